//! Terminal frontend built on dialoguer prompts and colored output.

use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use drill_orchestrator::{Frontend, Prompt, Tone, UserInput, View};

/// Renders session views to stdout and reads answers from the terminal.
#[derive(Default)]
pub struct TerminalFrontend {
    theme: ColorfulTheme,
}

impl TerminalFrontend {
    fn select(&self, title: &str, items: &[String], allow_back: bool) -> dialoguer::Result<UserInput> {
        let selection = Select::with_theme(&self.theme)
            .with_prompt(title)
            .items(items)
            .default(0)
            .interact_opt()?;

        Ok(match selection {
            Some(index) => UserInput::Select(index),
            None if allow_back => UserInput::Back,
            None => UserInput::Quit,
        })
    }

    fn text(&self, label: &str, default: &str) -> dialoguer::Result<UserInput> {
        let dir: String = Input::with_theme(&self.theme)
            .with_prompt(label)
            .default(default.to_string())
            .interact_text()?;
        Ok(UserInput::Directory(dir))
    }

    fn wait(&self, hint: &str, allow_edit: bool) -> dialoguer::Result<UserInput> {
        let prompt = format!("{hint} (q to quit)");
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;

        Ok(match answer.trim() {
            "q" => UserInput::Quit,
            "e" if allow_edit => UserInput::Edit,
            _ => UserInput::Enter,
        })
    }
}

impl Frontend for TerminalFrontend {
    fn render(&mut self, view: &View) {
        let title = match view.tone {
            Tone::Neutral => view.title.bold(),
            Tone::Busy => view.title.cyan(),
            Tone::Success => view.title.green().bold(),
            Tone::Failure => view.title.red().bold(),
        };
        println!();
        println!("{title}");
        if !view.body.is_empty() {
            println!("{}", view.body);
        }
    }

    fn prompt(&mut self, prompt: &Prompt) -> UserInput {
        let answer = tokio::task::block_in_place(|| match prompt {
            Prompt::Select {
                title,
                items,
                allow_back,
            } => self.select(title, items, *allow_back),
            Prompt::Text { label, default } => self.text(label, default),
            Prompt::Continue { hint, allow_edit } => self.wait(hint, *allow_edit),
            Prompt::Acknowledge => self.wait("Press enter to quit", false).map(|_| UserInput::Quit),
        });

        answer.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Prompt failed");
            UserInput::Quit
        })
    }
}
