//! Command execution.
//!
//! Every [`Command`] runs in its own tokio task and answers with exactly one
//! completion [`Event`] on the session channel. CLI steps additionally post
//! [`Event::StepStarted`] and [`Event::StepFinished`] while they run.

use std::path::Path;

use drill_check::text_input::check_input_file;
use drill_check::{cli, compare_output, interpolate, CliStep, CommandOutcome, Variables, Verdict};
use drill_process::git::{self, PublishRequest};
use drill_process::{run_captured, run_interactive, run_merged, run_shell, tracer, ProcessSpec};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command::{Command, Context};
use crate::editor::editor_command;
use crate::error::{DrillError, Result};
use crate::lesson::{Lesson, LessonKind};
use crate::materialize::materialize;
use crate::resume::save_last;
use crate::session::Event;

/// Marker written into a CLI exercise recording the directory its steps ran in.
pub const DIR_MARKER_FILE_NAME: &str = ".dir";

/// Recipe building and testing a code exercise.
pub const TEST_RECIPE: &str = "Makefile";

/// Recipe running a code exercise.
pub const RUN_RECIPE: &str = "run";

/// Spawns commands and routes their completions to the session channel.
#[derive(Debug, Clone)]
pub struct Executor {
    ctx: Context,
    tx: UnboundedSender<Event>,
}

impl Executor {
    /// Creates an executor posting events on `tx`.
    #[must_use]
    pub const fn new(ctx: Context, tx: UnboundedSender<Event>) -> Self {
        Self { ctx, tx }
    }

    /// Runs `command` in a new task.
    pub fn spawn(&self, command: Command) -> JoinHandle<()> {
        debug!(command = command.name(), "Dispatching command");
        let ctx = self.ctx.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let name = command.name();
            let event = execute(&ctx, command, &tx).await;
            if tx.send(event).is_err() {
                debug!(command = name, "Session ended before command completed");
            }
        })
    }
}

/// Runs one command to completion and returns its completion event.
///
/// Progress events are posted on `progress`; errors become [`Event::Failed`].
pub async fn execute(ctx: &Context, command: Command, progress: &UnboundedSender<Event>) -> Event {
    let name = command.name();
    match run(ctx, command, progress).await {
        Ok(event) => event,
        Err(err) => {
            warn!(command = name, error = %err, "Command failed");
            Event::Failed(err)
        }
    }
}

async fn run(ctx: &Context, command: Command, progress: &UnboundedSender<Event>) -> Result<Event> {
    let root = ctx.config.root_path();
    let client = &ctx.client;

    match command {
        Command::FetchTracks => Ok(Event::TracksLoaded(client.tracks().await?)),
        Command::FetchTrack { slug } => Ok(Event::TrackLoaded(client.track(&slug).await?)),
        Command::LoadCourse { target, download } => {
            let course = client.course(&target).await?;
            info!(course = %course.slug, download, "Course loaded");
            if download {
                let lesson = client.lesson(&course.first_lesson_uuid).await?;
                Ok(Event::LessonLoaded(Box::new(lesson)))
            } else {
                let progress = client.course_progress(&course.first_lesson_uuid).await?;
                Ok(Event::ProgressLoaded(progress))
            }
        }
        Command::FetchProgress { lesson_uuid } => Ok(Event::ProgressLoaded(
            client.course_progress(&lesson_uuid).await?,
        )),
        Command::FetchLesson { target } => {
            Ok(Event::LessonLoaded(Box::new(client.lesson(&target).await?)))
        }
        Command::WriteFiles { lesson } => {
            if let Err(err) = save_last(&root, &client.lesson_url(&lesson.uuid)).await {
                warn!(error = %err, "Could not save lesson pointer");
            }
            Ok(Event::FilesWritten(materialize(&root, &lesson).await?))
        }
        Command::OpenEditor { lesson, files } => {
            let spec = editor_command(&ctx.config, &root, &lesson, &files);
            let code = run_interactive(&spec).await.map_err(|e| DrillError::Editor {
                message: e.to_string(),
                args: spec.args.clone(),
            })?;
            if code != 0 {
                return Err(DrillError::Editor {
                    message: format!("{} exited with code {code}", spec.program),
                    args: spec.args,
                });
            }
            Ok(Event::EditorClosed)
        }
        Command::RunCodeTests { lesson } => Ok(Event::CodeTested(
            run_code_tests(ctx, &root, &lesson).await,
        )),
        Command::CheckOutput { lesson } => Ok(Event::OutputChecked(
            check_output(ctx, &root, &lesson).await,
        )),
        Command::RunCliSteps { lesson, dir } => {
            run_cli_steps(ctx, &root, &lesson, &dir, progress).await
        }
        Command::FetchCheck { lesson } => Ok(Event::CheckLoaded(client.check(&lesson.uuid).await?)),
        Command::CheckInput { lesson, check } => {
            let dir = root.join(lesson.exercise_dir());
            let verdict = check_input_file(&dir, &check).await.unwrap_or_else(|err| {
                warn!(error = %err, "Input file unreadable");
                Verdict::fail(err.to_string())
            });
            Ok(Event::InputChecked(verdict))
        }
        Command::Publish { lesson } => publish(ctx, &root, &lesson).await,
    }
}

// ============================================================================
// Verification workflows
// ============================================================================

/// Locates a recipe of the lesson's language, or explains why it is missing.
fn recipe(ctx: &Context, root: &Path, lesson: &Lesson, file: &str) -> std::result::Result<String, Verdict> {
    let language = lesson.language().unwrap_or_default();
    let recipe = ctx.config.recipe_path(language, file);
    if root.join(&recipe).is_file() {
        Ok(recipe.to_string_lossy().into_owned())
    } else {
        Err(Verdict::fail(format!(
            "missing {file} for language '{language}' at {}",
            root.join(&recipe).display()
        )))
    }
}

async fn run_code_tests(ctx: &Context, root: &Path, lesson: &Lesson) -> Verdict {
    let makefile = match recipe(ctx, root, lesson, TEST_RECIPE) {
        Ok(path) => path,
        Err(verdict) => return verdict,
    };

    let spec = ProcessSpec::new("make")
        .with_args([
            "-f".to_string(),
            makefile,
            lesson.exercise_dir().to_string_lossy().into_owned(),
        ])
        .with_current_dir(root);

    match run_captured(&spec).await {
        Ok(output) if output.success() => Verdict::pass(output.stdout),
        Ok(output) => Verdict::fail(format!("{}{}", output.stdout, output.stderr)),
        Err(err) => Verdict::fail(err.to_string()),
    }
}

async fn check_output(ctx: &Context, root: &Path, lesson: &Lesson) -> Verdict {
    let script = match recipe(ctx, root, lesson, RUN_RECIPE) {
        Ok(path) => path,
        Err(verdict) => return verdict,
    };
    let expected = match &lesson.kind {
        LessonKind::CodeOutput {
            expected_output, ..
        } => expected_output.as_str(),
        _ => "",
    };

    let spec = ProcessSpec::new("bash")
        .with_args([
            script,
            lesson.exercise_dir().to_string_lossy().into_owned(),
        ])
        .with_current_dir(root);

    match run_merged(&spec).await {
        Ok(output) => compare_output(&output.stdout, expected, output.exit_code).into_verdict(),
        Err(err) => Verdict::fail(err.to_string()),
    }
}

async fn run_cli_steps(
    ctx: &Context,
    root: &Path,
    lesson: &Lesson,
    dir: &str,
    progress: &UnboundedSender<Event>,
) -> Result<Event> {
    let steps = match &lesson.kind {
        LessonKind::Cli { steps, .. } => steps.as_slice(),
        _ => &[],
    };
    let work_dir = root.join(dir);
    let vars = Variables::new();

    for step in steps {
        let command = match step {
            CliStep::Command(command) => command,
            CliStep::HttpRequest(_) => return Err(DrillError::unimplemented("HTTPRequest")),
            CliStep::Missing => return Err(DrillError::MissingStep),
        };

        notify(
            progress,
            Event::StepStarted {
                command: command.command.clone(),
            },
        );

        let final_command = interpolate(&command.command, &vars);

        let (exit_code, stdout) = run_shell(&final_command, &work_dir, &ctx.config.locale).await;
        let outcome = CommandOutcome {
            final_command,
            exit_code,
            stdout,
        };
        debug!(command = %outcome.final_command, exit_code, "CLI step finished");

        if let Err(err) = cli::evaluate_tests(&command.tests, &outcome, &vars) {
            return Ok(Event::CliFinished(Err(cli::failure_report(&err, &outcome))));
        }
        notify(
            progress,
            Event::StepFinished {
                output: outcome.stdout,
            },
        );
    }

    let marker = root.join(lesson.exercise_dir()).join(DIR_MARKER_FILE_NAME);
    if let Err(err) = tokio::fs::write(&marker, dir).await {
        warn!(path = %marker.display(), error = %err, "Could not write directory marker");
    }
    Ok(Event::CliFinished(Ok(())))
}

/// Posts a progress event; the driver may already have stopped listening.
fn notify(progress: &UnboundedSender<Event>, event: Event) {
    if let Err(err) = progress.send(event) {
        debug!(event = ?err.0, "Progress event dropped, receiver closed");
    }
}

// ============================================================================
// Publishing
// ============================================================================

async fn publish(ctx: &Context, root: &Path, lesson: &Lesson) -> Result<Event> {
    if !git::is_repository(root) {
        return Err(DrillError::GitRepositoryMissing {
            root: root.to_path_buf(),
        });
    }

    let message = git::commit_message(&lesson.course_slug, &lesson.chapter_slug, &lesson.slug);
    let exercise_dir = lesson.exercise_dir();
    let request = PublishRequest {
        repo_root: root,
        exercise_dir: &exercise_dir,
        message: &message,
        dry_run_push: tracer::is_traced(),
        poll_interval: ctx.config.git_poll_interval(),
    };

    info!(%message, "Publishing exercise");
    let outcome = git::publish_chain(&request).run().await?;
    Ok(Event::Published(outcome))
}

// ============================================================================
// Tests
// ============================================================================
