//! Drill CLI
//!
//! Main entry point for running interactive lesson sessions.

mod terminal;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use drill_orchestrator::{driver, Config, Context, Session, StartTarget};
use tracing_subscriber::EnvFilter;

use crate::terminal::TerminalFrontend;

/// Drill - Interactive Lesson Runner
///
/// Fetches lessons from the lesson service, writes each exercise to disk,
/// opens your editor, checks your work and commits it to your repository.
#[derive(Parser, Debug)]
#[command(name = "drill")]
#[command(version, about, long_about = None)]
struct Args {
    /// Lesson or course URL or slug (default: resume from .last)
    #[arg(value_name = "TARGET")]
    target: Option<String>,

    /// Editor command used instead of the nvr layout
    #[arg(long, value_name = "CMD")]
    code_editor: Option<String>,

    /// Markdown viewer used for the README pane
    #[arg(long, value_name = "CMD")]
    md_editor: Option<String>,

    /// Only write exercises, following the course to its end
    #[arg(long)]
    download: bool,

    /// Path to configuration file (default: drill.json in the working root)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Working root for exercises, .last and .lib
    #[arg(long, value_name = "DIR")]
    root: Option<String>,

    /// Base URL of the lesson service
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(lesson = ?args.target, config = ?args.config, "Arguments");

    match run_drill(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs one lesson session.
///
/// 1. Load config and apply CLI overrides
/// 2. Resolve where to start
/// 3. Drive the session until the learner quits
async fn run_drill(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref(), args.root.as_deref())?;

    if let Some(root) = args.root {
        config.root = root;
    }
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }
    if args.code_editor.is_some() {
        config.code_editor = args.code_editor;
    }
    if args.md_editor.is_some() {
        config.md_editor = args.md_editor;
    }
    config.download |= args.download;

    // Re-validate after overrides
    config.validate()?;
    log_config(&config);

    let target = StartTarget::resolve(args.target.as_deref(), &config.root_path());
    tracing::info!(start = ?target, "Starting session");

    let mut session = Session::from_config(&config);
    let ctx = Context::new(config)?;
    let mut frontend = TerminalFrontend::default();

    driver::run(ctx, &mut session, target, &mut frontend).await?;

    match session.error() {
        Some(err) => anyhow::bail!("{err}"),
        None => Ok(()),
    }
}

fn load_config(config_path: Option<&str>, root: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load_from_dir(Path::new(root.unwrap_or(".")))
            .map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn log_config(config: &Config) {
    tracing::debug!(
        api = %config.api_base_url,
        root = %config.root,
        lib_dir = %config.lib_dir,
        code_editor = ?config.code_editor,
        download = config.download,
        "Configuration loaded"
    );
}
