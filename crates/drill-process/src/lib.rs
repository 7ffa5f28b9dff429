//! Drill Process Management
//!
//! External process execution for Drill sessions: build and test recipes,
//! run scripts, CLI lesson steps, editors, and the git publish chain.
//!
//! This crate provides a small builder for describing a process
//! ([`ProcessSpec`]), runners that capture or inherit its output
//! ([`runner`]), a supervised sequential chain of processes reaped without
//! blocking ([`chain`]), the git publisher built on top of it ([`git`]), and
//! detection of an attached tracer ([`tracer`]).

pub mod chain;
pub mod git;
pub mod runner;
pub mod tracer;

pub use chain::{ChainOutcome, ProcessChain};
pub use runner::{run_captured, run_interactive, run_merged, run_shell};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while running external processes.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be started.
    #[error("failed to start {command}\n{source}")]
    Spawn {
        /// The command line that failed to start.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Waiting for or reaping the process failed.
    #[error("failed to reap process {command}: {source}")]
    Reap {
        /// The command line being supervised.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the process status file failed.
    #[error("can't open process status file: {0}")]
    StatusFile(#[source] std::io::Error),

    /// The process status file did not contain a tracer line.
    #[error("unknown format of process status file")]
    StatusFormat,
}

/// Result type for process operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Description of an external process to run.
///
/// # Example
///
/// ```
/// use drill_process::ProcessSpec;
///
/// let spec = ProcessSpec::new("make")
///     .with_args(["-f", ".lib/go/Makefile", "learn-go/1-intro/2-hello"])
///     .with_current_dir("/home/learner/course")
///     .with_env("LANG", "en_US.UTF-8");
///
/// assert_eq!(spec.command_line(), "make -f .lib/go/Makefile learn-go/1-intro/2-hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Working directory; the caller's when `None`.
    pub current_dir: Option<PathBuf>,
    /// Extra environment variables, appended to the inherited environment.
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    /// Creates a spec for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env: Vec::new(),
        }
    }

    /// Appends several arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The program and its arguments joined by spaces, for display.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds the tokio command described by this spec.
    pub(crate) fn to_command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }
}

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    /// Captured stdout (holds stderr as well for merged runs).
    pub stdout: String,
    /// Captured stderr; empty for merged runs.
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns `true` if the process exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Maps an exit status to the code reported to learners.
pub(crate) fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
