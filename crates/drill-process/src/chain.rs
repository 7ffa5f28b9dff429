//! Supervised sequential process chains.
//!
//! A [`ProcessChain`] starts its steps one after another. Each running step
//! is reaped with non-blocking `try_wait` polls separated by a short sleep, so
//! the supervising task never blocks a runtime thread on process exit. The
//! chain stops at the first step that exits non-zero; later steps are never
//! started.

use std::fmt::Write as _;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{exit_code, ProcessError, ProcessSpec, Result};

/// Default delay between two reap attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Prompt marker written before each command in the transcript.
pub const PROMPT: &str = "❯";

/// A step of a chain that exited non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    /// Zero-based index of the failing step.
    pub index: usize,
    /// Command line of the failing step.
    pub command: String,
    /// Its exit code.
    pub exit_code: i32,
}

/// Result of running a chain to completion or to its first failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainOutcome {
    /// Every started command, its stdout, and the failure text if any.
    pub transcript: String,
    /// Number of steps that were started.
    pub started: usize,
    /// The failing step, if the chain was aborted.
    pub failure: Option<StepFailure>,
}

impl ChainOutcome {
    /// Returns `true` if every step exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Steps run in order, stopping at the first non-zero exit.
#[derive(Debug, Clone)]
pub struct ProcessChain {
    steps: Vec<ProcessSpec>,
    poll_interval: Duration,
}

impl ProcessChain {
    /// Creates a chain of `steps` using [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn new(steps: Vec<ProcessSpec>) -> Self {
        Self {
            steps,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the delay between reap attempts.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The steps of this chain.
    #[must_use]
    pub fn steps(&self) -> &[ProcessSpec] {
        &self.steps
    }

    /// Runs the chain.
    ///
    /// A step exiting non-zero ends the chain with a [`StepFailure`] in the
    /// outcome. A step that cannot be started or reaped is an error.
    pub async fn run(self) -> Result<ChainOutcome> {
        let mut outcome = ChainOutcome::default();

        for (index, spec) in self.steps.iter().enumerate() {
            let command = spec.command_line();
            let _ = writeln!(outcome.transcript, "{PROMPT} {command}");
            outcome.started += 1;

            let (code, stdout, stderr) = self.supervise(spec).await?;
            outcome.transcript.push_str(&stdout);

            if code != 0 {
                warn!(command = %command, exit_code = code, "Chain step failed");
                let _ = write!(
                    outcome.transcript,
                    "\"{command}\" failed with exit code {code}\n{stderr}"
                );
                outcome.failure = Some(StepFailure {
                    index,
                    command,
                    exit_code: code,
                });
                return Ok(outcome);
            }
            debug!(command = %command, "Chain step finished");
        }

        Ok(outcome)
    }

    /// Starts one step and polls it until it has exited.
    async fn supervise(&self, spec: &ProcessSpec) -> Result<(i32, String, String)> {
        let mut child = spec
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: spec.command_line(),
                source,
            })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(source) => {
                    return Err(ProcessError::Reap {
                        command: spec.command_line(),
                        source,
                    })
                }
            }
        };

        Ok((
            exit_code(status),
            collect(stdout).await,
            collect(stderr).await,
        ))
    }
}

/// Reads a pipe to the end on its own task so a chatty child never blocks.
fn drain<R>(mut reader: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            debug!(error = %e, "Failed to read process pipe");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}
