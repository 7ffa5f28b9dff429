//! Runners for one-off external processes.

use std::path::Path;
use std::process::Stdio;

use tracing::{debug, instrument};

use crate::{exit_code, ProcessError, ProcessOutput, ProcessSpec, Result};

/// Exit code reported when a shell step could not be started at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -2;

/// Runs a process to completion with stdout and stderr captured separately.
#[instrument(skip(spec), fields(command = %spec.command_line()))]
pub async fn run_captured(spec: &ProcessSpec) -> Result<ProcessOutput> {
    let output = spec
        .to_command()
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| ProcessError::Spawn {
            command: spec.command_line(),
            source,
        })?;

    let result = ProcessOutput {
        exit_code: exit_code(output.status),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(exit_code = result.exit_code, "Process finished");
    Ok(result)
}

/// Runs a process with stderr redirected into stdout, preserving interleaving.
///
/// The process is started through `sh`, which redirects its own stderr and
/// then replaces itself with the target program.
pub async fn run_merged(spec: &ProcessSpec) -> Result<ProcessOutput> {
    let merged = ProcessSpec {
        program: "sh".to_string(),
        args: [
            "-c".to_string(),
            r#"exec "$0" "$@" 2>&1"#.to_string(),
            spec.program.clone(),
        ]
        .into_iter()
        .chain(spec.args.iter().cloned())
        .collect(),
        current_dir: spec.current_dir.clone(),
        env: spec.env.clone(),
    };

    let mut output = run_captured(&merged).await.map_err(|err| match err {
        ProcessError::Spawn { source, .. } => ProcessError::Spawn {
            command: spec.command_line(),
            source,
        },
        other => other,
    })?;
    output.stdout.push_str(&std::mem::take(&mut output.stderr));
    Ok(output)
}

/// Runs `command` through `sh -c` in `dir` with `LANG` set to `locale`.
///
/// Returns the exit code and the combined output trimmed of trailing
/// whitespace. When the shell cannot be started the exit code is
/// [`SPAWN_FAILURE_EXIT_CODE`] and the error text replaces the output.
pub async fn run_shell(command: &str, dir: &Path, locale: &str) -> (i32, String) {
    let spec = ProcessSpec::new("sh")
        .with_args(["-c", command])
        .with_current_dir(dir)
        .with_env("LANG", locale);

    match run_merged(&spec).await {
        Ok(output) => (
            output.exit_code,
            output.stdout.trim_end_matches([' ', '\n', '\t', '\r']).to_string(),
        ),
        Err(err) => (SPAWN_FAILURE_EXIT_CODE, err.to_string()),
    }
}

/// Runs a process attached to the terminal and waits for it to exit.
///
/// Used for editors: stdin, stdout and stderr are inherited.
#[instrument(skip(spec), fields(command = %spec.command_line()))]
pub async fn run_interactive(spec: &ProcessSpec) -> Result<i32> {
    let status = spec
        .to_command()
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| ProcessError::Spawn {
            command: spec.command_line(),
            source,
        })?;
    Ok(exit_code(status))
}
