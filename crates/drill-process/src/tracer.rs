//! Detection of a debugger or tracer attached to this process.

use crate::{ProcessError, Result};

const STATUS_FILE: &str = "/proc/self/status";

/// PID of the process tracing this one, 0 when untraced.
pub fn tracer_pid() -> Result<u32> {
    let status = std::fs::read_to_string(STATUS_FILE).map_err(ProcessError::StatusFile)?;
    parse_tracer_pid(&status).ok_or(ProcessError::StatusFormat)
}

/// Returns `true` if a tracer is attached. Unknown means untraced.
#[must_use]
pub fn is_traced() -> bool {
    matches!(tracer_pid(), Ok(pid) if pid > 0)
}

fn parse_tracer_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|value| value.trim().parse().ok())
}
