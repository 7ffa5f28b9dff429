//! Session event loop.
//!
//! The driver owns the event channel. It hands commands to the
//! [`Executor`], feeds every event back into the [`Session`], and asks the
//! [`Frontend`] for input only once no command is in flight.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::command::{Command, Context};
use crate::error::{DrillError, Result};
use crate::executor::Executor;
use crate::resume::StartTarget;
use crate::session::{Event, Session};
use crate::view::{Prompt, UserInput, View};

/// Presentation seam between the session and the learner.
pub trait Frontend {
    /// Shows the current screen. Called whenever it changes.
    fn render(&mut self, view: &View);

    /// Asks the learner for input and blocks until it is given.
    fn prompt(&mut self, prompt: &Prompt) -> UserInput;
}

/// Runs `session` from `target` until the learner quits or a download ends.
///
/// # Errors
///
/// Returns [`DrillError::Stalled`] when no command is pending and the
/// session has nothing to ask. Failures of individual commands are not
/// errors here; they move the session to its failed state.
pub async fn run<F: Frontend>(
    ctx: Context,
    session: &mut Session,
    target: StartTarget,
    frontend: &mut F,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = Executor::new(ctx, tx);
    let mut pending = 0_usize;

    let dispatch = |commands: Vec<Command>, pending: &mut usize| {
        for command in commands {
            executor.spawn(command);
            *pending += 1;
        }
    };

    info!(start = ?target, "Session starting");
    dispatch(session.start(target), &mut pending);

    let mut shown: Option<View> = None;
    loop {
        let view = session.view();
        if shown.as_ref() != Some(&view) {
            frontend.render(&view);
            shown = Some(view);
        }

        if session.is_done() {
            info!(state = %session.state(), "Session finished");
            return Ok(());
        }

        if pending > 0 {
            let Some(event) = rx.recv().await else {
                return Err(DrillError::Stalled {
                    state: session.state().to_string(),
                });
            };
            if event.is_completion() {
                pending -= 1;
            }
            debug!(state = %session.state(), pending, "Applying event");
            dispatch(session.update(event), &mut pending);
            continue;
        }

        let Some(prompt) = session.prompt() else {
            return Err(DrillError::Stalled {
                state: session.state().to_string(),
            });
        };
        let input = frontend.prompt(&prompt);
        debug!(state = %session.state(), ?input, "Learner input");
        dispatch(session.update(Event::Input(input)), &mut pending);
    }
}
