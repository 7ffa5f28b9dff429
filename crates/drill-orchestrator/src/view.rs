//! What a frontend shows and asks for.
//!
//! Both are derived from the session, so a frontend renders without knowing
//! anything about the state machine.

/// How a view should be colored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tone {
    /// Plain text.
    #[default]
    Neutral,
    /// Work is in flight.
    Busy,
    /// Something passed.
    Success,
    /// Something failed.
    Failure,
}

/// A rendered session screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    /// Heading.
    pub title: String,
    /// Diagnostic or informational text, possibly empty.
    pub body: String,
    /// Coloring hint.
    pub tone: Tone,
}

impl View {
    pub(crate) fn new(title: impl Into<String>, body: impl Into<String>, tone: Tone) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            tone,
        }
    }
}

/// Input requested from the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Pick one item; answer with [`UserInput::Select`] or [`UserInput::Back`].
    Select {
        /// Heading of the list.
        title: String,
        /// Item titles in display order.
        items: Vec<String>,
        /// Whether going back to the parent list is possible.
        allow_back: bool,
    },
    /// Enter a line of text; answer with [`UserInput::Directory`].
    Text {
        /// Label in front of the input.
        label: String,
        /// Pre-filled value.
        default: String,
    },
    /// Wait for Enter; answer with [`UserInput::Enter`] or [`UserInput::Edit`].
    Continue {
        /// What Enter does.
        hint: String,
        /// Whether `e` reopens the editor.
        allow_edit: bool,
    },
    /// The session failed; any answer ends it.
    Acknowledge,
}

/// An answer to a [`Prompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Confirm or continue.
    Enter,
    /// Pick the item at this index.
    Select(usize),
    /// Return to the parent list.
    Back,
    /// Reopen the editor.
    Edit,
    /// Directory to run CLI steps in.
    Directory(String),
    /// End the session.
    Quit,
}
