//! Start-up target resolution and the `.last` lesson pointer.

use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// File in the working root holding the URL of the most recent lesson.
pub const LAST_FILE_NAME: &str = ".last";

/// Where a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartTarget {
    /// A lesson URL or UUID.
    Lesson(String),
    /// A course URL or slug; runs in download mode.
    Course(String),
    /// Track selection.
    Tracks,
}

impl StartTarget {
    /// Interprets the positional argument.
    ///
    /// Anything containing `courses` is a course; any other argument is a
    /// lesson. With no argument the session resumes from `.last` in `root`,
    /// or starts at track selection when there is nothing to resume.
    #[must_use]
    pub fn resolve(arg: Option<&str>, root: &Path) -> Self {
        match arg.map(str::trim).filter(|a| !a.is_empty()) {
            Some(arg) if arg.contains("courses") => Self::Course(arg.to_string()),
            Some(arg) => Self::Lesson(arg.to_string()),
            None => load_last(root).map_or(Self::Tracks, Self::Lesson),
        }
    }

    /// Whether this target implies download mode.
    #[must_use]
    pub const fn is_download(&self) -> bool {
        matches!(self, Self::Course(_))
    }
}

/// Reads the lesson pointer, ignoring a missing or empty file.
#[must_use]
pub fn load_last(root: &Path) -> Option<String> {
    let path = root.join(LAST_FILE_NAME);
    match std::fs::read_to_string(&path) {
        Ok(content) => Some(content.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No lesson to resume");
            None
        }
    }
}

/// Overwrites the lesson pointer.
pub async fn save_last(root: &Path, lesson_url: &str) -> Result<()> {
    tokio::fs::write(root.join(LAST_FILE_NAME), lesson_url).await?;
    Ok(())
}
