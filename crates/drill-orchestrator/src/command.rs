//! Side effects requested by the session.
//!
//! The session never performs I/O. Each transition returns [`Command`]s and
//! the [`Executor`](crate::executor::Executor) runs them; every command
//! answers with exactly one completion [`Event`](crate::session::Event).

use std::sync::Arc;

use drill_check::Check;

use crate::client::LessonClient;
use crate::config::Config;
use crate::error::Result;
use crate::lesson::Lesson;

/// Asynchronous work issued by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch the track list.
    FetchTracks,
    /// Fetch one track.
    FetchTrack {
        /// Track slug.
        slug: String,
    },
    /// Fetch the course, then its first lesson (download) or its progress tree.
    LoadCourse {
        /// Course URL or slug.
        target: String,
        /// Go straight to the first lesson.
        download: bool,
    },
    /// Fetch the progress tree of the course containing a lesson.
    FetchProgress {
        /// Any lesson of the course.
        lesson_uuid: String,
    },
    /// Fetch a lesson.
    FetchLesson {
        /// Lesson URL or UUID.
        target: String,
    },
    /// Save the `.last` pointer and materialize the exercise.
    WriteFiles {
        /// The lesson to write.
        lesson: Arc<Lesson>,
    },
    /// Open the editor and wait for it to exit.
    OpenEditor {
        /// The lesson being edited.
        lesson: Arc<Lesson>,
        /// Materialized files, README first.
        files: Vec<String>,
    },
    /// Run the language's test recipe.
    RunCodeTests {
        /// The code lesson.
        lesson: Arc<Lesson>,
    },
    /// Run the language's run recipe and compare its output.
    CheckOutput {
        /// The code lesson.
        lesson: Arc<Lesson>,
    },
    /// Run every CLI step in `dir`.
    RunCliSteps {
        /// The CLI lesson.
        lesson: Arc<Lesson>,
        /// Directory the learner chose, relative to the working root.
        dir: String,
    },
    /// Fetch the check spec of a text-input lesson.
    FetchCheck {
        /// The text-input lesson.
        lesson: Arc<Lesson>,
    },
    /// Check the learner's `input.txt`.
    CheckInput {
        /// The text-input lesson.
        lesson: Arc<Lesson>,
        /// Rules to apply.
        check: Check,
    },
    /// Stage, commit and push the exercise directory.
    Publish {
        /// The finished lesson.
        lesson: Arc<Lesson>,
    },
}

impl Command {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FetchTracks => "fetch_tracks",
            Self::FetchTrack { .. } => "fetch_track",
            Self::LoadCourse { .. } => "load_course",
            Self::FetchProgress { .. } => "fetch_progress",
            Self::FetchLesson { .. } => "fetch_lesson",
            Self::WriteFiles { .. } => "write_files",
            Self::OpenEditor { .. } => "open_editor",
            Self::RunCodeTests { .. } => "run_code_tests",
            Self::CheckOutput { .. } => "check_output",
            Self::RunCliSteps { .. } => "run_cli_steps",
            Self::FetchCheck { .. } => "fetch_check",
            Self::CheckInput { .. } => "check_input",
            Self::Publish { .. } => "publish",
        }
    }
}

/// Everything commands need from the outside world, built once at start-up.
#[derive(Debug, Clone)]
pub struct Context {
    /// Session configuration.
    pub config: Arc<Config>,
    /// Lesson service client.
    pub client: LessonClient,
}

impl Context {
    /// Builds the context for `config`.
    pub fn new(config: Config) -> Result<Self> {
        let client = LessonClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}
