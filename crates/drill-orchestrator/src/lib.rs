//! Drill Session Orchestrator
//!
//! Drives an interactive lesson session: fetches lessons from the lesson
//! service, writes exercises to disk, opens the editor, verifies the work
//! and publishes it with git.
//!
//! The [`Session`] state machine is pure. Side effects are [`Command`]s run
//! by the [`Executor`], and [`driver::run`] connects both to a [`Frontend`].

pub mod client;
pub mod command;
pub mod config;
pub mod driver;
pub mod editor;
pub mod error;
pub mod executor;
pub mod lesson;
pub mod materialize;
pub mod menu;
pub mod resume;
pub mod session;
pub mod view;

pub use client::LessonClient;
pub use command::{Command, Context};
pub use config::{Config, CONFIG_FILE_NAME};
pub use driver::Frontend;
pub use error::{DrillError, FetchErrorKind, Result};
pub use executor::Executor;
pub use lesson::{
    Chapter, CodeExercise, Course, CourseProgress, Lesson, LessonKind, LessonSummary, Question,
    StarterFile, Successor, Track,
};
pub use menu::{Menu, MenuItem, Selectable};
pub use resume::StartTarget;
pub use session::{Event, Session, State};
pub use view::{Prompt, Tone, UserInput, View};
