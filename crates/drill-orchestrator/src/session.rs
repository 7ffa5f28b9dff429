//! Lesson session state machine.
//!
//! [`Session::update`] is the whole transition function: it consumes one
//! [`Event`] (learner input or the completion of a command), mutates the
//! session, and returns the [`Command`]s to run next. It performs no I/O.
//!
//! A lesson moves through these states:
//!
//! - `Fetch` -> `WriteFiles` -> `EditorStart` -> `EditorFinished`
//! - `EditorFinished` dispatches on the lesson kind:
//!   - choice: `QuestionStart` -> `QuestionCorrect` | `QuestionRetry` | `QuestionFailed`
//!   - code tests: `CodeTest` -> `CodeTestSuccess` | `CodeTestFailed`
//!   - code output: `CheckOutput` -> `OutputSuccess` | `OutputFail`
//!   - CLI: `InputDir` -> `CLICheck` -> `CLIDone` | `CLIFailed`
//!   - text input: `CheckInput` -> `InputSuccess` | `InputFail`
//!   - manual: straight to `Git`
//! - failures return to `EditorStart`; successes go to `Git`
//! - `Git` -> `NextLesson` -> `Fetch` | `CourseFinished`
//!
//! Selection states (`TrackSelect`, `CourseSelect`, `ChapterSelect`,
//! `LessonSelect`) navigate the catalogue. `Failed` is terminal.

use std::fmt::Write as _;
use std::sync::Arc;

use drill_check::{Check, Verdict};
use drill_process::ChainOutcome;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::Config;
use crate::error::DrillError;
use crate::lesson::{CourseProgress, Lesson, LessonKind, Successor, Track};
use crate::menu::Menu;
use crate::resume::StartTarget;
use crate::view::{Prompt, Tone, UserInput, View};

// ============================================================================
// State
// ============================================================================

/// Where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the lesson service.
    Fetch,
    /// Answering a multiple-choice question.
    QuestionStart,
    /// The answer was correct.
    QuestionCorrect,
    /// The answer was wrong; attempts remain.
    QuestionRetry,
    /// Every attempt was used.
    QuestionFailed,
    /// Materializing the exercise.
    WriteFiles,
    /// The editor is open.
    EditorStart,
    /// The editor closed; dispatching on the lesson kind.
    EditorFinished,
    /// Running the test recipe.
    CodeTest,
    /// Tests passed.
    CodeTestSuccess,
    /// Tests failed.
    CodeTestFailed,
    /// Running the program and comparing its output.
    CheckOutput,
    /// Output matched.
    OutputSuccess,
    /// Output did not match or the program failed.
    OutputFail,
    /// Choosing the directory for CLI steps.
    InputDir,
    /// Running CLI steps.
    CLICheck,
    /// Every CLI step passed.
    CLIDone,
    /// A CLI step failed.
    CLIFailed,
    /// Checking `input.txt`.
    CheckInput,
    /// `input.txt` failed its check.
    InputFail,
    /// `input.txt` passed its check.
    InputSuccess,
    /// Publishing, or showing a failed publish.
    Git,
    /// Resolving the next lesson.
    NextLesson,
    /// Picking a track.
    TrackSelect,
    /// Picking a course of the selected track.
    CourseSelect,
    /// The course has no further lessons.
    CourseFinished,
    /// Picking a chapter.
    ChapterSelect,
    /// Picking a lesson of the selected chapter.
    LessonSelect,
    /// Unrecoverable error; only quitting is possible.
    Failed,
}

impl State {
    /// Returns `true` for states that accept a list selection.
    #[must_use]
    pub const fn is_selection(&self) -> bool {
        matches!(
            self,
            Self::TrackSelect
                | Self::CourseSelect
                | Self::ChapterSelect
                | Self::LessonSelect
                | Self::QuestionStart
        )
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

// ============================================================================
// Events
// ============================================================================

/// Something the session reacts to.
#[derive(Debug)]
pub enum Event {
    /// The learner answered a prompt.
    Input(UserInput),
    /// The track list arrived.
    TracksLoaded(Vec<Track>),
    /// A track arrived.
    TrackLoaded(Track),
    /// A course progress tree arrived.
    ProgressLoaded(CourseProgress),
    /// A lesson arrived.
    LessonLoaded(Box<Lesson>),
    /// The exercise was written; file names, README first.
    FilesWritten(Vec<String>),
    /// The editor exited.
    EditorClosed,
    /// The test recipe finished.
    CodeTested(Verdict),
    /// The run recipe finished and its output was compared.
    OutputChecked(Verdict),
    /// The check spec arrived; `None` when the lesson has none.
    CheckLoaded(Option<Check>),
    /// `input.txt` was checked.
    InputChecked(Verdict),
    /// A CLI step started. Progress only.
    StepStarted {
        /// The step's command template.
        command: String,
    },
    /// A CLI step passed. Progress only.
    StepFinished {
        /// Its output.
        output: String,
    },
    /// Every CLI step ran; the error holds the failure report.
    CliFinished(std::result::Result<(), String>),
    /// The git chain finished.
    Published(ChainOutcome),
    /// A command failed.
    Failed(DrillError),
}

impl Event {
    /// Returns `true` if this event completes a command.
    #[must_use]
    pub const fn is_completion(&self) -> bool {
        !matches!(
            self,
            Self::Input(_) | Self::StepStarted { .. } | Self::StepFinished { .. }
        )
    }
}

// ============================================================================
// Session
// ============================================================================

/// The orchestrator's context across transitions.
#[derive(Debug, Clone)]
pub struct Session {
    state: State,
    max_attempts: u32,
    download: bool,
    tracks: Option<Vec<Track>>,
    track: Option<Track>,
    progress: Option<CourseProgress>,
    chapter_index: usize,
    lesson: Option<Arc<Lesson>>,
    starter_files: Vec<String>,
    attempts: u32,
    content: String,
    dir: String,
    error: Option<String>,
    quit: bool,
}

impl Session {
    /// Creates a session allowing `max_attempts` answers per question.
    #[must_use]
    pub const fn new(max_attempts: u32, download: bool) -> Self {
        Self {
            state: State::Fetch,
            max_attempts,
            download,
            tracks: None,
            track: None,
            progress: None,
            chapter_index: 0,
            lesson: None,
            starter_files: Vec::new(),
            attempts: 0,
            content: String::new(),
            dir: String::new(),
            error: None,
            quit: false,
        }
    }

    /// Creates a session from configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.max_attempts, config.download)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// The lesson being worked on.
    #[must_use]
    pub fn lesson(&self) -> Option<&Lesson> {
        self.lesson.as_deref()
    }

    /// Diagnostic text of the current state.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Wrong answers given to the current question.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Materialized files of the current lesson, README first.
    #[must_use]
    pub fn starter_files(&self) -> &[String] {
        &self.starter_files
    }

    /// Whether interactive steps are skipped.
    #[must_use]
    pub const fn is_download(&self) -> bool {
        self.download
    }

    /// The error that failed the session.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns `true` once the session should end.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.quit || (self.download && self.state == State::CourseFinished)
    }

    /// Commands that begin a session at `target`.
    pub fn start(&mut self, target: StartTarget) -> Vec<Command> {
        self.download |= target.is_download();
        self.state = State::Fetch;
        match target {
            StartTarget::Lesson(target) => vec![Command::FetchLesson { target }],
            StartTarget::Course(target) => vec![Command::LoadCourse {
                target,
                download: self.download,
            }],
            StartTarget::Tracks => vec![Command::FetchTracks],
        }
    }

    /// Applies one event and returns the commands it triggers.
    #[allow(clippy::too_many_lines)]
    pub fn update(&mut self, event: Event) -> Vec<Command> {
        if self.state == State::Failed && !matches!(event, Event::Input(_)) {
            debug!(?event, "Ignoring event after failure");
            return Vec::new();
        }

        match event {
            Event::Input(input) => self.on_input(input),
            Event::Failed(err) => self.fail(err.to_string()),
            Event::TracksLoaded(tracks) => {
                self.tracks = Some(tracks);
                self.state = State::TrackSelect;
                Vec::new()
            }
            Event::TrackLoaded(track) => {
                self.track = Some(track);
                self.state = State::CourseSelect;
                Vec::new()
            }
            Event::ProgressLoaded(progress) => {
                self.progress = Some(progress);
                if self.state == State::NextLesson {
                    self.resolve_next()
                } else {
                    self.chapter_index = 0;
                    self.state = State::ChapterSelect;
                    Vec::new()
                }
            }
            Event::LessonLoaded(lesson) => self.on_lesson(*lesson),
            Event::FilesWritten(files) => {
                self.starter_files = files;
                if self.download {
                    self.resolve_next()
                } else {
                    self.open_editor()
                }
            }
            Event::EditorClosed => self.dispatch(),
            Event::CodeTested(verdict) => {
                self.state = if verdict.passed {
                    State::CodeTestSuccess
                } else {
                    State::CodeTestFailed
                };
                self.content = verdict.report;
                Vec::new()
            }
            Event::OutputChecked(verdict) => {
                self.state = if verdict.passed {
                    State::OutputSuccess
                } else {
                    State::OutputFail
                };
                self.content = verdict.report;
                Vec::new()
            }
            Event::CheckLoaded(Some(check)) => match self.lesson.clone() {
                Some(lesson) => {
                    self.state = State::CheckInput;
                    vec![Command::CheckInput { lesson, check }]
                }
                None => self.fail(DrillError::NoLesson.to_string()),
            },
            Event::CheckLoaded(None) => self.publish(),
            Event::InputChecked(verdict) => {
                self.state = if verdict.passed {
                    State::InputSuccess
                } else {
                    State::InputFail
                };
                self.content = verdict.report;
                Vec::new()
            }
            Event::StepStarted { command } => {
                let _ = writeln!(self.content, "❯ {command}");
                Vec::new()
            }
            Event::StepFinished { output } => {
                let _ = write!(self.content, "{output}\n\n");
                Vec::new()
            }
            Event::CliFinished(Ok(())) => {
                self.content.push_str("done");
                self.state = State::CLIDone;
                Vec::new()
            }
            Event::CliFinished(Err(report)) => {
                self.content = report;
                self.state = State::CLIFailed;
                Vec::new()
            }
            Event::Published(outcome) => {
                self.content = outcome.transcript;
                match outcome.failure {
                    None => self.resolve_next(),
                    Some(failure) => {
                        warn!(command = %failure.command, exit_code = failure.exit_code, "Publish failed");
                        self.state = State::Git;
                        Vec::new()
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn on_input(&mut self, input: UserInput) -> Vec<Command> {
        if input == UserInput::Quit || self.state == State::Failed {
            self.quit = true;
            return Vec::new();
        }

        match (self.state, input) {
            (State::TrackSelect, UserInput::Select(index)) => {
                let Some(slug) = self
                    .tracks
                    .as_ref()
                    .and_then(|tracks| tracks.get(index))
                    .map(|track| track.slug.clone())
                else {
                    return Vec::new();
                };
                self.track = None;
                self.state = State::Fetch;
                vec![Command::FetchTrack { slug }]
            }
            (State::CourseSelect, UserInput::Select(index)) => {
                let Some(lesson_uuid) = self
                    .track
                    .as_ref()
                    .and_then(|track| track.courses.get(index))
                    .map(|course| course.first_lesson_uuid.clone())
                else {
                    return Vec::new();
                };
                self.progress = None;
                self.state = State::Fetch;
                vec![Command::FetchProgress { lesson_uuid }]
            }
            (State::ChapterSelect, UserInput::Select(index)) => {
                if self
                    .progress
                    .as_ref()
                    .is_some_and(|p| index < p.chapters.len())
                {
                    self.chapter_index = index;
                    self.state = State::LessonSelect;
                }
                Vec::new()
            }
            (State::LessonSelect, UserInput::Select(index)) => {
                let Some(target) = self
                    .progress
                    .as_ref()
                    .and_then(|p| p.chapters.get(self.chapter_index))
                    .and_then(|chapter| chapter.lessons.get(index))
                    .map(|lesson| lesson.uuid.clone())
                else {
                    return Vec::new();
                };
                self.state = State::Fetch;
                vec![Command::FetchLesson { target }]
            }
            (State::QuestionStart, UserInput::Select(index)) => {
                self.answer(index);
                Vec::new()
            }
            (State::LessonSelect, UserInput::Back) => {
                self.state = State::ChapterSelect;
                Vec::new()
            }
            (State::ChapterSelect, UserInput::Back) => {
                if self.track.is_some() {
                    self.state = State::CourseSelect;
                    Vec::new()
                } else {
                    self.state = State::Fetch;
                    vec![Command::FetchTracks]
                }
            }
            (State::CourseSelect, UserInput::Back) | (State::CourseFinished, UserInput::Enter) => {
                self.select_track()
            }
            (State::QuestionRetry, UserInput::Enter) => {
                self.state = State::QuestionStart;
                Vec::new()
            }
            (
                State::QuestionCorrect
                | State::QuestionFailed
                | State::CodeTestSuccess
                | State::OutputSuccess
                | State::CLIDone
                | State::InputSuccess,
                UserInput::Enter,
            ) => self.publish(),
            (
                State::CodeTestFailed | State::OutputFail | State::CLIFailed | State::InputFail,
                UserInput::Enter,
            )
            | (State::CodeTestSuccess, UserInput::Edit) => self.open_editor(),
            (State::CodeTest | State::CheckOutput, UserInput::Enter) => self.dispatch(),
            (State::InputDir, UserInput::Directory(dir)) => {
                if !dir.trim().is_empty() {
                    self.dir = dir.trim().to_string();
                }
                match self.lesson.clone() {
                    Some(lesson) => {
                        self.content.clear();
                        self.state = State::CLICheck;
                        vec![Command::RunCliSteps {
                            lesson,
                            dir: self.dir.clone(),
                        }]
                    }
                    None => self.fail(DrillError::NoLesson.to_string()),
                }
            }
            (State::Git | State::NextLesson, UserInput::Enter) => self.resolve_next(),
            (state, input) => {
                debug!(%state, ?input, "Input ignored");
                Vec::new()
            }
        }
    }

    fn on_lesson(&mut self, lesson: Lesson) -> Vec<Command> {
        info!(lesson = %lesson.slug, kind = lesson.kind.type_tag(), "Lesson loaded");
        if self
            .progress
            .as_ref()
            .is_some_and(|p| p.course_uuid != lesson.course_uuid)
        {
            self.progress = None;
        }

        let lesson = Arc::new(lesson);
        self.lesson = Some(Arc::clone(&lesson));
        self.starter_files.clear();
        self.content.clear();
        self.state = State::WriteFiles;
        vec![Command::WriteFiles { lesson }]
    }

    /// Routes a lesson to its verification state.
    fn dispatch(&mut self) -> Vec<Command> {
        let Some(lesson) = self.lesson.clone() else {
            return self.fail(DrillError::NoLesson.to_string());
        };
        self.state = State::EditorFinished;

        match &lesson.kind {
            LessonKind::Choice { .. } => {
                self.state = State::QuestionStart;
                Vec::new()
            }
            LessonKind::CodeTests(_) => {
                self.state = State::CodeTest;
                vec![Command::RunCodeTests { lesson }]
            }
            LessonKind::CodeOutput { .. } => {
                self.state = State::CheckOutput;
                vec![Command::CheckOutput { lesson }]
            }
            LessonKind::Cli { .. } => {
                self.dir = lesson.exercise_dir().to_string_lossy().into_owned();
                self.state = State::InputDir;
                Vec::new()
            }
            LessonKind::TextInput { .. } => {
                self.state = State::CheckInput;
                vec![Command::FetchCheck { lesson }]
            }
            LessonKind::Manual { .. } => self.publish(),
        }
    }

    fn answer(&mut self, index: usize) {
        let Some(question) = self.lesson.as_deref().and_then(Lesson::question) else {
            return;
        };
        let Some(selected) = question.answers.get(index) else {
            return;
        };

        if *selected == question.answer {
            self.state = State::QuestionCorrect;
        } else {
            self.attempts += 1;
            self.state = if self.attempts >= self.max_attempts {
                State::QuestionFailed
            } else {
                State::QuestionRetry
            };
        }
    }

    fn open_editor(&mut self) -> Vec<Command> {
        let Some(lesson) = self.lesson.clone() else {
            return self.fail(DrillError::NoLesson.to_string());
        };
        self.state = State::EditorStart;
        vec![Command::OpenEditor {
            lesson,
            files: self.starter_files.clone(),
        }]
    }

    fn publish(&mut self) -> Vec<Command> {
        let Some(lesson) = self.lesson.clone() else {
            return self.fail(DrillError::NoLesson.to_string());
        };
        self.content.clear();
        self.state = State::Git;
        vec![Command::Publish { lesson }]
    }

    fn resolve_next(&mut self) -> Vec<Command> {
        self.attempts = 0;
        self.starter_files.clear();
        let Some(lesson) = self.lesson.clone() else {
            return self.fail(DrillError::NoLesson.to_string());
        };

        match self.progress.as_ref().map(|p| p.successor(&lesson)) {
            Some(Successor::Lesson(target)) => {
                self.state = State::Fetch;
                vec![Command::FetchLesson { target }]
            }
            Some(Successor::Finished) => {
                info!(course = %lesson.course_slug, "Course finished");
                self.state = State::CourseFinished;
                Vec::new()
            }
            None => {
                self.state = State::NextLesson;
                vec![Command::FetchProgress {
                    lesson_uuid: lesson.uuid.clone(),
                }]
            }
        }
    }

    fn select_track(&mut self) -> Vec<Command> {
        if self.tracks.is_some() {
            self.state = State::TrackSelect;
            Vec::new()
        } else {
            self.state = State::Fetch;
            vec![Command::FetchTracks]
        }
    }

    fn fail(&mut self, message: String) -> Vec<Command> {
        warn!(state = %self.state, error = %message, "Session failed");
        self.error = Some(message);
        self.state = State::Failed;
        Vec::new()
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// The list of the current selection state, rebuilt from cached data.
    #[must_use]
    pub fn menu(&self) -> Option<Menu> {
        match self.state {
            State::TrackSelect => Some(Menu::from_items(
                "Select Track",
                self.tracks.as_deref().unwrap_or_default(),
            )),
            State::CourseSelect => Some(Menu::from_items(
                "Select Course",
                self.track.as_ref().map_or(&[][..], |t| t.courses.as_slice()),
            )),
            State::ChapterSelect => Some(Menu::from_items(
                "Select Chapter",
                self.progress.as_ref().map_or(&[][..], |p| p.chapters.as_slice()),
            )),
            State::LessonSelect => Some(Menu::from_items(
                "Select Lesson",
                self.progress
                    .as_ref()
                    .and_then(|p| p.chapters.get(self.chapter_index))
                    .map_or(&[][..], |c| c.lessons.as_slice()),
            )),
            State::QuestionStart => self
                .lesson
                .as_deref()
                .and_then(Lesson::question)
                .map(|q| Menu::from_items(q.question.clone(), q.answers.as_slice())),
            _ => None,
        }
    }

    /// What the learner is asked for, or `None` while work is in flight.
    #[must_use]
    pub fn prompt(&self) -> Option<Prompt> {
        let proceed = |hint: &str| {
            Some(Prompt::Continue {
                hint: hint.to_string(),
                allow_edit: false,
            })
        };

        match self.state {
            State::Failed => Some(Prompt::Acknowledge),
            state if state.is_selection() => self.menu().map(|menu| Prompt::Select {
                title: menu.title.clone(),
                items: menu.titles(),
                allow_back: matches!(
                    state,
                    State::CourseSelect | State::ChapterSelect | State::LessonSelect
                ),
            }),
            State::InputDir => Some(Prompt::Text {
                label: "Enter Directory".to_string(),
                default: self.dir.clone(),
            }),
            State::QuestionRetry => proceed("Press enter to retry"),
            State::QuestionCorrect
            | State::QuestionFailed
            | State::OutputSuccess
            | State::CLIDone
            | State::InputSuccess => proceed("Press enter to commit and push"),
            State::CodeTestSuccess => Some(Prompt::Continue {
                hint: "Press enter to commit and push, e to edit again".to_string(),
                allow_edit: true,
            }),
            State::CodeTestFailed | State::OutputFail | State::CLIFailed | State::InputFail => {
                proceed("Press enter to edit again")
            }
            State::CodeTest | State::CheckOutput => proceed("Press enter to check again"),
            State::Git | State::NextLesson => {
                proceed("Press enter to continue to next lesson")
            }
            State::CourseFinished => proceed("Press enter to select a track"),
            _ => None,
        }
    }

    /// The screen for the current state.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn view(&self) -> View {
        let body = self.content.clone();
        match self.state {
            State::Fetch => View::new("Fetching lesson data...", "", Tone::Busy),
            State::WriteFiles => View::new("Writing exercise files...", "", Tone::Busy),
            State::EditorStart => View::new("Waiting for the editor to close...", "", Tone::Busy),
            State::EditorFinished => View::new("Editor closed", "", Tone::Busy),
            State::QuestionStart
            | State::TrackSelect
            | State::CourseSelect
            | State::ChapterSelect
            | State::LessonSelect => {
                let title = self.menu().map(|m| m.title).unwrap_or_default();
                View::new(title, "", Tone::Neutral)
            }
            State::QuestionCorrect => View::new("Correct! Great job!", "", Tone::Success),
            State::QuestionRetry => View::new(
                format!(
                    "Incorrect. Try again! ({} attempts remaining)",
                    self.max_attempts.saturating_sub(self.attempts)
                ),
                "",
                Tone::Failure,
            ),
            State::QuestionFailed => {
                let answer = self
                    .lesson
                    .as_deref()
                    .and_then(Lesson::question)
                    .map(|q| q.answer.clone())
                    .unwrap_or_default();
                View::new(
                    format!("Incorrect! The correct answer was: {answer}"),
                    "",
                    Tone::Failure,
                )
            }
            State::CodeTest => View::new("Testing work.", body, Tone::Busy),
            State::CodeTestSuccess => View::new("Code Test Successful", body, Tone::Success),
            State::CodeTestFailed => View::new("Code Test Failed", body, Tone::Failure),
            State::CheckOutput => View::new("Checking Output", body, Tone::Busy),
            State::OutputSuccess => View::new("Output Matches", body, Tone::Success),
            State::OutputFail => View::new("Output does not match", body, Tone::Failure),
            State::InputDir => View::new("Directory to run commands in", "", Tone::Neutral),
            State::CLICheck => View::new("Running commands", body, Tone::Busy),
            State::CLIDone => View::new("Running commands", body, Tone::Success),
            State::CLIFailed => View::new("Command failed", body, Tone::Failure),
            State::CheckInput => View::new("Checking input", body, Tone::Busy),
            State::InputSuccess => View::new("Input Matches", body, Tone::Success),
            State::InputFail => View::new("Input does not Match", body, Tone::Failure),
            State::Git => View::new("Pushing to repo", body, Tone::Neutral),
            State::NextLesson => View::new("Loading next lesson...", body, Tone::Busy),
            State::CourseFinished => View::new("Course Finished 🎊", body, Tone::Success),
            State::Failed => View::new(
                "Error",
                self.error.clone().unwrap_or_default(),
                Tone::Failure,
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
