//! Lesson service data model.
//!
//! Payloads arrive as PascalCase JSON. A lesson carries a `Type` tag plus one
//! `LessonData*` object per lesson type; decoding folds the relevant object
//! into a closed [`LessonKind`], so an unknown tag is rejected here and never
//! reaches the session.

use std::fmt::Write as _;
use std::path::PathBuf;

use drill_check::{Check, CliStep, INPUT_FILE_NAME};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DrillError, Result};

/// Name of the README written into every exercise directory.
pub const README_FILE_NAME: &str = "README.md";

// ============================================================================
// Lesson
// ============================================================================

/// A lesson as fetched from the lesson service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    /// Lesson UUID.
    pub uuid: String,
    /// Lesson slug, e.g. `2-pointer-array`.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// UUID of the owning course.
    pub course_uuid: String,
    /// Title of the owning course.
    pub course_title: String,
    /// Slug of the owning course.
    pub course_slug: String,
    /// UUID of the owning chapter.
    pub chapter_uuid: String,
    /// Title of the owning chapter.
    pub chapter_title: String,
    /// Slug of the owning chapter, e.g. `7-advanced-pointers`.
    pub chapter_slug: String,
    /// Type-specific payload.
    pub kind: LessonKind,
}

/// The lesson types this client runs, each with its own payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonKind {
    /// Multiple-choice question (`type_choice`).
    Choice {
        /// Lesson text.
        readme: String,
        /// The question.
        question: Question,
    },
    /// Code verified by the language's test recipe (`type_code_tests`).
    CodeTests(CodeExercise),
    /// Code verified by comparing its output (`type_code`).
    CodeOutput {
        /// Starter code and lesson text.
        exercise: CodeExercise,
        /// Exact output the program must print.
        expected_output: String,
    },
    /// Shell steps run in a learner-chosen directory (`type_cli`).
    Cli {
        /// Lesson text.
        readme: String,
        /// Default base URL for request steps.
        base_url_default: String,
        /// Steps in execution order.
        steps: Vec<CliStep>,
    },
    /// Reading only, published once the editor closes (`type_manual`).
    Manual {
        /// Lesson text.
        readme: String,
    },
    /// Free text written to `input.txt` (`type_text_input`).
    TextInput {
        /// Lesson text.
        readme: String,
        /// Check shipped with the lesson; the checks endpoint is authoritative.
        check: Check,
    },
}

impl LessonKind {
    /// Wire tag of this kind.
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Self::Choice { .. } => "type_choice",
            Self::CodeTests(_) => "type_code_tests",
            Self::CodeOutput { .. } => "type_code",
            Self::Cli { .. } => "type_cli",
            Self::Manual { .. } => "type_manual",
            Self::TextInput { .. } => "type_text_input",
        }
    }
}

/// Starter code and text of a code lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodeExercise {
    /// Lesson text.
    #[serde(default)]
    pub readme: String,
    /// Language key selecting the recipe under the lib directory.
    #[serde(rename = "ProgLang", default)]
    pub language: String,
    /// Files to materialize.
    #[serde(default, deserialize_with = "null_as_default")]
    pub starter_files: Vec<StarterFile>,
}

/// A file shipped with a lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StarterFile {
    /// File name, relative to the exercise directory.
    pub name: String,
    /// Initial content.
    #[serde(default)]
    pub content: String,
    /// Hidden files are never written.
    #[serde(default)]
    pub is_hidden: bool,
    /// Informational only.
    #[serde(default)]
    pub is_read_only: bool,
}

/// A multiple-choice question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Question {
    /// Question text.
    #[serde(default)]
    pub question: String,
    /// Answer choices in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub answers: Vec<String>,
    /// The correct choice.
    #[serde(default)]
    pub answer: String,
}

impl Lesson {
    /// Exercise directory relative to the working root.
    ///
    /// `<course>/<chapter>/<lesson>`, or `<course>` alone for CLI lessons.
    #[must_use]
    pub fn exercise_dir(&self) -> PathBuf {
        match self.kind {
            LessonKind::Cli { .. } => PathBuf::from(&self.course_slug),
            _ => [&self.course_slug, &self.chapter_slug, &self.slug]
                .iter()
                .collect(),
        }
    }

    /// README body; multiple-choice lessons get their question appended.
    #[must_use]
    pub fn readme(&self) -> String {
        match &self.kind {
            LessonKind::Choice { readme, question } => {
                let mut body = format!("{readme}\n# Question\n### {}", question.question);
                if !question.answers.is_empty() {
                    let _ = write!(body, "\n- {}", question.answers.join("\n- "));
                }
                body
            }
            LessonKind::CodeTests(exercise) | LessonKind::CodeOutput { exercise, .. } => {
                exercise.readme.clone()
            }
            LessonKind::Cli { readme, .. }
            | LessonKind::Manual { readme }
            | LessonKind::TextInput { readme, .. } => readme.clone(),
        }
    }

    /// Files to write besides the README.
    #[must_use]
    pub fn starter_files(&self) -> Vec<StarterFile> {
        match &self.kind {
            LessonKind::CodeTests(exercise) | LessonKind::CodeOutput { exercise, .. } => {
                exercise.starter_files.clone()
            }
            LessonKind::TextInput { .. } => vec![StarterFile {
                name: INPUT_FILE_NAME.to_string(),
                ..StarterFile::default()
            }],
            LessonKind::Choice { .. } | LessonKind::Cli { .. } | LessonKind::Manual { .. } => {
                Vec::new()
            }
        }
    }

    /// Recipe language of a code lesson.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            LessonKind::CodeTests(exercise) | LessonKind::CodeOutput { exercise, .. } => {
                Some(&exercise.language)
            }
            _ => None,
        }
    }

    /// The question of a multiple-choice lesson.
    #[must_use]
    pub const fn question(&self) -> Option<&Question> {
        match &self.kind {
            LessonKind::Choice { question, .. } => Some(question),
            _ => None,
        }
    }
}

// ============================================================================
// Courses, tracks and progress
// ============================================================================

/// A course as listed in a track or fetched by slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Course {
    /// Course UUID.
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    /// Course slug.
    #[serde(default)]
    pub slug: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Entry point of the course.
    #[serde(rename = "FirstLessonUUID", default)]
    pub first_lesson_uuid: String,
}

/// A track: an ordered list of courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Track {
    /// Track UUID.
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Track slug.
    #[serde(default)]
    pub slug: String,
    /// Courses in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub courses: Vec<Course>,
}

/// Chapter and lesson tree of a course.
///
/// Ordering is stable and defines the successor of each lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CourseProgress {
    /// Course UUID.
    #[serde(rename = "CourseUUID", default)]
    pub course_uuid: String,
    /// Chapters in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapters: Vec<Chapter>,
}

/// A chapter of a course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Chapter {
    /// Chapter UUID.
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Lessons in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub lessons: Vec<LessonSummary>,
}

/// A lesson entry in a [`CourseProgress`] tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LessonSummary {
    /// Lesson UUID.
    #[serde(rename = "UUID", default)]
    pub uuid: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Whether the learner has completed it.
    #[serde(default)]
    pub is_complete: bool,
}

/// Where a session goes after a lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Successor {
    /// The lesson with this UUID.
    Lesson(String),
    /// The course has no further lessons.
    Finished,
}

impl CourseProgress {
    /// The lesson following `lesson`.
    ///
    /// The lesson is located by UUID. When the tree does not contain it, the
    /// leading numbers of its chapter and lesson slugs are used as the
    /// 1-based chapter and the index of the next lesson. Empty chapters are
    /// skipped.
    #[must_use]
    pub fn successor(&self, lesson: &Lesson) -> Successor {
        let located = self.chapters.iter().enumerate().find_map(|(c, chapter)| {
            chapter
                .lessons
                .iter()
                .position(|l| l.uuid == lesson.uuid)
                .map(|l| (c, l + 1))
        });

        let (chapter, next) = match located {
            Some(found) => found,
            None => {
                let chapter = drill_process::git::chapter_number(&lesson.chapter_slug);
                let next = drill_process::git::lesson_number(&lesson.slug);
                let next = usize::try_from(next).unwrap_or(usize::MAX);
                match usize::try_from(chapter).ok().and_then(|c| c.checked_sub(1)) {
                    Some(chapter) => (chapter, next),
                    None => return Successor::Finished,
                }
            }
        };

        if let Some(found) = self
            .chapters
            .get(chapter)
            .and_then(|c| c.lessons.get(next))
        {
            return Successor::Lesson(found.uuid.clone());
        }

        self.chapters
            .iter()
            .skip(chapter + 1)
            .find_map(|c| c.lessons.first())
            .map_or(Successor::Finished, |l| Successor::Lesson(l.uuid.clone()))
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// Deserializes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `{"Lesson": {...}}` body of the lesson endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LessonEnvelope {
    pub(crate) lesson: WireLesson,
}

/// `{"Course": {...}}` body of the course endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CourseEnvelope {
    pub(crate) course: Course,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct WireLesson {
    #[serde(rename = "UUID")]
    uuid: String,
    slug: String,
    title: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "CourseUUID")]
    course_uuid: String,
    course_title: String,
    course_slug: String,
    #[serde(rename = "ChapterUUID")]
    chapter_uuid: String,
    chapter_title: String,
    chapter_slug: String,
    #[serde(deserialize_with = "null_as_default")]
    lesson_data_multiple_choice: WireChoice,
    #[serde(deserialize_with = "null_as_default")]
    lesson_data_code_tests: CodeExercise,
    #[serde(deserialize_with = "null_as_default")]
    lesson_data_code_completion: WireCodeOutput,
    #[serde(deserialize_with = "null_as_default")]
    lesson_data_code_output: WireCodeOutput,
    #[serde(rename = "LessonDataCLI", deserialize_with = "null_as_default")]
    lesson_data_cli: WireCli,
    #[serde(deserialize_with = "null_as_default")]
    lesson_data_manual: WireReadme,
    #[serde(deserialize_with = "null_as_default")]
    lesson_data_text_input: WireTextInput,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct WireChoice {
    readme: String,
    #[serde(deserialize_with = "null_as_default")]
    question: Question,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct WireCodeOutput {
    readme: String,
    prog_lang: String,
    #[serde(deserialize_with = "null_as_default")]
    starter_files: Vec<StarterFile>,
    code_expected_output: String,
}

impl WireCodeOutput {
    fn into_kind(self) -> LessonKind {
        LessonKind::CodeOutput {
            exercise: CodeExercise {
                readme: self.readme,
                language: self.prog_lang,
                starter_files: self.starter_files,
            },
            expected_output: self.code_expected_output,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct WireCli {
    readme: String,
    #[serde(rename = "CLIData", deserialize_with = "null_as_default")]
    cli_data: WireCliData,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct WireCliData {
    #[serde(rename = "BaseURLDefault")]
    base_url_default: String,
    #[serde(deserialize_with = "null_as_default")]
    steps: Vec<CliStep>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct WireReadme {
    readme: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct WireTextInput {
    readme: String,
    #[serde(deserialize_with = "null_as_default")]
    text_input_data: Check,
}

impl TryFrom<WireLesson> for Lesson {
    type Error = DrillError;

    fn try_from(wire: WireLesson) -> Result<Self> {
        let kind = match wire.kind.as_str() {
            "type_choice" => LessonKind::Choice {
                readme: wire.lesson_data_multiple_choice.readme,
                question: wire.lesson_data_multiple_choice.question,
            },
            "type_code_tests" => LessonKind::CodeTests(wire.lesson_data_code_tests),
            "type_code" => {
                if wire.lesson_data_code_completion.readme.is_empty() {
                    wire.lesson_data_code_output.into_kind()
                } else {
                    wire.lesson_data_code_completion.into_kind()
                }
            }
            "type_cli" => LessonKind::Cli {
                readme: wire.lesson_data_cli.readme,
                base_url_default: wire.lesson_data_cli.cli_data.base_url_default,
                steps: wire.lesson_data_cli.cli_data.steps,
            },
            "type_manual" => LessonKind::Manual {
                readme: wire.lesson_data_manual.readme,
            },
            "type_text_input" => LessonKind::TextInput {
                readme: wire.lesson_data_text_input.readme,
                check: wire.lesson_data_text_input.text_input_data,
            },
            other => return Err(DrillError::unknown_lesson_type(other)),
        };

        Ok(Self {
            uuid: wire.uuid,
            slug: wire.slug,
            title: wire.title,
            course_uuid: wire.course_uuid,
            course_title: wire.course_title,
            course_slug: wire.course_slug,
            chapter_uuid: wire.chapter_uuid,
            chapter_title: wire.chapter_title,
            chapter_slug: wire.chapter_slug,
            kind,
        })
    }
}
