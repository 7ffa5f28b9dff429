//! Exercise materializer.
//!
//! Writes a lesson's starter files and README under the working root.
//! Starter files are created with `create_new`, so an existing file (and any
//! edits the learner made to it) is never replaced. The README is rewritten
//! every time.

use std::io;
use std::path::{Component, Path};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{DrillError, Result};
use crate::lesson::{Lesson, README_FILE_NAME};

/// Writes the exercise directory of `lesson` below `root`.
///
/// Returns the visible file names in the order the editor should open them,
/// README first.
pub async fn materialize(root: &Path, lesson: &Lesson) -> Result<Vec<String>> {
    let exercise_dir = root.join(lesson.exercise_dir());
    info!(
        course = %lesson.course_slug,
        chapter = %lesson.chapter_slug,
        lesson = %lesson.slug,
        "Writing exercise"
    );

    fs::create_dir_all(&exercise_dir)
        .await
        .map_err(|e| DrillError::materialize(&exercise_dir, e))?;

    let mut files = vec![README_FILE_NAME.to_string()];
    for file in lesson.starter_files() {
        if file.is_hidden {
            continue;
        }

        let path = exercise_dir.join(&file.name);
        if !is_contained(Path::new(&file.name)) {
            return Err(DrillError::materialize(
                &path,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "starter file name leaves the exercise directory",
                ),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DrillError::materialize(parent, e))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut handle) => {
                handle
                    .write_all(file.content.as_bytes())
                    .await
                    .map_err(|e| DrillError::materialize(&path, e))?;
                handle
                    .flush()
                    .await
                    .map_err(|e| DrillError::materialize(&path, e))?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "Keeping existing file");
            }
            Err(e) => return Err(DrillError::materialize(&path, e)),
        }
        files.push(file.name);
    }

    let readme = exercise_dir.join(README_FILE_NAME);
    fs::write(&readme, lesson.readme())
        .await
        .map_err(|e| DrillError::materialize(&readme, e))?;

    Ok(files)
}

/// True when `name` is a relative path made only of normal components.
fn is_contained(name: &Path) -> bool {
    name.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && name.components().next().is_some()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lesson::{CodeExercise, LessonKind, Question, StarterFile};

    fn lesson(kind: LessonKind) -> Lesson {
        Lesson {
            uuid: "l-1".to_string(),
            slug: "3-vars".to_string(),
            title: "Variables".to_string(),
            course_uuid: "c-1".to_string(),
            course_title: "Learn Go".to_string(),
            course_slug: "learn-golang".to_string(),
            chapter_uuid: "ch-1".to_string(),
            chapter_title: "Intro".to_string(),
            chapter_slug: "1-intro".to_string(),
            kind,
        }
    }

    fn code_lesson() -> Lesson {
        lesson(LessonKind::CodeTests(CodeExercise {
            readme: "# Vars".to_string(),
            language: "go".to_string(),
            starter_files: vec![
                StarterFile {
                    name: "main.go".to_string(),
                    content: "package main\n".to_string(),
                    ..StarterFile::default()
                },
                StarterFile {
                    name: "main_test.go".to_string(),
                    content: "secret".to_string(),
                    is_hidden: true,
                    ..StarterFile::default()
                },
                StarterFile {
                    name: "go.mod".to_string(),
                    content: "module vars\n".to_string(),
                    is_read_only: true,
                    ..StarterFile::default()
                },
            ],
        }))
    }

    #[tokio::test]
    async fn test_materialize_writes_visible_files_readme_first() {
        let root = tempfile::tempdir().unwrap();
        let files = materialize(root.path(), &code_lesson()).await.unwrap();

        assert_eq!(files, vec!["README.md", "main.go", "go.mod"]);
        let dir = root.path().join("learn-golang/1-intro/3-vars");
        assert_eq!(std::fs::read_to_string(dir.join("README.md")).unwrap(), "# Vars");
        assert_eq!(
            std::fs::read_to_string(dir.join("main.go")).unwrap(),
            "package main\n"
        );
        assert!(!dir.join("main_test.go").exists());
    }

    #[tokio::test]
    async fn test_materialize_never_overwrites_starter_files() {
        let root = tempfile::tempdir().unwrap();
        let lesson = code_lesson();
        materialize(root.path(), &lesson).await.unwrap();

        let dir = root.path().join("learn-golang/1-intro/3-vars");
        std::fs::write(dir.join("main.go"), "package main // edited\n").unwrap();
        std::fs::remove_file(dir.join("README.md")).unwrap();

        let files = materialize(root.path(), &lesson).await.unwrap();
        assert_eq!(files, vec!["README.md", "main.go", "go.mod"]);
        assert_eq!(
            std::fs::read_to_string(dir.join("main.go")).unwrap(),
            "package main // edited\n"
        );
        assert_eq!(std::fs::read_to_string(dir.join("README.md")).unwrap(), "# Vars");
    }

    #[tokio::test]
    async fn test_materialize_choice_appends_question() {
        let root = tempfile::tempdir().unwrap();
        let choice = lesson(LessonKind::Choice {
            readme: "Read this".to_string(),
            question: Question {
                question: "Which?".to_string(),
                answers: vec!["a".to_string(), "b".to_string()],
                answer: "b".to_string(),
            },
        });

        let files = materialize(root.path(), &choice).await.unwrap();
        assert_eq!(files, vec!["README.md"]);
        let readme = std::fs::read_to_string(
            root.path().join("learn-golang/1-intro/3-vars/README.md"),
        )
        .unwrap();
        assert_eq!(readme, "Read this\n# Question\n### Which?\n- a\n- b");
    }

    #[tokio::test]
    async fn test_materialize_text_input_creates_empty_input_file() {
        let root = tempfile::tempdir().unwrap();
        let text = lesson(LessonKind::TextInput {
            readme: "Write".to_string(),
            check: drill_check::Check::default(),
        });

        let files = materialize(root.path(), &text).await.unwrap();
        assert_eq!(files, vec!["README.md", "input.txt"]);
        let input = root.path().join("learn-golang/1-intro/3-vars/input.txt");
        assert_eq!(std::fs::read_to_string(input).unwrap(), "");
    }

    #[tokio::test]
    async fn test_materialize_rejects_escaping_file_names() {
        for name in ["../../outside.go", "/tmp/absolute.go", "pkg/../../x.go", ""] {
            let root = tempfile::tempdir().unwrap();
            let escaping = lesson(LessonKind::CodeTests(CodeExercise {
                readme: "# Vars".to_string(),
                language: "go".to_string(),
                starter_files: vec![StarterFile {
                    name: name.to_string(),
                    content: "package main\n".to_string(),
                    ..StarterFile::default()
                }],
            }));

            let err = materialize(root.path(), &escaping).await.unwrap_err();
            assert!(
                err.to_string().contains("leaves the exercise directory"),
                "{name}: {err}"
            );
            assert!(!root.path().join("learn-golang/outside.go").exists());
        }
    }

    #[tokio::test]
    async fn test_materialize_keeps_nested_starter_files() {
        let root = tempfile::tempdir().unwrap();
        let nested = lesson(LessonKind::CodeTests(CodeExercise {
            readme: "# Vars".to_string(),
            language: "go".to_string(),
            starter_files: vec![StarterFile {
                name: "pkg/util.go".to_string(),
                content: "package pkg\n".to_string(),
                ..StarterFile::default()
            }],
        }));

        let files = materialize(root.path(), &nested).await.unwrap();
        assert_eq!(files, vec!["README.md", "pkg/util.go"]);
        assert!(root
            .path()
            .join("learn-golang/1-intro/3-vars/pkg/util.go")
            .exists());
    }

    #[tokio::test]
    async fn test_materialize_cli_uses_course_directory() {
        let root = tempfile::tempdir().unwrap();
        let cli = lesson(LessonKind::Cli {
            readme: "Run".to_string(),
            base_url_default: String::new(),
            steps: Vec::new(),
        });

        materialize(root.path(), &cli).await.unwrap();
        assert!(root.path().join("learn-golang/README.md").exists());
    }
}
