//! Editor invocation for an exercise.

use std::path::Path;

use drill_process::ProcessSpec;

use crate::config::Config;
use crate::lesson::{Lesson, LessonKind, README_FILE_NAME};

/// Editor used when no code editor is configured.
pub const DEFAULT_EDITOR: &str = "nvr";

/// README viewer used in the default layout when no markdown editor is set.
pub const DEFAULT_VIEWER: &str = "glow";

/// Builds the editor process for `lesson`, run inside its exercise directory.
///
/// `files` is the materialized file list, README first. A configured code
/// editor gets the remaining files. Otherwise `nvr` opens them next to a
/// terminal pane rendering the README. Lessons without code also set
/// `vim.g.bootdev` for editor plugins.
#[must_use]
pub fn editor_command(config: &Config, root: &Path, lesson: &Lesson, files: &[String]) -> ProcessSpec {
    let code_files = files
        .iter()
        .filter(|f| f.as_str() != README_FILE_NAME)
        .cloned();

    let mut spec = match config.code_editor.as_deref().map(str::split_whitespace) {
        Some(mut words) => {
            let program = words.next().unwrap_or(DEFAULT_EDITOR);
            ProcessSpec::new(program).with_args(words).with_args(code_files)
        }
        None => {
            let viewer = config.md_editor.as_deref().unwrap_or(DEFAULT_VIEWER);
            ProcessSpec::new(DEFAULT_EDITOR).with_args(code_files).with_args([
                "-cc".to_string(),
                format!("terminal {viewer} -p {README_FILE_NAME}"),
                "-cc".to_string(),
                "vsplit".to_string(),
                "--remote-wait-silent".to_string(),
            ])
        }
    };

    if matches!(
        lesson.kind,
        LessonKind::Cli { .. } | LessonKind::Manual { .. } | LessonKind::TextInput { .. }
    ) {
        spec = spec.with_args(["-cc", "lua vim.g.bootdev=true"]);
    }

    spec.with_current_dir(root.join(lesson.exercise_dir()))
}
