//! Git publisher for finished exercises.
//!
//! Publishing stages the exercise directory, commits it with a message
//! derived from the course slug and the chapter and lesson numbers, and
//! pushes. The three commands run as a [`ProcessChain`], so a failing commit
//! means the push is never issued.

use std::path::Path;
use std::time::Duration;

use crate::{ProcessChain, ProcessSpec};

/// Leading integer of a `-`-separated slug, or 0 when there is none.
///
/// # Examples
///
/// ```
/// use drill_process::git::slug_number;
///
/// assert_eq!(slug_number("7-advanced-pointers"), 7);
/// assert_eq!(slug_number("pointers"), 0);
/// ```
#[must_use]
pub fn slug_number(slug: &str) -> u32 {
    slug.split('-')
        .next()
        .and_then(|head| head.parse().ok())
        .unwrap_or(0)
}

/// Chapter number parsed from a chapter slug (`"7-advanced-pointers"` is 7).
#[must_use]
pub fn chapter_number(chapter_slug: &str) -> u32 {
    slug_number(chapter_slug)
}

/// Lesson number parsed from a lesson slug (`"2-pointer-array"` is 2).
#[must_use]
pub fn lesson_number(lesson_slug: &str) -> u32 {
    slug_number(lesson_slug)
}

/// Commit message for a lesson: `"<course> - Chapter <N> - Lesson <M>"`.
#[must_use]
pub fn commit_message(course_slug: &str, chapter_slug: &str, lesson_slug: &str) -> String {
    format!(
        "{course_slug} - Chapter {} - Lesson {}",
        chapter_number(chapter_slug),
        lesson_number(lesson_slug)
    )
}

/// What to publish and how.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    /// Repository root; every git command runs here.
    pub repo_root: &'a Path,
    /// Exercise directory to stage, relative to `repo_root`.
    pub exercise_dir: &'a Path,
    /// Commit message.
    pub message: &'a str,
    /// Push as a dry run with verbose output.
    pub dry_run_push: bool,
    /// Delay between reap attempts.
    pub poll_interval: Duration,
}

/// Builds the `git add`, `git commit`, `git push` chain for a request.
///
/// The push gets `-n -v` when `dry_run_push` is set; callers set it when the
/// process is being traced.
#[must_use]
pub fn publish_chain(request: &PublishRequest<'_>) -> ProcessChain {
    let git = |args: Vec<String>| {
        ProcessSpec::new("git")
            .with_args(args)
            .with_current_dir(request.repo_root)
    };

    let mut push = vec!["push".to_string()];
    if request.dry_run_push {
        push.extend(["-n".to_string(), "-v".to_string()]);
    }

    ProcessChain::new(vec![
        git(vec![
            "add".to_string(),
            request.exercise_dir.to_string_lossy().into_owned(),
        ]),
        git(vec![
            "commit".to_string(),
            "-m".to_string(),
            request.message.to_string(),
        ]),
        git(push),
    ])
    .with_poll_interval(request.poll_interval)
}

/// Returns `true` if `root` contains a `.git` entry.
#[must_use]
pub fn is_repository(root: &Path) -> bool {
    root.join(".git").exists()
}
