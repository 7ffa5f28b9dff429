//! End-to-end tests spanning several lessons: download mode, catalogue
//! navigation and publishing into a git repository.

mod common;

use std::path::Path;
use std::process::Command as StdCommand;

use drill_orchestrator::{driver, Context, Prompt, Session, StartTarget, State, UserInput};
use serde_json::json;

use common::{
    choice_lesson, config, course, manual_lesson, progress_of, serve, track_of, Fixtures,
    ScriptedFrontend,
};

fn two_lesson_course() -> Fixtures {
    let mut fixtures = Fixtures::default()
        .with_lesson(manual_lesson("l-1", "1-welcome"))
        .with_lesson(choice_lesson("l-2", "2-pick"));
    fixtures
        .courses
        .insert("learn-golang".to_string(), course("l-1"));
    fixtures.progress = progress_of(&["l-1", "l-2"]);
    fixtures
}

/// A course URL writes every lesson without prompting and ends at the course end.
#[tokio::test]
async fn test_download_course_writes_every_lesson() {
    let base = serve(two_lesson_course()).await;
    let root = tempfile::tempdir().expect("Failed to create root");
    let ctx = Context::new(config(&base, root.path())).expect("Failed to build context");
    let target = StartTarget::resolve(
        Some("https://www.boot.dev/courses/learn-golang"),
        root.path(),
    );
    let mut session = Session::new(3, false);
    let mut frontend = ScriptedFrontend::default();

    driver::run(ctx, &mut session, target, &mut frontend)
        .await
        .expect("Session stalled");

    assert_eq!(session.state(), State::CourseFinished);
    assert!(frontend.prompts.is_empty());
    assert!(root
        .path()
        .join("learn-golang/1-intro/1-welcome/README.md")
        .exists());
    assert!(root
        .path()
        .join("learn-golang/1-intro/2-pick/README.md")
        .exists());

    let last = std::fs::read_to_string(root.path().join(".last")).expect(".last not written");
    assert_eq!(last, format!("{base}static/lessons/l-2"));
}

/// Track, course, chapter and lesson selection lead to the picked lesson.
#[tokio::test]
async fn test_catalogue_navigation_opens_selected_lesson() {
    let mut fixtures = Fixtures::default()
        .with_lesson(manual_lesson("l-1", "1-welcome"))
        .with_lesson(manual_lesson("l-2", "2-setup"));
    fixtures.tracks = json!([track_of("l-1")]);
    fixtures
        .track
        .insert("backend".to_string(), track_of("l-1"));
    fixtures.progress = progress_of(&["l-1", "l-2"]);

    let base = serve(fixtures).await;
    let root = tempfile::tempdir().expect("Failed to create root");
    let ctx = Context::new(config(&base, root.path())).expect("Failed to build context");
    let mut session = Session::new(3, false);
    let mut frontend = ScriptedFrontend::new([
        UserInput::Select(0),
        UserInput::Select(0),
        UserInput::Back,
        UserInput::Select(0),
        UserInput::Select(0),
        UserInput::Select(1),
    ]);

    driver::run(ctx, &mut session, StartTarget::Tracks, &mut frontend)
        .await
        .expect("Session stalled");

    let select_titles: Vec<&str> = frontend
        .prompts
        .iter()
        .filter_map(|p| match p {
            Prompt::Select { title, .. } => Some(title.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        select_titles,
        vec![
            "Select Track",
            "Select Course",
            "Select Chapter",
            "Select Course",
            "Select Chapter",
            "Select Lesson",
        ]
    );

    assert!(root
        .path()
        .join("learn-golang/1-intro/2-setup/README.md")
        .exists());
    assert!(!root.path().join("learn-golang/1-intro/1-welcome").exists());

    // No repository in the root, so publishing fails the session.
    assert_eq!(session.state(), State::Failed);
}

fn git(root: &Path, args: &[&str]) -> Option<String> {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Each finished lesson is committed; a failing push leaves the transcript on screen.
#[tokio::test]
async fn test_publish_commits_each_lesson() {
    let root = tempfile::tempdir().expect("Failed to create root");
    let ready = git(root.path(), &["init", "-q"]).is_some()
        && git(root.path(), &["config", "user.email", "learner@example.com"]).is_some()
        && git(root.path(), &["config", "user.name", "Learner"]).is_some()
        && git(root.path(), &["config", "commit.gpgsign", "false"]).is_some();
    if !ready {
        eprintln!("git is not available; skipping");
        return;
    }

    let mut fixtures = Fixtures::default()
        .with_lesson(manual_lesson("l-1", "1-welcome"))
        .with_lesson(manual_lesson("l-2", "2-setup"));
    fixtures.progress = progress_of(&["l-1", "l-2"]);

    let base = serve(fixtures).await;
    let ctx = Context::new(config(&base, root.path())).expect("Failed to build context");
    let mut session = Session::new(3, false);
    // The repository has no remote, so every push fails and waits for Enter.
    let mut frontend = ScriptedFrontend::new([UserInput::Enter, UserInput::Enter]);

    driver::run(
        ctx,
        &mut session,
        StartTarget::Lesson("l-1".to_string()),
        &mut frontend,
    )
    .await
    .expect("Session stalled");

    assert_eq!(session.state(), State::CourseFinished);
    assert_eq!(git(root.path(), &["rev-list", "--count", "HEAD"]).as_deref(), Some("2"));
    assert_eq!(
        git(root.path(), &["log", "-1", "--format=%s"]).as_deref(),
        Some("learn-golang - Chapter 1 - Lesson 2")
    );

    let transcript = frontend
        .views
        .iter()
        .find(|v| v.title == "Pushing to repo" && !v.body.is_empty())
        .expect("No publish transcript rendered");
    assert!(transcript
        .body
        .contains("❯ git add learn-golang/1-intro/1-welcome"));
    assert!(transcript.body.contains("\"git push\" failed with exit code"));
}
