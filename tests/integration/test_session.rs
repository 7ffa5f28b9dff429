//! End-to-end tests for single-lesson sessions.
//!
//! Each test serves fixture lessons from a mock lesson service, runs the full
//! event loop against a temporary working root, and answers prompts from a
//! script. The editor is `true`, which exits immediately.

mod common;

use drill_orchestrator::{driver, Context, Prompt, Session, StartTarget, State, UserInput};
use serde_json::json;

use common::{
    choice_lesson, config, serve, text_input_lesson, unknown_lesson, Fixtures, ScriptedFrontend,
};

async fn run_lesson(fixtures: Fixtures, script: Vec<UserInput>) -> (Session, ScriptedFrontend, tempfile::TempDir, String) {
    let base = serve(fixtures).await;
    let root = tempfile::tempdir().expect("Failed to create root");
    let ctx = Context::new(config(&base, root.path())).expect("Failed to build context");
    let mut session = Session::new(3, false);
    let mut frontend = ScriptedFrontend::new(script);

    driver::run(
        ctx,
        &mut session,
        StartTarget::Lesson("l-1".to_string()),
        &mut frontend,
    )
    .await
    .expect("Session stalled");

    (session, frontend, root, base)
}

/// Three wrong answers exhaust the attempts and reveal the answer.
#[tokio::test]
async fn test_choice_wrong_three_times_reveals_answer() {
    let fixtures = Fixtures::default().with_lesson(choice_lesson("l-1", "1-pick"));
    let script = vec![
        UserInput::Select(0),
        UserInput::Enter,
        UserInput::Select(2),
        UserInput::Enter,
        UserInput::Select(0),
    ];

    let (session, frontend, root, base) = run_lesson(fixtures, script).await;

    assert_eq!(session.state(), State::QuestionFailed);
    let titles = frontend.titles();
    assert!(titles.contains(&"Incorrect. Try again! (2 attempts remaining)".to_string()));
    assert!(titles.contains(&"Incorrect. Try again! (1 attempts remaining)".to_string()));
    assert_eq!(
        titles.last().map(String::as_str),
        Some("Incorrect! The correct answer was: b")
    );

    assert_eq!(
        frontend.prompts.first(),
        Some(&Prompt::Select {
            title: "Which letter?".to_string(),
            items: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            allow_back: false,
        })
    );

    let readme = std::fs::read_to_string(root.path().join("learn-golang/1-intro/1-pick/README.md"))
        .expect("README not written");
    assert!(readme.contains("# Question\n### Which letter?\n- a\n- b\n- c"));

    let last = std::fs::read_to_string(root.path().join(".last")).expect(".last not written");
    assert_eq!(last, format!("{base}static/lessons/l-1"));
}

/// A correct answer goes to publishing, which needs a git repository.
#[tokio::test]
async fn test_choice_correct_then_publish_without_repository_fails() {
    let fixtures = Fixtures::default().with_lesson(choice_lesson("l-1", "1-pick"));
    let script = vec![UserInput::Select(1), UserInput::Enter];

    let (session, frontend, _root, _base) = run_lesson(fixtures, script).await;

    assert!(frontend.titles().contains(&"Correct! Great job!".to_string()));
    assert_eq!(session.state(), State::Failed);
    assert!(session
        .error()
        .is_some_and(|e| e.contains("initialize git repo")));
    assert_eq!(frontend.prompts.last(), Some(&Prompt::Acknowledge));
}

/// Lesson types this client cannot run fail the session before anything is written.
#[tokio::test]
async fn test_unknown_lesson_type_fails_session() {
    let fixtures = Fixtures::default().with_lesson(unknown_lesson("l-1"));

    let (session, frontend, root, _base) = run_lesson(fixtures, Vec::new()).await;

    assert_eq!(session.state(), State::Failed);
    assert!(session
        .error()
        .is_some_and(|e| e.contains("unknown lesson type: type_bogus")));
    assert_eq!(frontend.prompts, vec![Prompt::Acknowledge]);
    assert!(!root.path().join("learn-golang").exists());
}

/// A missing lesson surfaces the HTTP status.
#[tokio::test]
async fn test_missing_lesson_reports_status() {
    let (session, _frontend, _root, _base) = run_lesson(Fixtures::default(), Vec::new()).await;

    assert_eq!(session.state(), State::Failed);
    assert!(session.error().is_some_and(|e| e.contains("404")));
}

/// An empty `input.txt` fails the lesson's check.
#[tokio::test]
async fn test_text_input_checked_against_service_rules() {
    let mut fixtures = Fixtures::default().with_lesson(text_input_lesson("l-1", "3-query"));
    fixtures
        .checks
        .insert("l-1".to_string(), json!({ "ContainsAll": ["SELECT"] }));

    let (session, frontend, root, _base) = run_lesson(fixtures, Vec::new()).await;

    assert_eq!(session.state(), State::InputFail);
    let last = frontend.views.last().expect("No view rendered");
    assert_eq!(last.title, "Input does not Match");
    assert!(last.body.contains("Expect input file to contain all of:"));
    assert!(root
        .path()
        .join("learn-golang/1-intro/3-query/input.txt")
        .exists());
}

/// Without a check spec (403) the lesson goes straight to publishing.
#[tokio::test]
async fn test_text_input_without_check_publishes() {
    let fixtures = Fixtures::default().with_lesson(text_input_lesson("l-1", "3-query"));

    let (session, frontend, _root, _base) = run_lesson(fixtures, Vec::new()).await;

    assert!(frontend.titles().iter().all(|t| t != "Input does not Match"));
    assert_eq!(session.state(), State::Failed);
    assert!(session
        .error()
        .is_some_and(|e| e.contains("initialize git repo")));
}

/// A lesson body of the wrong shape is reported as a decode failure of the fetch.
#[tokio::test]
async fn test_malformed_lesson_reports_decode_failure() {
    let mut fixtures = Fixtures::default();
    fixtures
        .lessons
        .insert("l-1".to_string(), json!({ "Lesson": 5 }));

    let (session, _frontend, root, _base) = run_lesson(fixtures, Vec::new()).await;

    assert_eq!(session.state(), State::Failed);
    assert!(session
        .error()
        .is_some_and(|e| e.contains("failed to parse response")));
    assert!(!root.path().join("learn-golang").exists());
}
