//! Shared fixtures: a mock lesson service and a scripted frontend.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use drill_orchestrator::{Config, Frontend, Prompt, UserInput, View};
use serde_json::{json, Value};
use tokio::net::TcpListener;

// ============================================================================
// Mock lesson service
// ============================================================================

/// Payloads served by the mock lesson service.
#[derive(Default)]
pub struct Fixtures {
    /// Lesson envelopes by UUID.
    pub lessons: HashMap<String, Value>,
    /// Course envelopes by slug.
    pub courses: HashMap<String, Value>,
    /// Progress tree returned for every lesson.
    pub progress: Value,
    /// Track list.
    pub tracks: Value,
    /// Tracks by slug.
    pub track: HashMap<String, Value>,
    /// Check specs by lesson UUID; other lessons answer 403.
    pub checks: HashMap<String, Value>,
}

impl Fixtures {
    pub fn with_lesson(mut self, lesson: Value) -> Self {
        let uuid = lesson["Lesson"]["UUID"].as_str().unwrap_or_default().to_string();
        self.lessons.insert(uuid, lesson);
        self
    }
}

fn found(value: Option<&Value>) -> Response {
    match value {
        Some(value) => Json(value.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn lesson(State(f): State<Arc<Fixtures>>, UrlPath(uuid): UrlPath<String>) -> Response {
    found(f.lessons.get(&uuid))
}

async fn course_handler(State(f): State<Arc<Fixtures>>, UrlPath(slug): UrlPath<String>) -> Response {
    found(f.courses.get(&slug))
}

async fn progress(State(f): State<Arc<Fixtures>>, UrlPath(_uuid): UrlPath<String>) -> Response {
    Json(f.progress.clone()).into_response()
}

async fn tracks(State(f): State<Arc<Fixtures>>) -> Response {
    Json(f.tracks.clone()).into_response()
}

async fn track(State(f): State<Arc<Fixtures>>, UrlPath(slug): UrlPath<String>) -> Response {
    found(f.track.get(&slug))
}

async fn check(State(f): State<Arc<Fixtures>>, UrlPath(uuid): UrlPath<String>) -> Response {
    match f.checks.get(&uuid) {
        Some(check) => Json(check.clone()).into_response(),
        None => StatusCode::FORBIDDEN.into_response(),
    }
}

/// Serves `fixtures` on an ephemeral port and returns the API base URL.
pub async fn serve(fixtures: Fixtures) -> String {
    let app = Router::new()
        .route("/v1/static/lessons/:uuid", get(lesson))
        .route("/v1/static/courses/slug/:slug", get(course_handler))
        .route("/v1/course_progress_by_lesson/:uuid", get(progress))
        .route("/v1/static/tracks", get(tracks))
        .route("/v1/static/tracks/:slug", get(track))
        .route("/v1/lessons/:uuid/checks", get(check))
        .with_state(Arc::new(fixtures));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock service");
    let addr: SocketAddr = listener.local_addr().expect("Failed to read address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{addr}/v1/")
}

/// Configuration pointing at the mock service, with an editor that exits at once.
pub fn config(api_base_url: &str, root: &Path) -> Config {
    Config {
        api_base_url: api_base_url.to_string(),
        root: root.to_string_lossy().into_owned(),
        code_editor: Some("true".to_string()),
        request_timeout_secs: 5,
        git_poll_interval_ms: 5,
        ..Config::default()
    }
}

// ============================================================================
// Payload builders
// ============================================================================

fn envelope(uuid: &str, slug: &str, kind: &str, data_key: &str, data: Value) -> Value {
    let mut lesson = json!({
        "UUID": uuid,
        "Slug": slug,
        "Title": format!("Lesson {slug}"),
        "Type": kind,
        "CourseUUID": "c-1",
        "CourseTitle": "Learn Go",
        "CourseSlug": "learn-golang",
        "ChapterUUID": "ch-1",
        "ChapterTitle": "Intro",
        "ChapterSlug": "1-intro",
    });
    lesson[data_key] = data;
    json!({ "Lesson": lesson })
}

pub fn manual_lesson(uuid: &str, slug: &str) -> Value {
    envelope(
        uuid,
        slug,
        "type_manual",
        "LessonDataManual",
        json!({ "Readme": format!("# {slug}") }),
    )
}

pub fn choice_lesson(uuid: &str, slug: &str) -> Value {
    envelope(
        uuid,
        slug,
        "type_choice",
        "LessonDataMultipleChoice",
        json!({
            "Readme": "Pick one",
            "Question": {
                "Question": "Which letter?",
                "Answers": ["a", "b", "c"],
                "Answer": "b",
            },
        }),
    )
}

pub fn text_input_lesson(uuid: &str, slug: &str) -> Value {
    envelope(
        uuid,
        slug,
        "type_text_input",
        "LessonDataTextInput",
        json!({ "Readme": "Write a query" }),
    )
}

pub fn unknown_lesson(uuid: &str) -> Value {
    envelope(uuid, "1-odd", "type_bogus", "LessonDataManual", json!(null))
}

pub fn progress_of(lessons: &[&str]) -> Value {
    let lessons: Vec<Value> = lessons
        .iter()
        .map(|uuid| json!({ "UUID": uuid, "Title": format!("Lesson {uuid}"), "IsComplete": false }))
        .collect();
    json!({
        "CourseUUID": "c-1",
        "Chapters": [{ "UUID": "ch-1", "Title": "Intro", "Lessons": lessons }],
    })
}

pub fn course(first_lesson: &str) -> Value {
    json!({
        "Course": {
            "UUID": "c-1",
            "Slug": "learn-golang",
            "Title": "Learn Go",
            "FirstLessonUUID": first_lesson,
        }
    })
}

pub fn track_of(first_lesson: &str) -> Value {
    json!({
        "UUID": "t-1",
        "Title": "Backend",
        "Slug": "backend",
        "Courses": [{
            "UUID": "c-1",
            "Slug": "learn-golang",
            "Title": "Learn Go",
            "FirstLessonUUID": first_lesson,
        }],
    })
}

// ============================================================================
// Scripted frontend
// ============================================================================

/// Answers prompts from a script and records everything shown.
///
/// Once the script runs out every prompt is answered with `Quit`.
#[derive(Default)]
pub struct ScriptedFrontend {
    script: VecDeque<UserInput>,
    pub views: Vec<View>,
    pub prompts: Vec<Prompt>,
}

impl ScriptedFrontend {
    pub fn new(script: impl IntoIterator<Item = UserInput>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Titles of every rendered view, in order.
    pub fn titles(&self) -> Vec<String> {
        self.views.iter().map(|v| v.title.clone()).collect()
    }
}

impl Frontend for ScriptedFrontend {
    fn render(&mut self, view: &View) {
        self.views.push(view.clone());
    }

    fn prompt(&mut self, prompt: &Prompt) -> UserInput {
        self.prompts.push(prompt.clone());
        self.script.pop_front().unwrap_or(UserInput::Quit)
    }
}
