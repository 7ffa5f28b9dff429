//! Remote lesson service client.
//!
//! Every endpoint is a GET returning JSON. A non-200 status and a body that
//! does not decode both surface as [`DrillError::Fetch`], tagged with a
//! [`FetchErrorKind`] so callers can single out the 403 of the checks
//! endpoint.

use drill_check::Check;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::{DrillError, FetchErrorKind, Result};
use crate::lesson::{Course, CourseEnvelope, CourseProgress, Lesson, LessonEnvelope, Track};

const LESSON_PATH: &str = "static/lessons/";
const COURSE_PATH: &str = "static/courses/slug/";
const COURSE_PROGRESS_PATH: &str = "course_progress_by_lesson/";
const TRACK_PATH: &str = "static/tracks/";
const TRACKS_PATH: &str = "static/tracks";

/// The last `/`-separated segment of a URL or slug.
///
/// # Examples
///
/// ```
/// use drill_orchestrator::client::last_segment;
///
/// assert_eq!(last_segment("https://www.boot.dev/lessons/3f1e"), "3f1e");
/// assert_eq!(last_segment("learn-golang"), "learn-golang");
/// ```
#[must_use]
pub fn last_segment(target: &str) -> &str {
    target.rsplit('/').next().unwrap_or(target)
}

/// Async client for the lesson service, cheap to clone.
#[derive(Debug, Clone)]
pub struct LessonClient {
    http: Client,
    base_url: String,
}

impl LessonClient {
    /// Builds a client for the service configured in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.base_url();
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DrillError::fetch(&base_url, FetchErrorKind::Request, e.to_string()))?;
        Ok(Self { http, base_url })
    }

    /// The base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Endpoint URLs
    // ========================================================================

    /// URL of a lesson; `target` may be a lesson URL or a bare UUID.
    #[must_use]
    pub fn lesson_url(&self, target: &str) -> String {
        format!("{}{LESSON_PATH}{}", self.base_url, last_segment(target))
    }

    /// URL of a course; `target` may be a course URL or a bare slug.
    #[must_use]
    pub fn course_url(&self, target: &str) -> String {
        format!("{}{COURSE_PATH}{}", self.base_url, last_segment(target))
    }

    /// URL of the progress tree of the course containing a lesson.
    #[must_use]
    pub fn course_progress_url(&self, lesson_uuid: &str) -> String {
        format!(
            "{}{COURSE_PROGRESS_PATH}{}",
            self.base_url,
            last_segment(lesson_uuid)
        )
    }

    /// URL of a track by slug.
    #[must_use]
    pub fn track_url(&self, slug: &str) -> String {
        format!("{}{TRACK_PATH}{}", self.base_url, last_segment(slug))
    }

    /// URL of the track list.
    #[must_use]
    pub fn tracks_url(&self) -> String {
        format!("{}{TRACKS_PATH}", self.base_url)
    }

    /// URL of the check spec of a text-input lesson.
    #[must_use]
    pub fn check_url(&self, lesson_uuid: &str) -> String {
        format!(
            "{}lessons/{}/checks",
            self.base_url,
            last_segment(lesson_uuid)
        )
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Fetches a lesson. Unknown lesson types are rejected here.
    #[instrument(skip(self))]
    pub async fn lesson(&self, target: &str) -> Result<Lesson> {
        let envelope: LessonEnvelope = self.get_json(&self.lesson_url(target)).await?;
        envelope.lesson.try_into()
    }

    /// Fetches a course by slug.
    #[instrument(skip(self))]
    pub async fn course(&self, target: &str) -> Result<Course> {
        let envelope: CourseEnvelope = self.get_json(&self.course_url(target)).await?;
        Ok(envelope.course)
    }

    /// Fetches the progress tree of the course containing `lesson_uuid`.
    #[instrument(skip(self))]
    pub async fn course_progress(&self, lesson_uuid: &str) -> Result<CourseProgress> {
        self.get_json(&self.course_progress_url(lesson_uuid)).await
    }

    /// Fetches a track by slug.
    #[instrument(skip(self))]
    pub async fn track(&self, slug: &str) -> Result<Track> {
        self.get_json(&self.track_url(slug)).await
    }

    /// Fetches every track.
    #[instrument(skip(self))]
    pub async fn tracks(&self) -> Result<Vec<Track>> {
        self.get_json(&self.tracks_url()).await
    }

    /// Fetches the check spec of a lesson; `None` when the service answers 403.
    #[instrument(skip(self))]
    pub async fn check(&self, lesson_uuid: &str) -> Result<Option<Check>> {
        match self.get_json(&self.check_url(lesson_uuid)).await {
            Ok(check) => Ok(Some(check)),
            Err(e) if e.is_forbidden() => {
                debug!("No check available for lesson");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DrillError::fetch(url, FetchErrorKind::Request, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DrillError::fetch(
                url,
                FetchErrorKind::Status(status.as_u16()),
                format!("HTTP request failed with status: {status}"),
            ));
        }

        let body = response.bytes().await.map_err(|e| {
            DrillError::fetch(
                url,
                FetchErrorKind::Request,
                format!("failed to read response: {e}"),
            )
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            DrillError::fetch(
                url,
                FetchErrorKind::Decode,
                format!("failed to parse response: {e}"),
            )
        })
    }
}
