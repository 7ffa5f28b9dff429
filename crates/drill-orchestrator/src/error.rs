//! Error types for the Drill orchestrator.
//!
//! This module defines the error hierarchy for session operations: loading
//! configuration, talking to the remote lesson service, materializing
//! exercises, and running external tools. Verification failures are not
//! errors; they are verdicts carried by session events.

use std::path::PathBuf;

use drill_process::ProcessError;

/// A specialized `Result` type for Drill orchestrator operations.
pub type Result<T> = std::result::Result<T, DrillError>;

/// Errors that can occur while driving a lesson session.
///
/// Variants the user can act on carry a suggestion line.
#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your drill.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Remote Lesson Service Errors
    // ========================================================================
    /// A request to the lesson service failed.
    #[error("Failed to fetch '{url}': {message}\n\nSuggestion: {}", .kind.suggestion())]
    Fetch {
        /// The requested URL.
        url: String,
        /// What went wrong.
        kind: FetchErrorKind,
        /// Detail from the transport or decoder.
        message: String,
    },

    /// The lesson payload names a lesson type this client cannot run.
    #[error("unknown lesson type: {kind}")]
    UnknownLessonType {
        /// The type tag as sent by the service.
        kind: String,
    },

    // ========================================================================
    // Environment Errors
    // ========================================================================
    /// The working root is not a git repository.
    #[error("initialize git repo in '{root}'\n\nSuggestion: Run 'git init' and add a remote before starting a lesson")]
    GitRepositoryMissing {
        /// The working root.
        root: PathBuf,
    },

    /// Creating an exercise directory or file failed.
    #[error("failed to create {path}: {source}")]
    Materialize {
        /// Path that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The editor could not be started.
    #[error("failed to open editor: {message}\nArgs: {args:?}")]
    Editor {
        /// Description of the failure.
        message: String,
        /// Arguments the editor was given.
        args: Vec<String>,
    },

    /// The session has no lesson loaded where one is required.
    #[error("no lesson loaded")]
    NoLesson,

    /// A CLI lesson step carries neither a command nor a request.
    #[error("unable to run lesson: missing step")]
    MissingStep,

    /// A feature present in lesson data that this client does not run.
    #[error("unimplemented step: {feature}")]
    Unimplemented {
        /// Name of the unsupported feature.
        feature: String,
    },

    /// No command is in flight and the session asks for nothing.
    #[error("session stalled in state {state}")]
    Stalled {
        /// The state the session stopped in.
        state: String,
    },

    // ========================================================================
    // Wrapped Errors
    // ========================================================================
    /// An external process failed to start or be reaped.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Categories of lesson service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request could not be sent or the body could not be read.
    Request,
    /// The service answered with a non-200 status.
    Status(u16),
    /// The body was not the expected JSON.
    Decode,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Status(code) => write!(f, "status {code}"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

impl FetchErrorKind {
    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Request => "Check your network connection and the apiBaseUrl setting",
            Self::Status(404) => "Check the lesson or course URL",
            Self::Status(_) => "Retry later; the lesson service may be experiencing issues",
            Self::Decode => "The lesson service returned an unexpected payload; check apiBaseUrl",
        }
    }
}

impl DrillError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Fetch` error.
    #[must_use]
    pub fn fetch(url: impl Into<String>, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }

    /// Creates a new `UnknownLessonType` error.
    #[must_use]
    pub fn unknown_lesson_type(kind: impl Into<String>) -> Self {
        Self::UnknownLessonType { kind: kind.into() }
    }

    /// Creates a new `Materialize` error.
    #[must_use]
    pub fn materialize(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Materialize {
            path: path.into(),
            source,
        }
    }

    /// Creates a new `Unimplemented` error.
    #[must_use]
    pub fn unimplemented(feature: impl Into<String>) -> Self {
        Self::Unimplemented {
            feature: feature.into(),
        }
    }

    /// Returns `true` if this is a 403 answer from the lesson service.
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(
            self,
            Self::Fetch {
                kind: FetchErrorKind::Status(403),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = DrillError::fetch(
            "https://api.example/v1/static/lessons/abc",
            FetchErrorKind::Status(404),
            "HTTP request failed with status: 404 Not Found",
        );
        let msg = err.to_string();
        assert!(msg.contains("static/lessons/abc"));
        assert!(msg.contains("404 Not Found"));
        assert!(msg.contains("Suggestion: Check the lesson or course URL"));
    }

    #[test]
    fn test_fetch_error_kind_display() {
        assert_eq!(FetchErrorKind::Request.to_string(), "request");
        assert_eq!(FetchErrorKind::Status(500).to_string(), "status 500");
        assert_eq!(FetchErrorKind::Decode.to_string(), "decode");
    }

    #[test]
    fn test_is_forbidden() {
        let forbidden = DrillError::fetch("u", FetchErrorKind::Status(403), "forbidden");
        assert!(forbidden.is_forbidden());

        let missing = DrillError::fetch("u", FetchErrorKind::Status(404), "missing");
        assert!(!missing.is_forbidden());
        assert!(!DrillError::MissingStep.is_forbidden());
    }

    #[test]
    fn test_cli_step_messages() {
        assert_eq!(
            DrillError::unimplemented("HTTPRequest").to_string(),
            "unimplemented step: HTTPRequest"
        );
        assert_eq!(
            DrillError::MissingStep.to_string(),
            "unable to run lesson: missing step"
        );
    }

    #[test]
    fn test_unknown_lesson_type_display() {
        let err = DrillError::unknown_lesson_type("type_quiz");
        assert_eq!(err.to_string(), "unknown lesson type: type_quiz");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let drill_err: DrillError = io_err.into();
        assert!(matches!(drill_err, DrillError::Io(_)));
    }

    #[test]
    fn test_from_process_error_is_transparent() {
        let err: DrillError = ProcessError::StatusFormat.into();
        assert_eq!(err.to_string(), "unknown format of process status file");
    }
}
