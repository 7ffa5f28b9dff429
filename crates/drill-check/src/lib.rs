//! Drill Verification Engines
//!
//! This crate decides whether a learner's work on a lesson passes. Each engine
//! consumes a lesson-type-specific check specification and produces a verdict
//! plus human-readable diagnostic text.
//!
//! # Engines
//!
//! - [`cli`] - Evaluates the assertions of a CLI step against a command outcome
//! - [`output`] - Compares program output with the expected output (character diff)
//! - [`text_input`] - Checks the content of the learner's `input.txt`
//!
//! Variable interpolation shared by the CLI engine lives in [`interpolate`].
//!
//! # Example
//!
//! ```rust
//! use drill_check::text_input::{check_input, Check};
//!
//! let check = Check {
//!     contains_all: Some(vec!["foo".to_string()]),
//!     ..Check::default()
//! };
//!
//! assert!(check_input("foobar", &check).passed);
//! assert!(!check_input("bar", &check).passed);
//! ```

pub mod cli;
pub mod interpolate;
pub mod output;
pub mod text_input;

pub use cli::{CliAssertionError, CliCommand, CliCommandTest, CliStep, CommandOutcome};
pub use interpolate::{interpolate, Variables};
pub use output::{compare_output, OutputComparison};
pub use text_input::{check_input, Check, INPUT_FILE_NAME};

use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while gathering the material a check needs.
///
/// Failing a check is not an error; it is a [`Verdict`] with `passed == false`.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The file a check reads could not be read.
    #[error("could not read user input file:\n {path}: {source}")]
    ReadInput {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for check operations.
pub type Result<T> = std::result::Result<T, CheckError>;

// ============================================================================
// Verdict
// ============================================================================

/// Outcome of a verification engine.
///
/// `report` is always populated: on success it echoes what was checked, on
/// failure it explains what was expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the check passed.
    pub passed: bool,
    /// Diagnostic text shown to the learner.
    pub report: String,
}

impl Verdict {
    /// Creates a passing verdict.
    #[must_use]
    pub fn pass(report: impl Into<String>) -> Self {
        Self {
            passed: true,
            report: report.into(),
        }
    }

    /// Creates a failing verdict.
    #[must_use]
    pub fn fail(report: impl Into<String>) -> Self {
        Self {
            passed: false,
            report: report.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
