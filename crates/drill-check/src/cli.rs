//! CLI lesson steps and the assertions evaluated against their output.
//!
//! A CLI lesson is an ordered list of [`CliStep`]s. Shell-command steps are
//! executed by the caller; the resulting [`CommandOutcome`] is then checked
//! against every [`CliCommandTest`] of the step with [`evaluate_tests`].

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interpolate::{interpolate, Variables};

// ============================================================================
// Step schema
// ============================================================================

/// One step of a CLI lesson.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCliStep")]
pub enum CliStep {
    /// Run a shell command and test its output.
    Command(CliCommand),
    /// Issue an HTTP request and test the response. Not executable yet.
    HttpRequest(Box<HttpRequestStep>),
    /// The payload named neither kind of step.
    Missing,
}

/// Wire shape of a step: exactly one of the two fields is expected to be set.
#[derive(Deserialize)]
struct RawCliStep {
    #[serde(rename = "CLICommand", default)]
    cli_command: Option<CliCommand>,
    #[serde(rename = "HTTPRequest", default)]
    http_request: Option<HttpRequestStep>,
}

impl From<RawCliStep> for CliStep {
    fn from(raw: RawCliStep) -> Self {
        match (raw.cli_command, raw.http_request) {
            (Some(command), _) => Self::Command(command),
            (None, Some(request)) => Self::HttpRequest(Box::new(request)),
            (None, None) => Self::Missing,
        }
    }
}

/// A shell command template plus the tests its result must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CliCommand {
    /// Command text; may reference variables as `${name}`.
    pub command: String,
    /// Assertions over the command result.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tests: Vec<CliCommandTest>,
}

/// Assertions over the result of a shell-command step.
///
/// Every field is optional; unset fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CliCommandTest {
    /// Exact exit code the command must return.
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Substrings that must all appear in stdout.
    #[serde(default)]
    pub stdout_contains_all: Option<Vec<String>>,
    /// Substrings none of which may appear in stdout.
    #[serde(default)]
    pub stdout_contains_none: Option<Vec<String>>,
    /// Minimum number of stdout lines.
    #[serde(default)]
    pub stdout_lines_gt: Option<usize>,
}

/// An HTTP-request step as described by the lesson service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpRequestStep {
    /// Variables to capture from the response body.
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_variables: Vec<ResponseVariable>,
    /// Assertions over the response.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tests: Vec<HttpRequestTest>,
    /// The request to send.
    #[serde(default)]
    pub request: HttpRequest,
}

/// Request description of an [`HttpRequestStep`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpRequest {
    /// HTTP method.
    #[serde(default)]
    pub method: String,
    /// Absolute URL, possibly containing `${name}` tokens.
    #[serde(rename = "FullURL", default)]
    pub full_url: String,
    /// Request headers.
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    /// JSON body.
    #[serde(rename = "BodyJSON", default)]
    pub body_json: Option<serde_json::Value>,
}

/// Assertion over an HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpRequestTest {
    /// Expected status code.
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Substring the body must contain.
    #[serde(default)]
    pub body_contains: Option<String>,
    /// Substring the body must not contain.
    #[serde(default)]
    pub body_contains_none: Option<String>,
}

/// A value to capture from an HTTP response into [`Variables`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseVariable {
    /// Variable name.
    pub name: String,
    /// JSON path of the captured value.
    pub path: String,
}

/// Deserializes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Evaluation
// ============================================================================

/// Result of running one shell-command step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Command text after interpolation.
    pub final_command: String,
    /// Exit code; `-2` when the process could not be started.
    pub exit_code: i32,
    /// Combined stdout and stderr with trailing whitespace removed.
    pub stdout: String,
}

/// Why a CLI step failed one of its tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliAssertionError {
    /// The exit code did not match.
    #[error("expect exit code {expected}")]
    ExitCode {
        /// Expected exit code.
        expected: i32,
        /// Actual exit code.
        actual: i32,
    },

    /// Stdout had fewer lines than required.
    #[error("expect > {expected} lines on stdout")]
    TooFewLines {
        /// Required line count.
        expected: usize,
        /// Actual line count.
        actual: usize,
    },

    /// At least one required substring was missing.
    #[error("{message}")]
    MissingSubstrings {
        /// Description listing every required substring.
        message: String,
    },

    /// At least one forbidden substring was present.
    #[error("{message}")]
    ForbiddenSubstrings {
        /// Description listing every forbidden substring.
        message: String,
    },
}

impl CliCommandTest {
    /// Checks `outcome` against this test.
    ///
    /// Rules run in a fixed order (exit code, line count, required substrings,
    /// forbidden substrings) and evaluation stops at the first failing rule.
    /// Substrings are interpolated against `vars` before matching.
    pub fn evaluate(
        &self,
        outcome: &CommandOutcome,
        vars: &Variables,
    ) -> std::result::Result<(), CliAssertionError> {
        if let Some(expected) = self.exit_code {
            if expected != outcome.exit_code {
                return Err(CliAssertionError::ExitCode {
                    expected,
                    actual: outcome.exit_code,
                });
            }
        }

        if let Some(expected) = self.stdout_lines_gt {
            let actual = outcome.stdout.split('\n').count();
            if expected > actual {
                return Err(CliAssertionError::TooFewLines { expected, actual });
            }
        }

        if let Some(required) = &self.stdout_contains_all {
            let mut message = String::from("Expect stdout to contain all of:");
            let mut missing = false;
            for pattern in required {
                let pattern = interpolate(pattern, vars);
                let _ = write!(message, "\n      - '{pattern}'");
                if !outcome.stdout.contains(&pattern) {
                    missing = true;
                }
            }
            if missing {
                return Err(CliAssertionError::MissingSubstrings { message });
            }
        }

        if let Some(forbidden) = &self.stdout_contains_none {
            let mut message = String::from("Expect stdout to contain none of:");
            let mut present = false;
            for pattern in forbidden {
                let pattern = interpolate(pattern, vars);
                let _ = write!(message, "\n      - '{pattern}'");
                if outcome.stdout.contains(&pattern) {
                    present = true;
                }
            }
            if present {
                return Err(CliAssertionError::ForbiddenSubstrings { message });
            }
        }

        Ok(())
    }
}

/// Checks `outcome` against every test of a step, stopping at the first failure.
pub fn evaluate_tests(
    tests: &[CliCommandTest],
    outcome: &CommandOutcome,
    vars: &Variables,
) -> std::result::Result<(), CliAssertionError> {
    tests.iter().try_for_each(|test| test.evaluate(outcome, vars))
}

/// Renders a failed step as the diagnostic text shown to the learner.
#[must_use]
pub fn failure_report(error: &CliAssertionError, outcome: &CommandOutcome) -> String {
    format!("{error}\n{}", outcome.stdout)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn outcome(exit_code: i32, stdout: &str) -> CommandOutcome {
        CommandOutcome {
            final_command: "go run .".to_string(),
            exit_code,
            stdout: stdout.to_string(),
        }
    }

    // ------------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------------

    #[test]
    fn test_step_deserializes_cli_command() {
        let json = r#"{
            "CLICommand": {
                "Command": "echo ${greeting}",
                "Tests": [{"ExitCode": 0, "StdoutContainsAll": ["hello"]}]
            },
            "HTTPRequest": null
        }"#;

        let step: CliStep = serde_json::from_str(json).unwrap();
        let CliStep::Command(command) = step else {
            panic!("expected a command step");
        };
        assert_eq!(command.command, "echo ${greeting}");
        assert_eq!(command.tests.len(), 1);
        assert_eq!(command.tests[0].exit_code, Some(0));
        assert_eq!(
            command.tests[0].stdout_contains_all,
            Some(vec!["hello".to_string()])
        );
        assert!(command.tests[0].stdout_lines_gt.is_none());
    }

    #[test]
    fn test_step_deserializes_http_request() {
        let json = r#"{
            "HTTPRequest": {
                "Request": {"Method": "GET", "FullURL": "${baseURL}/users"},
                "Tests": [{"StatusCode": 200}],
                "ResponseVariables": [{"Name": "id", "Path": ".id"}]
            }
        }"#;

        let step: CliStep = serde_json::from_str(json).unwrap();
        let CliStep::HttpRequest(request) = step else {
            panic!("expected an HTTP step");
        };
        assert_eq!(request.request.method, "GET");
        assert_eq!(request.request.full_url, "${baseURL}/users");
        assert_eq!(request.tests[0].status_code, Some(200));
        assert_eq!(request.response_variables[0].name, "id");
    }

    #[test]
    fn test_step_without_payload_is_missing() {
        let step: CliStep = serde_json::from_str("{}").unwrap();
        assert_eq!(step, CliStep::Missing);
    }

    #[test]
    fn test_null_tests_become_empty() {
        let command: CliCommand =
            serde_json::from_str(r#"{"Command": "ls", "Tests": null}"#).unwrap();
        assert!(command.tests.is_empty());
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    #[test]
    fn test_exit_code_mismatch() {
        let test = CliCommandTest {
            exit_code: Some(0),
            ..CliCommandTest::default()
        };
        let err = test
            .evaluate(&outcome(1, "boom"), &Variables::new())
            .unwrap_err();
        assert_eq!(
            err,
            CliAssertionError::ExitCode {
                expected: 0,
                actual: 1
            }
        );
        assert_eq!(err.to_string(), "expect exit code 0");
    }

    #[test]
    fn test_line_count_minimum() {
        let test = CliCommandTest {
            stdout_lines_gt: Some(3),
            ..CliCommandTest::default()
        };
        assert!(test.evaluate(&outcome(0, "a\nb\nc"), &Variables::new()).is_ok());

        let err = test
            .evaluate(&outcome(0, "a\nb"), &Variables::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "expect > 3 lines on stdout");
    }

    #[test]
    fn test_contains_all_reports_every_pattern() {
        let test = CliCommandTest {
            stdout_contains_all: Some(vec!["alpha".to_string(), "beta".to_string()]),
            ..CliCommandTest::default()
        };
        assert!(test
            .evaluate(&outcome(0, "alpha and beta"), &Variables::new())
            .is_ok());

        let err = test
            .evaluate(&outcome(0, "alpha only"), &Variables::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expect stdout to contain all of:\n      - 'alpha'\n      - 'beta'"
        );
    }

    #[test]
    fn test_contains_none() {
        let test = CliCommandTest {
            stdout_contains_none: Some(vec!["panic".to_string()]),
            ..CliCommandTest::default()
        };
        assert!(test.evaluate(&outcome(0, "fine"), &Variables::new()).is_ok());

        let err = test
            .evaluate(&outcome(0, "panic: oh no"), &Variables::new())
            .unwrap_err();
        assert!(matches!(err, CliAssertionError::ForbiddenSubstrings { .. }));
        assert!(err
            .to_string()
            .starts_with("Expect stdout to contain none of:"));
    }

    #[test]
    fn test_patterns_are_interpolated() {
        let mut vars = Variables::new();
        vars.insert("port".to_string(), "8080".to_string());
        let test = CliCommandTest {
            stdout_contains_all: Some(vec!["listening on ${port}".to_string()]),
            ..CliCommandTest::default()
        };

        assert!(test
            .evaluate(&outcome(0, "server listening on 8080"), &vars)
            .is_ok());

        let err = test
            .evaluate(&outcome(0, "server listening on 9090"), &vars)
            .unwrap_err();
        assert!(err.to_string().contains("'listening on 8080'"));
    }

    #[test]
    fn test_first_failing_rule_wins() {
        let test = CliCommandTest {
            exit_code: Some(0),
            stdout_contains_all: Some(vec!["missing".to_string()]),
            ..CliCommandTest::default()
        };
        let err = test
            .evaluate(&outcome(2, "whatever"), &Variables::new())
            .unwrap_err();
        assert!(matches!(err, CliAssertionError::ExitCode { .. }));
    }

    #[test]
    fn test_evaluate_tests_stops_at_first_failure() {
        let tests = vec![
            CliCommandTest {
                exit_code: Some(0),
                ..CliCommandTest::default()
            },
            CliCommandTest {
                stdout_contains_all: Some(vec!["ok".to_string()]),
                ..CliCommandTest::default()
            },
            CliCommandTest {
                stdout_contains_none: Some(vec!["ok".to_string()]),
                ..CliCommandTest::default()
            },
        ];

        let err = evaluate_tests(&tests, &outcome(0, "ok"), &Variables::new()).unwrap_err();
        assert!(matches!(err, CliAssertionError::ForbiddenSubstrings { .. }));
        assert!(evaluate_tests(&tests[..2], &outcome(0, "ok"), &Variables::new()).is_ok());
    }

    #[test]
    fn test_failure_report_includes_output() {
        let out = outcome(1, "permission denied");
        let err = CliAssertionError::ExitCode {
            expected: 0,
            actual: 1,
        };
        assert_eq!(
            failure_report(&err, &out),
            "expect exit code 0\npermission denied"
        );
    }
}
