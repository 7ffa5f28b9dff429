//! Text-input checker.
//!
//! Text-input lessons ask the learner to write an answer into
//! [`INPUT_FILE_NAME`] inside the exercise directory. The lesson service
//! provides a [`Check`] with up to three rule groups that the content must
//! satisfy.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CheckError, Result, Verdict};

/// Name of the file a text-input lesson reads the learner's answer from.
pub const INPUT_FILE_NAME: &str = "input.txt";

/// Rule groups for a text-input lesson. Absent groups are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Check {
    /// Every listed substring must appear.
    #[serde(default)]
    pub contains_all: Option<Vec<String>>,
    /// At least one listed substring must appear.
    #[serde(default)]
    pub matches_one: Option<Vec<String>>,
    /// No listed substring may appear.
    #[serde(default)]
    pub contains_none: Option<Vec<String>>,
}

/// Checks `content` against the rule groups of `check`.
///
/// Groups are applied in the order contains-all, matches-one, contains-none;
/// the first failing group produces the verdict and lists its substrings
/// together with the full content. A passing verdict echoes the content.
#[must_use]
pub fn check_input(content: &str, check: &Check) -> Verdict {
    if let Some(required) = &check.contains_all {
        let failed = required.iter().any(|t| !content.contains(t.as_str()));
        if failed {
            return rule_failure("Expect input file to contain all of:", required, content);
        }
    }

    if let Some(candidates) = &check.matches_one {
        let failed = !candidates.iter().any(|t| content.contains(t.as_str()));
        if failed {
            return rule_failure("Expect input file to contain one of:", candidates, content);
        }
    }

    if let Some(forbidden) = &check.contains_none {
        let failed = forbidden.iter().any(|t| content.contains(t.as_str()));
        if failed {
            return rule_failure(
                "Expect input file to not contain any of:",
                forbidden,
                content,
            );
        }
    }

    Verdict::pass(content)
}

/// Reads [`INPUT_FILE_NAME`] from `exercise_dir` and checks it.
pub async fn check_input_file(exercise_dir: &Path, check: &Check) -> Result<Verdict> {
    let path = exercise_dir.join(INPUT_FILE_NAME);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| CheckError::ReadInput { path, source })?;
    Ok(check_input(&content, check))
}

fn rule_failure(heading: &str, patterns: &[String], content: &str) -> Verdict {
    let mut report = String::from(heading);
    for pattern in patterns {
        let _ = write!(report, "\n      - '{pattern}'");
    }
    let _ = write!(report, "\nContent is:\n{content}");
    Verdict::fail(report)
}
