//! Output-diff checker for code lessons with an expected output.

use similar::{ChangeTag, TextDiff};

use crate::Verdict;

/// Result of comparing a program's output with the expected output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputComparison {
    /// Whether the run succeeded and produced exactly the expected output.
    pub passed: bool,
    /// The captured output.
    pub output: String,
    /// Character-level diff of actual against expected, when they differ.
    pub diff: Option<String>,
}

impl OutputComparison {
    /// Converts the comparison into a [`Verdict`].
    ///
    /// The report is the diff when there is one, otherwise the output.
    #[must_use]
    pub fn into_verdict(self) -> Verdict {
        let passed = self.passed;
        let report = match self.diff {
            Some(diff) => diff,
            None => self.output,
        };
        Verdict { passed, report }
    }
}

/// Compares `actual` with `expected` byte for byte.
///
/// A non-zero `exit_code` fails the comparison even when the output matches;
/// the diff is still computed whenever the texts differ.
///
/// # Examples
///
/// ```
/// use drill_check::compare_output;
///
/// let same = compare_output("abc", "abc", 0);
/// assert!(same.passed);
/// assert!(same.diff.is_none());
///
/// let different = compare_output("abd", "abc", 0);
/// assert!(!different.passed);
/// assert!(!different.diff.unwrap_or_default().is_empty());
/// ```
#[must_use]
pub fn compare_output(actual: &str, expected: &str, exit_code: i32) -> OutputComparison {
    if actual == expected {
        return OutputComparison {
            passed: exit_code == 0,
            output: actual.to_string(),
            diff: None,
        };
    }

    OutputComparison {
        passed: false,
        output: actual.to_string(),
        diff: Some(character_diff(actual, expected)),
    }
}

/// Renders a character-level diff of `actual` against `expected`.
///
/// Runs present only in `actual` render as `(~~text~~)`, runs present only in
/// `expected` as `(++text++)`, and shared runs verbatim.
#[must_use]
pub fn character_diff(actual: &str, expected: &str) -> String {
    let diff = TextDiff::from_chars(actual, expected);
    let mut rendered = String::with_capacity(actual.len() + expected.len());
    let mut run = String::new();
    let mut run_tag: Option<ChangeTag> = None;

    for change in diff.iter_all_changes() {
        let tag = change.tag();
        if run_tag != Some(tag) {
            flush_run(&mut rendered, run_tag, &run);
            run.clear();
            run_tag = Some(tag);
        }
        run.push_str(change.value());
    }
    flush_run(&mut rendered, run_tag, &run);

    rendered
}

fn flush_run(out: &mut String, tag: Option<ChangeTag>, run: &str) {
    if run.is_empty() {
        return;
    }
    match tag {
        Some(ChangeTag::Delete) => {
            out.push_str("(~~");
            out.push_str(run);
            out.push_str("~~)");
        }
        Some(ChangeTag::Insert) => {
            out.push_str("(++");
            out.push_str(run);
            out.push_str("++)");
        }
        Some(ChangeTag::Equal) | None => out.push_str(run),
    }
}
