//! `${name}` variable interpolation for CLI step templates.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Variables threaded through the steps of a CLI lesson.
pub type Variables = HashMap<String, String>;

#[allow(clippy::expect_used)]
static VARIABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("variable pattern is a valid regex"));

/// Replaces every `${name}` token in `template` with its value from `vars`.
///
/// Tokens naming an unknown variable are left verbatim, so text without any
/// `${...}` token is returned unchanged.
///
/// # Examples
///
/// ```
/// use drill_check::{interpolate, Variables};
///
/// let mut vars = Variables::new();
/// vars.insert("x".to_string(), "5".to_string());
///
/// assert_eq!(interpolate("got: ${x}", &vars), "got: 5");
/// assert_eq!(interpolate("got: ${y}", &vars), "got: ${y}");
/// ```
#[must_use]
pub fn interpolate(template: &str, vars: &Variables) -> String {
    let replaced: Cow<'_, str> = VARIABLE_PATTERN.replace_all(template, |caps: &Captures<'_>| {
        let token = caps.get(0).map_or("", |m| m.as_str());
        caps.get(1)
            .and_then(|name| vars.get(name.as_str()))
            .map_or_else(|| token.to_string(), Clone::clone)
    });
    replaced.into_owned()
}
