//! Configuration types for the Drill orchestrator.
//!
//! This module provides the configuration used to drive a session: where the
//! lesson service lives, where exercises are written, which editors to open
//! and how verification and publishing behave.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DrillError, Result};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "drill.json";

/// Default lesson service base URL.
fn default_api_base_url() -> String {
    "https://api.boot.dev/v1/".to_string()
}

/// Default working root.
fn default_root() -> String {
    ".".to_string()
}

/// Default directory of per-language build and run recipes.
fn default_lib_dir() -> String {
    ".lib".to_string()
}

/// Default number of answers allowed on a multiple-choice question.
const fn default_max_attempts() -> u32 {
    3
}

/// Default `LANG` for CLI lesson steps.
fn default_locale() -> String {
    "en_US.UTF-8".to_string()
}

/// Default delay between reap attempts of the git chain, in milliseconds.
const fn default_git_poll_interval_ms() -> u64 {
    50
}

/// Default HTTP timeout in seconds.
const fn default_request_timeout_secs() -> u64 {
    30
}

/// Main configuration for a Drill session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the remote lesson service.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Working root for exercises, `.last`, recipes and the git repository.
    #[serde(default = "default_root")]
    pub root: String,

    /// Recipe tree, relative to `root` unless absolute.
    #[serde(default = "default_lib_dir")]
    pub lib_dir: String,

    /// Editor for code files. The `nvr` layout is used when unset.
    #[serde(default)]
    pub code_editor: Option<String>,

    /// Markdown viewer for the README pane of the `nvr` layout.
    #[serde(default)]
    pub md_editor: Option<String>,

    /// Write every lesson of a course without opening editors or checks.
    #[serde(default)]
    pub download: bool,

    /// Answers allowed before a question is failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// `LANG` passed to CLI lesson steps.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Delay between non-blocking reap attempts of the git chain.
    #[serde(default = "default_git_poll_interval_ms")]
    pub git_poll_interval_ms: u64,

    /// Timeout for lesson service requests in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            root: default_root(),
            lib_dir: default_lib_dir(),
            code_editor: None,
            md_editor: None,
            download: false,
            max_attempts: default_max_attempts(),
            locale: default_locale(),
            git_poll_interval_ms: default_git_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from a specific directory.
    ///
    /// Looks for `drill.json` in the given directory. If not found, returns
    /// the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::ConfigParseError` if the file exists but cannot
    /// be read or parsed, and `DrillError::ConfigValidationError` if a value
    /// is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(DrillError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| DrillError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(DrillError::config_validation(
                "apiBaseUrl must not be empty",
                "Set apiBaseUrl in your drill.json or pass --api-url",
            ));
        }

        if self.root.trim().is_empty() {
            return Err(DrillError::config_validation(
                "root must not be empty",
                "Use '.' for the current directory",
            ));
        }

        if self.lib_dir.trim().is_empty() {
            return Err(DrillError::config_validation(
                "libDir must not be empty",
                "Point libDir at the directory holding <language>/Makefile and <language>/run",
            ));
        }

        if self.max_attempts == 0 {
            return Err(DrillError::config_validation(
                "maxAttempts must be greater than 0",
                "Set maxAttempts to at least 1 in your drill.json",
            ));
        }

        if self.locale.trim().is_empty() {
            return Err(DrillError::config_validation(
                "locale must not be empty",
                "Set locale to a value such as 'en_US.UTF-8'",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(DrillError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 second in your drill.json",
            ));
        }

        if matches!(&self.code_editor, Some(e) if e.trim().is_empty()) {
            return Err(DrillError::config_validation(
                "codeEditor must not be empty",
                "Remove codeEditor to use the default nvr layout",
            ));
        }

        Ok(())
    }

    /// Base URL with a guaranteed trailing `/`.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.api_base_url.ends_with('/') {
            self.api_base_url.clone()
        } else {
            format!("{}/", self.api_base_url)
        }
    }

    /// The working root as a path.
    #[must_use]
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    /// Path of a recipe file for `language`, e.g. `.lib/go/Makefile`.
    ///
    /// Relative to the working root unless `lib_dir` is absolute; recipes are
    /// run with the working root as current directory.
    #[must_use]
    pub fn recipe_path(&self, language: &str, file: &str) -> PathBuf {
        Path::new(&self.lib_dir).join(language).join(file)
    }

    /// Delay between reap attempts of the git chain.
    #[must_use]
    pub const fn git_poll_interval(&self) -> Duration {
        Duration::from_millis(self.git_poll_interval_ms)
    }

    /// Timeout for lesson service requests.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
