//! Workspace configuration
//!
//! Read from an optional `rf.toml` at the workspace root. Every key is
//! optional; missing keys fall back to [`WorkspaceConfig::default`].
//!
//! ```toml
//! exclude = ["target", "testdata"]
//! max_file_size = 1048576
//! languages = ["go"]
//! ```

use std::path::Path;

use rf_source::Language;
use serde::Deserialize;

use crate::error::ConfigError;

/// Name of the configuration file looked up at the workspace root
pub const CONFIG_FILE: &str = "rf.toml";

/// Largest source file loaded by default (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Directories skipped by default
pub const DEFAULT_EXCLUDES: &[&str] = &["target", "vendor", "node_modules", "testdata"];

/// How a workspace is discovered and loaded
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Directory names skipped during discovery (hidden entries are always skipped)
    pub exclude: Vec<String>,
    /// Files larger than this fail the load
    pub max_file_size: u64,
    /// Languages whose files are loaded
    pub languages: Vec<Language>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            languages: Language::ALL.to_vec(),
        }
    }
}

impl WorkspaceConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set excluded directory names
    #[must_use]
    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Set file size limit
    #[inline]
    #[must_use]
    pub fn with_max_file_size(mut self, max: u64) -> Self {
        self.max_file_size = max;
        self
    }

    /// Restrict loaded languages
    #[must_use]
    pub fn with_languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.languages = languages.into_iter().collect();
        self
    }

    /// Load `rf.toml` from `root`, or defaults when there is none
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded workspace config");
        Ok(config)
    }

    /// Parse config text
    ///
    /// # Errors
    ///
    /// Returns error on invalid TOML or unknown keys.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Whether a directory entry named `name` is skipped
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        name.starts_with('.') || self.exclude.iter().any(|e| e == name)
    }

    /// Whether files of `language` are loaded
    #[inline]
    #[must_use]
    pub fn includes(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }
}
