//! Build configuration.
//!
//! [`CompilerConfig`] mirrors the familiar bundler configuration surface:
//!
//! ```
//! use tapestry_compiler::{CompilerConfig, Mode};
//!
//! let config = CompilerConfig::from_json(r#"{
//!     "mode": "development",
//!     "entry": { "index": "templates/index.js", "utils": "templates/utils.js" },
//!     "output": { "path": "dist", "filename": "[name].bundle.js" },
//!     "module": {
//!         "rules": [
//!             { "test": "\\.my$", "use": [{ "loader": "json-data-loader", "options": { "age": 12 } }] }
//!         ]
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(config.mode, Mode::Development);
//! assert_eq!(config.output.filename_for("utils"), "utils.bundle.js");
//! ```
//!
//! Parsing compiles rule patterns; [`CompilerConfig::validate`] checks the
//! rest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tapestry_loader::LoaderRule;

use crate::error::ConfigError;

/// Placeholder substituted with the entry name in output filenames.
pub const NAME_PLACEHOLDER: &str = "[name]";

/// Entry name used when `entry` is a single path.
pub const DEFAULT_ENTRY_NAME: &str = "main";

/// Build mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unoptimized output.
    Development,
    /// Optimized output (default).
    #[default]
    Production,
    /// No mode-specific defaults.
    None,
}

/// Entry points: a single path or a map of entry name to path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// One unnamed entry, reported as [`DEFAULT_ENTRY_NAME`].
    Single(String),
    /// Named entries, iterated in name order.
    Named(BTreeMap<String, String>),
}

impl Default for Entry {
    fn default() -> Self {
        Entry::Single("./src/index.js".into())
    }
}

impl Entry {
    /// Returns `(name, path)` pairs.
    #[must_use]
    pub fn entries(&self) -> Vec<(&str, &str)> {
        match self {
            Entry::Single(path) => vec![(DEFAULT_ENTRY_NAME, path.as_str())],
            Entry::Named(entries) => entries
                .iter()
                .map(|(name, path)| (name.as_str(), path.as_str()))
                .collect(),
        }
    }

    /// Returns the number of entry points.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Entry::Single(_) => 1,
            Entry::Named(entries) => entries.len(),
        }
    }

    /// Returns true if no entry point is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where and how build output is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory.
    pub path: String,
    /// Output filename template; may contain `[name]`.
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "dist".into(),
            filename: "[name].js".into(),
        }
    }
}

impl OutputConfig {
    /// Renders the output filename for an entry.
    #[must_use]
    pub fn filename_for(&self, entry_name: &str) -> String {
        self.filename.replace(NAME_PLACEHOLDER, entry_name)
    }
}

/// The `module` section: loader rules in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Loader rules.
    pub rules: Vec<LoaderRule>,
}

/// Complete build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Build mode.
    pub mode: Mode,
    /// Entry points.
    pub entry: Entry,
    /// Output settings.
    pub output: OutputConfig,
    /// Module rules.
    pub module: ModuleConfig,
}

impl CompilerConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks constraints that deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entry.is_empty() {
            return Err(ConfigError::NoEntry);
        }
        if self.output.filename.is_empty() {
            return Err(ConfigError::EmptyFilename);
        }
        let entries = self.entry.len();
        if entries > 1 && !self.output.filename.contains(NAME_PLACEHOLDER) {
            return Err(ConfigError::MissingNamePlaceholder {
                filename: self.output.filename.clone(),
                entries,
            });
        }
        Ok(())
    }

    /// Returns `(output filename, entry path)` for every entry.
    #[must_use]
    pub fn assets(&self) -> BTreeMap<String, String> {
        self.entry
            .entries()
            .into_iter()
            .map(|(name, path)| (self.output.filename_for(name), path.to_owned()))
            .collect()
    }
}
