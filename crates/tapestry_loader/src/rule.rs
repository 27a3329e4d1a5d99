//! Loader rules: which loaders apply to which modules.
//!
//! A [`LoaderRule`] pairs a [`RuleTest`] pattern with an ordered `use` list of
//! [`LoaderSpec`]s. Rules deserialize from the usual configuration shape, where
//! a `use` entry is either a bare loader reference or a `{loader, options}`
//! object:
//!
//! ```
//! use tapestry_loader::LoaderRule;
//!
//! let rule: LoaderRule = serde_json::from_str(r#"{
//!     "test": "\\.css$",
//!     "use": ["style-loader", { "loader": "css-loader", "options": { "modules": true } }]
//! }"#).unwrap();
//!
//! assert!(rule.matches("src/app.css"));
//! assert_eq!(rule.uses[0].loader, "style-loader");
//! assert_eq!(rule.uses[1].options["modules"], true);
//! ```

use core::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LoaderError;

/// Options passed to a single loader stage.
pub type LoaderOptions = serde_json::Map<String, serde_json::Value>;

// ─────────────────────────────────────────────────────────────────────────────
// RuleTest
// ─────────────────────────────────────────────────────────────────────────────

/// Regular expression matched against module identifiers.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleTest {
    regex: Regex,
}

impl RuleTest {
    /// Compiles a pattern.
    pub fn new(pattern: &str) -> Result<Self, LoaderError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| LoaderError::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })
    }

    /// Returns the source pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns true if the module id matches.
    #[must_use]
    pub fn is_match(&self, module_id: &str) -> bool {
        self.regex.is_match(module_id)
    }
}

impl fmt::Debug for RuleTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

impl PartialEq for RuleTest {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl TryFrom<String> for RuleTest {
    type Error = LoaderError;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        Self::new(&pattern)
    }
}

impl From<RuleTest> for String {
    fn from(test: RuleTest) -> Self {
        test.as_str().to_owned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoaderSpec
// ─────────────────────────────────────────────────────────────────────────────

/// One entry of a rule's `use` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLoaderSpec")]
pub struct LoaderSpec {
    /// Reference resolved to a transform by a
    /// [`LoaderResolver`](crate::LoaderResolver).
    pub loader: String,
    /// Options handed to this stage only.
    #[serde(default, skip_serializing_if = "LoaderOptions::is_empty")]
    pub options: LoaderOptions,
}

impl LoaderSpec {
    /// Creates a spec with no options.
    #[must_use]
    pub fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            options: LoaderOptions::new(),
        }
    }

    /// Sets this stage's options.
    #[must_use]
    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets a single option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for LoaderSpec {
    fn from(loader: &str) -> Self {
        Self::new(loader)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLoaderSpec {
    Bare(String),
    Full {
        loader: String,
        #[serde(default)]
        options: LoaderOptions,
    },
}

impl From<RawLoaderSpec> for LoaderSpec {
    fn from(raw: RawLoaderSpec) -> Self {
        match raw {
            RawLoaderSpec::Bare(loader) => Self::new(loader),
            RawLoaderSpec::Full { loader, options } => Self { loader, options },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LoaderRule
// ─────────────────────────────────────────────────────────────────────────────

/// A pattern and the loaders applied to modules matching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderRule {
    /// Pattern matched against module identifiers.
    pub test: RuleTest,
    /// Loaders in declaration order; they execute right to left.
    #[serde(rename = "use")]
    pub uses: Vec<LoaderSpec>,
}

impl LoaderRule {
    /// Creates a rule from a pattern and a `use` list.
    pub fn new<I, S>(test: &str, uses: I) -> Result<Self, LoaderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<LoaderSpec>,
    {
        Ok(Self {
            test: RuleTest::new(test)?,
            uses: uses.into_iter().map(Into::into).collect(),
        })
    }

    /// Returns true if this rule applies to the module.
    #[must_use]
    pub fn matches(&self, module_id: &str) -> bool {
        self.test.is_match(module_id)
    }
}
