//! Error types for the loader pipeline.

/// Error type returned by loader stages.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving or running loaders.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// A loader stage failed; the chain was aborted.
    #[error("loader '{loader}' failed on module '{module}': {source}")]
    Transform {
        /// Reference of the failing loader.
        loader: String,
        /// The module being transformed.
        module: String,
        /// The error the stage returned.
        source: BoxError,
    },

    /// A loader reference could not be resolved to a transform.
    #[error("loader '{loader}' required by module '{module}' could not be resolved")]
    Unresolved {
        /// The unresolved reference.
        loader: String,
        /// The module that required it.
        module: String,
    },

    /// A rule's `test` pattern is not a valid regular expression.
    #[error("invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The regex compilation error.
        source: regex::Error,
    },
}

impl LoaderError {
    /// Returns the module the error belongs to, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        match self {
            LoaderError::Transform { module, .. } | LoaderError::Unresolved { module, .. } => {
                Some(module)
            }
            LoaderError::InvalidPattern { .. } => None,
        }
    }
}
