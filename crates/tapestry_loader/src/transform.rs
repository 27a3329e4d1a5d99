//! Loader stages and their output.

use core::future;

use futures::future::BoxFuture;

use crate::error::BoxError;
use crate::rule::LoaderOptions;

/// Textual rendering of a module with no exported value.
pub const UNDEFINED_EXPORT: &str = "export default undefined";

const DEFAULT_EXPORT_PREFIX: &str = "export default ";

// ─────────────────────────────────────────────────────────────────────────────
// TransformResult
// ─────────────────────────────────────────────────────────────────────────────

/// Output of a loader stage.
///
/// `Undefined` means the stage could not produce a value from otherwise
/// well-formed input. It is valid module content, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformResult {
    /// Replacement module source.
    Value(String),
    /// The module exports no value.
    Undefined,
}

impl TransformResult {
    /// Returns true for the `Undefined` sentinel.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, TransformResult::Undefined)
    }

    /// Returns the module source; `Undefined` renders as [`UNDEFINED_EXPORT`].
    #[must_use]
    pub fn as_source(&self) -> &str {
        match self {
            TransformResult::Value(source) => source,
            TransformResult::Undefined => UNDEFINED_EXPORT,
        }
    }

    /// Consumes the result, returning the module source.
    #[must_use]
    pub fn into_source(self) -> String {
        match self {
            TransformResult::Value(source) => source,
            TransformResult::Undefined => UNDEFINED_EXPORT.to_owned(),
        }
    }

    /// Returns the expression after `export default`, if the source has one.
    ///
    /// Returns `None` for `Undefined` and for sources exporting `undefined`.
    #[must_use]
    pub fn default_export(&self) -> Option<&str> {
        let TransformResult::Value(source) = self else {
            return None;
        };
        let expression = source
            .trim()
            .strip_prefix(DEFAULT_EXPORT_PREFIX)?
            .trim_end_matches(';')
            .trim();
        (expression != "undefined").then_some(expression)
    }
}

impl From<String> for TransformResult {
    fn from(source: String) -> Self {
        TransformResult::Value(source)
    }
}

impl From<&str> for TransformResult {
    fn from(source: &str) -> Self {
        TransformResult::Value(source.to_owned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// A loader: turns one module source into another.
///
/// Each call receives the output of the previous stage and the stage's own
/// options. Stages may be asynchronous; the chain awaits each one before
/// starting the next.
///
/// # Example
///
/// ```
/// use futures::future::BoxFuture;
/// use tapestry_loader::{BoxError, LoaderOptions, Transform, TransformResult};
///
/// struct Upper;
///
/// impl Transform for Upper {
///     fn run<'a>(
///         &'a self,
///         source: &'a str,
///         _options: &'a LoaderOptions,
///     ) -> BoxFuture<'a, Result<TransformResult, BoxError>> {
///         Box::pin(async move { Ok(source.to_uppercase().into()) })
///     }
/// }
/// ```
pub trait Transform: Send + Sync + 'static {
    /// Transforms `source`.
    fn run<'a>(
        &'a self,
        source: &'a str,
        options: &'a LoaderOptions,
    ) -> BoxFuture<'a, Result<TransformResult, BoxError>>;

    /// Returns the loader's name for logging.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

/// Adapts a synchronous closure into a [`Transform`].
///
/// ```
/// use tapestry_loader::{transform_fn, TransformResult};
///
/// let append = transform_fn(|source: &str, _options: &_| Ok(format!("{source}!").into()));
/// # let _ = append;
/// ```
pub struct FnTransform<F> {
    f: F,
}

/// Creates a [`FnTransform`] from a closure.
pub fn transform_fn<F>(f: F) -> FnTransform<F>
where
    F: Fn(&str, &LoaderOptions) -> Result<TransformResult, BoxError> + Send + Sync + 'static,
{
    FnTransform { f }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&str, &LoaderOptions) -> Result<TransformResult, BoxError> + Send + Sync + 'static,
{
    fn run<'a>(
        &'a self,
        source: &'a str,
        options: &'a LoaderOptions,
    ) -> BoxFuture<'a, Result<TransformResult, BoxError>> {
        Box::pin(future::ready((self.f)(source, options)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_renders_as_textual_export() {
        assert_eq!(TransformResult::Undefined.as_source(), UNDEFINED_EXPORT);
        assert_eq!(
            TransformResult::Undefined.into_source(),
            "export default undefined"
        );
    }

    #[test]
    fn default_export_extracts_expression() {
        let result = TransformResult::from("export default [1,2,3];\n");
        assert_eq!(result.default_export(), Some("[1,2,3]"));
    }

    #[test]
    fn default_export_is_none_without_value() {
        assert_eq!(TransformResult::Undefined.default_export(), None);
        assert_eq!(
            TransformResult::from(UNDEFINED_EXPORT).default_export(),
            None
        );
        assert_eq!(
            TransformResult::from("module.exports = 1").default_export(),
            None
        );
    }

    #[tokio::test]
    async fn fn_transform_receives_options() {
        let loader = transform_fn(|source: &str, options: &LoaderOptions| {
            let suffix = options
                .get("suffix")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default();
            Ok(format!("{source}{suffix}").into())
        });

        let mut options = LoaderOptions::new();
        options.insert("suffix".into(), "!".into());

        let result = loader.run("hi", &options).await.unwrap();
        assert_eq!(result, TransformResult::from("hi!"));
    }
}
