//! Loader for JSON data envelopes.
//!
//! Modules handled by [`JsonDataLoader`] contain a status envelope:
//!
//! ```json
//! { "code": 200, "data": [1, 2, 3] }
//! ```
//!
//! When `code` matches the expected status the module exports `data`. Any
//! other well-formed envelope exports `undefined` instead of failing the
//! build. Input that is not JSON, or is JSON `null`, is an error.

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::BoxError;
use crate::rule::LoaderOptions;
use crate::transform::{Transform, TransformResult};

/// Option key overriding the expected status code for one rule.
const EXPECTED_CODE_OPTION: &str = "expectedCode";

/// Exports the `data` field of a JSON envelope whose `code` is expected.
///
/// # Example
///
/// ```
/// use tapestry_loader::{JsonDataLoader, LoaderOptions, Transform};
///
/// let loader = JsonDataLoader::default();
/// let options = LoaderOptions::new();
///
/// let ok = futures::executor::block_on(loader.run(r#"{"code": 200, "data": [1,2,3]}"#, &options)).unwrap();
/// assert_eq!(ok.default_export(), Some("[1,2,3]"));
///
/// let missing = futures::executor::block_on(loader.run(r#"{"code": 404}"#, &options)).unwrap();
/// assert!(missing.is_undefined());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonDataLoader {
    expected_code: u16,
}

impl Default for JsonDataLoader {
    fn default() -> Self {
        Self { expected_code: 200 }
    }
}

impl JsonDataLoader {
    /// Creates a loader expecting the given status code.
    #[must_use]
    pub fn with_expected_code(expected_code: u16) -> Self {
        Self { expected_code }
    }

    /// Returns the expected status code.
    #[must_use]
    pub fn expected_code(&self) -> u16 {
        self.expected_code
    }

    fn load(&self, source: &str, options: &LoaderOptions) -> Result<TransformResult, BoxError> {
        let envelope: Value = serde_json::from_str(source)?;
        if envelope.is_null() {
            return Err("cannot read `code` of a null envelope".into());
        }

        let expected = options
            .get(EXPECTED_CODE_OPTION)
            .and_then(Value::as_f64)
            .unwrap_or_else(|| f64::from(self.expected_code));

        let code = envelope.get("code").and_then(Value::as_f64);
        if code != Some(expected) {
            tracing::debug!(?code, expected, "unexpected status, exporting undefined");
            return Ok(TransformResult::Undefined);
        }

        match envelope.get("data") {
            Some(data) => Ok(TransformResult::Value(format!(
                "export default {}",
                serde_json::to_string(data)?
            ))),
            None => Ok(TransformResult::Undefined),
        }
    }
}

impl Transform for JsonDataLoader {
    fn run<'a>(
        &'a self,
        source: &'a str,
        options: &'a LoaderOptions,
    ) -> BoxFuture<'a, Result<TransformResult, BoxError>> {
        Box::pin(core::future::ready(self.load(source, options)))
    }

    fn name(&self) -> &str {
        "json-data-loader"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(source: &str) -> Result<TransformResult, BoxError> {
        JsonDataLoader::default().load(source, &LoaderOptions::new())
    }

    #[test]
    fn matching_code_exports_data() {
        let result = load(r#"{"code": 200, "data": [1, 2, 3]}"#).unwrap();
        assert_eq!(result.as_source(), "export default [1,2,3]");

        let exported: Value = serde_json::from_str(result.default_export().unwrap()).unwrap();
        assert_eq!(exported, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn mismatched_code_exports_undefined() {
        let result = load(r#"{"code": 404}"#).unwrap();
        assert!(result.is_undefined());
        assert_eq!(result.as_source(), "export default undefined");
    }

    #[test]
    fn string_code_is_not_the_expected_number() {
        assert!(load(r#"{"code": "200", "data": 1}"#).unwrap().is_undefined());
    }

    #[test]
    fn float_code_equal_to_expected_matches() {
        let result = load(r#"{"code": 200.0, "data": {"a": 1}}"#).unwrap();
        assert_eq!(result.default_export(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn missing_data_exports_undefined() {
        assert!(load(r#"{"code": 200}"#).unwrap().is_undefined());
    }

    #[test]
    fn non_object_json_exports_undefined() {
        assert!(load("[1, 2, 3]").unwrap().is_undefined());
    }

    #[test]
    fn null_envelope_is_an_error() {
        let err = load("null").unwrap_err();
        assert!(err.to_string().contains("null envelope"));
        assert!(load(" null\n").is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(load("{code: 200").is_err());
    }

    #[test]
    fn expected_code_option_overrides_default() {
        let mut options = LoaderOptions::new();
        options.insert(EXPECTED_CODE_OPTION.into(), 204.into());

        let result = JsonDataLoader::default()
            .load(r#"{"code": 204, "data": null}"#, &options)
            .unwrap();
        assert_eq!(result.as_source(), "export default null");
    }

    #[test]
    fn unrelated_options_are_ignored() {
        let mut options = LoaderOptions::new();
        options.insert("age".into(), 12.into());

        let result = JsonDataLoader::with_expected_code(201)
            .load(r#"{"code": 201, "data": "ok"}"#, &options)
            .unwrap();
        assert_eq!(result.default_export(), Some(r#""ok""#));
    }
}
