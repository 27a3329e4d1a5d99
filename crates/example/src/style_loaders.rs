//! A CSS rule in two stages.
//!
//! Configured as `use: ["style-loader", "css-loader"]`, [`CssLoader`] runs
//! first and turns the stylesheet into a module exporting its text;
//! [`StyleLoader`] then wraps that module so importing it injects the style.

use futures::future::BoxFuture;
use tapestry_loader::{BoxError, LoaderOptions, Transform, TransformResult};

/// Exports a stylesheet's text as a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssLoader;

impl Transform for CssLoader {
    fn run<'a>(
        &'a self,
        source: &'a str,
        _options: &'a LoaderOptions,
    ) -> BoxFuture<'a, Result<TransformResult, BoxError>> {
        Box::pin(async move {
            let css = serde_json::to_string(source.trim())?;
            Ok(format!("export default {css}").into())
        })
    }

    fn name(&self) -> &str {
        "css-loader"
    }
}

/// Wraps a CSS module so importing it appends a `<style>` element.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleLoader;

impl Transform for StyleLoader {
    fn run<'a>(
        &'a self,
        source: &'a str,
        _options: &'a LoaderOptions,
    ) -> BoxFuture<'a, Result<TransformResult, BoxError>> {
        Box::pin(async move {
            let Some(css) = source.trim().strip_prefix("export default ") else {
                return Err(format!("expected a css module, got: {source}").into());
            };
            Ok(format!(
                "const style = document.createElement('style');\n\
                 style.textContent = {css};\n\
                 document.head.appendChild(style);"
            )
            .into())
        })
    }

    fn name(&self) -> &str {
        "style-loader"
    }
}
