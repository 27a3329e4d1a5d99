//! The per-module loader pipeline.
//!
//! [`LoaderChain::transform`] threads a module's source through every loader
//! whose rule matches the module id:
//!
//! 1. Matching rules are selected in configuration order and their `use`
//!    lists concatenated.
//! 2. Loader references are resolved up front; an unknown reference fails
//!    before any stage runs.
//! 3. Stages run right to left: the last declared loader sees the raw source
//!    and earlier loaders post-process its output.
//! 4. The first failing stage aborts the chain; no partial output is returned.

use std::sync::Arc;

use crate::error::LoaderError;
use crate::resolver::LoaderResolver;
use crate::rule::{LoaderRule, LoaderSpec};
use crate::transform::{Transform, TransformResult};

/// Ordered loader rules plus the resolver that turns references into
/// transforms.
///
/// # Example
///
/// ```
/// use tapestry_loader::{transform_fn, LoaderChain, LoaderRegistry, LoaderRule};
///
/// let mut loaders = LoaderRegistry::new();
/// for name in ["a", "b", "c"] {
///     loaders.register(name, transform_fn(move |s: &str, _: &_| Ok(format!("{s}{name}").into())));
/// }
///
/// let chain = LoaderChain::new(vec![LoaderRule::new(r"\.txt$", ["a", "b", "c"]).unwrap()], loaders);
/// let out = futures::executor::block_on(chain.transform("x.txt", ">")).unwrap();
/// assert_eq!(out.as_source(), ">cba");
/// ```
#[derive(Clone)]
pub struct LoaderChain {
    rules: Vec<LoaderRule>,
    resolver: Arc<dyn LoaderResolver>,
}

impl LoaderChain {
    /// Creates a chain from rules in configuration order.
    pub fn new(rules: Vec<LoaderRule>, resolver: impl LoaderResolver) -> Self {
        Self::with_shared_resolver(rules, Arc::new(resolver))
    }

    /// Creates a chain using an already shared resolver.
    #[must_use]
    pub fn with_shared_resolver(rules: Vec<LoaderRule>, resolver: Arc<dyn LoaderResolver>) -> Self {
        Self { rules, resolver }
    }

    /// Returns the configured rules.
    #[must_use]
    pub fn rules(&self) -> &[LoaderRule] {
        &self.rules
    }

    /// Returns the loader specs that apply to `module_id`, in declaration
    /// order (execution order is the reverse).
    #[must_use]
    pub fn resolve_rules(&self, module_id: &str) -> Vec<&LoaderSpec> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(module_id))
            .flat_map(|rule| rule.uses.iter())
            .collect()
    }

    /// Runs the matching loaders over `source`.
    ///
    /// Returns the source unchanged when no rule matches.
    pub async fn transform(
        &self,
        module_id: &str,
        source: &str,
    ) -> Result<TransformResult, LoaderError> {
        let specs = self.resolve_rules(module_id);
        if specs.is_empty() {
            tracing::trace!(module = module_id, "no loaders matched");
            return Ok(TransformResult::Value(source.to_owned()));
        }

        let stages = specs
            .into_iter()
            .map(|spec| {
                self.resolver
                    .resolve(&spec.loader)
                    .map(|transform| (spec, transform))
                    .ok_or_else(|| LoaderError::Unresolved {
                        loader: spec.loader.clone(),
                        module: module_id.to_owned(),
                    })
            })
            .collect::<Result<Vec<(&LoaderSpec, Arc<dyn Transform>)>, _>>()?;

        let mut current = TransformResult::Value(source.to_owned());
        for (spec, transform) in stages.iter().rev() {
            tracing::debug!(
                module = module_id,
                loader = %spec.loader,
                transform = transform.name(),
                "running loader"
            );

            let next = transform
                .run(current.as_source(), &spec.options)
                .await
                .map_err(|source| {
                    tracing::warn!(module = module_id, loader = %spec.loader, error = %source, "loader failed");
                    LoaderError::Transform {
                        loader: spec.loader.clone(),
                        module: module_id.to_owned(),
                        source,
                    }
                })?;
            current = next;
        }

        Ok(current)
    }
}
