//! Resolution of loader references to transforms.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::loaders::JsonDataLoader;
use crate::transform::Transform;

/// Resolves a loader reference (as written in a rule's `use` list) to the
/// transform that implements it.
///
/// Resolution is delegated so that callers can plug in whatever lookup their
/// environment provides; [`LoaderRegistry`] is the in-memory default.
pub trait LoaderResolver: Send + Sync + 'static {
    /// Returns the transform for `loader`, or `None` if it is unknown.
    fn resolve(&self, loader: &str) -> Option<Arc<dyn Transform>>;
}

/// In-memory map from loader reference to transform.
///
/// # Example
///
/// ```
/// use tapestry_loader::{transform_fn, LoaderRegistry, LoaderResolver};
///
/// let mut loaders = LoaderRegistry::new();
/// loaders.register("noop", transform_fn(|source: &str, _: &_| Ok(source.into())));
///
/// assert!(loaders.resolve("noop").is_some());
/// assert!(loaders.resolve("missing").is_none());
/// ```
#[derive(Default, Clone)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn Transform>>,
}

impl LoaderRegistry {
    /// Reference under which [`JsonDataLoader`] is registered by
    /// [`with_builtins`](Self::with_builtins).
    pub const JSON_DATA_LOADER: &'static str = "json-data-loader";

    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in loaders.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Self::JSON_DATA_LOADER, JsonDataLoader::default());
        registry
    }

    /// Registers a transform, replacing any previous one with the same reference.
    pub fn register(&mut self, loader: impl Into<String>, transform: impl Transform) -> &mut Self {
        self.register_arc(loader, Arc::new(transform))
    }

    /// Registers an already shared transform.
    pub fn register_arc(
        &mut self,
        loader: impl Into<String>,
        transform: Arc<dyn Transform>,
    ) -> &mut Self {
        let loader = loader.into();
        if self.loaders.insert(loader.clone(), transform).is_some() {
            tracing::debug!(loader = %loader, "replaced loader registration");
        }
        self
    }

    /// Returns true if the reference is registered.
    #[must_use]
    pub fn contains(&self, loader: &str) -> bool {
        self.loaders.contains_key(loader)
    }

    /// Returns the number of registered loaders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Returns true if no loader is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl LoaderResolver for LoaderRegistry {
    fn resolve(&self, loader: &str) -> Option<Arc<dyn Transform>> {
        self.loaders.get(loader).cloned()
    }
}

impl<R: LoaderResolver> LoaderResolver for Arc<R> {
    fn resolve(&self, loader: &str) -> Option<Arc<dyn Transform>> {
        (**self).resolve(loader)
    }
}
