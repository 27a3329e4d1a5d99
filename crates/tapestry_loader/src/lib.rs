//! Pattern-matched loader pipeline for Tapestry.
//!
//! `tapestry_loader` turns raw module source into transformed module source:
//!
//! - [`rule`] - [`LoaderRule`] and [`LoaderSpec`], deserializable from configuration
//! - [`transform`] - The [`Transform`] trait and its [`TransformResult`]
//! - [`resolver`] - [`LoaderResolver`] and the in-memory [`LoaderRegistry`]
//! - [`chain`] - [`LoaderChain`], which selects and runs loaders per module
//! - [`loaders`] - Built-in loaders such as [`JsonDataLoader`]
//!
//! # Example
//!
//! ```
//! use tapestry_loader::{LoaderChain, LoaderRegistry, LoaderRule, LoaderSpec};
//!
//! let rule = LoaderRule::new(
//!     r"\.my$",
//!     [LoaderSpec::new(LoaderRegistry::JSON_DATA_LOADER).with_option("age", 12)],
//! )
//! .unwrap();
//! let chain = LoaderChain::new(vec![rule], LoaderRegistry::with_builtins());
//!
//! let out = futures::executor::block_on(
//!     chain.transform("data.my", r#"{"code": 200, "data": [1, 2, 3]}"#),
//! )
//! .unwrap();
//! assert_eq!(out.as_source(), "export default [1,2,3]");
//! ```

/// Resolving and running the loaders for one module.
pub mod chain;

/// Error types for the loader pipeline.
pub mod error;

/// Built-in loaders.
pub mod loaders;

/// Resolution of loader references.
pub mod resolver;

/// Loader rules and specs.
pub mod rule;

/// The transform trait and its output.
pub mod transform;

pub use chain::LoaderChain;
pub use error::{BoxError, LoaderError};
pub use loaders::JsonDataLoader;
pub use resolver::{LoaderRegistry, LoaderResolver};
pub use rule::{LoaderOptions, LoaderRule, LoaderSpec, RuleTest};
pub use transform::{FnTransform, Transform, TransformResult, UNDEFINED_EXPORT, transform_fn};
