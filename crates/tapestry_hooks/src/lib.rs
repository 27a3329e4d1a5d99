//! Typed, tappable lifecycle hooks for Tapestry.
//!
//! `tapestry_hooks` provides the extension points plugins attach to:
//!
//! - [`hook`] - A single [`Hook`] with sync, async-series, or async-parallel firing
//! - [`registry`] - The [`HookRegistry`] mapping lifecycle names to hooks
//! - [`name`] - The closed [`HookName`] set
//! - [`error`] - [`HookError`] and the [`BoxError`] taps fail with
//!
//! # Architecture
//!
//! - **Layer 1** (`tapestry_hooks`, `tapestry_loader`): hook and loader primitives (this crate)
//! - **Layer 2** (`tapestry_compiler`): plugin runtime and build lifecycle
//! - **Layer 3** (plugins): tracing, demos, user plugins

/// Error types for tapping and firing.
pub mod error;

/// A single named extension point.
pub mod hook;

/// The closed set of lifecycle hook names.
pub mod name;

/// Named hook registry.
pub mod registry;

pub use error::{BoxError, HookError, TapFailure};
pub use hook::{Hook, HookKind, TapResult};
pub use name::HookName;
pub use registry::HookRegistry;
