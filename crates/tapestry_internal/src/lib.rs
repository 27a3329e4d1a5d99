//! # Tapestry Internal Library
//!
//! Re-exports the core Tapestry crates for convenience.

/// Layer 1: Typed, tappable lifecycle hooks.
pub use tapestry_hooks;

/// Layer 1: Pattern-matched loader pipeline.
pub use tapestry_loader;

/// Layer 2: Compiler lifecycle and plugin runtime.
pub use tapestry_compiler;

/// Layer 3: Infrastructure plugins.
pub use tapestry_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tapestry_compiler::{
        BoxError, BuildEvent, BuildOutput, BuildStats, Compiler, CompilerConfig, CompilerError,
        CompilerState, Pluggable,
    };
    pub use tapestry_core_plugins::{TracingFormat, TracingPlugin};
    pub use tapestry_hooks::{Hook, HookError, HookKind, HookName, HookRegistry};
    pub use tapestry_loader::{
        LoaderChain, LoaderError, LoaderOptions, LoaderRegistry, LoaderResolver, LoaderRule,
        LoaderSpec, Transform, TransformResult, transform_fn,
    };
}
