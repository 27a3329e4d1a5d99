//! The extensibility core of a module bundler.
//!
//! Plugins tap typed lifecycle hooks on a [`Compiler`](tapestry_compiler::Compiler);
//! modules are threaded through pattern-matched loader chains.

pub use tapestry_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tapestry_internal::prelude::*;
}
