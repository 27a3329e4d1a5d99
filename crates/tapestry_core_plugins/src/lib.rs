//! Core infrastructure plugins for Tapestry.
//!
//! - [`TracingPlugin`] - Logging of the build lifecycle via the `tracing` crate
//!
//! # Example
//!
//! ```
//! use tapestry_compiler::Compiler;
//! use tapestry_core_plugins::{TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! let compiler = Compiler::default().with_plugin(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! # let _ = compiler;
//! ```

mod tracing_plugin;

pub use tracing_plugin::{TracingFormat, TracingPlugin};
