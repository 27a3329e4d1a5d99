//! Compiler lifecycle and plugin runtime for Tapestry.
//!
//! This crate ties the hook layer ([`tapestry_hooks`]) and the loader layer
//! ([`tapestry_loader`]) into a build:
//!
//! - [`Compiler`] owns one build: its hooks, plugins, loader chain and module
//!   sources, and walks the lifecycle state machine.
//! - [`Pluggable`] is the plugin contract; [`apply_all`] applies a plugin list
//!   in order.
//! - [`CompilerConfig`] is the serde-backed configuration surface.
//! - [`BuildEvent`] is the payload every lifecycle hook fires with.
//!
//! # Example
//!
//! ```
//! use tapestry_compiler::{BoxError, BuildEvent, Compiler, Pluggable};
//!
//! struct CountModules;
//!
//! impl Pluggable for CountModules {
//!     fn apply(&self, compiler: &Compiler) -> Result<(), BoxError> {
//!         compiler.hooks().done()?.tap("CountModules", |event| {
//!             if let BuildEvent::Done { stats } = event {
//!                 tracing::info!(modules = stats.modules, "done");
//!             }
//!             Ok(())
//!         })?;
//!         Ok(())
//!     }
//! }
//!
//! let compiler = Compiler::default()
//!     .with_plugin(CountModules)
//!     .with_module("index.js", "export default 1");
//!
//! let output = futures::executor::block_on(compiler.run()).unwrap();
//! assert_eq!(output.stats.modules, 1);
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod event;
pub mod plugin;

pub use compiler::{BuildOutput, Compiler, CompilerState};
pub use config::{CompilerConfig, Entry, ModuleConfig, Mode, OutputConfig};
pub use error::{CompilerError, ConfigError};
pub use event::{BuildEvent, BuildId, BuildStats};
pub use plugin::{Pluggable, apply_all};
pub use tapestry_hooks::BoxError;
