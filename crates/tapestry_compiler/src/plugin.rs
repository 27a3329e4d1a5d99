//! Plugin runtime.
//!
//! A plugin is anything that can tap the compiler's hooks. Plugins are
//! applied once, in the order they were added, before the build starts:
//!
//! ```
//! use tapestry_compiler::{BoxError, Compiler, Pluggable};
//!
//! struct HelloPlugin;
//!
//! impl Pluggable for HelloPlugin {
//!     fn apply(&self, compiler: &Compiler) -> Result<(), BoxError> {
//!         compiler.hooks().run()?.tap("HelloPlugin", |_| {
//!             tracing::info!("starting compilation");
//!             Ok(())
//!         })?;
//!         Ok(())
//!     }
//! }
//!
//! let compiler = Compiler::default().with_plugin(HelloPlugin);
//! compiler.apply_plugins().unwrap();
//! assert_eq!(compiler.hooks().run().unwrap().tap_count(), 1);
//! ```

use tapestry_hooks::BoxError;

use crate::compiler::Compiler;
use crate::error::CompilerError;

/// An extension that registers taps on a [`Compiler`]'s hooks.
///
/// `apply` is called exactly once per compiler. Work that must happen during
/// the build belongs in the taps it registers, not in `apply` itself.
pub trait Pluggable: Send + Sync + 'static {
    /// Registers this plugin's taps.
    ///
    /// Returning an error stops the remaining plugins from being applied.
    /// Taps registered before the error are kept.
    fn apply(&self, compiler: &Compiler) -> Result<(), BoxError>;

    /// Returns the plugin's name for logging and error messages.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

/// Applies `plugins` to `compiler` in order.
///
/// Stops at the first failure and reports its position; nothing registered
/// so far is rolled back.
pub fn apply_all(plugins: &[Box<dyn Pluggable>], compiler: &Compiler) -> Result<(), CompilerError> {
    for (index, plugin) in plugins.iter().enumerate() {
        tracing::debug!(index, plugin = plugin.name(), "applying plugin");
        plugin
            .apply(compiler)
            .map_err(|source| CompilerError::PluginApply {
                index,
                name: plugin.name().to_owned(),
                source,
            })?;
    }
    tracing::debug!(count = plugins.len(), "plugins applied");
    Ok(())
}
