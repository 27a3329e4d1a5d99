//! A minimal plugin tapping the first two lifecycle hooks.

use core::time::Duration;

use serde::Deserialize;
use tapestry_compiler::{BoxError, Compiler, Pluggable};

/// Options accepted by [`HelloPlugin`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HelloOptions {
    /// Free-form flag carried through to the log output.
    pub flag: bool,
}

/// Logs when compilation starts, then simulates one second of async work
/// during `compile`.
#[derive(Debug, Clone)]
pub struct HelloPlugin {
    options: HelloOptions,
    compile_delay: Duration,
}

impl HelloPlugin {
    /// Creates the plugin with the given options.
    #[must_use]
    pub fn new(options: HelloOptions) -> Self {
        Self {
            options,
            compile_delay: Duration::from_secs(1),
        }
    }

    /// Creates the plugin from a JSON options object.
    pub fn from_json(options: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_value(options)?))
    }

    /// Overrides how long the `compile` tap waits.
    #[must_use]
    pub fn with_compile_delay(mut self, delay: Duration) -> Self {
        self.compile_delay = delay;
        self
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> &HelloOptions {
        &self.options
    }
}

impl Pluggable for HelloPlugin {
    fn apply(&self, compiler: &Compiler) -> Result<(), BoxError> {
        let flag = self.options.flag;
        compiler.hooks().run()?.tap("HelloPlugin", move |_| {
            tracing::info!(flag, "starting compilation");
            Ok(())
        })?;

        let delay = self.compile_delay;
        compiler.hooks().compile()?.tap_async("HelloPlugin", move |_| async move {
            tokio::time::sleep(delay).await;
            tracing::info!("compiling");
            Ok(())
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "HelloPlugin"
    }
}
