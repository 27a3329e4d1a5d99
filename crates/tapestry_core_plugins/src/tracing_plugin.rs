//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`] which installs a `tracing` subscriber and logs
//! each lifecycle hook of the build it is applied to.
//!
//! # Lifecycle
//!
//! - **`apply()`** installs the subscriber (unless disabled or one is already
//!   set) and taps every lifecycle hook.
//! - During the build, `run`, `done` and `failed` are logged at `info`/`error`;
//!   `compile`, `make`, `buildModule` and `emit` at `debug`.
//!
//! # Example
//!
//! ```
//! use tapestry_compiler::Compiler;
//! use tapestry_core_plugins::{TracingPlugin, TracingFormat};
//! use tracing::Level;
//!
//! let compiler = Compiler::default()
//!     .with_plugin(
//!         TracingPlugin::default()
//!             .with_level(Level::DEBUG)
//!             .with_format(TracingFormat::Pretty)
//!     )
//!     .with_module("index.js", "export default 1");
//!
//! futures::executor::block_on(compiler.run()).unwrap();
//! ```

use tapestry_compiler::{BoxError, BuildEvent, Compiler, Pluggable};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const TAP_NAME: &str = "TracingPlugin";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// Configures the `tracing` subscriber and reports build progress through
/// it. Uses the [`tracing`] and [`tracing_subscriber`] crates under the hood.
///
/// # Configuration Options
///
/// ```
/// use tapestry_core_plugins::{TracingPlugin, TracingFormat};
/// use tracing::Level;
///
/// // Development: Pretty colored output with debug level
/// let dev_plugin = TracingPlugin::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);  // Show span enter/exit
///
/// // Production: JSON output for log aggregation
/// let prod_plugin = TracingPlugin::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("tapestry_compiler=info,tapestry_loader=warn");
/// ```
///
/// # Environment Filter
///
/// Use `with_env_filter` to set target-specific log levels:
///
/// ```
/// use tapestry_core_plugins::TracingPlugin;
///
/// TracingPlugin::default()
///     .with_env_filter("tapestry_hooks=debug,tapestry_loader=trace")
/// # ;
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "tapestry_loader=debug").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
    /// Whether `apply` installs the global subscriber.
    install_subscriber: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
            install_subscriber: true,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Controls whether `apply` installs the global subscriber.
    ///
    /// Disable when the host application sets up its own subscriber and
    /// only wants the lifecycle taps.
    #[must_use]
    pub fn with_subscriber(mut self, install: bool) -> Self {
        self.install_subscriber = install;
        self
    }

    fn init_subscriber(&self) {
        let env_filter = match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        };

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init fails if a global subscriber is already set; keep that one.
        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        tracing::debug!(
            level = %self.level,
            format = ?self.format,
            installed,
            "TracingPlugin subscriber configured"
        );
    }
}

impl Pluggable for TracingPlugin {
    fn apply(&self, compiler: &Compiler) -> Result<(), BoxError> {
        if self.install_subscriber {
            self.init_subscriber();
        }

        let hooks = compiler.hooks();
        hooks.run()?.tap(TAP_NAME, log_event)?;
        hooks.compile()?.tap(TAP_NAME, log_event)?;
        hooks.make()?.tap(TAP_NAME, log_event)?;
        hooks.build_module()?.tap(TAP_NAME, log_event)?;
        hooks.emit()?.tap(TAP_NAME, log_event)?;
        hooks.done()?.tap(TAP_NAME, log_event)?;
        hooks.failed()?.tap(TAP_NAME, log_event)?;
        Ok(())
    }

    fn name(&self) -> &str {
        TAP_NAME
    }
}

fn log_event(event: &BuildEvent) -> Result<(), BoxError> {
    match event {
        BuildEvent::Run { build_id } => {
            tracing::info!(build_id = %build_id, "starting compilation");
        }
        BuildEvent::Compile {
            build_id,
            module_count,
        } => {
            tracing::debug!(build_id = %build_id, module_count, "compiling");
        }
        BuildEvent::Make { build_id, modules } => {
            tracing::debug!(build_id = %build_id, modules = modules.len(), "making modules");
        }
        BuildEvent::BuildModule { build_id, module } => {
            tracing::debug!(build_id = %build_id, module = %module, "building module");
        }
        BuildEvent::Emit { build_id, modules } => {
            tracing::debug!(build_id = %build_id, modules = modules.len(), "emitting");
        }
        BuildEvent::Done { stats } => {
            tracing::info!(
                build_id = %stats.build_id,
                modules = stats.modules,
                undefined_exports = stats.undefined_exports,
                duration_ms = stats.duration.as_millis(),
                "compilation finished"
            );
        }
        BuildEvent::Failed { build_id, error } => {
            tracing::error!(build_id = %build_id, error = %error, "compilation failed");
        }
    }
    Ok(())
}
