//! The build lifecycle.
//!
//! A [`Compiler`] owns the hook registry, the plugin list and the loader
//! chain for exactly one build. The build moves through a fixed sequence of
//! states, firing one or more hooks on each transition:
//!
//! ```text
//! Idle ──start──▶ Running ──compile──▶ Compiling ──build_modules──▶ Emitting ──emit──▶ Done
//!   │               │                    │                            │
//!   └───────────────┴────────────────────┴────────────────────────────┴──▶ Failed
//! ```
//!
//! | Step            | Hooks fired                                  |
//! |-----------------|----------------------------------------------|
//! | `start`         | `run` (async series)                         |
//! | `compile`       | `compile` (async series)                     |
//! | `build_modules` | `make` (async parallel), `buildModule` (sync) per module |
//! | `emit`          | `emit` (async series), `done` (async series) |
//!
//! Any error moves the compiler to [`CompilerState::Failed`] and fires the
//! `failed` hook. `Done` and `Failed` are terminal: further steps fail with
//! [`CompilerError::InvalidTransition`].

use core::fmt;
use std::collections::BTreeMap;
use std::time::Instant;

use parking_lot::Mutex;
use tapestry_hooks::HookRegistry;
use tapestry_loader::{LoaderChain, LoaderRegistry, LoaderResolver, TransformResult};
use tracing::Instrument;

use crate::config::CompilerConfig;
use crate::error::CompilerError;
use crate::event::{BuildEvent, BuildId, BuildStats};
use crate::plugin::{Pluggable, apply_all};

// ─────────────────────────────────────────────────────────────────────────────
// CompilerState
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a [`Compiler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CompilerState {
    /// Created; plugins may not have been applied yet.
    #[default]
    Idle,
    /// `run` has fired.
    Running,
    /// `compile` has fired.
    Compiling,
    /// Every module has been built.
    Emitting,
    /// `done` has fired. Terminal.
    Done,
    /// A step failed. Terminal.
    Failed,
}

impl CompilerState {
    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, CompilerState::Done | CompilerState::Failed)
    }
}

impl fmt::Display for CompilerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompilerState::Idle => "idle",
            CompilerState::Running => "running",
            CompilerState::Compiling => "compiling",
            CompilerState::Emitting => "emitting",
            CompilerState::Done => "done",
            CompilerState::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BuildOutput
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Summary passed to the `done` hook.
    pub stats: BuildStats,
    /// Transformed modules keyed by module id.
    pub modules: BTreeMap<String, TransformResult>,
    /// Output filename to entry path, one per configured entry.
    pub assets: BTreeMap<String, String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiler
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum PluginPhase {
    #[default]
    Pending,
    Applying,
    Applied,
}

#[derive(Default)]
struct Lifecycle {
    state: CompilerState,
    step: Option<&'static str>,
    plugins: PluginPhase,
    started_at: Option<Instant>,
}

/// Clears the in-flight step when a step method returns or is dropped.
struct StepGuard<'a> {
    lifecycle: &'a Mutex<Lifecycle>,
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        self.lifecycle.lock().step = None;
    }
}

/// Drives one build.
///
/// Plugins receive `&Compiler` in [`Pluggable::apply`] and tap hooks through
/// [`hooks`](Self::hooks). All step methods take `&self`; only one step runs
/// at a time, and a step requested while another is in flight is rejected.
///
/// # Example
///
/// ```
/// use tapestry_compiler::{Compiler, CompilerConfig, CompilerState};
/// use tapestry_loader::LoaderRegistry;
///
/// let config = CompilerConfig::from_json(r#"{
///     "module": { "rules": [{ "test": "\\.my$", "use": ["json-data-loader"] }] }
/// }"#).unwrap();
///
/// let compiler = Compiler::new(config, LoaderRegistry::with_builtins())
///     .unwrap()
///     .with_module("data.my", r#"{"code": 200, "data": {"age": 12}}"#);
///
/// let output = futures::executor::block_on(compiler.run()).unwrap();
/// assert_eq!(compiler.state(), CompilerState::Done);
/// assert_eq!(output.modules["data.my"].as_source(), r#"export default {"age":12}"#);
/// ```
pub struct Compiler {
    build_id: BuildId,
    config: CompilerConfig,
    hooks: HookRegistry<BuildEvent>,
    plugins: Vec<Box<dyn Pluggable>>,
    loaders: LoaderChain,
    modules: Mutex<BTreeMap<String, String>>,
    outputs: Mutex<BTreeMap<String, TransformResult>>,
    lifecycle: Mutex<Lifecycle>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::from_parts(CompilerConfig::default(), LoaderRegistry::with_builtins())
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("build_id", &self.build_id)
            .field("state", &self.state())
            .field("plugins", &self.plugins.len())
            .field("modules", &self.modules.lock().len())
            .finish_non_exhaustive()
    }
}

impl Compiler {
    /// Creates a compiler for `config`, resolving loader references through
    /// `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Config`] if the configuration is invalid.
    pub fn new(config: CompilerConfig, resolver: impl LoaderResolver) -> Result<Self, CompilerError> {
        config.validate()?;
        Ok(Self::from_parts(config, resolver))
    }

    fn from_parts(config: CompilerConfig, resolver: impl LoaderResolver) -> Self {
        let loaders = LoaderChain::new(config.module.rules.clone(), resolver);
        let build_id = BuildId::new();
        tracing::debug!(build_id = %build_id, rules = loaders.rules().len(), "compiler created");
        Self {
            build_id,
            config,
            hooks: HookRegistry::new(),
            plugins: Vec::new(),
            loaders,
            modules: Mutex::new(BTreeMap::new()),
            outputs: Mutex::new(BTreeMap::new()),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Adds a plugin. Plugins are applied in the order they are added.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Pluggable) -> Self {
        self.add_plugin(plugin);
        self
    }

    /// Adds a plugin. Plugins are applied in the order they are added.
    pub fn add_plugin(&mut self, plugin: impl Pluggable) -> &mut Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Adds a module source.
    #[must_use]
    pub fn with_module(self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert_module(id.into(), source.into());
        self
    }

    /// Adds a module source between steps.
    ///
    /// Taps see the module set as read-only, so modules are added before
    /// `start` or between two steps, never while one is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::InvalidTransition`] while a step is running
    /// and once modules have been built.
    pub fn add_module(
        &self,
        id: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), CompilerError> {
        let lifecycle = self.lifecycle.lock();
        let state = lifecycle.state;
        if lifecycle.step.is_some()
            || matches!(state, CompilerState::Emitting)
            || state.is_terminal()
        {
            return Err(CompilerError::InvalidTransition {
                from: state,
                action: "add a module",
            });
        }
        // Held until the insert so a step cannot begin in between.
        self.insert_module(id.into(), source.into());
        drop(lifecycle);
        Ok(())
    }

    fn insert_module(&self, id: String, source: String) {
        if self.modules.lock().insert(id.clone(), source).is_some() {
            tracing::debug!(build_id = %self.build_id, module = %id, "replaced module source");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the hooks plugins tap.
    #[must_use]
    pub fn hooks(&self) -> &HookRegistry<BuildEvent> {
        &self.hooks
    }

    /// Returns this build's id.
    #[must_use]
    pub fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Returns the loader chain.
    #[must_use]
    pub fn loaders(&self) -> &LoaderChain {
        &self.loaders
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CompilerState {
        self.lifecycle.lock().state
    }

    /// Returns the registered module ids in build order.
    #[must_use]
    pub fn module_ids(&self) -> Vec<String> {
        self.modules.lock().keys().cloned().collect()
    }

    /// Returns the number of configured plugins.
    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies every plugin, at most once per compiler.
    ///
    /// Called by [`start`](Self::start); calling it earlier lets callers
    /// inspect the registered taps before the build begins.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::PluginApply`] for the first failing plugin and
    /// moves the compiler to `Failed`. Returns
    /// [`CompilerError::InvalidTransition`] when called while plugins are
    /// still being applied, or again after a failure.
    pub fn apply_plugins(&self) -> Result<(), CompilerError> {
        {
            let mut lifecycle = self.lifecycle.lock();
            match (lifecycle.plugins, lifecycle.state) {
                (PluginPhase::Pending, _) => lifecycle.plugins = PluginPhase::Applying,
                (PluginPhase::Applied, state) if state != CompilerState::Failed => return Ok(()),
                (_, state) => {
                    return Err(CompilerError::InvalidTransition {
                        from: state,
                        action: "apply plugins",
                    });
                }
            }
        }

        let result = apply_all(&self.plugins, self);
        self.lifecycle.lock().plugins = PluginPhase::Applied;
        result.map_err(|error| self.fail(error))
    }

    /// `Idle -> Running`: applies plugins and fires `run`.
    pub async fn start(&self) -> Result<(), CompilerError> {
        let _step = self.begin_step(CompilerState::Idle, "start")?;
        self.apply_plugins()?;

        self.lifecycle.lock().started_at = Some(Instant::now());
        let event = BuildEvent::Run {
            build_id: self.build_id.clone(),
        };
        self.fire_run(&event).await.map_err(|error| self.fail(error))?;

        self.advance(CompilerState::Running);
        Ok(())
    }

    /// `Running -> Compiling`: fires `compile`.
    pub async fn compile(&self) -> Result<(), CompilerError> {
        let _step = self.begin_step(CompilerState::Running, "compile")?;

        let event = BuildEvent::Compile {
            build_id: self.build_id.clone(),
            module_count: self.modules.lock().len(),
        };
        self.fire_compile(&event)
            .await
            .map_err(|error| self.fail(error))?;

        self.advance(CompilerState::Compiling);
        Ok(())
    }

    /// `Compiling -> Emitting`: fires `make`, then builds every module in id
    /// order.
    pub async fn build_modules(&self) -> Result<(), CompilerError> {
        let _step = self.begin_step(CompilerState::Compiling, "build modules")?;
        self.build_all().await.map_err(|error| self.fail(error))?;
        self.advance(CompilerState::Emitting);
        Ok(())
    }

    /// `Emitting -> Done`: fires `emit` and `done`, returning the build output.
    pub async fn emit(&self) -> Result<BuildOutput, CompilerError> {
        let _step = self.begin_step(CompilerState::Emitting, "emit")?;
        let output = self.emit_all().await.map_err(|error| self.fail(error))?;
        self.advance(CompilerState::Done);
        Ok(output)
    }

    /// Drives the whole lifecycle from `Idle` to `Done`.
    pub async fn run(&self) -> Result<BuildOutput, CompilerError> {
        let span = tracing::info_span!("build", build_id = %self.build_id);
        async {
            self.start().await?;
            self.compile().await?;
            self.build_modules().await?;
            self.emit().await
        }
        .instrument(span)
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Step bodies
    // ─────────────────────────────────────────────────────────────────────────

    async fn fire_run(&self, event: &BuildEvent) -> Result<(), CompilerError> {
        tracing::info!(build_id = %self.build_id, "build started");
        self.hooks.run()?.call_async(event).await?;
        Ok(())
    }

    async fn fire_compile(&self, event: &BuildEvent) -> Result<(), CompilerError> {
        self.hooks.compile()?.call_async(event).await?;
        Ok(())
    }

    async fn build_all(&self) -> Result<(), CompilerError> {
        let make = BuildEvent::Make {
            build_id: self.build_id.clone(),
            modules: self.module_ids(),
        };
        self.hooks.make()?.call_parallel(&make).await?;

        let modules = self.modules.lock().clone();
        let build_module = self.hooks.build_module()?;
        for (id, source) in &modules {
            let event = BuildEvent::BuildModule {
                build_id: self.build_id.clone(),
                module: id.clone(),
            };
            build_module.call(&event)?;

            let result = self
                .loaders
                .transform(id, source)
                .await
                .map_err(|source| CompilerError::Module {
                    module: id.clone(),
                    source,
                })?;
            tracing::debug!(
                build_id = %self.build_id,
                module = %id,
                undefined = result.is_undefined(),
                "module built"
            );
            self.outputs.lock().insert(id.clone(), result);
        }

        tracing::info!(build_id = %self.build_id, modules = modules.len(), "modules built");
        Ok(())
    }

    async fn emit_all(&self) -> Result<BuildOutput, CompilerError> {
        let modules = core::mem::take(&mut *self.outputs.lock());

        let emit = BuildEvent::Emit {
            build_id: self.build_id.clone(),
            modules: modules.keys().cloned().collect(),
        };
        self.hooks.emit()?.call_async(&emit).await?;

        let started_at = self.lifecycle.lock().started_at;
        let stats = BuildStats {
            build_id: self.build_id.clone(),
            modules: modules.len(),
            undefined_exports: modules.values().filter(|m| m.is_undefined()).count(),
            duration: started_at.map(|t| t.elapsed()).unwrap_or_default(),
        };
        let done = BuildEvent::Done {
            stats: stats.clone(),
        };
        self.hooks.done()?.call_async(&done).await?;

        tracing::info!(
            build_id = %self.build_id,
            modules = stats.modules,
            undefined_exports = stats.undefined_exports,
            duration_ms = stats.duration.as_millis(),
            "build complete"
        );

        Ok(BuildOutput {
            stats,
            modules,
            assets: self.config.assets(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State handling
    // ─────────────────────────────────────────────────────────────────────────

    fn begin_step(
        &self,
        expected: CompilerState,
        action: &'static str,
    ) -> Result<StepGuard<'_>, CompilerError> {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state != expected || lifecycle.step.is_some() {
            return Err(CompilerError::InvalidTransition {
                from: lifecycle.state,
                action,
            });
        }
        lifecycle.step = Some(action);
        Ok(StepGuard {
            lifecycle: &self.lifecycle,
        })
    }

    fn advance(&self, to: CompilerState) {
        let mut lifecycle = self.lifecycle.lock();
        tracing::debug!(build_id = %self.build_id, from = %lifecycle.state, to = %to, "state changed");
        lifecycle.state = to;
    }

    /// Moves to `Failed`, fires the `failed` hook and hands `error` back.
    ///
    /// A failure of the `failed` hook itself is logged only.
    fn fail(&self, error: CompilerError) -> CompilerError {
        let from = core::mem::replace(&mut self.lifecycle.lock().state, CompilerState::Failed);
        tracing::warn!(build_id = %self.build_id, state = %from, error = %error, "build failed");

        let event = BuildEvent::Failed {
            build_id: self.build_id.clone(),
            error: error.to_string(),
        };
        if let Err(hook_error) = self.hooks.failed().and_then(|hook| hook.call(&event)) {
            tracing::warn!(build_id = %self.build_id, error = %hook_error, "failed hook errored");
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tapestry_hooks::{HookError, HookName};

    #[tokio::test]
    async fn empty_build_reaches_done() {
        let compiler = Compiler::default();
        let output = compiler.run().await.unwrap();

        assert_eq!(compiler.state(), CompilerState::Done);
        assert_eq!(output.stats.modules, 0);
        assert_eq!(output.stats.build_id, *compiler.build_id());
        assert_eq!(output.assets["main.js"], "./src/index.js");
    }

    #[tokio::test]
    async fn steps_must_run_in_order() {
        let compiler = Compiler::default();

        let err = compiler.compile().await.unwrap_err();
        assert!(matches!(
            err,
            CompilerError::InvalidTransition {
                from: CompilerState::Idle,
                action: "compile"
            }
        ));
        // A rejected transition is not a build failure.
        assert_eq!(compiler.state(), CompilerState::Idle);

        compiler.start().await.unwrap();
        assert_eq!(compiler.state(), CompilerState::Running);
        compiler.compile().await.unwrap();
        assert_eq!(compiler.state(), CompilerState::Compiling);
        compiler.build_modules().await.unwrap();
        assert_eq!(compiler.state(), CompilerState::Emitting);
        compiler.emit().await.unwrap();
        assert_eq!(compiler.state(), CompilerState::Done);
    }

    #[tokio::test]
    async fn done_is_terminal() {
        let compiler = Compiler::default();
        compiler.run().await.unwrap();

        for result in [compiler.start().await, compiler.compile().await] {
            assert!(matches!(
                result,
                Err(CompilerError::InvalidTransition {
                    from: CompilerState::Done,
                    ..
                })
            ));
        }
        assert!(compiler.add_module("late.js", "").is_err());
        assert_eq!(compiler.state(), CompilerState::Done);
    }

    #[tokio::test]
    async fn step_cannot_be_reentered_from_a_tap() {
        let compiler = Arc::new(Compiler::default());
        let nested = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&nested);
        let weak = Arc::downgrade(&compiler);
        compiler
            .hooks()
            .run()
            .unwrap()
            .tap_async("restart", move |_| {
                let weak = weak.clone();
                let inner = Arc::clone(&inner);
                async move {
                    if let Some(compiler) = weak.upgrade() {
                        let rejected = compiler.start().await.is_err();
                        *inner.lock() = Some(rejected);
                    }
                    Ok(())
                }
            })
            .unwrap();

        compiler.start().await.unwrap();
        assert_eq!(*nested.lock(), Some(true));
        assert_eq!(compiler.state(), CompilerState::Running);
    }

    #[tokio::test]
    async fn failing_tap_moves_to_failed_and_fires_failed_hook() {
        let compiler = Compiler::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        compiler
            .hooks()
            .compile()
            .unwrap()
            .tap("broken", |_| Err("compile tap failed".into()))
            .unwrap();
        let failed_seen = Arc::clone(&seen);
        compiler
            .hooks()
            .failed()
            .unwrap()
            .tap("record", move |event| {
                if let BuildEvent::Failed { error, .. } = event {
                    failed_seen.lock().push(error.clone());
                }
                Ok(())
            })
            .unwrap();

        let err = compiler.run().await.unwrap_err();

        assert!(matches!(
            err,
            CompilerError::Hook(HookError::TapFailed { ref tap, .. }) if tap == "broken"
        ));
        assert_eq!(compiler.state(), CompilerState::Failed);
        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].contains("compile tap failed"));
    }

    #[tokio::test]
    async fn failing_failed_hook_does_not_mask_original_error() {
        let compiler = Compiler::default();
        compiler
            .hooks()
            .run()
            .unwrap()
            .tap("broken", |_| Err("original".into()))
            .unwrap();
        compiler
            .hooks()
            .failed()
            .unwrap()
            .tap("also-broken", |_| Err("secondary".into()))
            .unwrap();

        let err = compiler.start().await.unwrap_err();
        assert!(err.to_string().contains("original"));
        assert_eq!(compiler.state(), CompilerState::Failed);
    }

    /// Registers a tap on `hook` that tries to add `late.js` and records
    /// whether the compiler refused.
    fn tap_late_add(compiler: &Arc<Compiler>, hook: HookName) -> Arc<Mutex<Vec<bool>>> {
        let rejected = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&rejected);
        let weak = Arc::downgrade(compiler);
        compiler
            .hooks()
            .get(hook, hook.default_kind())
            .unwrap()
            .tap("add-late", move |_| {
                if let Some(compiler) = weak.upgrade() {
                    let result = compiler.add_module("late.js", "late");
                    inner.lock().push(matches!(
                        result,
                        Err(CompilerError::InvalidTransition {
                            action: "add a module",
                            ..
                        })
                    ));
                }
                Ok(())
            })
            .unwrap();
        rejected
    }

    #[tokio::test]
    async fn make_taps_cannot_add_modules() {
        let compiler = Arc::new(Compiler::default().with_module("a.js", "a"));
        let rejected = tap_late_add(&compiler, HookName::Make);

        let output = compiler.run().await.unwrap();

        assert_eq!(*rejected.lock(), vec![true]);
        assert_eq!(compiler.module_ids(), vec!["a.js"]);
        assert_eq!(output.modules.keys().collect::<Vec<_>>(), vec!["a.js"]);
    }

    #[tokio::test]
    async fn build_module_taps_cannot_add_modules() {
        let compiler = Arc::new(Compiler::default().with_module("a.js", "a"));
        let rejected = tap_late_add(&compiler, HookName::BuildModule);

        let output = compiler.run().await.unwrap();

        assert_eq!(*rejected.lock(), vec![true]);
        assert_eq!(compiler.module_ids(), vec!["a.js"]);
        assert_eq!(output.stats.modules, 1);
    }

    #[tokio::test]
    async fn modules_added_between_steps_are_built() {
        let compiler = Compiler::default().with_module("a.js", "a");
        compiler.start().await.unwrap();
        compiler.add_module("b.js", "b").unwrap();
        compiler.compile().await.unwrap();
        compiler.add_module("c.js", "c").unwrap();
        compiler.build_modules().await.unwrap();

        assert!(compiler.add_module("d.js", "d").is_err());
        let output = compiler.emit().await.unwrap();
        let ids: Vec<_> = output.modules.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a.js", "b.js", "c.js"]);
    }

    struct Reapplying {
        nested: Arc<Mutex<Option<bool>>>,
    }

    impl Pluggable for Reapplying {
        fn apply(&self, compiler: &Compiler) -> Result<(), crate::BoxError> {
            let rejected = matches!(
                compiler.apply_plugins(),
                Err(CompilerError::InvalidTransition {
                    from: CompilerState::Idle,
                    action: "apply plugins"
                })
            );
            *self.nested.lock() = Some(rejected);
            Ok(())
        }
    }

    #[test]
    fn apply_plugins_rejects_calls_while_applying() {
        let nested = Arc::new(Mutex::new(None));
        let compiler = Compiler::default().with_plugin(Reapplying {
            nested: Arc::clone(&nested),
        });

        compiler.apply_plugins().unwrap();
        assert_eq!(*nested.lock(), Some(true));

        compiler.apply_plugins().unwrap();
        assert_eq!(compiler.state(), CompilerState::Idle);
    }
}
