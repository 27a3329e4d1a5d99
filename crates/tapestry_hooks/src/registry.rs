//! Named hook registry.
//!
//! The [`HookRegistry`] maps each [`HookName`] to its [`Hook`], creating hooks
//! lazily on first access. The kind a hook is created with is fixed for the
//! registry's lifetime; asking for the same name with another kind fails with
//! [`HookError::KindMismatch`].
//!
//! Plugins reach hooks through the typed accessors, which request each hook
//! with its [`default_kind`](HookName::default_kind):
//!
//! ```
//! use tapestry_hooks::HookRegistry;
//!
//! let hooks: HookRegistry<()> = HookRegistry::new();
//! hooks.run()?.tap("HelloPlugin", |()| {
//!     println!("starting compilation");
//!     Ok(())
//! })?;
//!
//! assert_eq!(hooks.run()?.tap_count(), 1);
//! # Ok::<(), tapestry_hooks::HookError>(())
//! ```

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::HookError;
use crate::hook::{Hook, HookKind};
use crate::name::HookName;

/// Registry of lifecycle hooks, keyed by [`HookName`].
///
/// # Thread Safety
///
/// Uses interior mutability via [`RwLock`], so plugins can tap hooks through
/// a shared reference to the owning compiler.
pub struct HookRegistry<E> {
    hooks: RwLock<HashMap<HookName, Arc<Hook<E>>>>,
}

impl<E> Default for HookRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> HookRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the named hook, creating it with `kind` if it does not exist.
    ///
    /// Fails with [`HookError::KindMismatch`] if the hook already exists with
    /// a different kind.
    pub fn get(&self, name: HookName, kind: HookKind) -> Result<Arc<Hook<E>>, HookError> {
        let mut hooks = self.hooks.write();
        let hook = hooks.entry(name).or_insert_with(|| {
            tracing::trace!(hook = %name, %kind, "creating hook");
            Arc::new(Hook::new(name, kind))
        });

        if hook.kind() == kind {
            Ok(Arc::clone(hook))
        } else {
            Err(HookError::KindMismatch {
                hook: name,
                existing: hook.kind(),
                requested: kind,
            })
        }
    }

    /// Looks up a hook by its string name.
    ///
    /// Names outside the lifecycle's hook set fail with
    /// [`HookError::UnknownHook`].
    pub fn get_by_str(&self, name: &str, kind: HookKind) -> Result<Arc<Hook<E>>, HookError> {
        self.get(name.parse()?, kind)
    }

    /// Returns the hook if it has already been created.
    #[must_use]
    pub fn existing(&self, name: HookName) -> Option<Arc<Hook<E>>> {
        self.hooks.read().get(&name).cloned()
    }

    /// Returns true if the named hook has been created.
    #[must_use]
    pub fn contains(&self, name: HookName) -> bool {
        self.hooks.read().contains_key(&name)
    }

    /// Returns the number of hooks created so far.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    /// Returns the number of taps across every hook.
    #[must_use]
    pub fn total_tap_count(&self) -> usize {
        self.hooks.read().values().map(|hook| hook.tap_count()).sum()
    }

    fn default_hook(&self, name: HookName) -> Result<Arc<Hook<E>>, HookError> {
        self.get(name, name.default_kind())
    }

    /// The `run` hook.
    pub fn run(&self) -> Result<Arc<Hook<E>>, HookError> {
        self.default_hook(HookName::Run)
    }

    /// The `compile` hook.
    pub fn compile(&self) -> Result<Arc<Hook<E>>, HookError> {
        self.default_hook(HookName::Compile)
    }

    /// The `make` hook.
    pub fn make(&self) -> Result<Arc<Hook<E>>, HookError> {
        self.default_hook(HookName::Make)
    }

    /// The `buildModule` hook.
    pub fn build_module(&self) -> Result<Arc<Hook<E>>, HookError> {
        self.default_hook(HookName::BuildModule)
    }

    /// The `emit` hook.
    pub fn emit(&self) -> Result<Arc<Hook<E>>, HookError> {
        self.default_hook(HookName::Emit)
    }

    /// The `done` hook.
    pub fn done(&self) -> Result<Arc<Hook<E>>, HookError> {
        self.default_hook(HookName::Done)
    }

    /// The `failed` hook.
    pub fn failed(&self) -> Result<Arc<Hook<E>>, HookError> {
        self.default_hook(HookName::Failed)
    }
}
