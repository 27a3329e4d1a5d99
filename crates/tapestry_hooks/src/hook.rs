//! A single named extension point.
//!
//! A [`Hook`] holds an ordered list of taps and fires them with one of three
//! semantics, fixed by its [`HookKind`]:
//!
//! | Kind | Fire method | Semantics |
//! |------|-------------|-----------|
//! | [`Sync`](HookKind::Sync) | [`call`](Hook::call) | In order, fail-fast |
//! | [`AsyncSeries`](HookKind::AsyncSeries) | [`call_async`](Hook::call_async) | One at a time, each awaited, fail-fast |
//! | [`AsyncParallel`](HookKind::AsyncParallel) | [`call_parallel`](Hook::call_parallel) | All started, all settled, aggregate failure |
//!
//! Hooks are single-flight: a second fire of the same instance while one is
//! in flight fails with [`HookError::ReentrantFire`], and tapping a hook that
//! is being fired fails with [`HookError::ReentrantTap`].
//!
//! # Example
//!
//! ```
//! use tapestry_hooks::{Hook, HookKind, HookName};
//!
//! let hook: Hook<String> = Hook::new(HookName::Compile, HookKind::AsyncSeries);
//!
//! hook.tap("log", |event: &String| {
//!     println!("compiling {event}");
//!     Ok(())
//! })
//! .unwrap()
//! .tap_async("wait", |_: &String| async { Ok(()) })
//! .unwrap();
//!
//! futures::executor::block_on(hook.call_async(&"main.js".to_string())).unwrap();
//! ```

use core::fmt;
use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use parking_lot::RwLock;

use crate::error::{BoxError, HookError, TapFailure};
use crate::name::HookName;

/// Result returned by every tap callback.
pub type TapResult = Result<(), BoxError>;

// ─────────────────────────────────────────────────────────────────────────────
// HookKind
// ─────────────────────────────────────────────────────────────────────────────

/// Firing semantics of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Taps run synchronously, in registration order.
    Sync,
    /// Taps run one after another; each is awaited before the next starts.
    AsyncSeries,
    /// Taps are all started, then awaited together.
    AsyncParallel,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Sync => "sync",
            HookKind::AsyncSeries => "async-series",
            HookKind::AsyncParallel => "async-parallel",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tap
// ─────────────────────────────────────────────────────────────────────────────

type SyncCallback<E> = Arc<dyn Fn(&E) -> TapResult + Send + Sync>;
type AsyncCallback<E> = Arc<dyn Fn(&E) -> BoxFuture<'static, TapResult> + Send + Sync>;

enum Callback<E> {
    Sync(SyncCallback<E>),
    Async(AsyncCallback<E>),
}

impl<E> Clone for Callback<E> {
    fn clone(&self) -> Self {
        match self {
            Callback::Sync(f) => Callback::Sync(Arc::clone(f)),
            Callback::Async(f) => Callback::Async(Arc::clone(f)),
        }
    }
}

/// One registered callback.
struct Tap<E> {
    /// Informational only, duplicates are allowed.
    name: String,
    callback: Callback<E>,
}

impl<E> Clone for Tap<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            callback: self.callback.clone(),
        }
    }
}

/// Clears the in-flight flag when a fire completes, fails, or is dropped.
struct FireGuard<'a> {
    firing: &'a AtomicBool,
}

impl Drop for FireGuard<'_> {
    fn drop(&mut self) {
        self.firing.store(false, Ordering::Release);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Hook
// ─────────────────────────────────────────────────────────────────────────────

/// A named extension point holding an ordered list of taps.
///
/// `E` is the event type every tap receives by reference.
pub struct Hook<E> {
    name: HookName,
    kind: HookKind,
    taps: RwLock<Vec<Tap<E>>>,
    firing: AtomicBool,
}

impl<E> fmt::Debug for Hook<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("taps", &self.tap_names())
            .field("firing", &self.is_firing())
            .finish()
    }
}

impl<E> Hook<E> {
    /// Creates a hook with no taps.
    #[must_use]
    pub fn new(name: HookName, kind: HookKind) -> Self {
        Self {
            name,
            kind,
            taps: RwLock::new(Vec::new()),
            firing: AtomicBool::new(false),
        }
    }

    /// Returns the hook's name.
    #[must_use]
    pub fn name(&self) -> HookName {
        self.name
    }

    /// Returns the hook's firing semantics.
    #[must_use]
    pub fn kind(&self) -> HookKind {
        self.kind
    }

    /// Returns the number of registered taps.
    #[must_use]
    pub fn tap_count(&self) -> usize {
        self.taps.read().len()
    }

    /// Returns tap names in registration order.
    #[must_use]
    pub fn tap_names(&self) -> Vec<String> {
        self.taps.read().iter().map(|tap| tap.name.clone()).collect()
    }

    /// Returns true while a fire of this hook is in flight.
    #[must_use]
    pub fn is_firing(&self) -> bool {
        self.firing.load(Ordering::Acquire)
    }

    /// Registers a synchronous callback.
    ///
    /// Sync callbacks may be tapped onto hooks of any kind.
    pub fn tap<F>(&self, name: impl Into<String>, callback: F) -> Result<&Self, HookError>
    where
        F: Fn(&E) -> TapResult + Send + Sync + 'static,
    {
        self.push(name.into(), Callback::Sync(Arc::new(callback)))
    }

    /// Registers an asynchronous callback.
    ///
    /// The callback is invoked with the event and returns a future that
    /// signals completion; the future must not borrow the event.
    pub fn tap_async<F, Fut>(&self, name: impl Into<String>, callback: F) -> Result<&Self, HookError>
    where
        E: 'static,
        F: Fn(&E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TapResult> + Send + 'static,
    {
        let name = name.into();
        if self.kind == HookKind::Sync {
            return Err(HookError::AsyncTapOnSyncHook {
                hook: self.name,
                tap: name,
            });
        }

        let callback: AsyncCallback<E> =
            Arc::new(move |event: &E| -> BoxFuture<'static, TapResult> {
                Box::pin(callback(event))
            });
        self.push(name, Callback::Async(callback))
    }

    fn push(&self, name: String, callback: Callback<E>) -> Result<&Self, HookError> {
        let mut taps = self.taps.write();
        if self.is_firing() {
            return Err(HookError::ReentrantTap { hook: self.name });
        }

        tracing::trace!(hook = %self.name, tap = %name, "tapped");
        taps.push(Tap { name, callback });
        Ok(self)
    }

    /// Fires a [`Sync`](HookKind::Sync) hook.
    ///
    /// Taps run in registration order; the first failure stops the fire.
    pub fn call(&self, event: &E) -> Result<(), HookError> {
        self.expect_kind(HookKind::Sync, "call")?;
        let _guard = self.begin_fire()?;

        for tap in self.snapshot() {
            tracing::debug!(hook = %self.name, tap = %tap.name, "invoking tap");
            match &tap.callback {
                Callback::Sync(callback) => {
                    callback(event).map_err(|source| self.tap_failed(&tap.name, source))?;
                }
                Callback::Async(_) => {
                    return Err(HookError::AsyncTapOnSyncHook {
                        hook: self.name,
                        tap: tap.name,
                    });
                }
            }
        }
        Ok(())
    }

    /// Fires an [`AsyncSeries`](HookKind::AsyncSeries) hook.
    ///
    /// Each tap completes before the next one starts; the first failure
    /// aborts the chain.
    pub async fn call_async(&self, event: &E) -> Result<(), HookError> {
        self.expect_kind(HookKind::AsyncSeries, "call_async")?;
        let _guard = self.begin_fire()?;

        for tap in self.snapshot() {
            tracing::debug!(hook = %self.name, tap = %tap.name, "invoking tap");
            let result = match &tap.callback {
                Callback::Sync(callback) => callback(event),
                Callback::Async(callback) => callback(event).await,
            };
            result.map_err(|source| self.tap_failed(&tap.name, source))?;
        }
        Ok(())
    }

    /// Fires an [`AsyncParallel`](HookKind::AsyncParallel) hook.
    ///
    /// Every callback is invoked before any completion is awaited. All
    /// started work is awaited to settlement, even after a failure, and the
    /// failures are then reported together.
    pub async fn call_parallel(&self, event: &E) -> Result<(), HookError> {
        self.expect_kind(HookKind::AsyncParallel, "call_parallel")?;
        let _guard = self.begin_fire()?;

        let taps = self.snapshot();
        let pending: Vec<BoxFuture<'static, TapResult>> = taps
            .iter()
            .map(|tap| -> BoxFuture<'static, TapResult> {
                tracing::debug!(hook = %self.name, tap = %tap.name, "starting tap");
                match &tap.callback {
                    Callback::Sync(callback) => Box::pin(future::ready(callback(event))),
                    Callback::Async(callback) => callback(event),
                }
            })
            .collect();

        let results = future::join_all(pending).await;

        let failures: Vec<TapFailure> = taps
            .into_iter()
            .zip(results)
            .filter_map(|(tap, result)| {
                result.err().map(|source| TapFailure {
                    tap: tap.name,
                    source,
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!(hook = %self.name, failed = failures.len(), "parallel taps failed");
            Err(HookError::ParallelFailed {
                hook: self.name,
                failures,
            })
        }
    }

    fn expect_kind(&self, kind: HookKind, method: &'static str) -> Result<(), HookError> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(HookError::WrongFireMethod {
                hook: self.name,
                kind: self.kind,
                method,
            })
        }
    }

    fn begin_fire(&self) -> Result<FireGuard<'_>, HookError> {
        self.firing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HookError::ReentrantFire { hook: self.name })?;
        Ok(FireGuard {
            firing: &self.firing,
        })
    }

    /// Copies the tap list so no lock is held while callbacks run.
    fn snapshot(&self) -> Vec<Tap<E>> {
        self.taps.read().clone()
    }

    fn tap_failed(&self, tap: &str, source: BoxError) -> HookError {
        tracing::warn!(hook = %self.name, tap, error = %source, "tap failed");
        HookError::TapFailed {
            hook: self.name,
            tap: tap.to_owned(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn sync_hook_runs_taps_in_order() {
        let hook: Hook<()> = Hook::new(HookName::BuildModule, HookKind::Sync);
        let order = recorder();

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            hook.tap(name, move |()| {
                order.lock().unwrap().push(name.to_string());
                Ok(())
            })
            .unwrap();
        }

        hook.call(&()).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn sync_hook_stops_at_first_failure() {
        let hook: Hook<()> = Hook::new(HookName::BuildModule, HookKind::Sync);
        let order = recorder();

        for (index, name) in ["a", "b", "c"].into_iter().enumerate() {
            let order = Arc::clone(&order);
            hook.tap(name, move |()| {
                order.lock().unwrap().push(name.to_string());
                if index == 1 {
                    Err("boom".into())
                } else {
                    Ok(())
                }
            })
            .unwrap();
        }

        let err = hook.call(&()).unwrap_err();
        assert!(matches!(err, HookError::TapFailed { ref tap, .. } if tap == "b"));
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
        assert!(!hook.is_firing(), "guard should be released after failure");
    }

    #[test]
    fn empty_hook_fires_successfully() {
        let hook: Hook<()> = Hook::new(HookName::Failed, HookKind::Sync);
        hook.call(&()).unwrap();
    }

    #[test]
    fn duplicate_tap_names_are_allowed() {
        let hook: Hook<()> = Hook::new(HookName::Run, HookKind::AsyncSeries);
        hook.tap("same", |()| Ok(()))
            .unwrap()
            .tap("same", |()| Ok(()))
            .unwrap();
        assert_eq!(hook.tap_names(), vec!["same", "same"]);
    }

    #[test]
    fn async_tap_rejected_on_sync_hook() {
        let hook: Hook<()> = Hook::new(HookName::BuildModule, HookKind::Sync);
        let err = hook.tap_async("late", |()| async { Ok(()) }).unwrap_err();
        assert!(matches!(err, HookError::AsyncTapOnSyncHook { .. }));
        assert_eq!(hook.tap_count(), 0);
    }

    #[test]
    fn wrong_fire_method_is_rejected() {
        let hook: Hook<()> = Hook::new(HookName::Run, HookKind::AsyncSeries);
        let err = hook.call(&()).unwrap_err();
        assert!(matches!(
            err,
            HookError::WrongFireMethod {
                method: "call",
                kind: HookKind::AsyncSeries,
                ..
            }
        ));
    }

    #[test]
    fn tapping_from_inside_a_tap_is_rejected() {
        let hook: Arc<Hook<()>> = Arc::new(Hook::new(HookName::BuildModule, HookKind::Sync));
        let inner = Arc::clone(&hook);
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        hook.tap("retap", move |()| {
            let result = inner.tap("nested", |()| Ok(())).map(|_| ());
            *seen_clone.lock().unwrap() = Some(result);
            Ok(())
        })
        .unwrap();

        hook.call(&()).unwrap();
        let result = seen.lock().unwrap().take().unwrap();
        assert!(matches!(result, Err(HookError::ReentrantTap { .. })));
        assert_eq!(hook.tap_count(), 1);
    }

    #[test]
    fn firing_from_inside_a_tap_is_rejected() {
        let hook: Arc<Hook<()>> = Arc::new(Hook::new(HookName::BuildModule, HookKind::Sync));
        let inner = Arc::clone(&hook);

        hook.tap("refire", move |()| {
            inner.call(&())?;
            Ok(())
        })
        .unwrap();

        let err = hook.call(&()).unwrap_err();
        let HookError::TapFailed { source, .. } = err else {
            panic!("expected TapFailed");
        };
        assert!(source.to_string().contains("already being fired"));
    }

    #[tokio::test]
    async fn series_hook_mixes_sync_and_async_taps_in_order() {
        let hook: Hook<()> = Hook::new(HookName::Compile, HookKind::AsyncSeries);
        let order = recorder();

        let o = Arc::clone(&order);
        hook.tap_async("slow", move |()| {
            let o = Arc::clone(&o);
            async move {
                tokio::time::sleep(core::time::Duration::from_millis(20)).await;
                o.lock().unwrap().push("slow".to_string());
                Ok(())
            }
        })
        .unwrap();

        let o = Arc::clone(&order);
        hook.tap("fast", move |()| {
            o.lock().unwrap().push("fast".to_string());
            Ok(())
        })
        .unwrap();

        hook.call_async(&()).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn dropped_fire_releases_the_guard() {
        let hook: Hook<()> = Hook::new(HookName::Compile, HookKind::AsyncSeries);
        hook.tap_async("pending", |()| future::pending::<TapResult>())
            .unwrap();

        {
            let fire = hook.call_async(&());
            let timed_out =
                tokio::time::timeout(core::time::Duration::from_millis(10), fire).await;
            assert!(timed_out.is_err());
        }

        assert!(!hook.is_firing());
    }
}
