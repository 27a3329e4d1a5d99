//! Error types for hook registration and firing.

use core::fmt;

use crate::hook::HookKind;
use crate::name::HookName;

/// Error type returned by tap callbacks.
///
/// Taps surface arbitrary failures; the hook wraps them with the hook and tap
/// name so the fault can be located.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// A single failed tap from a parallel fire.
#[derive(Debug)]
pub struct TapFailure {
    /// Name the failing callback was tapped with.
    pub tap: String,
    /// The error the callback returned.
    pub source: BoxError,
}

impl fmt::Display for TapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tap '{}': {}", self.tap, self.source)
    }
}

/// Errors that can occur while tapping or firing hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// A tap was registered while the hook was being fired.
    #[error("cannot tap hook '{hook}' while it is being fired")]
    ReentrantTap {
        /// The hook being fired.
        hook: HookName,
    },

    /// A hook was fired while a previous fire of the same hook was in flight.
    #[error("hook '{hook}' is already being fired")]
    ReentrantFire {
        /// The hook being fired.
        hook: HookName,
    },

    /// The hook exists with a different kind than the one requested.
    #[error("hook '{hook}' was created as {existing} but requested as {requested}")]
    KindMismatch {
        /// The hook name.
        hook: HookName,
        /// Kind fixed when the hook was first created.
        existing: HookKind,
        /// Kind of the rejected request.
        requested: HookKind,
    },

    /// The name does not belong to the lifecycle's hook set.
    #[error("unknown hook name '{0}'")]
    UnknownHook(String),

    /// An asynchronous callback was tapped onto a synchronous hook.
    #[error("cannot tap async callback '{tap}' onto sync hook '{hook}'")]
    AsyncTapOnSyncHook {
        /// The sync hook.
        hook: HookName,
        /// Name of the rejected tap.
        tap: String,
    },

    /// The hook was fired with a method that does not match its kind.
    #[error("hook '{hook}' is {kind} and cannot be fired with `{method}`")]
    WrongFireMethod {
        /// The hook name.
        hook: HookName,
        /// The hook's kind.
        kind: HookKind,
        /// The fire method that was used.
        method: &'static str,
    },

    /// A tap failed during a sync or series fire.
    #[error("hook '{hook}' failed in tap '{tap}': {source}")]
    TapFailed {
        /// The hook being fired.
        hook: HookName,
        /// Name of the failing tap.
        tap: String,
        /// The error the tap returned.
        source: BoxError,
    },

    /// One or more taps failed during a parallel fire.
    ///
    /// Raised only after every started tap has settled.
    #[error("{} parallel tap(s) on hook '{hook}' failed: {}", .failures.len(), join_failures(.failures))]
    ParallelFailed {
        /// The hook being fired.
        hook: HookName,
        /// Failed taps, in registration order.
        failures: Vec<TapFailure>,
    },
}

impl HookError {
    /// Returns the hook this error belongs to, if any.
    #[must_use]
    pub fn hook(&self) -> Option<HookName> {
        match self {
            HookError::ReentrantTap { hook }
            | HookError::ReentrantFire { hook }
            | HookError::KindMismatch { hook, .. }
            | HookError::AsyncTapOnSyncHook { hook, .. }
            | HookError::WrongFireMethod { hook, .. }
            | HookError::TapFailed { hook, .. }
            | HookError::ParallelFailed { hook, .. } => Some(*hook),
            HookError::UnknownHook(_) => None,
        }
    }
}

fn join_failures(failures: &[TapFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
