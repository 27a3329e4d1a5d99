//! Events passed to lifecycle hook taps.
//!
//! Every hook a [`Compiler`](crate::Compiler) fires receives a [`BuildEvent`].
//! The variant always matches the hook being fired, so taps can destructure
//! the variant they expect and ignore the rest.

use core::fmt;
use core::time::Duration;

use tapestry_hooks::HookName;

// ─────────────────────────────────────────────────────────────────────────────
// BuildId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier of one build.
///
/// Build IDs are generated using nanoid and attached to every event and log
/// record of the build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildId(String);

impl BuildId {
    /// Creates a new build ID with a unique nanoid.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build_{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BuildStats
// ─────────────────────────────────────────────────────────────────────────────

/// Summary of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStats {
    /// The build this summary belongs to.
    pub build_id: BuildId,
    /// Number of modules built.
    pub modules: usize,
    /// Number of modules whose loaders produced no value.
    pub undefined_exports: usize,
    /// Time from `start` to the end of emission.
    pub duration: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// BuildEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Payload handed to lifecycle hook taps.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// Fired on `run` when the build starts.
    Run {
        /// The build being started.
        build_id: BuildId,
    },

    /// Fired on `compile` before modules are built.
    Compile {
        /// The build.
        build_id: BuildId,
        /// Number of modules registered so far.
        module_count: usize,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Module Events
    // ─────────────────────────────────────────────────────────────────────────
    /// Fired on `make` before any module is transformed.
    Make {
        /// The build.
        build_id: BuildId,
        /// Module ids in build order.
        modules: Vec<String>,
    },

    /// Fired on `buildModule` right before a module's loaders run.
    BuildModule {
        /// The build.
        build_id: BuildId,
        /// The module about to be transformed.
        module: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Terminal Events
    // ─────────────────────────────────────────────────────────────────────────
    /// Fired on `emit` once every module is built.
    Emit {
        /// The build.
        build_id: BuildId,
        /// Ids of the emitted modules.
        modules: Vec<String>,
    },

    /// Fired on `done` after emission.
    Done {
        /// Summary of the build.
        stats: BuildStats,
    },

    /// Fired on `failed` when any step surfaces an error.
    Failed {
        /// The build.
        build_id: BuildId,
        /// The error message.
        error: String,
    },
}

impl BuildEvent {
    /// Returns the hook this event is fired on.
    #[must_use]
    pub fn hook_name(&self) -> HookName {
        match self {
            BuildEvent::Run { .. } => HookName::Run,
            BuildEvent::Compile { .. } => HookName::Compile,
            BuildEvent::Make { .. } => HookName::Make,
            BuildEvent::BuildModule { .. } => HookName::BuildModule,
            BuildEvent::Emit { .. } => HookName::Emit,
            BuildEvent::Done { .. } => HookName::Done,
            BuildEvent::Failed { .. } => HookName::Failed,
        }
    }

    /// Returns the build the event belongs to.
    #[must_use]
    pub fn build_id(&self) -> &BuildId {
        match self {
            BuildEvent::Run { build_id }
            | BuildEvent::Compile { build_id, .. }
            | BuildEvent::Make { build_id, .. }
            | BuildEvent::BuildModule { build_id, .. }
            | BuildEvent::Emit { build_id, .. }
            | BuildEvent::Failed { build_id, .. } => build_id,
            BuildEvent::Done { stats } => &stats.build_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_ids_are_unique() {
        assert_ne!(BuildId::new(), BuildId::new());
        assert!(BuildId::new().to_string().starts_with("build_"));
    }

    #[test]
    fn events_map_to_their_hooks() {
        let build_id = BuildId::new();
        let event = BuildEvent::BuildModule {
            build_id: build_id.clone(),
            module: "a.my".into(),
        };
        assert_eq!(event.hook_name(), HookName::BuildModule);
        assert_eq!(event.build_id(), &build_id);

        let done = BuildEvent::Done {
            stats: BuildStats {
                build_id: build_id.clone(),
                modules: 0,
                undefined_exports: 0,
                duration: Duration::ZERO,
            },
        };
        assert_eq!(done.hook_name(), HookName::Done);
        assert_eq!(done.build_id(), &build_id);
    }
}
