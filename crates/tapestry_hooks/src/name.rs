//! The closed set of lifecycle hook names.
//!
//! Every hook a plugin can tap is named by a [`HookName`] variant. The set is
//! fixed at compile time so an unknown name is rejected when it is parsed,
//! not silently created as an orphan hook nobody fires.

use core::fmt;
use core::str::FromStr;

use crate::error::HookError;
use crate::hook::HookKind;

/// Identifier for a lifecycle hook.
///
/// # Example
///
/// ```
/// use tapestry_hooks::{HookKind, HookName};
///
/// let name: HookName = "compile".parse().unwrap();
/// assert_eq!(name, HookName::Compile);
/// assert_eq!(name.default_kind(), HookKind::AsyncSeries);
/// assert!("seal".parse::<HookName>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookName {
    /// A build is starting.
    Run,
    /// Compilation is about to begin.
    Compile,
    /// Module processing is about to begin.
    Make,
    /// A single module is about to be transformed.
    BuildModule,
    /// Transformed modules are about to be emitted.
    Emit,
    /// The build finished successfully.
    Done,
    /// The build failed.
    Failed,
}

impl HookName {
    /// All hook names, in lifecycle order.
    pub const ALL: [HookName; 7] = [
        HookName::Run,
        HookName::Compile,
        HookName::Make,
        HookName::BuildModule,
        HookName::Emit,
        HookName::Done,
        HookName::Failed,
    ];

    /// Returns the name plugins use to refer to this hook.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookName::Run => "run",
            HookName::Compile => "compile",
            HookName::Make => "make",
            HookName::BuildModule => "buildModule",
            HookName::Emit => "emit",
            HookName::Done => "done",
            HookName::Failed => "failed",
        }
    }

    /// Returns the kind the compiler fires this hook with.
    #[must_use]
    pub fn default_kind(self) -> HookKind {
        match self {
            HookName::Run | HookName::Compile | HookName::Emit | HookName::Done => {
                HookKind::AsyncSeries
            }
            HookName::Make => HookKind::AsyncParallel,
            HookName::BuildModule | HookName::Failed => HookKind::Sync,
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| HookError::UnknownHook(s.to_owned()))
    }
}
