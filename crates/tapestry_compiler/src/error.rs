//! Error types for configuration, plugin application and the build lifecycle.

use tapestry_hooks::{BoxError, HookError};
use tapestry_loader::LoaderError;

use crate::compiler::CompilerState;

/// Errors produced while parsing or validating a [`CompilerConfig`](crate::CompilerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document could not be deserialized.
    #[error("failed to parse compiler config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration declares no entry point.
    #[error("compiler config declares no entry")]
    NoEntry,

    /// The output filename is empty.
    #[error("output filename must not be empty")]
    EmptyFilename,

    /// Several entries would be written to the same output file.
    #[error(
        "output filename '{filename}' has no [name] placeholder but {entries} entries are configured"
    )]
    MissingNamePlaceholder {
        /// The configured output filename.
        filename: String,
        /// Number of configured entries.
        entries: usize,
    },
}

/// Errors surfaced by the [`Compiler`](crate::Compiler).
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// A plugin's `apply` failed. Plugins after it were not applied.
    #[error("plugin #{index} '{name}' failed to apply: {source}")]
    PluginApply {
        /// Position of the plugin in the configured list.
        index: usize,
        /// The plugin's name.
        name: String,
        /// The error returned by `apply`.
        source: BoxError,
    },

    /// Tapping or firing a lifecycle hook failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The loader chain failed for a module.
    #[error("failed to build module '{module}': {source}")]
    Module {
        /// The module being built.
        module: String,
        /// The loader failure.
        source: LoaderError,
    },

    /// A lifecycle step was requested in a state that does not allow it.
    #[error("cannot {action} while the compiler is {from}")]
    InvalidTransition {
        /// The state the compiler was in.
        from: CompilerState,
        /// The rejected step.
        action: &'static str,
    },

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CompilerError {
    /// Returns the module the error is attributed to, if any.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        match self {
            CompilerError::Module { module, .. } => Some(module),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_apply_message_identifies_plugin() {
        let err = CompilerError::PluginApply {
            index: 1,
            name: "HelloPlugin".into(),
            source: "missing option".into(),
        };
        assert_eq!(
            err.to_string(),
            "plugin #1 'HelloPlugin' failed to apply: missing option"
        );
    }

    #[test]
    fn module_error_exposes_module_id() {
        let err = CompilerError::Module {
            module: "data.my".into(),
            source: LoaderError::Unresolved {
                loader: "my-loader".into(),
                module: "data.my".into(),
            },
        };
        assert_eq!(err.module(), Some("data.my"));
        assert!(err.to_string().starts_with("failed to build module 'data.my'"));
    }

    #[test]
    fn invalid_transition_names_state_and_action() {
        let err = CompilerError::InvalidTransition {
            from: CompilerState::Done,
            action: "start",
        };
        assert_eq!(err.to_string(), "cannot start while the compiler is done");
    }
}
