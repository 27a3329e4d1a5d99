//! Example plugins and loaders built with Tapestry.
//!
//! - [`HelloPlugin`] taps `run` and `compile`, showing a sync tap next to an
//!   async one the compiler waits for.
//! - [`CssLoader`] and [`StyleLoader`] form a two-stage rule that shows loaders
//!   running right to left.
//!
//! The `demo` binary wires both into a build together with the built-in
//! JSON data loader.

mod hello_plugin;
mod style_loaders;

pub use hello_plugin::{HelloOptions, HelloPlugin};
pub use style_loaders::{CssLoader, StyleLoader};
