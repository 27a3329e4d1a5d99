//! Built-in loaders.

mod json_data;

pub use json_data::JsonDataLoader;
