//! Demo build.
//!
//! Builds the bundled templates with three rules in play:
//!
//! - `.my` files go through the built-in `json-data-loader` with
//!   `{"age": 12}` as options; a non-200 payload exports `undefined`.
//! - `.css` files go through `style-loader` and `css-loader`, right to left.
//! - Everything else passes through unchanged.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run -p example --bin demo
//! ```

use example::{CssLoader, HelloOptions, HelloPlugin, StyleLoader};
use tapestry_compiler::{Compiler, CompilerConfig};
use tapestry_core_plugins::{TracingFormat, TracingPlugin};
use tapestry_loader::LoaderRegistry;

const CONFIG: &str = r#"{
    "mode": "development",
    "entry": {
        "index": "templates/index.js",
        "utils": "templates/utils.js"
    },
    "output": { "path": "dist", "filename": "[name].bundle.js" },
    "module": {
        "rules": [
            { "test": "\\.css$", "use": ["style-loader", "css-loader"] },
            { "test": "\\.my$", "use": [{ "loader": "json-data-loader", "options": { "age": 12 } }] }
        ]
    }
}"#;

const TEMPLATES: [(&str, &str); 5] = [
    ("templates/index.js", include_str!("../templates/index.js")),
    ("templates/utils.js", include_str!("../templates/utils.js")),
    ("templates/list.my", include_str!("../templates/list.my")),
    ("templates/missing.my", include_str!("../templates/missing.my")),
    ("templates/style.css", include_str!("../templates/style.css")),
];

#[tokio::main]
async fn main() {
    let config = match CompilerConfig::from_json(CONFIG) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut loaders = LoaderRegistry::with_builtins();
    loaders
        .register("css-loader", CssLoader)
        .register("style-loader", StyleLoader);

    let mut compiler = match Compiler::new(config, loaders) {
        Ok(compiler) => compiler,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    compiler
        .add_plugin(TracingPlugin::default().with_format(TracingFormat::Compact))
        .add_plugin(HelloPlugin::new(HelloOptions { flag: true }));

    for (id, source) in TEMPLATES {
        if let Err(e) = compiler.add_module(id, source) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    match compiler.run().await {
        Ok(output) => {
            for (filename, entry) in &output.assets {
                tracing::info!(filename = %filename, entry = %entry, "asset");
            }
            for (id, module) in &output.modules {
                tracing::info!(module = %id, source = %module.as_source(), "module");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
