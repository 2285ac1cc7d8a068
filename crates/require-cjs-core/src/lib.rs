// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # require-cjs-core
//!
//! Lets an ES module bundle load CommonJS dependencies through plain
//! `require()` instead of a synthetic interop shim.
//!
//! For every static import of a module being transformed, the crate
//! decides whether the target is pure CommonJS:
//!
//! - Node.js built-ins (optional fast path via `process.getBuiltinModule`)
//! - user overrides (`should_transform`)
//! - `import` and `require` resolution must agree on the same file
//! - `.cjs` / `.js` extension, then the nearest package.json `"type"`
//! - static CommonJS export lexing as a last resort
//!
//! and, if so, rewrites the declaration into equivalent `const` bindings.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use require_cjs_core::{HostResolution, Options, RequireCjs};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let plugin = RequireCjs::new(Options::default())?;
//!     plugin.check_output_format("es")?;
//!     plugin.build_start().await;
//!
//!     let host = |_: &str, _: &str| -> Option<HostResolution> { None };
//!     let code = "import * as ts from 'typescript';";
//!     if let Some(out) = plugin.transform(code, "/project/src/index.ts", &host).await? {
//!         println!("{}", out.code);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classifier;
pub mod edit;
pub mod error;
pub mod module_system;
pub mod options;
pub mod plugin;
pub mod rewriter;
pub mod sourcemap;

// Re-exports
pub use classifier::{Backends, Classifier, Decision};
pub use error::{RequireCjsError, Result};
pub use options::{FilterPattern, Options, OptionsResolved, Order, ShouldTransform, TransformPredicate};
pub use plugin::{HostResolution, HostResolver, PLUGIN_NAME, RequireCjs, TransformOutput};
pub use sourcemap::SourceMap;
