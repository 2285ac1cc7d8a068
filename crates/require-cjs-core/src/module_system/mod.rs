// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Node.js module system knowledge used by the classifier
//!
//! ## Resolution
//! - ESM-style and CommonJS-style resolution from the same importer
//! - `exports` conditions, subpath patterns, `main`, index files
//!
//! ## Package metadata
//! - Nearest `package.json` lookup
//! - `package.json` "type" field
//!
//! ## Built-ins
//! - `node:` prefix and the unprefixed built-in list

mod builtins;
mod package;
mod resolver;

pub use builtins::{BUILTIN_MODULES, BUILTIN_SUBPATHS, NODE_PREFIX, builtin_accessor, is_builtin};
pub use package::{PackageJson, PackageType, find_package_json, read_package_type};
pub use resolver::{ModuleResolver, Resolve, ResolutionMode};
