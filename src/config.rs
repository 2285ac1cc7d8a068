// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `require-cjs.json` configuration file

use anyhow::{Context, Result};
use require_cjs_core::{FilterPattern, Options, Order, ShouldTransform};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "require-cjs.json";

/// How source maps are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    /// No source map
    #[default]
    None,
    /// `data:` URL comment appended to the output
    Inline,
    /// Separate `.map` file next to the output
    File,
}

/// Settings read from `require-cjs.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Include patterns (`/regex/` or glob)
    pub include: Option<Vec<String>>,
    /// Exclude patterns (`/regex/` or glob)
    pub exclude: Option<Vec<String>>,
    /// Transform ordering hint
    pub order: Option<Order>,
    /// Specifiers that are always transformed; everything else never is
    pub should_transform: Option<Vec<String>>,
    /// Use `process.getBuiltinModule()` for Node.js built-ins
    pub builtin_node_modules: bool,
    /// Drop `import 'node:x'` statements entirely
    pub remove_builtin_side_effect_imports: bool,
    /// Cache verdicts for the run
    pub cache: bool,
    /// Output format of the build
    pub format: Option<String>,
    /// Source map emission
    pub source_map: Option<SourceMapMode>,
    /// Specifiers the build treats as external
    pub externals: Vec<String>,
}

impl Config {
    /// Load `path`, or `require-cjs.json` from the working directory when
    /// no path is given. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path, true),
            None => (Path::new(CONFIG_FILE), false),
        };
        if !required && !path.is_file() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Transform options described by this config.
    pub fn to_options(&self) -> Options {
        let patterns = |list: &Option<Vec<String>>| {
            list.as_ref()
                .map(|list| list.iter().map(|p| FilterPattern::parse(p)).collect())
        };
        Options {
            include: patterns(&self.include),
            exclude: patterns(&self.exclude),
            order: self.order.unwrap_or_default(),
            should_transform: self.should_transform.clone().map(ShouldTransform::List),
            builtin_node_modules: self.builtin_node_modules,
            remove_builtin_side_effect_imports: self.remove_builtin_side_effect_imports,
            cache: self.cache,
        }
    }
}
