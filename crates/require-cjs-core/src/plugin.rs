// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The transform driver a build host calls into

use crate::classifier::{Backends, Classifier};
use crate::edit::EditBuffer;
use crate::error::{RequireCjsError, Result};
use crate::module_system::is_builtin;
use crate::options::{Options, OptionsResolved, Order};
use crate::rewriter::{RequireExpr, rewrite};
use crate::sourcemap::SourceMap;
use async_trait::async_trait;
use require_cjs_lexer::{ImportDeclaration, parse_imports};
use tracing::{debug, trace};

/// Name reported to the host
pub const PLUGIN_NAME: &str = "require-cjs";

/// Output formats the transform is meaningful for
pub const ESM_FORMATS: &[&str] = &["es", "esm", "module"];

/// What the host's own resolver made of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResolution {
    /// Resolved module id
    pub id: String,
    /// `false` when the module is part of the current build
    pub external: bool,
}

/// The host's module resolution
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `specifier` from `importer`; `None` when the host cannot.
    async fn resolve(&self, specifier: &str, importer: &str) -> Option<HostResolution>;
}

#[async_trait]
impl<F> HostResolver for F
where
    F: Fn(&str, &str) -> Option<HostResolution> + Send + Sync,
{
    async fn resolve(&self, specifier: &str, importer: &str) -> Option<HostResolution> {
        self(specifier, importer)
    }
}

/// Rewritten module
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// New source text
    pub code: String,
    /// Mapping back to the original text
    pub map: SourceMap,
}

/// Rewrites imports of pure CommonJS modules into `require()` bindings
pub struct RequireCjs {
    options: OptionsResolved,
    classifier: Classifier,
}

impl RequireCjs {
    /// Create the transform, compiling its filters.
    pub fn new(options: Options) -> Result<Self> {
        Self::with_backends(options, Backends::default())
    }

    /// Create the transform over custom resolution and lexing services.
    pub fn with_backends(options: Options, backends: Backends) -> Result<Self> {
        let options = options.resolve()?;
        let classifier = Classifier::with_backends(&options, backends);
        Ok(Self {
            options,
            classifier,
        })
    }

    /// Name reported to the host
    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    /// Ordering hint
    pub fn order(&self) -> Order {
        self.options.order
    }

    /// Normalized options
    pub fn options(&self) -> &OptionsResolved {
        &self.options
    }

    /// The classifier used for every import
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Build-start hook: initialize the lexer and drop cached verdicts.
    pub async fn build_start(&self) {
        self.classifier.reset_cache();
        self.classifier.init().await;
    }

    /// Reject output formats other than ES modules.
    pub fn check_output_format(&self, format: &str) -> Result<()> {
        if ESM_FORMATS.contains(&format) {
            Ok(())
        } else {
            Err(RequireCjsError::config(format!(
                "{PLUGIN_NAME} is only necessary for ESM output (got format '{format}')"
            )))
        }
    }

    /// Whether the module `id` should be visited at all
    pub fn filter(&self, id: &str) -> bool {
        self.options.filter.matches(id)
    }

    /// Rewrite the CommonJS imports of module `id`.
    ///
    /// Returns `None` when the module is filtered out or nothing changed.
    pub async fn transform(
        &self,
        code: &str,
        id: &str,
        host: &dyn HostResolver,
    ) -> Result<Option<TransformOutput>> {
        if !self.filter(id) {
            trace!(id, "filtered out");
            return Ok(None);
        }

        let declarations = parse_imports(code, id).map_err(|source| RequireCjsError::Parse {
            id: id.to_string(),
            source,
        })?;

        let mut buffer = EditBuffer::new(code);
        let mut rewritten = 0usize;
        for decl in &declarations {
            if !decl.has_runtime_effect() {
                continue;
            }
            let Some(replacement) = self.replacement(decl, &buffer, id, host).await? else {
                continue;
            };
            if !buffer.overwrite(decl.span, replacement) {
                return Err(self.rewrite_error(id, decl, "overlapping declarations"));
            }
            rewritten += 1;
        }

        if !buffer.has_changed() {
            return Ok(None);
        }
        debug!(id, rewritten, "rewrote CommonJS imports");
        let (code, map) = buffer.finish(id);
        Ok(Some(TransformOutput { code, map }))
    }

    /// Replacement text for one declaration, or `None` to keep it.
    async fn replacement(
        &self,
        decl: &ImportDeclaration,
        buffer: &EditBuffer<'_>,
        id: &str,
        host: &dyn HostResolver,
    ) -> Result<Option<String>> {
        let specifier = decl.source.value.as_str();
        let quoted = buffer.slice(decl.source.span);

        let require = if self.options.builtin_node_modules && is_builtin(specifier) {
            if decl.is_side_effect_only() && self.options.remove_builtin_side_effect_imports {
                return Ok(Some(String::new()));
            }
            RequireExpr::builtin(quoted)
        } else {
            if let Some(resolution) = host.resolve(specifier, id).await {
                if !resolution.external {
                    trace!(specifier, resolved = %resolution.id, "part of the build");
                    return Ok(None);
                }
            }
            if !self.classifier.classify(specifier, id).await {
                return Ok(None);
            }
            RequireExpr::require(quoted)
        };

        rewrite(decl, buffer.source(), &require)
            .map(Some)
            .map_err(|err| self.rewrite_error(id, decl, &err.to_string()))
    }

    fn rewrite_error(&self, id: &str, decl: &ImportDeclaration, reason: &str) -> RequireCjsError {
        RequireCjsError::Rewrite {
            id: id.to_string(),
            specifier: decl.source.value.clone(),
            reason: reason.to_string(),
        }
    }
}
