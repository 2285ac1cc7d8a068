// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Pure-CommonJS classification
//!
//! An import is treated as CommonJS when the first definitive stage says
//! so:
//!
//! 1. built-in module (when enabled)
//! 2. user override
//! 3. `import` and `require` resolve to different files, or fail: no
//! 4. `.cjs`: yes; `.js`: continue; anything else: no
//! 5. nearest package.json `"type"`
//! 6. static CommonJS export lexing succeeds
//!
//! Every failure along the way means "not CommonJS"; classification never
//! returns an error.

mod lexer_gate;
mod stages;

pub use lexer_gate::{DefaultLexerFactory, LexerFactory, LexerGate};
pub use stages::{
    BuiltinStage, DivergenceStage, ExtensionStage, LexingStage, ManifestStage, Outcome,
    OverrideStage, Probe, Stage,
};

use crate::module_system::{ModuleResolver, Resolve};
use crate::options::OptionsResolved;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// A verdict together with the stage that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// `true` to rewrite into `require()`
    pub verdict: bool,
    /// Deciding stage; `None` when every stage was inconclusive
    pub stage: Option<&'static str>,
}

/// External services the classifier consults
#[derive(Clone)]
pub struct Backends {
    /// ESM-style resolution
    pub import_resolver: Arc<dyn Resolve>,
    /// CommonJS-style resolution
    pub require_resolver: Arc<dyn Resolve>,
    /// Source of the export lexer
    pub lexer_factory: Arc<dyn LexerFactory>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            import_resolver: Arc::new(ModuleResolver::import()),
            require_resolver: Arc::new(ModuleResolver::require()),
            lexer_factory: Arc::new(DefaultLexerFactory),
        }
    }
}

/// Decides whether an import targets a pure CommonJS module
pub struct Classifier {
    stages: Vec<Box<dyn Stage>>,
    gate: Arc<LexerGate>,
    cache: Option<DashMap<(String, String), Decision>>,
}

impl Classifier {
    /// Create a classifier backed by the Node.js resolvers.
    pub fn new(options: &OptionsResolved) -> Self {
        Self::with_backends(options, Backends::default())
    }

    /// Create a classifier over custom services.
    pub fn with_backends(options: &OptionsResolved, backends: Backends) -> Self {
        let gate = Arc::new(LexerGate::new(backends.lexer_factory));

        let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(6);
        if options.builtin_node_modules {
            stages.push(Box::new(BuiltinStage));
        }
        if let Some(should_transform) = &options.should_transform {
            stages.push(Box::new(OverrideStage::new(should_transform.clone())));
        }
        stages.push(Box::new(DivergenceStage::new(
            backends.import_resolver,
            backends.require_resolver,
        )));
        stages.push(Box::new(ExtensionStage));
        stages.push(Box::new(ManifestStage));
        stages.push(Box::new(LexingStage::new(gate.clone())));

        Self {
            stages,
            gate,
            cache: options.cache.then(DashMap::new),
        }
    }

    /// Initialize the lexer ahead of the first lexing stage.
    pub async fn init(&self) {
        self.gate.get().await;
    }

    /// Whether the lexer has been initialized
    pub fn is_initialized(&self) -> bool {
        self.gate.is_initialized()
    }

    /// Forget cached verdicts; called at the start of every build.
    pub fn reset_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Whether `specifier` imported from `importer` is pure CommonJS
    pub async fn classify(&self, specifier: &str, importer: &str) -> bool {
        self.explain(specifier, importer).await.verdict
    }

    /// Classify and report which stage decided.
    pub async fn explain(&self, specifier: &str, importer: &str) -> Decision {
        let key = (specifier.to_string(), importer.to_string());
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&key).map(|d| *d)) {
            trace!(specifier, importer, "cached verdict");
            return hit;
        }

        let decision = self.run_stages(specifier, importer).await;
        debug!(
            specifier,
            importer,
            verdict = decision.verdict,
            stage = decision.stage.unwrap_or("exhausted"),
            "classified"
        );

        if let Some(cache) = &self.cache {
            cache.insert(key, decision);
        }
        decision
    }

    async fn run_stages(&self, specifier: &str, importer: &str) -> Decision {
        let mut probe = Probe::new(specifier, importer);
        for stage in &self.stages {
            let outcome = stage.evaluate(&mut probe).await;
            trace!(specifier, stage = stage.name(), ?outcome);
            if let Some(verdict) = outcome.verdict() {
                return Decision {
                    verdict,
                    stage: Some(stage.name()),
                };
            }
        }
        Decision {
            verdict: false,
            stage: None,
        }
    }
}
