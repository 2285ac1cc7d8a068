// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Classification stages, evaluated in order

use super::lexer_gate::LexerGate;
use crate::module_system::{PackageType, Resolve, find_package_json, is_builtin, read_package_type};
use crate::error::RequireCjsError;
use crate::options::ShouldTransform;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Definitely pure CommonJS
    CommonJs,
    /// Definitely not (or not safely) CommonJS
    NotCommonJs,
    /// Defer to the next stage
    Inconclusive,
}

impl Outcome {
    /// The verdict, if definitive
    pub fn verdict(self) -> Option<bool> {
        match self {
            Outcome::CommonJs => Some(true),
            Outcome::NotCommonJs => Some(false),
            Outcome::Inconclusive => None,
        }
    }
}

impl From<bool> for Outcome {
    fn from(verdict: bool) -> Self {
        if verdict {
            Outcome::CommonJs
        } else {
            Outcome::NotCommonJs
        }
    }
}

/// The import under classification, plus what earlier stages learned
#[derive(Debug, Clone)]
pub struct Probe<'a> {
    /// Import specifier as written
    pub specifier: &'a str,
    /// Path of the importing file
    pub importer: &'a str,
    /// File both resolution strategies agree on
    pub resolved: Option<PathBuf>,
}

impl<'a> Probe<'a> {
    /// Start classifying `specifier` imported from `importer`.
    pub fn new(specifier: &'a str, importer: &'a str) -> Self {
        Self {
            specifier,
            importer,
            resolved: None,
        }
    }
}

/// One signal in the classification chain
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Inspect the probe; never fails.
    async fn evaluate(&self, probe: &mut Probe<'_>) -> Outcome;
}

/// Built-in modules are always synchronously requirable.
pub struct BuiltinStage;

#[async_trait]
impl Stage for BuiltinStage {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn evaluate(&self, probe: &mut Probe<'_>) -> Outcome {
        if is_builtin(probe.specifier) {
            Outcome::CommonJs
        } else {
            Outcome::Inconclusive
        }
    }
}

/// User override (`shouldTransform`)
pub struct OverrideStage {
    should_transform: ShouldTransform,
}

impl OverrideStage {
    /// Wrap the user's override.
    pub fn new(should_transform: ShouldTransform) -> Self {
        Self { should_transform }
    }
}

#[async_trait]
impl Stage for OverrideStage {
    fn name(&self) -> &'static str {
        "override"
    }

    async fn evaluate(&self, probe: &mut Probe<'_>) -> Outcome {
        self.should_transform
            .decide(probe.specifier, probe.importer)
            .await
            .map_or(Outcome::Inconclusive, Outcome::from)
    }
}

/// Both module systems must load the very same file.
pub struct DivergenceStage {
    import: Arc<dyn Resolve>,
    require: Arc<dyn Resolve>,
}

impl DivergenceStage {
    /// Compare `import` resolution against `require` resolution.
    pub fn new(import: Arc<dyn Resolve>, require: Arc<dyn Resolve>) -> Self {
        Self { import, require }
    }
}

#[async_trait]
impl Stage for DivergenceStage {
    fn name(&self) -> &'static str {
        "divergence"
    }

    async fn evaluate(&self, probe: &mut Probe<'_>) -> Outcome {
        // Resolution probes the filesystem synchronously
        let (import, require) = (self.import.clone(), self.require.clone());
        let specifier = probe.specifier.to_string();
        let importer = PathBuf::from(probe.importer);
        let resolved = tokio::task::spawn_blocking(move || {
            let esm = import.resolve(&specifier, &importer)?;
            let cjs = require.resolve(&specifier, &importer)?;
            Ok::<_, RequireCjsError>((esm, cjs))
        })
        .await;
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(specifier = probe.specifier, error = %err, "resolution task failed");
                return Outcome::NotCommonJs;
            }
        };

        match resolved {
            Ok((esm, cjs)) if esm == cjs => {
                probe.resolved = Some(esm);
                Outcome::Inconclusive
            }
            Ok((esm, cjs)) => {
                debug!(
                    specifier = probe.specifier,
                    import = %esm.display(),
                    require = %cjs.display(),
                    "resolution diverges"
                );
                Outcome::NotCommonJs
            }
            Err(err) => {
                debug!(specifier = probe.specifier, error = %err, "unresolvable");
                Outcome::NotCommonJs
            }
        }
    }
}

/// `.cjs` is CommonJS, `.js` needs a closer look, anything else is not.
pub struct ExtensionStage;

#[async_trait]
impl Stage for ExtensionStage {
    fn name(&self) -> &'static str {
        "extension"
    }

    async fn evaluate(&self, probe: &mut Probe<'_>) -> Outcome {
        let Some(resolved) = &probe.resolved else {
            return Outcome::Inconclusive;
        };
        match resolved.extension().and_then(|e| e.to_str()) {
            Some("cjs") => Outcome::CommonJs,
            Some("js") => Outcome::Inconclusive,
            _ => Outcome::NotCommonJs,
        }
    }
}

/// Nearest package.json `"type"`
pub struct ManifestStage;

#[async_trait]
impl Stage for ManifestStage {
    fn name(&self) -> &'static str {
        "manifest"
    }

    async fn evaluate(&self, probe: &mut Probe<'_>) -> Outcome {
        let Some(resolved) = &probe.resolved else {
            return Outcome::Inconclusive;
        };
        let Some(manifest) = find_package_json(resolved).await else {
            return Outcome::Inconclusive;
        };
        match read_package_type(&manifest).await {
            Ok(Some(PackageType::Module)) => Outcome::NotCommonJs,
            Ok(Some(PackageType::CommonJs)) => Outcome::CommonJs,
            Ok(None) => Outcome::Inconclusive,
            Err(err) => {
                warn!(manifest = %manifest.display(), error = %err, "cannot read package.json");
                Outcome::NotCommonJs
            }
        }
    }
}

/// Static CommonJS export analysis of the resolved file
pub struct LexingStage {
    gate: Arc<LexerGate>,
}

impl LexingStage {
    /// Lex through the shared gate.
    pub fn new(gate: Arc<LexerGate>) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl Stage for LexingStage {
    fn name(&self) -> &'static str {
        "lexing"
    }

    async fn evaluate(&self, probe: &mut Probe<'_>) -> Outcome {
        let Some(resolved) = &probe.resolved else {
            return Outcome::Inconclusive;
        };
        let source = match tokio::fs::read_to_string(resolved).await {
            Ok(source) => source,
            Err(err) => {
                warn!(path = %resolved.display(), error = %err, "cannot read module");
                return Outcome::NotCommonJs;
            }
        };
        match self.gate.get().await.parse(&source) {
            Ok(_) => Outcome::CommonJs,
            Err(err) => {
                debug!(path = %resolved.display(), error = %err, "not lexable as CommonJS");
                Outcome::NotCommonJs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use std::path::Path;
    use std::fs;
    use tempfile::tempdir;

    struct Fixed(Option<PathBuf>);

    impl Resolve for Fixed {
        fn resolve(&self, specifier: &str, _importer: &Path) -> Result<PathBuf> {
            self.0
                .clone()
                .ok_or_else(|| RequireCjsError::module_not_found(specifier))
        }
    }

    fn resolved(path: &Path) -> Probe<'static> {
        let mut probe = Probe::new("pkg", "/src/index.ts");
        probe.resolved = Some(path.to_path_buf());
        probe
    }

    #[tokio::test]
    async fn test_divergence() {
        let a = Arc::new(Fixed(Some(PathBuf::from("/nm/pkg/index.mjs"))));
        let b = Arc::new(Fixed(Some(PathBuf::from("/nm/pkg/index.cjs"))));
        let none = Arc::new(Fixed(None));

        let mut probe = Probe::new("pkg", "/src/index.ts");
        let stage = DivergenceStage::new(a.clone(), b);
        assert_eq!(stage.evaluate(&mut probe).await, Outcome::NotCommonJs);

        let stage = DivergenceStage::new(a.clone(), none.clone());
        assert_eq!(stage.evaluate(&mut probe).await, Outcome::NotCommonJs);

        let stage = DivergenceStage::new(none, a.clone());
        assert_eq!(stage.evaluate(&mut probe).await, Outcome::NotCommonJs);
        assert_eq!(probe.resolved, None);

        let stage = DivergenceStage::new(a.clone(), a);
        assert_eq!(stage.evaluate(&mut probe).await, Outcome::Inconclusive);
        assert_eq!(probe.resolved, Some(PathBuf::from("/nm/pkg/index.mjs")));
    }

    /// Records the thread each resolution runs on
    #[derive(Default)]
    struct ThreadRecorder {
        threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl Resolve for ThreadRecorder {
        fn resolve(&self, _specifier: &str, _importer: &Path) -> Result<PathBuf> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            Ok(PathBuf::from("/nm/pkg/index.js"))
        }
    }

    #[tokio::test]
    async fn test_divergence_resolves_on_blocking_pool() {
        let recorder = Arc::new(ThreadRecorder::default());
        let stage = DivergenceStage::new(recorder.clone(), recorder.clone());
        let mut probe = Probe::new("pkg", "/src/index.ts");
        assert_eq!(stage.evaluate(&mut probe).await, Outcome::Inconclusive);

        let threads = recorder.threads.lock().unwrap();
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|id| *id != std::thread::current().id()));
    }

    #[tokio::test]
    async fn test_extension() {
        let stage = ExtensionStage;
        let cases = [
            ("/x/a.cjs", Outcome::CommonJs),
            ("/x/a.js", Outcome::Inconclusive),
            ("/x/a.mjs", Outcome::NotCommonJs),
            ("/x/a.json", Outcome::NotCommonJs),
            ("/x/a.node", Outcome::NotCommonJs),
        ];
        for (path, expected) in cases {
            assert_eq!(stage.evaluate(&mut resolved(Path::new(path))).await, expected, "{path}");
        }
    }

    #[tokio::test]
    async fn test_manifest() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let file = root.join("lib/index.js");
        fs::create_dir_all(root.join("lib")).unwrap();
        fs::write(&file, "").unwrap();

        let stage = ManifestStage;
        assert_eq!(stage.evaluate(&mut resolved(&file)).await, Outcome::Inconclusive);

        let manifest = root.join("package.json");
        for (content, expected) in [
            (r#"{"type":"module"}"#, Outcome::NotCommonJs),
            (r#"{"type":"commonjs"}"#, Outcome::CommonJs),
            (r#"{"name":"silent"}"#, Outcome::Inconclusive),
            ("{ broken", Outcome::Inconclusive),
        ] {
            fs::write(&manifest, content).unwrap();
            assert_eq!(stage.evaluate(&mut resolved(&file)).await, expected, "{content}");
        }
    }

    #[tokio::test]
    async fn test_lexing() {
        let dir = tempdir().unwrap();
        let cjs = dir.path().join("cjs.js");
        let esm = dir.path().join("esm.js");
        fs::write(&cjs, "exports.a = 1;").unwrap();
        fs::write(&esm, "export const a = 1;").unwrap();

        let stage = LexingStage::new(Arc::new(LexerGate::default()));
        assert_eq!(stage.evaluate(&mut resolved(&cjs)).await, Outcome::CommonJs);
        assert_eq!(stage.evaluate(&mut resolved(&esm)).await, Outcome::NotCommonJs);

        let missing = dir.path().join("missing.js");
        assert_eq!(stage.evaluate(&mut resolved(&missing)).await, Outcome::NotCommonJs);
    }

    #[tokio::test]
    async fn test_override_and_builtin() {
        let stage = OverrideStage::new(ShouldTransform::List(vec!["pkg".into()]));
        assert_eq!(stage.evaluate(&mut Probe::new("pkg", "/a.ts")).await, Outcome::CommonJs);
        assert_eq!(stage.evaluate(&mut Probe::new("other", "/a.ts")).await, Outcome::NotCommonJs);

        let stage = OverrideStage::new(ShouldTransform::predicate(|_: &str, _: &str| None));
        assert_eq!(stage.evaluate(&mut Probe::new("pkg", "/a.ts")).await, Outcome::Inconclusive);

        assert_eq!(BuiltinStage.evaluate(&mut Probe::new("node:fs", "/a.ts")).await, Outcome::CommonJs);
        assert_eq!(BuiltinStage.evaluate(&mut Probe::new("fs-extra", "/a.ts")).await, Outcome::Inconclusive);
    }
}
