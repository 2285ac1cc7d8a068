// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution (Node.js algorithm)
//!
//! The same algorithm serves both module systems; only the `exports`
//! conditions and the probed extensions differ between
//! [`ResolutionMode::Import`] and [`ResolutionMode::Require`].

use super::builtins::is_builtin;
use super::package::PackageJson;
use crate::error::{RequireCjsError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Which module system a resolution is performed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionMode {
    /// `import` statements (ESM)
    Import,
    /// `require()` calls (CommonJS)
    Require,
}

impl ResolutionMode {
    /// Conditions matched against a package's `exports`, in priority order.
    pub fn conditions(self) -> &'static [&'static str] {
        match self {
            ResolutionMode::Import => &["import", "node", "default"],
            ResolutionMode::Require => &["require", "node", "default"],
        }
    }

    /// Extensions probed for extensionless file specifiers.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ResolutionMode::Import => &[".mjs", ".cjs", ".js", ".json"],
            ResolutionMode::Require => &[".js", ".json", ".node"],
        }
    }
}

/// A strategy mapping `(specifier, importer)` to an absolute file path.
///
/// Implementations may block on the filesystem; async callers run them on
/// tokio's blocking pool.
pub trait Resolve: Send + Sync {
    /// Resolve `specifier` as imported from the file `importer`.
    fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf>;
}

/// Module resolver implementing the Node.js resolution algorithm
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    mode: ResolutionMode,
}

impl ModuleResolver {
    /// Create a resolver for the given module system
    pub fn new(mode: ResolutionMode) -> Self {
        Self { mode }
    }

    /// ESM-style resolver
    pub fn import() -> Self {
        Self::new(ResolutionMode::Import)
    }

    /// CommonJS-style resolver
    pub fn require() -> Self {
        Self::new(ResolutionMode::Require)
    }

    /// The module system this resolver serves
    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Resolve a file path
    fn resolve_file(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(canonical(path));
        }

        // Extensions are appended, never substituted: `./a.min` probes `./a.min.js`
        for ext in self.mode.extensions() {
            let mut candidate = path.as_os_str().to_owned();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Some(canonical(&candidate));
            }
        }

        if path.is_dir() {
            return self.resolve_directory(path);
        }

        None
    }

    /// Resolve a directory (package.json main, then index files)
    fn resolve_directory(&self, dir: &Path) -> Option<PathBuf> {
        let package_json_path = dir.join("package.json");
        if package_json_path.is_file() {
            if let Ok(pkg) = PackageJson::read(&package_json_path) {
                if let Some(main) = pkg.main.as_deref() {
                    let main_path = dir.join(main);
                    let found = if main_path.is_dir() {
                        self.index_file(&main_path)
                    } else {
                        self.resolve_file(&main_path)
                    };
                    if found.is_some() {
                        return found;
                    }
                }
            }
        }

        self.index_file(dir)
    }

    fn index_file(&self, dir: &Path) -> Option<PathBuf> {
        self.mode
            .extensions()
            .iter()
            .map(|ext| dir.join(format!("index{ext}")))
            .find(|index| index.is_file())
            .map(|index| canonical(&index))
    }

    /// Resolve a module from node_modules
    fn resolve_node_modules(&self, specifier: &str, parent_dir: &Path) -> Result<PathBuf> {
        let (package_name, subpath) = parse_package_specifier(specifier);

        for dir in parent_dir.ancestors() {
            if dir.file_name().is_some_and(|name| name == "node_modules") {
                continue;
            }
            let package_dir = dir.join("node_modules").join(package_name);
            if !package_dir.is_dir() {
                continue;
            }
            trace!(specifier, package = %package_dir.display(), "found package");
            return self.resolve_package(specifier, &package_dir, subpath);
        }

        Err(RequireCjsError::module_not_found(specifier))
    }

    /// Resolve inside a located package directory.
    fn resolve_package(
        &self,
        specifier: &str,
        package_dir: &Path,
        subpath: Option<&str>,
    ) -> Result<PathBuf> {
        let manifest = package_dir.join("package.json");
        let pkg = if manifest.is_file() {
            Some(PackageJson::read(&manifest)?)
        } else {
            None
        };

        if let Some(exports) = pkg.as_ref().and_then(|pkg| pkg.exports.as_ref()) {
            let key = match subpath {
                Some(sub) => format!("./{sub}"),
                None => ".".to_string(),
            };
            let target = self.resolve_exports(exports, &key).ok_or_else(|| {
                RequireCjsError::resolution(
                    specifier,
                    format!("subpath '{key}' is not exported under {:?}", self.mode),
                )
            })?;
            let path = package_dir.join(target);
            return if path.is_file() {
                Ok(canonical(&path))
            } else {
                Err(RequireCjsError::module_not_found(specifier))
            };
        }

        let found = match subpath {
            Some(sub) => self.resolve_file(&package_dir.join(sub)),
            None => self.resolve_directory(package_dir),
        };
        found.ok_or_else(|| RequireCjsError::module_not_found(specifier))
    }

    /// Match `subpath` (`.` or `./x`) against an `exports` field.
    fn resolve_exports(&self, exports: &Value, subpath: &str) -> Option<String> {
        let subpath_map = match exports {
            Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => map,
            // Sugar for `{ ".": exports }`
            _ => {
                return if subpath == "." {
                    self.resolve_target(exports, None)
                } else {
                    None
                };
            }
        };

        if let Some(target) = subpath_map.get(subpath) {
            return self.resolve_target(target, None);
        }

        // Longest matching `*` pattern wins
        let mut best: Option<(&str, &str, &Value)> = None;
        for (key, target) in subpath_map {
            let Some((prefix, suffix)) = key.split_once('*') else {
                continue;
            };
            if subpath.len() >= prefix.len() + suffix.len()
                && subpath.starts_with(prefix)
                && subpath.ends_with(suffix)
                && best.is_none_or(|(p, _, _)| prefix.len() > p.len())
            {
                let capture = &subpath[prefix.len()..subpath.len() - suffix.len()];
                best = Some((prefix, capture, target));
            }
        }
        best.and_then(|(_, capture, target)| self.resolve_target(target, Some(capture)))
    }

    fn resolve_target(&self, target: &Value, capture: Option<&str>) -> Option<String> {
        match target {
            Value::String(path) if path.starts_with("./") => Some(match capture {
                Some(capture) => path.replace('*', capture),
                None => path.clone(),
            }),
            Value::Array(alternatives) => alternatives
                .iter()
                .find_map(|alt| self.resolve_target(alt, capture)),
            Value::Object(conditions) => conditions
                .iter()
                .filter(|(condition, _)| self.mode.conditions().contains(&condition.as_str()))
                .find_map(|(_, value)| self.resolve_target(value, capture)),
            _ => None,
        }
    }
}

impl Resolve for ModuleResolver {
    fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf> {
        if is_builtin(specifier) {
            return Err(RequireCjsError::resolution(
                specifier,
                "built-in modules do not resolve to files",
            ));
        }

        let parent_dir = importer.parent().unwrap_or(Path::new("."));

        if is_path_specifier(specifier) {
            let path = parent_dir.join(specifier);
            return self
                .resolve_file(&path)
                .ok_or_else(|| RequireCjsError::module_not_found(specifier));
        }

        if specifier.starts_with('#') {
            return Err(RequireCjsError::resolution(
                specifier,
                "package imports are not supported",
            ));
        }

        self.resolve_node_modules(specifier, parent_dir)
    }
}

fn is_path_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute()
}

/// Parse a package specifier into name and optional subpath
fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let name_end = if specifier.starts_with('@') {
        // Scoped package: @scope/name or @scope/name/subpath
        specifier
            .match_indices('/')
            .nth(1)
            .map(|(pos, _)| pos)
    } else {
        specifier.find('/')
    };
    match name_end {
        Some(end) => (&specifier[..end], Some(&specifier[end + 1..])),
        None => (specifier, None),
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "src/index.ts", "");
        write(root, "src/util.js", "");
        write(root, "src/lib/index.js", "");
        write(
            root,
            "node_modules/plain/package.json",
            r#"{"name":"plain","main":"lib/main"}"#,
        );
        write(root, "node_modules/plain/lib/main.js", "");
        write(root, "node_modules/plain/extra.js", "");
        write(
            root,
            "node_modules/dual/package.json",
            r#"{
                "name": "dual",
                "exports": {
                    ".": { "import": "./esm/index.mjs", "require": "./cjs/index.cjs" },
                    "./shared": "./shared.js",
                    "./features/*": { "node": "./features/*.js" },
                    "./package.json": "./package.json"
                }
            }"#,
        );
        write(root, "node_modules/dual/esm/index.mjs", "");
        write(root, "node_modules/dual/cjs/index.cjs", "");
        write(root, "node_modules/dual/shared.js", "");
        write(root, "node_modules/dual/features/a.js", "");
        write(
            root,
            "node_modules/@scope/pkg/package.json",
            r#"{"exports":"./entry.js"}"#,
        );
        write(root, "node_modules/@scope/pkg/entry.js", "");
        dir
    }

    fn both(specifier: &str, importer: &Path) -> (Result<PathBuf>, Result<PathBuf>) {
        (
            ModuleResolver::import().resolve(specifier, importer),
            ModuleResolver::require().resolve(specifier, importer),
        )
    }

    #[test]
    fn test_parse_package_specifier() {
        assert_eq!(parse_package_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_package_specifier("lodash/get"), ("lodash", Some("get")));
        assert_eq!(parse_package_specifier("@types/node"), ("@types/node", None));
        assert_eq!(
            parse_package_specifier("@babel/core/lib/index"),
            ("@babel/core", Some("lib/index"))
        );
    }

    #[test]
    fn test_relative_with_probing() {
        let dir = project();
        let root = dir.path().canonicalize().unwrap();
        let importer = root.join("src/index.ts");

        let (esm, cjs) = both("./util", &importer);
        assert_eq!(esm.unwrap(), root.join("src/util.js"));
        assert_eq!(cjs.unwrap(), root.join("src/util.js"));

        let (esm, _) = both("./lib", &importer);
        assert_eq!(esm.unwrap(), root.join("src/lib/index.js"));

        assert!(ModuleResolver::import().resolve("./missing", &importer).is_err());
    }

    #[test]
    fn test_main_field() {
        let dir = project();
        let root = dir.path().canonicalize().unwrap();
        let importer = root.join("src/index.ts");

        let (esm, cjs) = both("plain", &importer);
        assert_eq!(esm.unwrap(), root.join("node_modules/plain/lib/main.js"));
        assert_eq!(cjs.unwrap(), root.join("node_modules/plain/lib/main.js"));

        let (esm, _) = both("plain/extra", &importer);
        assert_eq!(esm.unwrap(), root.join("node_modules/plain/extra.js"));
    }

    #[test]
    fn test_conditional_exports_diverge() {
        let dir = project();
        let root = dir.path().canonicalize().unwrap();
        let importer = root.join("src/index.ts");

        let (esm, cjs) = both("dual", &importer);
        assert_eq!(esm.unwrap(), root.join("node_modules/dual/esm/index.mjs"));
        assert_eq!(cjs.unwrap(), root.join("node_modules/dual/cjs/index.cjs"));

        let (esm, cjs) = both("dual/shared", &importer);
        assert_eq!(esm.unwrap(), cjs.unwrap());
    }

    #[test]
    fn test_exports_patterns_and_encapsulation() {
        let dir = project();
        let root = dir.path().canonicalize().unwrap();
        let importer = root.join("src/index.ts");

        let (esm, cjs) = both("dual/features/a", &importer);
        assert_eq!(esm.unwrap(), root.join("node_modules/dual/features/a.js"));
        assert_eq!(cjs.unwrap(), root.join("node_modules/dual/features/a.js"));

        // Not listed in exports, even though the file exists
        let (esm, cjs) = both("dual/esm/index.mjs", &importer);
        assert!(esm.is_err());
        assert!(cjs.is_err());

        let (esm, _) = both("@scope/pkg", &importer);
        assert_eq!(esm.unwrap(), root.join("node_modules/@scope/pkg/entry.js"));
    }

    #[test]
    fn test_builtins_and_missing() {
        let dir = project();
        let importer = dir.path().join("src/index.ts");

        let (esm, cjs) = both("node:fs", &importer);
        assert!(esm.is_err());
        assert!(cjs.is_err());

        assert!(matches!(
            ModuleResolver::require().resolve("nope", &importer),
            Err(RequireCjsError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_probe_order_differs() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "src/index.ts", "");
        write(&root, "src/mod.mjs", "");
        write(&root, "src/mod.js", "");
        let importer = root.join("src/index.ts");

        let (esm, cjs) = both("./mod", &importer);
        assert_eq!(esm.unwrap(), root.join("src/mod.mjs"));
        assert_eq!(cjs.unwrap(), root.join("src/mod.js"));
    }
}
