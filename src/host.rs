// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The command line's notion of "the build"

use async_trait::async_trait;
use require_cjs_core::module_system::{ModuleResolver, Resolve};
use require_cjs_core::{HostResolution, HostResolver};
use std::collections::HashSet;
use std::path::PathBuf;

/// Treats the files given on the command line as one build.
///
/// An import resolving to one of those files stays an ES import; specifiers
/// listed as externals are reported external without resolving.
pub struct FsHost {
    resolver: ModuleResolver,
    inputs: HashSet<PathBuf>,
    externals: Vec<String>,
}

impl FsHost {
    /// Create a host over the build's input files.
    pub fn new(inputs: &[PathBuf], externals: Vec<String>) -> Self {
        Self {
            resolver: ModuleResolver::import(),
            inputs: inputs
                .iter()
                .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
                .collect(),
            externals,
        }
    }
}

#[async_trait]
impl HostResolver for FsHost {
    async fn resolve(&self, specifier: &str, importer: &str) -> Option<HostResolution> {
        if self.externals.iter().any(|e| e == specifier) {
            return Some(HostResolution {
                id: specifier.to_string(),
                external: true,
            });
        }
        let resolver = self.resolver.clone();
        let (request, importer) = (specifier.to_string(), PathBuf::from(importer));
        let resolved = tokio::task::spawn_blocking(move || resolver.resolve(&request, &importer))
            .await
            .ok()?
            .ok()?;
        Some(HostResolution {
            external: !self.inputs.contains(&resolved),
            id: resolved.to_string_lossy().into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_inputs_are_internal() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.js"), "").unwrap();
        fs::write(root.join("src/b.js"), "").unwrap();
        fs::write(root.join("src/c.js"), "").unwrap();

        let host = FsHost::new(
            &[root.join("src/a.js"), root.join("src/b.js")],
            vec!["react".into()],
        );
        let importer = root.join("src/a.js");
        let importer = importer.to_str().unwrap();

        let b = host.resolve("./b.js", importer).await.unwrap();
        assert!(!b.external);
        let c = host.resolve("./c", importer).await.unwrap();
        assert!(c.external);
        let react = host.resolve("react", importer).await.unwrap();
        assert!(react.external);
        assert!(host.resolve("./missing", importer).await.is_none());
    }
}
