// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! package.json lookup

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Declared module system of a package (`"type"` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageType {
    /// `"type": "module"`
    Module,
    /// `"type": "commonjs"`
    CommonJs,
}

impl PackageType {
    /// Parse the `"type"` field. Unknown values are treated as absent.
    pub fn from_field(field: Option<&str>) -> Option<Self> {
        match field {
            Some("module") => Some(PackageType::Module),
            Some("commonjs") => Some(PackageType::CommonJs),
            _ => None,
        }
    }
}

/// The subset of package.json used for resolution and type detection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    /// Package name
    pub name: Option<String>,
    /// Main entry point
    pub main: Option<String>,
    /// Package type (commonjs or module)
    #[serde(rename = "type")]
    pub package_type: Option<String>,
    /// Conditional exports map
    #[serde(default)]
    pub exports: Option<serde_json::Value>,
}

impl PackageJson {
    /// Parse manifest text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a manifest synchronously.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

/// Find the nearest package.json at or above `start`.
pub async fn find_package_json(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join("package.json");
        if let Ok(meta) = tokio::fs::metadata(&candidate).await {
            if meta.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Read the `"type"` of a manifest.
///
/// An unreadable file is an error; malformed JSON or a missing/unknown
/// `"type"` is `Ok(None)`.
pub async fn read_package_type(path: &Path) -> Result<Option<PackageType>> {
    let content = tokio::fs::read_to_string(path).await?;
    match PackageJson::parse(&content) {
        Ok(pkg) => Ok(PackageType::from_field(pkg.package_type.as_deref())),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "ignoring malformed package.json");
            Ok(None)
        }
    }
}
