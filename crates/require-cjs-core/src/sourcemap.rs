// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source Map v3 output

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use oxc_sourcemap::SourceMapBuilder;
use serde::{Deserialize, Serialize};

/// A Source Map revision 3 document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Always 3
    pub version: u8,
    /// Generated file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Original sources
    pub sources: Vec<String>,
    /// Original source text, parallel to `sources`
    pub sources_content: Vec<Option<String>>,
    /// Symbol names (unused)
    pub names: Vec<String>,
    /// VLQ-encoded mappings
    pub mappings: String,
}

impl SourceMap {
    /// Map for a single source file.
    pub fn new(file: &str, source: &str, mappings: String) -> Self {
        let name = file_name(file);
        Self {
            version: 3,
            file: Some(name.to_string()),
            sources: vec![name.to_string()],
            sources_content: vec![Some(source.to_string())],
            names: Vec::new(),
            mappings,
        }
    }

    /// Serialize as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// `data:` URL suitable for an inline `sourceMappingURL` comment.
    pub fn to_data_url(&self) -> Result<String> {
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(self.to_json()?)
        ))
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Accumulates single-source segments in generated order
pub struct MappingsBuilder {
    builder: SourceMapBuilder,
    source: u32,
}

impl MappingsBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        let mut builder = SourceMapBuilder::default();
        let source = builder.add_source_and_content("", "");
        Self { builder, source }
    }

    /// Map a generated position onto an original one (zero-based).
    /// Positions must be added in generated order.
    pub fn add(&mut self, generated_line: u32, generated_column: u32, line: u32, column: u32) {
        self.builder
            .add_token(generated_line, generated_column, line, column, Some(self.source), None);
    }

    /// Encode the `mappings` field.
    pub fn encode(self) -> String {
        self.builder.into_sourcemap().to_json().mappings
    }
}

impl Default for MappingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset to line/column (UTF-16 columns) lookup
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Index the line starts of `source`.
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Zero-based line and column of a byte offset.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let column = self.source[start..offset].encode_utf16().count();
        (line as u32, column as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mappings() {
        let mut builder = MappingsBuilder::new();
        builder.add(0, 0, 0, 0);
        builder.add(0, 23, 0, 18);
        builder.add(2, 0, 1, 0);
        assert_eq!(builder.encode(), "AAAA,uBAAkB;;AAClB");

        assert_eq!(MappingsBuilder::new().encode(), "");
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("ab\nπc\n");
        assert_eq!(index.position(0), (0, 0));
        assert_eq!(index.position(2), (0, 2));
        assert_eq!(index.position(3), (1, 0));
        assert_eq!(index.position(5), (1, 1));
        assert_eq!(index.position(7), (2, 0));
    }

    #[test]
    fn test_json_shape() {
        let map = SourceMap::new("/src/index.ts", "x", "AAAA".into());
        let json: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(json["version"], 3);
        assert_eq!(json["file"], "index.ts");
        assert_eq!(json["sources"][0], "index.ts");
        assert_eq!(json["sourcesContent"][0], "x");
        assert_eq!(json["mappings"], "AAAA");
        assert!(map.to_data_url().unwrap().starts_with("data:application/json;charset=utf-8;base64,"));
    }
}
