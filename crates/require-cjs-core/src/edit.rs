// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Span overwrites over an immutable source, with a source map back to it

use crate::sourcemap::{LineIndex, MappingsBuilder, SourceMap};
use require_cjs_lexer::Span;

/// Pending replacements of non-overlapping source spans
#[derive(Debug)]
pub struct EditBuffer<'a> {
    source: &'a str,
    edits: Vec<(Span, String)>,
}

impl<'a> EditBuffer<'a> {
    /// Start editing `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// The original source
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Source text covered by `span`
    pub fn slice(&self, span: Span) -> &'a str {
        span.slice(self.source)
    }

    /// Replace `span` with `text`. Returns `false`, leaving the buffer
    /// untouched, if `span` is out of bounds or overlaps an earlier edit.
    pub fn overwrite(&mut self, span: Span, text: impl Into<String>) -> bool {
        if span.end > self.source.len() || span.start > span.end {
            return false;
        }
        let at = self.edits.partition_point(|(s, _)| s.start < span.start);
        let overlaps_prev = at > 0 && self.edits[at - 1].0.end > span.start;
        let overlaps_next = self.edits.get(at).is_some_and(|(s, _)| s.start < span.end);
        if overlaps_prev || overlaps_next {
            return false;
        }
        self.edits.insert(at, (span, text.into()));
        true
    }

    /// Whether anything was overwritten
    pub fn has_changed(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Apply every edit.
    pub fn finish(&self, file: &str) -> (String, SourceMap) {
        let index = LineIndex::new(self.source);
        let mut out = Emitter {
            code: String::with_capacity(self.source.len()),
            line: 0,
            column: 0,
            mappings: MappingsBuilder::new(),
            index: &index,
        };

        let mut cursor = 0;
        for (span, text) in &self.edits {
            out.original(self.source, cursor, span.start);
            out.replacement(text, span.start);
            cursor = span.end;
        }
        out.original(self.source, cursor, self.source.len());

        let map = SourceMap::new(file, self.source, out.mappings.encode());
        (out.code, map)
    }
}

struct Emitter<'i, 's> {
    code: String,
    line: u32,
    column: u32,
    mappings: MappingsBuilder,
    index: &'i LineIndex<'s>,
}

impl Emitter<'_, '_> {
    /// Copy `source[start..end]`, mapping the first character of every line.
    fn original(&mut self, source: &str, start: usize, end: usize) {
        let mut line_start = true;
        for (offset, ch) in source[start..end].char_indices() {
            if ch == '\n' {
                line_start = true;
            } else if line_start {
                let (line, column) = self.index.position(start + offset);
                self.mappings.add(self.line, self.column, line, column);
                line_start = false;
            }
            self.push(ch);
        }
    }

    /// Emit `text` in place of the span starting at `origin`.
    fn replacement(&mut self, text: &str, origin: usize) {
        if text.is_empty() {
            return;
        }
        let (line, column) = self.index.position(origin);
        self.mappings.add(self.line, self.column, line, column);
        for ch in text.chars() {
            self.push(ch);
        }
    }

    fn push(&mut self, ch: char) {
        self.code.push(ch);
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += ch.len_utf16() as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_and_map() {
        let source = "import a from 'a';\nfoo();\n";
        let mut buffer = EditBuffer::new(source);
        assert!(!buffer.has_changed());
        assert_eq!(buffer.slice(Span::new(14, 17)), "'a'");

        assert!(buffer.overwrite(Span::new(0, 18), "const a = require('a');"));
        let (code, map) = buffer.finish("/src/index.js");
        assert_eq!(code, "const a = require('a');\nfoo();\n");
        assert_eq!(map.mappings, "AAAA;AACA");
        assert_eq!(map.sources, vec!["index.js"]);
    }

    #[test]
    fn test_overlapping_rejected() {
        let mut buffer = EditBuffer::new("0123456789");
        assert!(buffer.overwrite(Span::new(4, 6), "x"));
        assert!(buffer.overwrite(Span::new(0, 2), "y"));
        assert!(!buffer.overwrite(Span::new(5, 8), "z"));
        assert!(!buffer.overwrite(Span::new(1, 3), "z"));
        assert!(!buffer.overwrite(Span::new(8, 11), "z"));
        assert!(buffer.overwrite(Span::new(6, 8), ""));

        let (code, _) = buffer.finish("f.js");
        assert_eq!(code, "y23x89");
    }

    #[test]
    fn test_mid_line_edit_mapping() {
        let source = "x;import 'a';y;";
        let mut buffer = EditBuffer::new(source);
        buffer.overwrite(Span::new(2, 13), "require('a');");
        let (code, map) = buffer.finish("f.js");
        assert_eq!(code, "x;require('a');y;");
        // x at 0:0, require at 0:2 -> 0:2, y at 0:15 -> 0:13
        assert_eq!(map.mappings, "AAAA,EAAE,aAAW");
    }
}
