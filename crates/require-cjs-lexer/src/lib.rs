// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # require-cjs-lexer
//!
//! The JavaScript front end of the `require-cjs` transform:
//!
//! - [`imports`] - top-level static `import` declarations with spans,
//!   parsed with `oxc_parser` (JavaScript, TypeScript and JSX)
//! - [`lexer`] - a shallow tokenizer that understands comments, strings,
//!   templates and regular expressions
//! - [`cjs`] - static detection of CommonJS exports on top of [`lexer`]
//!
//! ```rust
//! use require_cjs_lexer::{parse_imports, CjsLexer};
//!
//! let imports = parse_imports("import { a as b } from 'pkg';", "/src/index.js").unwrap();
//! assert_eq!(imports[0].source.value, "pkg");
//!
//! let analysis = CjsLexer::new().parse("exports.a = 1;").unwrap();
//! assert_eq!(analysis.exports, vec!["a"]);
//! ```

pub mod cjs;
pub mod error;
pub mod imports;
pub mod lexer;

pub use cjs::{CjsAnalysis, CjsLexer};
pub use error::{LexError, ParseError};
pub use imports::{
    parse_imports, source_type_for, Binding, ExportName, ImportDeclaration, ImportSpecifier,
    StringLiteral,
};
pub use lexer::Span;
