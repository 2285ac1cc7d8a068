//! Static import declarations.
//!
//! [`parse_imports`] parses a module with `oxc_parser` and describes every
//! top-level `import ... from '...'` statement with enough span information
//! to rewrite it by slicing the original text. Everything else in the file
//! (including `export ... from`, `import()`, `import.meta`, TypeScript
//! `import x = require()` and phase imports) is left alone.

use crate::error::ParseError;
use crate::lexer::Span;
use oxc_allocator::Allocator;
use oxc_ast::ast::{self, ImportDeclarationSpecifier, ModuleExportName, Statement};
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use std::path::Path;

/// A string literal: decoded value plus the span of the quoted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

/// A local binding introduced by an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub span: Span,
}

/// The name a module exports something under: an identifier, a keyword
/// (`default`), or a string literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportName {
    pub name: String,
    pub span: Span,
    pub quoted: bool,
}

/// One binding of an import clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    /// `import d from 'm'`
    Default { local: Binding },
    /// `import * as ns from 'm'`
    Namespace { local: Binding },
    /// `import { a as b } from 'm'`, `import { type T } from 'm'`
    Named {
        imported: ExportName,
        local: Binding,
        type_only: bool,
    },
}

/// A parsed `import` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    /// From the `import` keyword through the terminating `;`, if any
    pub span: Span,
    /// The module specifier
    pub source: StringLiteral,
    /// Bindings in source order; empty for `import 'm'`
    pub specifiers: Vec<ImportSpecifier>,
    /// `import type ...`
    pub type_only: bool,
    /// `with { ... }` / `assert { ... }` clause
    pub attributes: Option<Span>,
}

impl ImportDeclaration {
    /// `import 'm'`
    pub fn is_side_effect_only(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Whether the statement has any runtime effect at all. A declaration
    /// made only of type imports is erased by the type checker.
    pub fn has_runtime_effect(&self) -> bool {
        if self.type_only {
            return false;
        }
        self.is_side_effect_only()
            || self.specifiers.iter().any(|s| {
                !matches!(
                    s,
                    ImportSpecifier::Named {
                        type_only: true,
                        ..
                    }
                )
            })
    }
}

/// Source type for a module id: TypeScript and JSX follow the extension,
/// plain JavaScript always allows JSX, and every module is an ES module.
pub fn source_type_for(id: &str) -> SourceType {
    let path = id.split(['?', '#']).next().unwrap_or(id);
    let source_type = SourceType::from_path(Path::new(path)).unwrap_or_else(|_| SourceType::mjs());
    let source_type = if source_type.is_typescript() {
        source_type
    } else {
        source_type.with_jsx(true)
    };
    source_type.with_module(true)
}

/// Parse every top-level static import declaration of the module `id`.
///
/// `id` only selects the dialect (see [`source_type_for`]); the file is
/// never read.
pub fn parse_imports(source: &str, id: &str) -> Result<Vec<ImportDeclaration>, ParseError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type_for(id)).parse();
    if let Some(diagnostic) = ret.errors.first() {
        return Err(diagnostic_error(diagnostic));
    }
    if ret.panicked {
        return Err(ParseError::new("parser gave up", Span::new(0, source.len())));
    }

    let imports = ret
        .program
        .body
        .iter()
        .filter_map(|statement| match statement {
            Statement::ImportDeclaration(decl) if decl.phase.is_none() => Some(declaration(decl)),
            _ => None,
        })
        .collect();
    Ok(imports)
}

fn diagnostic_error(diagnostic: &OxcDiagnostic) -> ParseError {
    let span = diagnostic
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map_or(Span::new(0, 0), |label| {
            Span::new(label.offset(), label.offset() + label.len())
        });
    ParseError::new(diagnostic.message.to_string(), span)
}

fn span(span: oxc_span::Span) -> Span {
    Span::new(span.start as usize, span.end as usize)
}

fn binding(local: &ast::BindingIdentifier) -> Binding {
    Binding {
        name: local.name.to_string(),
        span: span(local.span),
    }
}

fn declaration(decl: &ast::ImportDeclaration) -> ImportDeclaration {
    let specifiers = decl
        .specifiers
        .iter()
        .flat_map(|list| list.iter())
        .map(|specifier| match specifier {
            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => ImportSpecifier::Default {
                local: binding(&s.local),
            },
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                ImportSpecifier::Namespace {
                    local: binding(&s.local),
                }
            }
            ImportDeclarationSpecifier::ImportSpecifier(s) => ImportSpecifier::Named {
                imported: ExportName {
                    name: s.imported.name().to_string(),
                    span: span(s.imported.span()),
                    quoted: matches!(s.imported, ModuleExportName::StringLiteral(_)),
                },
                local: binding(&s.local),
                type_only: s.import_kind.is_type(),
            },
        })
        .collect();

    ImportDeclaration {
        span: span(decl.span),
        source: StringLiteral {
            value: decl.source.value.to_string(),
            span: span(decl.source.span),
        },
        specifiers,
        type_only: decl.import_kind.is_type(),
        attributes: decl.with_clause.as_ref().map(|clause| span(clause.span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> ImportDeclaration {
        let mut imports = parse_imports(source, "/src/mod.ts").unwrap();
        assert_eq!(imports.len(), 1, "{source}");
        imports.remove(0)
    }

    fn named(decl: &ImportDeclaration) -> Vec<(&str, &str, bool)> {
        decl.specifiers
            .iter()
            .filter_map(|s| match s {
                ImportSpecifier::Named {
                    imported,
                    local,
                    type_only,
                } => Some((imported.name.as_str(), local.name.as_str(), *type_only)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_side_effect_import() {
        let source = "import 'pkg';\nfoo();";
        let decl = parse_one(source);
        assert!(decl.is_side_effect_only());
        assert_eq!(decl.source.value, "pkg");
        assert_eq!(decl.span.slice(source), "import 'pkg';");
    }

    #[test]
    fn test_default_and_named() {
        let decl = parse_one("import d, { a, b as c } from \"m\"");
        assert!(matches!(
            &decl.specifiers[0],
            ImportSpecifier::Default { local } if local.name == "d"
        ));
        assert_eq!(
            named(&decl),
            vec![
                ("a", "a", false),
                ("b", "c", false)
            ]
        );
        assert_eq!(decl.source.value, "m");
    }

    #[test]
    fn test_namespace() {
        let decl = parse_one("import d, * as ns from 'm';");
        assert_eq!(decl.specifiers.len(), 2);
        assert!(matches!(
            &decl.specifiers[1],
            ImportSpecifier::Namespace { local } if local.name == "ns"
        ));
    }

    #[test]
    fn test_type_only_forms() {
        let decl = parse_one("import type { A } from 'm'");
        assert!(decl.type_only);
        assert!(!decl.has_runtime_effect());

        let decl = parse_one("import { type A, b } from 'm'");
        assert!(!decl.type_only);
        assert_eq!(
            named(&decl),
            vec![("A", "A", true), ("b", "b", false)]
        );
        assert!(decl.has_runtime_effect());

        let decl = parse_one("import { type A } from 'm'");
        assert!(!decl.has_runtime_effect());
    }

    #[test]
    fn test_type_as_identifier() {
        let decl = parse_one("import type from 'm'");
        assert!(!decl.type_only);
        assert!(matches!(
            &decl.specifiers[0],
            ImportSpecifier::Default { local } if local.name == "type"
        ));

        let decl = parse_one("import { type, type as t, type as as x } from 'm'");
        assert_eq!(
            named(&decl),
            vec![
                ("type", "type", false),
                ("type", "t", false),
                ("as", "x", true),
            ]
        );
    }

    #[test]
    fn test_string_and_keyword_names() {
        let decl = parse_one("import { 'a-b' as ab, default as d } from 'm'");
        assert_eq!(
            named(&decl),
            vec![
                ("a-b", "ab", false),
                ("default", "d", false)
            ]
        );
    }

    #[test]
    fn test_attributes() {
        let source = "import data from './d.json' with { type: 'json' };";
        let decl = parse_one(source);
        assert_eq!(decl.span.slice(source), source);
        assert_eq!(
            decl.attributes.map(|s| s.slice(source)),
            Some("with { type: 'json' }")
        );
    }

    #[test]
    fn test_skips_non_declarations() {
        let source = r#"
            const a = import('x');
            const u = import.meta.url;
            export { b } from 'y';
            export * from 'z';
            function f() { return "import q from 'nope'"; }
            const t = `import ${a} from 'nope'`;
            // import c from 'comment'
            import e = require('ts-equals');
        "#;
        assert!(parse_imports(source, "/src/mod.ts").unwrap().is_empty());
    }

    #[test]
    fn test_multiple_in_order() {
        let source = "import a from 'a'\nimport 'b'\nimport { c } from 'c'";
        let specs: Vec<_> = parse_imports(source, "/src/mod.js")
            .unwrap()
            .into_iter()
            .map(|d| d.source.value)
            .collect();
        assert_eq!(specs, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_malformed() {
        for source in [
            "import { a from 'm'",
            "import * from 'm'",
            "import a 'm'",
            "import 'unterminated",
        ] {
            assert!(parse_imports(source, "/src/mod.js").is_err(), "{source}");
        }
    }

    #[test]
    fn test_source_type_for() {
        assert!(source_type_for("/src/a.ts").is_typescript());
        assert!(!source_type_for("/src/a.ts").is_jsx());
        assert!(source_type_for("/src/a.tsx").is_jsx());
        assert!(source_type_for("/src/a.js").is_jsx());
        assert!(source_type_for("/src/a.mjs?raw").is_module());
        assert!(source_type_for("/src/a.vue").is_module());
    }

    #[test]
    fn test_jsx_text() {
        let source = "\
import React from 'react';
export const a = <p>Don't panic</p>;
const b = <b>c</b>;
";
        for id in ["/src/a.tsx", "/src/a.jsx", "/src/a.js"] {
            let imports = parse_imports(source, id).unwrap();
            assert_eq!(imports.len(), 1, "{id}");
            assert_eq!(imports[0].span.slice(source), "import React from 'react';");
        }
    }

    #[test]
    fn test_regex_after_paren() {
        let source = "import 'a';\nif (x) /'/.test(x);\nimport b from 'b';\n";
        let specs: Vec<_> = parse_imports(source, "/src/mod.js")
            .unwrap()
            .into_iter()
            .map(|d| d.source.value)
            .collect();
        assert_eq!(specs, vec!["a", "b"]);
    }
}
