//! Static CommonJS export detection.
//!
//! [`CjsLexer::parse`] either enumerates the names a CommonJS module
//! assigns onto `exports` / `module.exports`, or fails. It fails on
//! anything that cannot be a CommonJS script: malformed tokens, unbalanced
//! brackets, and ESM-only syntax.

use crate::error::LexError;
use crate::lexer::{Keyword, Scanner, Token, TokenKind};

/// What a CommonJS module statically exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CjsAnalysis {
    /// Names in first-assignment order
    pub exports: Vec<String>,
    /// Specifiers whose exports are re-exported wholesale
    /// (`module.exports = require('x')`, `...require('x')`)
    pub reexports: Vec<String>,
}

impl CjsAnalysis {
    fn export(&mut self, name: &str) {
        if !self.exports.iter().any(|e| e == name) {
            self.exports.push(name.to_string());
        }
    }

    fn reexport(&mut self, specifier: &str) {
        if !self.reexports.iter().any(|r| r == specifier) {
            self.reexports.push(specifier.to_string());
        }
    }

    /// `Object.defineProperty(exports, '__esModule', { value: true })`
    pub fn is_es_module_interop(&self) -> bool {
        self.exports.iter().any(|e| e == "__esModule")
    }
}

/// Token-level CommonJS export lexer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CjsLexer {
    _private: (),
}

impl CjsLexer {
    /// Create a lexer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze `source` as a CommonJS module.
    pub fn parse(&self, source: &str) -> Result<CjsAnalysis, LexError> {
        let tokens = Scanner::tokenize(source);
        for token in &tokens {
            if let TokenKind::Invalid(kind) = token.kind {
                return Err(LexError::Invalid {
                    kind,
                    offset: token.span.start,
                });
            }
        }
        check_balance(&tokens)?;

        let mut walker = ExportWalker {
            tokens: &tokens,
            analysis: CjsAnalysis::default(),
        };
        walker.run()?;
        Ok(walker.analysis)
    }
}

fn check_balance(tokens: &[Token]) -> Result<(), LexError> {
    let mut stack: Vec<&'static str> = Vec::new();
    for token in tokens {
        let TokenKind::Punct(p) = token.kind else {
            continue;
        };
        let expected_opener = match p {
            "(" | "[" | "{" => {
                stack.push(p);
                continue;
            }
            ")" => "(",
            "]" => "[",
            "}" => "{",
            _ => continue,
        };
        if stack.pop() != Some(expected_opener) {
            return Err(LexError::Unbalanced(p, token.span.start));
        }
    }
    if stack.is_empty() {
        Ok(())
    } else {
        Err(LexError::UnexpectedEof)
    }
}

struct ExportWalker<'t> {
    tokens: &'t [Token],
    analysis: CjsAnalysis,
}

impl<'t> ExportWalker<'t> {
    fn kind(&self, i: usize) -> Option<&'t TokenKind> {
        self.tokens.get(i).map(|t| &t.kind)
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_punct(p))
    }

    fn is_ident(&self, i: usize, name: &str) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_ident(name))
    }

    fn string(&self, i: usize) -> Option<&'t str> {
        match self.kind(i) {
            Some(TokenKind::String(value)) => Some(value),
            _ => None,
        }
    }

    fn is_member(&self, i: usize) -> bool {
        i > 0 && (self.is_punct(i - 1, ".") || self.is_punct(i - 1, "?."))
    }

    fn offset(&self, i: usize) -> usize {
        self.tokens[i].span.start
    }

    fn run(&mut self) -> Result<(), LexError> {
        let tokens = self.tokens;
        for i in 0..tokens.len() {
            match &tokens[i].kind {
                TokenKind::Keyword(Keyword::Import) => match self.kind(i + 1) {
                    Some(TokenKind::Punct("(")) => {}
                    Some(TokenKind::Punct(".")) if self.is_ident(i + 2, "meta") => {
                        return Err(LexError::ImportMeta(self.offset(i)));
                    }
                    _ => return Err(LexError::ImportStatement(self.offset(i))),
                },
                TokenKind::Keyword(Keyword::Export) if !self.is_punct(i + 1, ":") => {
                    return Err(LexError::ExportStatement(self.offset(i)));
                }
                TokenKind::Identifier(name) if !self.is_member(i) => match name.as_str() {
                    "exports" => self.member_assignment(i + 1),
                    "module" if self.is_punct(i + 1, ".") && self.is_ident(i + 2, "exports") => {
                        self.module_exports(i + 3)
                    }
                    "Object"
                        if self.is_punct(i + 1, ".")
                            && self.is_ident(i + 2, "defineProperty")
                            && self.is_punct(i + 3, "(") =>
                    {
                        self.define_property(i + 4)
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        Ok(())
    }

    /// `.name =` or `['name'] =` after `exports` / `module.exports`.
    fn member_assignment(&mut self, i: usize) {
        if self.is_punct(i, ".") && self.is_punct(i + 2, "=") {
            if let Some(TokenKind::Identifier(name)) = self.kind(i + 1) {
                self.analysis.export(name);
            }
        } else if self.is_punct(i, "[") && self.is_punct(i + 2, "]") && self.is_punct(i + 3, "=")
        {
            if let Some(name) = self.string(i + 1) {
                self.analysis.export(name);
            }
        }
    }

    fn module_exports(&mut self, i: usize) {
        if !self.is_punct(i, "=") {
            return self.member_assignment(i);
        }
        if let Some(specifier) = self.require_call(i + 1) {
            let chained = self.is_punct(i + 5, ".")
                || self.is_punct(i + 5, "[")
                || self.is_punct(i + 5, "(");
            if !chained {
                self.analysis.reexport(specifier);
            }
        } else if self.is_punct(i + 1, "{") {
            self.object_literal(i + 2);
        }
    }

    /// `require('x')` starting at `i`.
    fn require_call(&self, i: usize) -> Option<&'t str> {
        if self.is_ident(i, "require") && self.is_punct(i + 1, "(") && self.is_punct(i + 3, ")") {
            self.string(i + 2)
        } else {
            None
        }
    }

    /// Entries of `module.exports = { ... }`, starting after the brace.
    fn object_literal(&mut self, mut i: usize) {
        while i < self.tokens.len() && !self.is_punct(i, "}") {
            let key = match self.kind(i) {
                Some(TokenKind::Punct("...")) => {
                    if let Some(specifier) = self.require_call(i + 1) {
                        self.analysis.reexport(specifier);
                    }
                    None
                }
                Some(TokenKind::Identifier(name)) if name == "get" || name == "set" => {
                    match self.kind(i + 1) {
                        Some(TokenKind::Identifier(prop)) => Some(prop.as_str()),
                        _ => Some(name.as_str()),
                    }
                }
                Some(TokenKind::Identifier(name)) => Some(name.as_str()),
                Some(TokenKind::Keyword(kw)) => Some(kw.as_str()),
                Some(TokenKind::String(value)) if self.is_punct(i + 1, ":") => {
                    Some(value.as_str())
                }
                _ => None,
            };
            if let Some(key) = key {
                self.analysis.export(key);
            }
            let next = self.next_entry(i);
            if next == i {
                break;
            }
            i = next;
        }
    }

    /// Index of the next object entry: just past the next `,` at this
    /// nesting level, or the closing `}` of the object.
    fn next_entry(&self, mut i: usize) -> usize {
        let mut depth = 0usize;
        while let Some(kind) = self.kind(i) {
            match kind {
                TokenKind::Punct("(" | "[" | "{") => depth += 1,
                TokenKind::Punct(")" | "]" | "}") if depth == 0 => return i,
                TokenKind::Punct(")" | "]" | "}") => depth -= 1,
                TokenKind::Punct(",") if depth == 0 => return i + 1,
                _ => {}
            }
            i += 1;
        }
        i
    }

    /// `Object.defineProperty(exports, 'name', ...)`, starting after `(`.
    fn define_property(&mut self, i: usize) {
        let target_end = if self.is_ident(i, "exports") {
            i + 1
        } else if self.is_ident(i, "module")
            && self.is_punct(i + 1, ".")
            && self.is_ident(i + 2, "exports")
        {
            i + 3
        } else {
            return;
        };
        if self.is_punct(target_end, ",") {
            if let Some(name) = self.string(target_end + 1) {
                self.analysis.export(name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<CjsAnalysis, LexError> {
        CjsLexer::new().parse(source)
    }

    #[test]
    fn test_exports_assignments() {
        let analysis = parse(
            r#"
            'use strict';
            exports.a = 1;
            module.exports.b = function () {};
            exports['c-d'] = 2;
            exports.a = 3;
            if (exports.a === 3) {}
            "#,
        )
        .unwrap();
        assert_eq!(analysis.exports, vec!["a", "b", "c-d"]);
    }

    #[test]
    fn test_module_exports_object() {
        let analysis = parse(
            r#"
            module.exports = {
                a,
                b: call(1, { nested: 2 }),
                'c': [1, 2],
                default: x,
                method() { return 1; },
                ...require('./more'),
            };
            "#,
        )
        .unwrap();
        assert_eq!(analysis.exports, vec!["a", "b", "c", "default", "method"]);
        assert_eq!(analysis.reexports, vec!["./more"]);
    }

    #[test]
    fn test_reexport() {
        let analysis = parse("module.exports = require('./lib/index.js');").unwrap();
        assert_eq!(analysis.reexports, vec!["./lib/index.js"]);

        let analysis = parse("module.exports = require('./factory')();").unwrap();
        assert!(analysis.reexports.is_empty());
    }

    #[test]
    fn test_define_property() {
        let analysis = parse(
            r#"Object.defineProperty(exports, "__esModule", { value: true });
               Object.defineProperty(module.exports, 'x', { get() { return 1; } });"#,
        )
        .unwrap();
        assert!(analysis.is_es_module_interop());
        assert_eq!(analysis.exports, vec!["__esModule", "x"]);
    }

    #[test]
    fn test_script_without_exports_is_cjs() {
        assert_eq!(parse("console.log('hi');").unwrap(), CjsAnalysis::default());
    }

    #[test]
    fn test_esm_syntax_rejected() {
        assert!(matches!(
            parse("import x from 'y';"),
            Err(LexError::ImportStatement(0))
        ));
        assert!(matches!(
            parse("const u = import.meta.url;"),
            Err(LexError::ImportMeta(_))
        ));
        assert!(matches!(
            parse("export const a = 1;"),
            Err(LexError::ExportStatement(0))
        ));
        assert!(parse("const m = import('x'); const o = { export: 1 };").is_ok());
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(matches!(parse("function f( }"), Err(LexError::Unbalanced("}", _))));
        assert!(matches!(parse("if (a) {"), Err(LexError::UnexpectedEof)));
        assert!(matches!(parse("var s = 'x"), Err(LexError::Invalid { .. })));
    }

    #[test]
    fn test_strings_and_comments_ignored() {
        let analysis = parse(
            r#"
            // exports.hidden = 1
            var s = "exports.alsoHidden = 2";
            var re = /exports.nope = 3/;
            exports.real = 4;
            "#,
        )
        .unwrap();
        assert_eq!(analysis.exports, vec!["real"]);
    }
}
