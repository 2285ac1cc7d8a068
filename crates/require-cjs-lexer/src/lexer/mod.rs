//! Lexical analysis (tokenization) for JavaScript source code.
//!
//! The scanner is shallow: it only has to find module-level `exports`
//! assignments without being fooled by strings, comments, templates or
//! regular expressions. It does not understand JSX or TypeScript; callers
//! treat a scan failure as "not CommonJS".
//!
//! ## Usage
//!
//! ```rust
//! use require_cjs_lexer::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("let x = 42;");
//!
//! loop {
//!     let token = scanner.next_token();
//!     if matches!(token.kind, TokenKind::Eof) {
//!         break;
//!     }
//!     println!("{:?}", token.kind);
//! }
//! ```

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Invalid, Keyword, Span, Token, TokenKind};
