//! Error types for the lexer crate.

use crate::lexer::{Invalid, Span};
use thiserror::Error;

/// Source the module parser rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {}", span.start)]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// Where it went wrong
    pub span: Span,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Reasons static CommonJS analysis gives up on a source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// The scanner hit malformed input
    #[error("{kind} at offset {offset}")]
    Invalid {
        /// What the scanner found
        kind: Invalid,
        /// Byte offset
        offset: usize,
    },

    /// Closing bracket without a matching opener, or the reverse
    #[error("unbalanced '{0}' at offset {1}")]
    Unbalanced(&'static str, usize),

    /// Unexpected end of input
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A static `import` declaration
    #[error("unexpected import statement in CJS module at offset {0}")]
    ImportStatement(usize),

    /// `import.meta`
    #[error("unexpected import.meta in CJS module at offset {0}")]
    ImportMeta(usize),

    /// An `export` declaration
    #[error("unexpected export statement in CJS module at offset {0}")]
    ExportStatement(usize),
}
