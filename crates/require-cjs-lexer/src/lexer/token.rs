//! Token definitions for the JavaScript lexer.

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Slice `source` with this span.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True for the punctuator `p`.
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(&self.kind, TokenKind::Punct(q) if *q == p)
    }

    /// True for the identifier (not keyword) `name`.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Identifier(n) if n == name)
    }

    /// True for the reserved word `kw`.
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }
}

/// The different kinds of tokens in JavaScript.
///
/// Contextual words (`from`, `as`, `type`, `of`, `async`, ...) are plain
/// identifiers; only reserved words become [`TokenKind::Keyword`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier
    Identifier(String),
    /// Private identifier (#name)
    PrivateIdentifier(String),
    /// Reserved word
    Keyword(Keyword),
    /// String literal, escapes decoded
    String(String),
    /// Whole template literal including `${}` substitutions
    Template,
    /// Regular expression literal
    RegExp,
    /// Numeric or BigInt literal
    Number,
    /// Punctuator or operator
    Punct(&'static str),
    /// End of file
    Eof,
    /// Malformed input
    Invalid(Invalid),
}

/// Why the scanner produced [`TokenKind::Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalid {
    UnterminatedString,
    UnterminatedTemplate,
    UnterminatedRegExp,
    UnterminatedComment,
    UnexpectedChar(char),
}

impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invalid::UnterminatedString => f.write_str("unterminated string literal"),
            Invalid::UnterminatedTemplate => f.write_str("unterminated template literal"),
            Invalid::UnterminatedRegExp => f.write_str("unterminated regular expression"),
            Invalid::UnterminatedComment => f.write_str("unterminated comment"),
            Invalid::UnexpectedChar(ch) => write!(f, "unexpected character {ch:?}"),
        }
    }
}

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// Reserved words of the language.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            /// Look up a reserved word.
            pub fn from_word(word: &str) -> Option<Keyword> {
                match word {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            /// Source text of the keyword.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Await => "await",
    Break => "break",
    Case => "case",
    Catch => "catch",
    Class => "class",
    Const => "const",
    Continue => "continue",
    Debugger => "debugger",
    Default => "default",
    Delete => "delete",
    Do => "do",
    Else => "else",
    Enum => "enum",
    Export => "export",
    Extends => "extends",
    False => "false",
    Finally => "finally",
    For => "for",
    Function => "function",
    If => "if",
    Import => "import",
    In => "in",
    Instanceof => "instanceof",
    New => "new",
    Null => "null",
    Return => "return",
    Super => "super",
    Switch => "switch",
    This => "this",
    Throw => "throw",
    True => "true",
    Try => "try",
    Typeof => "typeof",
    Var => "var",
    Void => "void",
    While => "while",
    With => "with",
    Yield => "yield",
}

impl Keyword {
    /// Keywords that behave like a value, so a following `/` divides.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            Keyword::This | Keyword::Super | Keyword::True | Keyword::False | Keyword::Null
        )
    }
}

impl TokenKind {
    /// Returns true if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Number
                | TokenKind::String(_)
                | TokenKind::Template
                | TokenKind::RegExp
                | TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::Null)
        )
    }

    /// Whether a `/` after this token starts a regular expression rather
    /// than a division.
    pub fn allows_regexp_after(&self) -> bool {
        match self {
            TokenKind::Identifier(_)
            | TokenKind::PrivateIdentifier(_)
            | TokenKind::String(_)
            | TokenKind::Template
            | TokenKind::RegExp
            | TokenKind::Number => false,
            TokenKind::Keyword(kw) => !kw.is_value(),
            TokenKind::Punct(p) => !matches!(*p, ")" | "]" | "++" | "--"),
            TokenKind::Eof | TokenKind::Invalid(_) => true,
        }
    }
}
