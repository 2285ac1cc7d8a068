//! The scanner that produces tokens from source text.

use super::{Invalid, Keyword, Span, Token, TokenKind};

/// Punctuators, longest first so the first prefix match wins.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<", ">", "+", "-",
    "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=", ".", "@",
];

/// A scanner that tokenizes JavaScript source code.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    /// Kind of the last significant token, drives regex-vs-division.
    prev: Option<TokenKind>,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            prev: None,
        };
        if source.starts_with("#!") {
            while let Some(ch) = scanner.peek() {
                if ch == '\n' || ch == '\r' {
                    break;
                }
                scanner.advance();
            }
        }
        scanner
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        if let Err(invalid) = self.skip_whitespace_and_comments() {
            let span = Span::new(self.current_pos, self.source.len());
            return Token::new(TokenKind::Invalid(invalid), span);
        }

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match ch {
            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(),
            '0'..='9' => self.scan_number(),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            '/' if self.regexp_allowed() => self.scan_regexp(),
            '#' => self.scan_private_identifier(),
            _ if is_id_start(ch) => self.scan_identifier(ch),
            _ => self.scan_punctuator(start),
        };

        self.prev = Some(kind.clone());
        Token::new(kind, Span::new(start, self.current_pos))
    }

    /// Collect every token up to (not including) EOF.
    pub fn tokenize(source: &'a str) -> Vec<Token> {
        Scanner::new(source).collect()
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn regexp_allowed(&self) -> bool {
        self.prev.as_ref().is_none_or(TokenKind::allows_regexp_after)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), Invalid> {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if ch == '\n' || ch == '\r' || ch == '\u{2028}' || ch == '\u{2029}' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        loop {
                            match self.advance() {
                                None => return Err(Invalid::UnterminatedComment),
                                Some((_, '/')) if prev == '*' => break,
                                Some((_, ch)) => prev = ch,
                            }
                        }
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn scan_punctuator(&mut self, start: usize) -> TokenKind {
        let rest = &self.source[start..];
        let Some(punct) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) else {
            let ch = rest.chars().next().unwrap_or('\0');
            return TokenKind::Invalid(Invalid::UnexpectedChar(ch));
        };
        // The first character was consumed by `next_token`.
        for _ in 1..punct.len() {
            self.advance();
        }
        TokenKind::Punct(punct)
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None | Some((_, '\n' | '\r')) => {
                    return TokenKind::Invalid(Invalid::UnterminatedString);
                }
                Some((_, ch)) if ch == quote => break,
                Some((_, '\\')) => match self.advance() {
                    None => return TokenKind::Invalid(Invalid::UnterminatedString),
                    Some((_, escaped)) => match escaped {
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        '0' => value.push('\0'),
                        'x' => self.scan_hex_escape(2, &mut value),
                        'u' => self.scan_unicode_escape(&mut value),
                        // Line continuation
                        '\n' => {}
                        '\r' => {
                            if self.peek() == Some('\n') {
                                self.advance();
                            }
                        }
                        _ => value.push(escaped),
                    },
                },
                Some((_, ch)) => value.push(ch),
            }
        }

        TokenKind::String(value)
    }

    fn scan_hex_escape(&mut self, digits: usize, value: &mut String) {
        let mut code = 0u32;
        for _ in 0..digits {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    code = code * 16 + d;
                    self.advance();
                }
                None => break,
            }
        }
        value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    fn scan_unicode_escape(&mut self, value: &mut String) {
        if self.peek() != Some('{') {
            return self.scan_hex_escape(4, value);
        }
        self.advance();
        let mut code = 0u32;
        while let Some(ch) = self.peek() {
            self.advance();
            match ch.to_digit(16) {
                Some(d) => code = code.saturating_mul(16).saturating_add(d),
                None => break,
            }
        }
        value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    /// Scans a template literal, lexing `${}` substitutions as ordinary
    /// tokens so nested braces, strings and templates are skipped correctly.
    fn scan_template(&mut self) -> TokenKind {
        loop {
            match self.advance() {
                None => return TokenKind::Invalid(Invalid::UnterminatedTemplate),
                Some((_, '`')) => return TokenKind::Template,
                Some((_, '\\')) => {
                    self.advance();
                }
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    self.prev = Some(TokenKind::Punct("${"));
                    let mut depth = 0usize;
                    loop {
                        let token = self.next_token();
                        match token.kind {
                            TokenKind::Eof => {
                                return TokenKind::Invalid(Invalid::UnterminatedTemplate);
                            }
                            TokenKind::Invalid(invalid) => return TokenKind::Invalid(invalid),
                            TokenKind::Punct("{") => depth += 1,
                            TokenKind::Punct("}") if depth == 0 => break,
                            TokenKind::Punct("}") => depth -= 1,
                            _ => {}
                        }
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn scan_regexp(&mut self) -> TokenKind {
        let mut in_class = false;
        loop {
            match self.advance() {
                None | Some((_, '\n' | '\r')) => {
                    return TokenKind::Invalid(Invalid::UnterminatedRegExp);
                }
                Some((_, '\\')) => {
                    self.advance();
                }
                Some((_, '[')) => in_class = true,
                Some((_, ']')) => in_class = false,
                Some((_, '/')) if !in_class => break,
                Some(_) => {}
            }
        }
        // Flags
        while self.peek().is_some_and(is_id_continue) {
            self.advance();
        }
        TokenKind::RegExp
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut last = '0';
        while let Some(ch) = self.peek() {
            let exponent_sign = matches!(ch, '+' | '-') && matches!(last, 'e' | 'E');
            if is_id_continue(ch) || ch == '.' || exponent_sign {
                last = ch;
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Number
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Member names are never keywords: `module.exports.default`.
        let after_dot = matches!(self.prev, Some(TokenKind::Punct("." | "?.")));
        match Keyword::from_word(&name) {
            Some(keyword) if !after_dot => TokenKind::Keyword(keyword),
            _ => TokenKind::Identifier(name),
        }
    }

    fn scan_private_identifier(&mut self) -> TokenKind {
        let mut name = String::new();

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if name.is_empty() {
            TokenKind::Invalid(Invalid::UnexpectedChar('#'))
        } else {
            TokenKind::PrivateIdentifier(name)
        }
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuators_longest_match() {
        assert_eq!(
            kinds("a >>>= b ?. c"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Punct(">>>="),
                TokenKind::Identifier("b".into()),
                TokenKind::Punct("?."),
                TokenKind::Identifier("c".into()),
            ]
        );
    }

    #[test]
    fn test_strings() {
        let mut scanner = Scanner::new(r#""hello" 'wo\'rld' '\x41B\u{43}'"#);
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "hello"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "wo'rld"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "ABC"));
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(
            kinds("'abc"),
            vec![TokenKind::Invalid(Invalid::UnterminatedString)]
        );
    }

    #[test]
    fn test_keywords_and_contextual_words() {
        assert_eq!(
            kinds("import from as"),
            vec![
                TokenKind::Keyword(Keyword::Import),
                TokenKind::Identifier("from".into()),
                TokenKind::Identifier("as".into()),
            ]
        );
    }

    #[test]
    fn test_member_name_is_not_keyword() {
        assert_eq!(
            kinds("x.default"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Punct("."),
                TokenKind::Identifier("default".into()),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("1 // line\n /* block */ 2"),
            vec![TokenKind::Number, TokenKind::Number]
        );
        assert_eq!(
            kinds("1 /* open"),
            vec![
                TokenKind::Number,
                TokenKind::Invalid(Invalid::UnterminatedComment)
            ]
        );
    }

    #[test]
    fn test_division_vs_regexp() {
        assert_eq!(
            kinds("a / b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Punct("/"),
                TokenKind::Identifier("b".into()),
            ]
        );
        assert_eq!(
            kinds("x = /[/]import/g"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Punct("="),
                TokenKind::RegExp,
            ]
        );
    }

    #[test]
    fn test_template_with_substitutions() {
        assert_eq!(
            kinds("`a ${ {b: `c${d}`} } e` + 1"),
            vec![TokenKind::Template, TokenKind::Punct("+"), TokenKind::Number]
        );
        assert_eq!(
            kinds("`open ${x"),
            vec![TokenKind::Invalid(Invalid::UnterminatedTemplate)]
        );
    }

    #[test]
    fn test_hashbang() {
        assert_eq!(kinds("#!/usr/bin/env node\nx"), vec![TokenKind::Identifier("x".into())]);
    }

    #[test]
    fn test_spans() {
        let tokens = Scanner::tokenize("let  abc");
        assert_eq!(tokens[1].span, Span::new(5, 8));
        assert_eq!(tokens[1].span.slice("let  abc"), "abc");
    }
}
