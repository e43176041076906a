//! Lexer turning source text into positioned tokens.
//!
//! The lexer keeps every character of the input, including whitespace and newlines, so the
//! positions it reports always line up with the source. Whitespace is dropped later by the
//! parser; newlines are not. A newline starts a new line for position tracking.

use std::fmt;

use crate::error::LexError;

/// Classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// One of `+ - * / %`.
    Operator,
    /// An identifier immediately followed by `(`.
    FunctionName,
    /// An unsigned run of decimal digits.
    Number,
    /// A quoted string. The token text keeps its quotes.
    StringLiteral,
    /// Any other identifier.
    Variable,
    /// `(` or `)`.
    Control,
    Comma,
    NewLine,
    Whitespace,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Operator => "operator",
            TokenKind::FunctionName => "function name",
            TokenKind::Number => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::Variable => "variable",
            TokenKind::Control => "paren",
            TokenKind::Comma => "comma",
            TokenKind::NewLine => "newline",
            TokenKind::Whitespace => "whitespace",
        };
        f.write_str(name)
    }
}

/// A classified slice of the source with its position.
///
/// `line` is 1-based; `column` is the 0-based character offset from the start of that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub(crate) fn is_control(&self, paren: char) -> bool {
        self.kind == TokenKind::Control && self.text.starts_with(paren)
    }
}

/// Tokenizes the whole input.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).collect()
}

/// Single pass scanner with one character of rollback.
pub struct Lexer {
    source: Vec<char>,
    offset: usize,
    /// Start offset of every line seen so far; the last entry is the current line.
    lines: Vec<usize>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            offset: 0,
            lines: vec![0],
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.source.get(self.offset).copied()?;
        self.offset += 1;
        Some(ch)
    }

    fn rollback(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.offset).copied()
    }

    fn line(&self) -> usize {
        self.lines.len()
    }

    fn column_of(&self, start: usize) -> usize {
        start - self.lines.last().copied().unwrap_or(0)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            text: self.source[start..self.offset].iter().collect(),
            line: self.line(),
            column: self.column_of(start),
        }
    }

    /// Consumes characters while `accept` holds and rolls back the first one that does not.
    fn consume_while(&mut self, accept: impl Fn(char) -> bool) {
        while let Some(ch) = self.bump() {
            if !accept(ch) {
                self.rollback();
                break;
            }
        }
    }

    /// Scans a string literal whose opening quote has already been consumed.
    fn scan_string(&mut self, quote: char, start: usize) -> Result<Token, LexError> {
        let mut escaped = false;
        while let Some(ch) = self.bump() {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                return Ok(self.token(TokenKind::StringLiteral, start));
            }
        }

        Err(LexError::UnterminatedString {
            line: self.line(),
            column: self.column_of(start),
        })
    }

    /// Returns the next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.offset;
        let Some(ch) = self.bump() else {
            return Ok(None);
        };

        let token = match ch {
            '+' | '-' | '*' | '/' | '%' => self.token(TokenKind::Operator, start),
            c if c.is_ascii_digit() => {
                self.consume_while(|c| c.is_ascii_digit());
                self.token(TokenKind::Number, start)
            }
            '\'' | '"' => self.scan_string(ch, start)?,
            c if c.is_alphabetic() || c == '_' => {
                self.consume_while(|c| c.is_alphanumeric() || c == '_');
                if self.peek() == Some('(') {
                    self.token(TokenKind::FunctionName, start)
                } else {
                    self.token(TokenKind::Variable, start)
                }
            }
            '(' | ')' => self.token(TokenKind::Control, start),
            '\n' => {
                let token = self.token(TokenKind::NewLine, start);
                self.lines.push(self.offset);
                token
            }
            c if c.is_whitespace() => self.token(TokenKind::Whitespace, start),
            ',' => self.token(TokenKind::Comma, start),
            found => {
                return Err(LexError::UnexpectedCharacter {
                    found,
                    line: self.line(),
                    column: self.column_of(start),
                    context: self.source[..self.offset].iter().collect(),
                });
            }
        };

        Ok(Some(token))
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_returns_the_last_character() {
        let mut lexer = Lexer::new("ab");
        assert_eq!(lexer.bump(), Some('a'));
        lexer.rollback();
        assert_eq!(lexer.bump(), Some('a'));
        assert_eq!(lexer.bump(), Some('b'));
        assert_eq!(lexer.bump(), None);
    }

    #[test]
    fn number_stops_before_identifier() {
        let mut lexer = Lexer::new("12ab");
        let number = lexer
            .next_token()
            .expect("lexing succeeds")
            .expect("a token is produced");
        assert_eq!(number.kind, TokenKind::Number);
        assert_eq!(number.text, "12");
        assert_eq!(lexer.offset, 2);
    }

    #[test]
    fn newline_records_line_start() {
        let mut lexer = Lexer::new("a\nb");
        while lexer.next_token().expect("lexing succeeds").is_some() {}
        assert_eq!(lexer.lines, vec![0, 2]);
    }
}
