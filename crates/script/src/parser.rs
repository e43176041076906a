//! Parser for expressions.
//!
//! This is a hand written recursive descent parser that climbs operator precedence one level at
//! a time. Every level collects its run of same-priority operators into a single
//! [`Expr::Binary`] node, which is how left associativity is encoded: the evaluator folds the run
//! from left to right.
//!
//! # Grammar
//!
//! From lowest to highest precedence:
//!
//! ```text
//! expression  → binary(additive)
//! binary(L)   → lower(L) ( op_at(L) lower(L) )*
//! lower(L)    → binary(L + 1)             when L is not the highest level
//!             | signed_atom               otherwise
//! signed_atom → ( "+" | "-" ) atom | atom
//! atom        → variable | string | number | call | "(" expression ")"
//! call        → name "(" ( expression ( "," expression )* )? ")"
//! ```
//!
//! # Examples
//!
//! ```
//! use arith_script::parser::parse;
//! use arith_script::ast::Expr;
//!
//! assert_eq!(parse("42").unwrap(), Expr::Number(42));
//! assert_eq!(parse("   ").unwrap(), Expr::Empty);
//! assert!(parse("1+2abc").is_err());
//! ```

use std::collections::VecDeque;

use crate::ast::{Expr, Operand, Operator, Priority, UnaryOperator};
use crate::error::{ParseError, SyntaxError};
use crate::lexer::{Token, TokenKind, tokenize};

/// Default limit on nested parentheses and function calls.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tree levels one grouping can add: the additive run, the multiplicative run, the sign and the
/// parenthesis or call itself.
const LEVELS_PER_GROUP: usize = 4;

/// Deepest tree the parser produces when groupings nest at most `max_depth` deep. Code that
/// recurses over trees uses this as its limit, so every parsed tree fits.
pub fn max_tree_depth(max_depth: usize) -> usize {
    max_depth.saturating_add(1).saturating_mul(LEVELS_PER_GROUP)
}

/// Parse a full expression from the provided source string.
///
/// Blank input parses to [`Expr::Empty`]. Anything left over after a complete expression is an
/// error, so `1*2abc` is rejected even though `1*2` on its own is fine.
///
/// # Errors
///
/// Returns [`ParseError::Lex`] if the source contains a character the language does not know and
/// [`ParseError::Syntax`] if the tokens do not form an expression.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Same as [`parse`] with a custom nesting limit.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    let expr = Parser::new(tokens).with_max_depth(max_depth).parse()?;
    Ok(expr)
}

/// Parser over an already lexed token stream.
pub struct Parser {
    tokens: VecDeque<Token>,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Creates a parser, dropping whitespace tokens. Newlines are kept and no rule accepts one,
    /// so `1\n+2` is rejected.
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        Parser {
            tokens: tokens
                .into_iter()
                .filter(|t| t.kind != TokenKind::Whitespace)
                .collect(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses the token stream into exactly one expression.
    pub fn parse(mut self) -> Result<Expr, SyntaxError> {
        if self.tokens.is_empty() {
            return Ok(Expr::Empty);
        }

        let expr = self.expression()?;

        if let Some(token) = self.tokens.front() {
            return Err(SyntaxError::TrailingInput {
                found: token.text.clone(),
                line: token.line,
                column: token.column,
            });
        }

        Ok(expr)
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.binary(Priority::lowest())
    }

    fn binary(&mut self, priority: Priority) -> Result<Expr, SyntaxError> {
        let left = self.lower(priority)?;

        let mut operands = Vec::new();
        while let Some(op) = self.peek_operator(priority) {
            self.tokens.pop_front();
            let expr = self.lower(priority)?;
            operands.push(Operand::new(op, expr));
        }

        Ok(Expr::binary(left, priority, operands))
    }

    /// Parses an operand of a `priority` level operator.
    fn lower(&mut self, priority: Priority) -> Result<Expr, SyntaxError> {
        match priority.next() {
            Some(next) => self.binary(next),
            None => self.signed_atom(),
        }
    }

    fn peek_operator(&self, priority: Priority) -> Option<Operator> {
        let token = self.tokens.front()?;
        if token.kind != TokenKind::Operator {
            return None;
        }
        Operator::from_symbol(&token.text).filter(|op| priority.accepts(*op))
    }

    fn signed_atom(&mut self) -> Result<Expr, SyntaxError> {
        let sign = match self.tokens.front() {
            Some(token) if token.kind == TokenKind::Operator => {
                UnaryOperator::from_symbol(&token.text)
            }
            _ => None,
        };

        match sign {
            Some(op) => {
                self.tokens.pop_front();
                Ok(Expr::unary(op, self.atom()?))
            }
            None => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        const EXPECTED: &str = "an expression";

        let token = self.next_token(EXPECTED)?;
        match token.kind {
            TokenKind::Variable => Ok(Expr::Variable(token.text)),
            TokenKind::StringLiteral => Ok(Expr::String(unquote(&token.text))),
            TokenKind::Number => token
                .text
                .parse::<i64>()
                .map(Expr::Number)
                .map_err(|_| SyntaxError::InvalidNumber {
                    text: token.text.clone(),
                    line: token.line,
                    column: token.column,
                }),
            TokenKind::FunctionName => self.function_call(token),
            TokenKind::Control if token.is_control('(') => self.parenthesized(&token),
            _ => Err(unexpected(EXPECTED, &token)),
        }
    }

    fn function_call(&mut self, name: Token) -> Result<Expr, SyntaxError> {
        self.enter(&name)?;
        self.expect_control('(', "'('")?;

        let mut args = Vec::new();
        let empty = self.tokens.front().is_some_and(|t| t.is_control(')'));
        if !empty {
            args.push(self.expression()?);
            while self
                .tokens
                .front()
                .is_some_and(|t| t.kind == TokenKind::Comma)
            {
                self.tokens.pop_front();
                args.push(self.expression()?);
            }
        }

        self.expect_control(')', "')' or ','")?;
        self.leave();

        Ok(Expr::call(name.text, args))
    }

    fn parenthesized(&mut self, open: &Token) -> Result<Expr, SyntaxError> {
        self.enter(open)?;
        let inner = self.expression()?;
        self.expect_control(')', "')'")?;
        self.leave();

        Ok(Expr::parenthesized(inner))
    }

    fn next_token(&mut self, expected: &'static str) -> Result<Token, SyntaxError> {
        self.tokens
            .pop_front()
            .ok_or(SyntaxError::UnexpectedEnd { expected })
    }

    fn expect_control(&mut self, paren: char, expected: &'static str) -> Result<Token, SyntaxError> {
        let token = self.next_token(expected)?;
        if token.is_control(paren) {
            Ok(token)
        } else {
            Err(unexpected(expected, &token))
        }
    }

    fn enter(&mut self, token: &Token) -> Result<(), SyntaxError> {
        if self.depth >= self.max_depth {
            return Err(SyntaxError::NestingTooDeep {
                limit: self.max_depth,
                line: token.line,
                column: token.column,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

fn unexpected(expected: &'static str, token: &Token) -> SyntaxError {
    SyntaxError::UnexpectedToken {
        expected,
        found: token.text.clone(),
        line: token.line,
        column: token.column,
    }
}

/// Drops the delimiting quote characters of a string token.
fn unquote(text: &str) -> String {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}
