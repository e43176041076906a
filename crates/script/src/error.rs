//! Error types for every stage of the pipeline.
//!
//! Lexing and parsing failures carry the line and column of the offending input so a host can
//! point at it. Evaluation failures are never retried and never produce a partial result.

use thiserror::Error;

use crate::functions::FunctionError;
use crate::value::{TypeError, ValueError};

/// Convenience result type for the public API.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top level error returned by [`Vm::eval`](crate::Vm::eval).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// Registration or removal of a function failed.
    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// The source text contained a character the language does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("invalid character '{found}' at line {line}, column {column}: {context}...")]
    UnexpectedCharacter {
        found: char,
        line: usize,
        column: usize,
        /// Everything consumed before the bad character.
        context: String,
    },
    #[error("unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
}

/// The token stream does not form a valid expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("expected {expected} instead of '{found}' at line {line}, column {column}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("expected {expected} but reached the end of input")]
    UnexpectedEnd { expected: &'static str },
    #[error(
        "expression before line {line}, column {column} is valid but '{found}' and everything after it is redundant"
    )]
    TrailingInput {
        found: String,
        line: usize,
        column: usize,
    },
    #[error("number '{text}' at line {line}, column {column} does not fit in a 64-bit integer")]
    InvalidNumber {
        text: String,
        line: usize,
        column: usize,
    },
    #[error("expression nesting exceeds the limit of {limit} at line {line}, column {column}")]
    NestingTooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },
}

/// Anything that stops a source string from becoming an AST.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Failures while folding constant function calls.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("failed to fold call to '{name}'")]
    Fold {
        name: String,
        #[source]
        source: FunctionError,
    },
    #[error("expression nesting exceeds the optimizer limit of {limit}")]
    DepthLimitExceeded { limit: usize },
}

/// Failures while walking an AST.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid udf named '{0}'")]
    UnknownFunction(String),
    #[error("the function '{name}' requires {expected} argument(s) instead of {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("operator '{op}': {source}")]
    Type {
        op: &'static str,
        #[source]
        source: TypeError,
    },
    #[error("operator '{op}' divides by zero")]
    DivisionByZero { op: &'static str },
    #[error("operator '{op}' overflows a 64-bit integer")]
    Overflow { op: &'static str },
    #[error("expression nesting exceeds the evaluation limit of {limit}")]
    DepthLimitExceeded { limit: usize },
    #[error("error when optimizing expression")]
    Optimize(#[from] OptimizeError),
    #[error("call to '{name}' failed")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },
}

impl EvalError {
    /// Attributes a value error to the operator that raised it.
    pub(crate) fn from_value(op: &'static str, err: ValueError) -> Self {
        match err {
            ValueError::DivisionByZero { .. } => EvalError::DivisionByZero { op },
            ValueError::Overflow { .. } | ValueError::OutOfRange { .. } => {
                EvalError::Overflow { op }
            }
            ValueError::Type(source) => EvalError::Type { op, source },
            ValueError::InvalidConversion { from, .. } => EvalError::Type {
                op,
                source: TypeError::InvalidUnary { op, operand: from },
            },
        }
    }
}
