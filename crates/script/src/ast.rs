//! Abstract syntax tree for expressions.
//!
//! Nodes own their children outright, so a tree is never shared or aliased while it is being
//! built. Once parsed a tree is only ever handed out by shared reference, which makes it
//! effectively immutable for the rest of its life.

use std::fmt;

use crate::walk::{Node, WalkControl, walk};

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// The result of parsing a blank source string.
    Empty,
    /// Integer literal.
    Number(i64),
    /// String literal, without its surrounding quotes. Escapes are kept as written.
    String(String),
    /// Variable looked up in the environment.
    Variable(String),
    /// Signed operand, e.g. `-a`.
    Unary { op: UnaryOperator, expr: Box<Expr> },
    /// Left-associative run of operators of the same priority, e.g. `a + b - c`.
    Binary(BinaryExpr),
    /// Function call, e.g. `max(a, 2)`.
    FunctionCall { name: String, args: Vec<Expr> },
    /// Parenthesized expression, kept as its own node so the grouping survives.
    Parenthesized(Box<Expr>),
}

impl Expr {
    /// Builds a binary run from `left` and its trailing operands.
    ///
    /// With no operands there is nothing to combine and `left` is returned as is, so a
    /// [`Expr::Binary`] node always holds at least one operand.
    pub fn binary(left: Expr, priority: Priority, operands: Vec<Operand>) -> Expr {
        if operands.is_empty() {
            return left;
        }
        Expr::Binary(BinaryExpr {
            left: Box::new(left),
            priority,
            operands,
        })
    }

    pub fn unary(op: UnaryOperator, expr: Expr) -> Expr {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn parenthesized(inner: Expr) -> Expr {
        Expr::Parenthesized(Box::new(inner))
    }

    /// Whether the node is a constant literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Number(_) | Expr::String(_))
    }

    /// Number of nested levels in the tree, counting this node as one.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        walk(self, |depth, node| {
            if let Node::Expr(_) = node {
                max = max.max(depth);
            }
            WalkControl::Continue
        });
        max
    }
}

/// A chain such as `a * b / c`: the first operand plus every `(operator, operand)` pair that
/// follows it, all at the same priority.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    left: Box<Expr>,
    priority: Priority,
    operands: Vec<Operand>,
}

impl BinaryExpr {
    pub fn left(&self) -> &Expr {
        &self.left
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub(crate) fn into_parts(self) -> (Expr, Priority, Vec<Operand>) {
        (*self.left, self.priority, self.operands)
    }
}

/// One `(operator, operand)` step of a [`BinaryExpr`].
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub op: Operator,
    pub expr: Expr,
}

impl Operand {
    pub fn new(op: Operator, expr: Expr) -> Self {
        Self { op, expr }
    }
}

/// Operator precedence levels, lowest first. All levels associate left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// `+` and `-`.
    Additive = 1,
    /// `*`, `/` and `%`.
    Multiplicative = 2,
}

impl Priority {
    /// The level an expression starts parsing at.
    pub fn lowest() -> Self {
        Priority::Additive
    }

    /// The next tighter level, or `None` past the highest one.
    pub fn next(self) -> Option<Self> {
        match self {
            Priority::Additive => Some(Priority::Multiplicative),
            Priority::Multiplicative => None,
        }
    }

    pub fn is_highest(self) -> bool {
        self.next().is_none()
    }

    /// Whether `op` binds at this level.
    pub fn accepts(self, op: Operator) -> bool {
        op.priority() == self
    }
}

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" => Some(Operator::Mul),
            "/" => Some(Operator::Div),
            "%" => Some(Operator::Mod),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            Operator::Add | Operator::Sub => Priority::Additive,
            Operator::Mul | Operator::Div | Operator::Mod => Priority::Multiplicative,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(UnaryOperator::Plus),
            "-" => Some(UnaryOperator::Minus),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
