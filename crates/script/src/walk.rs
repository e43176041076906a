//! Depth-first traversal over an expression tree.

use std::collections::BTreeSet;

use crate::ast::{Expr, Operator, UnaryOperator};

/// Returned by a visitor to decide whether to descend into the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not visit the children of this node.
    Skip,
}

/// Everything a visitor can be handed, including the operator and function name tags that are
/// not expressions on their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Expr(&'a Expr),
    Operator(Operator),
    UnaryOperator(UnaryOperator),
    FunctionName(&'a str),
}

/// Visits `expr` and its descendants in pre-order. The root is at depth 1.
pub fn walk<'a, F>(expr: &'a Expr, mut visitor: F)
where
    F: FnMut(usize, Node<'a>) -> WalkControl,
{
    walk_expr(expr, 1, &mut visitor);
}

fn walk_expr<'a, F>(expr: &'a Expr, depth: usize, visitor: &mut F)
where
    F: FnMut(usize, Node<'a>) -> WalkControl,
{
    if visitor(depth, Node::Expr(expr)) == WalkControl::Skip {
        return;
    }

    match expr {
        Expr::Binary(binary) => {
            walk_expr(binary.left(), depth + 1, visitor);
            for operand in binary.operands() {
                visitor(depth + 1, Node::Operator(operand.op));
                walk_expr(&operand.expr, depth + 1, visitor);
            }
        }
        Expr::Unary { op, expr } => {
            visitor(depth + 1, Node::UnaryOperator(*op));
            walk_expr(expr, depth + 1, visitor);
        }
        Expr::FunctionCall { name, args } => {
            visitor(depth + 1, Node::FunctionName(name));
            for arg in args {
                walk_expr(arg, depth + 1, visitor);
            }
        }
        Expr::Parenthesized(inner) => walk_expr(inner, depth + 1, visitor),
        Expr::Empty | Expr::Number(_) | Expr::String(_) | Expr::Variable(_) => {}
    }
}

/// Names of every variable the expression reads.
pub fn variables(expr: &Expr) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    walk(expr, |_, node| {
        if let Node::Expr(Expr::Variable(name)) = node {
            names.insert(name.clone());
        }
        WalkControl::Continue
    });
    names
}

/// Names of every function the expression calls.
pub fn function_names(expr: &Expr) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    walk(expr, |_, node| {
        if let Node::FunctionName(name) = node {
            names.insert(name.to_string());
        }
        WalkControl::Continue
    });
    names
}
