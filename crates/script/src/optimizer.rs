//! Compile-time constant folding of function calls.
//!
//! Children are rewritten before their parent, so a call becomes foldable as soon as its arguments
//! have folded into literals: `max(abs(3), 2)` collapses in one pass.

use crate::ast::{Expr, Operand};
use crate::error::OptimizeError;
use crate::functions::FunctionRegistry;
use crate::parser::{DEFAULT_MAX_DEPTH, max_tree_depth};
use crate::Value;

/// Rewrites `expr`, replacing every call to a fold-eligible function whose arguments are all
/// literals with the literal it returns.
///
/// Calls to unknown or non-foldable functions, calls with the wrong number of arguments and calls
/// that return something other than an integer or a string are left as they are, to be resolved
/// at evaluation time. Running the optimizer on its own output changes nothing.
///
/// # Errors
///
/// Returns [`OptimizeError::Fold`] if a function fails while being folded and
/// [`OptimizeError::DepthLimitExceeded`] for a tree deeper than any parsed source could be.
pub fn optimize(expr: Expr, registry: &FunctionRegistry) -> Result<Expr, OptimizeError> {
    optimize_with_max_depth(expr, registry, DEFAULT_MAX_DEPTH)
}

/// Same as [`optimize`] for trees parsed with a custom nesting limit.
pub fn optimize_with_max_depth(
    expr: Expr,
    registry: &FunctionRegistry,
    max_depth: usize,
) -> Result<Expr, OptimizeError> {
    let folder = Folder {
        registry,
        max_depth,
        max_levels: max_tree_depth(max_depth),
    };
    folder.rewrite(expr, 0)
}

struct Folder<'a> {
    registry: &'a FunctionRegistry,
    max_depth: usize,
    max_levels: usize,
}

impl Folder<'_> {
    fn rewrite(&self, expr: Expr, level: usize) -> Result<Expr, OptimizeError> {
        if level >= self.max_levels {
            return Err(OptimizeError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        let level = level + 1;

        let optimized = match expr {
            Expr::Unary { op, expr } => Expr::unary(op, self.rewrite(*expr, level)?),
            Expr::Binary(binary) => {
                let (left, priority, operands) = binary.into_parts();
                let left = self.rewrite(left, level)?;
                let operands = operands
                    .into_iter()
                    .map(|Operand { op, expr }| {
                        self.rewrite(expr, level).map(|expr| Operand::new(op, expr))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::binary(left, priority, operands)
            }
            Expr::Parenthesized(inner) => Expr::parenthesized(self.rewrite(*inner, level)?),
            Expr::FunctionCall { name, args } => {
                let args = args
                    .into_iter()
                    .map(|arg| self.rewrite(arg, level))
                    .collect::<Result<Vec<_>, _>>()?;
                return fold_call(name, args, self.registry);
            }
            leaf @ (Expr::Empty | Expr::Number(_) | Expr::String(_) | Expr::Variable(_)) => leaf,
        };
        Ok(optimized)
    }
}

fn fold_call(
    name: String,
    args: Vec<Expr>,
    registry: &FunctionRegistry,
) -> Result<Expr, OptimizeError> {
    let Some(function) = registry.get(&name) else {
        return Ok(Expr::call(name, args));
    };
    if !function.fold_eligible()
        || !function.arity().accepts(args.len())
        || !args.iter().all(Expr::is_literal)
    {
        return Ok(Expr::call(name, args));
    }

    let values = args.iter().map(literal_value).collect();
    let result = function
        .call(values)
        .map_err(|source| OptimizeError::Fold {
            name: name.clone(),
            source,
        })?;

    match result {
        Value::Integer(value) => {
            log::debug!("folded call to {name} into {value}");
            Ok(Expr::Number(value))
        }
        Value::String(text) => {
            log::debug!("folded call to {name} into a string literal");
            Ok(Expr::String(text))
        }
        Value::Null | Value::Host(_) => Ok(Expr::call(name, args)),
    }
}

fn literal_value(expr: &Expr) -> Value {
    match expr {
        Expr::Number(value) => Value::Integer(*value),
        Expr::String(text) => Value::String(text.clone()),
        _ => Value::Null,
    }
}
