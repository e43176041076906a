//! Expression runtime: parsing, caching and evaluation.
//!
//! A [`Vm`] is shared freely between threads. Parsed expressions are cached by their exact
//! source text and reused for every environment; the environment itself is only borrowed for the
//! duration of a single call and never kept.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::ast::{Expr, Operator, UnaryOperator};
use crate::config::VmConfig;
use crate::error::{EvalError, Result};
use crate::functions::{Arity, Function, FunctionRegistry, FunctionResult};
use crate::optimizer::optimize_with_max_depth;
use crate::parser::{max_tree_depth, parse_with_max_depth};
use crate::value::{Value, ValueResult};

/// Variable bindings for one evaluation. Unbound names evaluate to [`Value::Null`].
pub type Env = HashMap<String, Value>;

static DEFAULT_VM: Lazy<Vm> = Lazy::new(Vm::new);

/// The process-wide VM used by [`eval`] and [`register_function`]. It starts with no functions.
pub fn default_vm() -> &'static Vm {
    &DEFAULT_VM
}

/// Evaluates `source` on the [`default_vm`].
pub fn eval(source: &str, env: &Env) -> Result<Value> {
    DEFAULT_VM.eval(source, env)
}

/// Registers a function on the [`default_vm`].
pub fn register_function(function: Function) -> Result<()> {
    DEFAULT_VM.register_function(function)
}

/// Evaluator with its own function registry and expression cache.
#[derive(Debug, Default)]
pub struct Vm {
    functions: RwLock<FunctionRegistry>,
    /// Bumped under the registry write lock on every registration or removal.
    generation: AtomicU64,
    cache: RwLock<HashMap<String, Arc<Expr>>>,
    config: VmConfig,
}

/// How far evaluation has recursed: groupings entered and tree levels descended.
#[derive(Debug, Clone, Copy, Default)]
struct Depth {
    groups: usize,
    levels: usize,
}

impl Vm {
    /// Creates a VM with no functions and the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a VM preloaded with [`FunctionRegistry::builtins`].
    pub fn with_builtins() -> Self {
        Self::with_registry(FunctionRegistry::builtins(), VmConfig::default())
    }

    pub fn with_registry(functions: FunctionRegistry, config: VmConfig) -> Self {
        Self {
            functions: RwLock::new(functions),
            generation: AtomicU64::new(0),
            cache: RwLock::default(),
            config,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Parses (or fetches from the cache) and evaluates `source` against `env`.
    ///
    /// # Errors
    ///
    /// Parse errors, folding failures and evaluation failures are all returned as is. Nothing is
    /// cached for a source that fails to parse or optimize.
    pub fn eval(&self, source: &str, env: &Env) -> Result<Value> {
        let expr = self.compile(source)?;
        Ok(self.eval_expr(&expr, env)?)
    }

    /// Returns the cached tree for `source`, parsing and optimizing it on a miss.
    ///
    /// If the registry changes while a tree is being folded, the fold is redone against the new
    /// registry so a removed function never ends up cached.
    pub fn compile(&self, source: &str) -> Result<Arc<Expr>> {
        if let Some(expr) = self.cache.read().get(source) {
            log::debug!("expression cache hit for {source:?}");
            return Ok(Arc::clone(expr));
        }
        log::debug!("expression cache miss for {source:?}");

        let parsed = parse_with_max_depth(source, self.config.max_depth)?;
        loop {
            let (expr, generation) = if self.config.optimize {
                // Folding runs host code, so it works on a snapshot instead of holding the lock.
                let (functions, generation) = {
                    let functions = self.functions.read();
                    (functions.clone(), self.generation.load(Ordering::SeqCst))
                };
                let expr =
                    optimize_with_max_depth(parsed.clone(), &functions, self.config.max_depth)
                        .map_err(EvalError::from)?;
                (expr, Some(generation))
            } else {
                (parsed.clone(), None)
            };

            let mut cache = self.cache.write();
            if generation.is_some_and(|seen| seen != self.generation.load(Ordering::SeqCst)) {
                log::debug!("functions changed while folding {source:?}, folding again");
                continue;
            }
            let cached = cache
                .entry(source.to_string())
                .or_insert_with(|| Arc::new(expr));
            return Ok(Arc::clone(cached));
        }
    }

    /// Evaluates an already parsed tree.
    ///
    /// Trees nested deeper than any parsed source could be fail with
    /// [`EvalError::DepthLimitExceeded`] instead of exhausting the stack.
    pub fn eval_expr(&self, expr: &Expr, env: &Env) -> Result<Value, EvalError> {
        self.evaluate(expr, env, Depth::default())
    }

    fn evaluate(&self, expr: &Expr, env: &Env, depth: Depth) -> Result<Value, EvalError> {
        let depth = self.descend(depth)?;
        log::trace!("evaluating {expr:?} at depth {}", depth.levels);
        match expr {
            Expr::Empty => Ok(Value::Null),
            Expr::Number(value) => Ok(Value::Integer(*value)),
            Expr::String(text) => Ok(Value::String(text.clone())),
            Expr::Variable(name) => Ok(env.get(name).cloned().unwrap_or_default()),
            Expr::Unary { op, expr } => {
                let value = self.evaluate(expr, env, depth)?;
                let result = match op {
                    UnaryOperator::Plus => value.identity(),
                    UnaryOperator::Minus => value.negate(),
                };
                result.map_err(|err| EvalError::from_value(op.symbol(), err))
            }
            Expr::Binary(binary) => {
                let mut acc = self.evaluate(binary.left(), env, depth)?;
                for operand in binary.operands() {
                    let rhs = self.evaluate(&operand.expr, env, depth)?;
                    acc = apply(operand.op, &acc, &rhs)
                        .map_err(|err| EvalError::from_value(operand.op.symbol(), err))?;
                }
                Ok(acc)
            }
            Expr::FunctionCall { name, args } => {
                let depth = self.enter(depth)?;
                self.call(name, args, env, depth)
            }
            Expr::Parenthesized(inner) => {
                let depth = self.enter(depth)?;
                self.evaluate(inner, env, depth)
            }
        }
    }

    fn depth_error(&self) -> EvalError {
        EvalError::DepthLimitExceeded {
            limit: self.config.max_depth,
        }
    }

    /// Counts one tree level.
    fn descend(&self, depth: Depth) -> Result<Depth, EvalError> {
        if depth.levels >= max_tree_depth(self.config.max_depth) {
            return Err(self.depth_error());
        }
        Ok(Depth {
            levels: depth.levels + 1,
            ..depth
        })
    }

    /// Counts one level of grouping, the same way the parser does.
    fn enter(&self, depth: Depth) -> Result<Depth, EvalError> {
        if depth.groups >= self.config.max_depth {
            return Err(self.depth_error());
        }
        Ok(Depth {
            groups: depth.groups + 1,
            ..depth
        })
    }

    fn call(&self, name: &str, args: &[Expr], env: &Env, depth: Depth) -> Result<Value, EvalError> {
        // Cloned out so the function can call back into this VM without holding the lock.
        let function = self
            .functions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;

        match function.arity() {
            Arity::Fixed(expected) if expected != args.len() => {
                return Err(EvalError::ArityMismatch {
                    name: name.to_string(),
                    expected,
                    found: args.len(),
                });
            }
            _ => {}
        }

        let values = args
            .iter()
            .map(|arg| self.evaluate(arg, env, depth))
            .collect::<Result<Vec<_>, _>>()?;

        function.call(values).map_err(|source| EvalError::Function {
            name: name.to_string(),
            source,
        })
    }

    /// Registers a function. Names are write-once.
    pub fn register_function(&self, function: Function) -> Result<()> {
        let mut functions = self.functions.write();
        functions.register(function)?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn register0<F>(&self, name: &str, fold_eligible: bool, f: F) -> Result<()>
    where
        F: Fn() -> FunctionResult + Send + Sync + 'static,
    {
        self.register_function(Function::nullary(name, fold_eligible, f))
    }

    pub fn register1<F>(&self, name: &str, fold_eligible: bool, f: F) -> Result<()>
    where
        F: Fn(Value) -> FunctionResult + Send + Sync + 'static,
    {
        self.register_function(Function::unary(name, fold_eligible, f))
    }

    pub fn register2<F>(&self, name: &str, fold_eligible: bool, f: F) -> Result<()>
    where
        F: Fn(Value, Value) -> FunctionResult + Send + Sync + 'static,
    {
        self.register_function(Function::binary(name, fold_eligible, f))
    }

    pub fn register3<F>(&self, name: &str, fold_eligible: bool, f: F) -> Result<()>
    where
        F: Fn(Value, Value, Value) -> FunctionResult + Send + Sync + 'static,
    {
        self.register_function(Function::ternary(name, fold_eligible, f))
    }

    pub fn register_variadic<F>(&self, name: &str, fold_eligible: bool, f: F) -> Result<()>
    where
        F: Fn(&[Value]) -> FunctionResult + Send + Sync + 'static,
    {
        self.register_function(Function::variadic(name, fold_eligible, f))
    }

    /// Removes a function if it is registered and returns whether it was.
    ///
    /// Cached expressions may hold results folded from the removed function, so the cache is
    /// cleared whenever something is removed.
    pub fn remove_function(&self, name: &str) -> bool {
        let removed = {
            let mut functions = self.functions.write();
            let removed = functions.remove(name).is_some();
            if removed {
                self.generation.fetch_add(1, Ordering::SeqCst);
            }
            removed
        };
        if removed {
            log::debug!("removed function {name}, clearing expression cache");
            self.clear_cache();
        }
        removed
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.read().contains(name)
    }

    /// Number of parsed expressions currently cached.
    pub fn cached_expressions(&self) -> usize {
        self.cache.read().len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
    }
}

fn apply(op: Operator, lhs: &Value, rhs: &Value) -> ValueResult<Value> {
    match op {
        Operator::Add => lhs.add(rhs),
        Operator::Sub => lhs.sub(rhs),
        Operator::Mul => lhs.mul(rhs),
        Operator::Div => lhs.div(rhs),
        Operator::Mod => lhs.rem(rhs),
    }
}
