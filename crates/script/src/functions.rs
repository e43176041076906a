use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value::{Value, ValueError};

#[derive(Debug, Error)]
pub enum FunctionError {
    /// The number of arguments to the function is incorrect
    #[error("function {name} takes {expected} argument(s), got {found}")]
    IncorrectArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    /// The type of an argument is incorrect
    #[error(
        "incorrect argument type for {name}, argument at index {index} is type {found_type}, expected {expected_type}"
    )]
    IncorrectArgumentType {
        name: String,
        index: usize,
        found_type: &'static str,
        expected_type: &'static str,
    },
    /// The function name does not exist
    #[error("function {0} does not exist")]
    DoesNotExist(String),
    /// A function with this name is already registered
    #[error("already registered a function named {0}")]
    AlreadyRegistered(String),
    #[error("function {0} overflowed a 64-bit integer")]
    Overflow(String),
    /// An argument could not be converted inside the function.
    #[error(transparent)]
    Value(#[from] ValueError),
    /// The error returned from a function. This means the function itself failed and not the
    /// function registry.
    #[error(transparent)]
    CallError(#[from] anyhow::Error),
}

/// A convenience wrapper for a result returned from a function
pub type FunctionResult = Result<Value, FunctionError>;

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments, from 0 to 3. Only the [`Callable`] shapes create these.
    Fixed(usize),
    /// Any number of arguments. The call site is never checked.
    Variadic,
}

impl Arity {
    /// Whether a call site with `count` arguments is acceptable.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(expected) => expected == count,
            Arity::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(count) => write!(f, "{count}"),
            Arity::Variadic => write!(f, "any number of"),
        }
    }
}

pub type NullaryFn = Arc<dyn Fn() -> FunctionResult + Send + Sync>;
pub type UnaryFn = Arc<dyn Fn(Value) -> FunctionResult + Send + Sync>;
pub type BinaryFn = Arc<dyn Fn(Value, Value) -> FunctionResult + Send + Sync>;
pub type TernaryFn = Arc<dyn Fn(Value, Value, Value) -> FunctionResult + Send + Sync>;
pub type VariadicFn = Arc<dyn Fn(&[Value]) -> FunctionResult + Send + Sync>;

/// The host closure behind a function, stored by the number of arguments it takes.
#[derive(Clone)]
pub enum Callable {
    Nullary(NullaryFn),
    Unary(UnaryFn),
    Binary(BinaryFn),
    Ternary(TernaryFn),
    Variadic(VariadicFn),
}

impl Callable {
    pub fn arity(&self) -> Arity {
        match self {
            Callable::Nullary(_) => Arity::Fixed(0),
            Callable::Unary(_) => Arity::Fixed(1),
            Callable::Binary(_) => Arity::Fixed(2),
            Callable::Ternary(_) => Arity::Fixed(3),
            Callable::Variadic(_) => Arity::Variadic,
        }
    }
}

/// A named, registered function.
#[derive(Clone)]
pub struct Function {
    name: String,
    fold_eligible: bool,
    callable: Callable,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .field("fold_eligible", &self.fold_eligible)
            .finish_non_exhaustive()
    }
}

impl Function {
    /// Creates a function. When `fold_eligible` is set, calls whose arguments are all literals
    /// are evaluated once when the expression is compiled, so the callable must be pure.
    pub fn new(name: impl Into<String>, fold_eligible: bool, callable: Callable) -> Self {
        Self {
            name: name.into(),
            fold_eligible,
            callable,
        }
    }

    pub fn nullary<F>(name: impl Into<String>, fold_eligible: bool, f: F) -> Self
    where
        F: Fn() -> FunctionResult + Send + Sync + 'static,
    {
        Self::new(name, fold_eligible, Callable::Nullary(Arc::new(f)))
    }

    pub fn unary<F>(name: impl Into<String>, fold_eligible: bool, f: F) -> Self
    where
        F: Fn(Value) -> FunctionResult + Send + Sync + 'static,
    {
        Self::new(name, fold_eligible, Callable::Unary(Arc::new(f)))
    }

    pub fn binary<F>(name: impl Into<String>, fold_eligible: bool, f: F) -> Self
    where
        F: Fn(Value, Value) -> FunctionResult + Send + Sync + 'static,
    {
        Self::new(name, fold_eligible, Callable::Binary(Arc::new(f)))
    }

    pub fn ternary<F>(name: impl Into<String>, fold_eligible: bool, f: F) -> Self
    where
        F: Fn(Value, Value, Value) -> FunctionResult + Send + Sync + 'static,
    {
        Self::new(name, fold_eligible, Callable::Ternary(Arc::new(f)))
    }

    pub fn variadic<F>(name: impl Into<String>, fold_eligible: bool, f: F) -> Self
    where
        F: Fn(&[Value]) -> FunctionResult + Send + Sync + 'static,
    {
        Self::new(name, fold_eligible, Callable::Variadic(Arc::new(f)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.callable.arity()
    }

    pub fn fold_eligible(&self) -> bool {
        self.fold_eligible
    }

    /// Invokes the function, checking the argument count first.
    pub fn call(&self, args: Vec<Value>) -> FunctionResult {
        match &self.callable {
            Callable::Nullary(f) => {
                let [] = self.fixed_args::<0>(args)?;
                f()
            }
            Callable::Unary(f) => {
                let [a] = self.fixed_args::<1>(args)?;
                f(a)
            }
            Callable::Binary(f) => {
                let [a, b] = self.fixed_args::<2>(args)?;
                f(a, b)
            }
            Callable::Ternary(f) => {
                let [a, b, c] = self.fixed_args::<3>(args)?;
                f(a, b, c)
            }
            Callable::Variadic(f) => f(&args),
        }
    }

    fn fixed_args<const N: usize>(&self, args: Vec<Value>) -> Result<[Value; N], FunctionError> {
        <[Value; N]>::try_from(args).map_err(|args| self.count_error(args.len()))
    }

    fn count_error(&self, found: usize) -> FunctionError {
        FunctionError::IncorrectArgumentCount {
            name: self.name.clone(),
            expected: match self.arity() {
                Arity::Fixed(count) => count,
                Arity::Variadic => found,
            },
            found,
        }
    }
}

/// Functions available to expressions, keyed by name.
///
/// Names are write-once: registering a name that already exists fails instead of replacing the
/// earlier function.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

impl FunctionRegistry {
    /// Creates a new, empty function registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a function registry with the builtin integer helpers registered.
    pub fn builtins() -> Self {
        let functions = [
            Function::variadic("add", true, add_fn),
            Function::variadic("mul", true, mul_fn),
            Function::unary("abs", true, abs_fn),
            Function::binary("min", true, min_fn),
            Function::binary("max", true, max_fn),
            Function::unary("len", true, len_fn),
        ];
        Self {
            functions: functions
                .into_iter()
                .map(|function| (function.name().to_string(), function))
                .collect(),
        }
    }

    /// Register a function under its own name
    pub fn register(&mut self, function: Function) -> Result<(), FunctionError> {
        if self.functions.contains_key(function.name()) {
            return Err(FunctionError::AlreadyRegistered(function.name().to_string()));
        }
        log::debug!(
            "registering function {} taking {} argument(s)",
            function.name(),
            function.arity()
        );
        self.functions.insert(function.name().to_string(), function);
        Ok(())
    }

    pub fn register0<F>(&mut self, name: &str, fold_eligible: bool, f: F) -> Result<(), FunctionError>
    where
        F: Fn() -> FunctionResult + Send + Sync + 'static,
    {
        self.register(Function::nullary(name, fold_eligible, f))
    }

    pub fn register1<F>(&mut self, name: &str, fold_eligible: bool, f: F) -> Result<(), FunctionError>
    where
        F: Fn(Value) -> FunctionResult + Send + Sync + 'static,
    {
        self.register(Function::unary(name, fold_eligible, f))
    }

    pub fn register2<F>(&mut self, name: &str, fold_eligible: bool, f: F) -> Result<(), FunctionError>
    where
        F: Fn(Value, Value) -> FunctionResult + Send + Sync + 'static,
    {
        self.register(Function::binary(name, fold_eligible, f))
    }

    pub fn register3<F>(&mut self, name: &str, fold_eligible: bool, f: F) -> Result<(), FunctionError>
    where
        F: Fn(Value, Value, Value) -> FunctionResult + Send + Sync + 'static,
    {
        self.register(Function::ternary(name, fold_eligible, f))
    }

    pub fn register_variadic<F>(
        &mut self,
        name: &str,
        fold_eligible: bool,
        f: F,
    ) -> Result<(), FunctionError>
    where
        F: Fn(&[Value]) -> FunctionResult + Send + Sync + 'static,
    {
        self.register(Function::variadic(name, fold_eligible, f))
    }

    /// Removes a function, returning it if it was registered.
    pub fn remove(&mut self, name: &str) -> Option<Function> {
        self.functions.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call the given function name with the args
    pub fn call(&self, name: &str, args: Vec<Value>) -> FunctionResult {
        let f = self
            .functions
            .get(name)
            .ok_or_else(|| FunctionError::DoesNotExist(name.to_string()))?;
        f.call(args)
    }
}

fn integer_arg(name: &str, index: usize, value: &Value) -> Result<i64, FunctionError> {
    value
        .as_int64()
        .map_err(|_| FunctionError::IncorrectArgumentType {
            name: name.to_string(),
            index,
            found_type: value.type_name(),
            expected_type: "integer",
        })
}

fn add_fn(args: &[Value]) -> FunctionResult {
    let mut sum: i64 = 0;
    for (index, arg) in args.iter().enumerate() {
        sum = sum
            .checked_add(integer_arg("add", index, arg)?)
            .ok_or_else(|| FunctionError::Overflow("add".to_string()))?;
    }
    Ok(Value::Integer(sum))
}

// No arguments gives 1, the same as x^0.
fn mul_fn(args: &[Value]) -> FunctionResult {
    let mut product: i64 = 1;
    for (index, arg) in args.iter().enumerate() {
        product = product
            .checked_mul(integer_arg("mul", index, arg)?)
            .ok_or_else(|| FunctionError::Overflow("mul".to_string()))?;
    }
    Ok(Value::Integer(product))
}

fn abs_fn(value: Value) -> FunctionResult {
    integer_arg("abs", 0, &value)?
        .checked_abs()
        .map(Value::Integer)
        .ok_or_else(|| FunctionError::Overflow("abs".to_string()))
}

fn min_fn(a: Value, b: Value) -> FunctionResult {
    Ok(Value::Integer(
        integer_arg("min", 0, &a)?.min(integer_arg("min", 1, &b)?),
    ))
}

fn max_fn(a: Value, b: Value) -> FunctionResult {
    Ok(Value::Integer(
        integer_arg("max", 0, &a)?.max(integer_arg("max", 1, &b)?),
    ))
}

fn len_fn(value: Value) -> FunctionResult {
    match value {
        Value::String(text) => i64::try_from(text.chars().count())
            .map(Value::Integer)
            .map_err(|_| FunctionError::Overflow("len".to_string())),
        other => Err(FunctionError::IncorrectArgumentType {
            name: "len".to_string(),
            index: 0,
            found_type: other.type_name(),
            expected_type: "string",
        }),
    }
}
