//! An embeddable integer expression language.
//!
//! Source strings are tokenized, parsed into an [`Expr`] tree, constant-folded and cached per
//! [`Vm`], then evaluated against an [`Env`] of variable bindings. Hosts extend the language by
//! registering functions.
//!
//! ```
//! use arith_script::{Env, Value, Vm};
//!
//! let vm = Vm::with_builtins();
//! let env = Env::from([("a".to_string(), Value::from(2))]);
//! assert_eq!(vm.eval("max(a, 3) * (1 + a)", &env).unwrap(), Value::Integer(9));
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod value;
pub mod vm;
pub mod walk;

pub use crate::ast::Expr;
pub use crate::config::VmConfig;
pub use crate::error::{
    Error, EvalError, LexError, OptimizeError, ParseError, Result, SyntaxError,
};
pub use crate::functions::{Arity, Function, FunctionError, FunctionRegistry, FunctionResult};
pub use crate::lexer::{Token, TokenKind, tokenize};
pub use crate::parser::parse;
pub use crate::value::{HostValue, TypeError, Value, ValueError, ValueResult};
pub use crate::vm::{Env, Vm, default_vm, eval, register_function};
