//! Runtime value representation for expressions.
//!
//! Arithmetic is defined on 64-bit signed integers only. Anything else a host
//! hands in (through the environment or a function result) passes through the
//! evaluator untouched as a [`HostValue`] and only fails once it is used as an
//! operand.

use std::any::Any;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Result type used for value operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Runtime value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value: an empty expression or an unbound variable.
    #[default]
    Null,
    Integer(i64),
    String(String),
    /// Opaque value owned by the host application.
    Host(HostValue),
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(value) => write!(f, "{value}"),
            Value::String(text) => write!(f, "{text}"),
            Value::Host(host) => write!(f, "<{}>", host.type_name()),
        }
    }
}

impl Value {
    /// Wraps an arbitrary host value.
    pub fn host<T: Any + Send + Sync>(value: T) -> Self {
        Value::Host(HostValue::new(value))
    }

    /// Converts a JSON value into a runtime value.
    ///
    /// Integers that fit in an `i64` and strings map onto their native variants, `null` maps to
    /// [`Value::Null`] and everything else (floats, booleans, arrays, objects) is kept as a host
    /// value holding the original JSON.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::String(text) => Value::String(text),
            serde_json::Value::Number(number) if number.is_i64() => match number.as_i64() {
                Some(value) => Value::Integer(value),
                None => Value::host(serde_json::Value::Number(number)),
            },
            other => Value::host(other),
        }
    }

    /// Returns a static type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Host(_) => "host",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the host value as `T` if this is a host value of that type.
    pub fn host_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Host(host) => host.downcast_ref(),
            _ => None,
        }
    }

    /// Returns the value as a 64-bit integer.
    pub fn as_int64(&self) -> ValueResult<i64> {
        match self {
            Value::Integer(value) => Ok(*value),
            _ => Err(ValueError::InvalidConversion {
                from: self.type_name(),
                to: "i64",
            }),
        }
    }

    /// Returns the value as a 32-bit integer, failing if it does not fit.
    pub fn as_int(&self) -> ValueResult<i32> {
        let value = self.as_int64().map_err(|_| ValueError::InvalidConversion {
            from: self.type_name(),
            to: "i32",
        })?;
        i32::try_from(value).map_err(|_| ValueError::OutOfRange {
            value,
            target: "i32",
        })
    }

    /// Returns the value as text. Integers are rendered in decimal.
    pub fn as_string(&self) -> ValueResult<String> {
        match self {
            Value::String(text) => Ok(text.clone()),
            Value::Integer(value) => Ok(value.to_string()),
            _ => Err(ValueError::InvalidConversion {
                from: self.type_name(),
                to: "string",
            }),
        }
    }

    /// Coerces the value into an arithmetic operand.
    ///
    /// A missing value counts as zero, so `a + 1` with `a` unbound evaluates to `1`.
    pub fn to_operand(&self, op: &'static str) -> ValueResult<i64> {
        match self {
            Value::Integer(value) => Ok(*value),
            Value::Null => Ok(0),
            _ => Err(ValueError::Type(TypeError::InvalidUnary {
                op,
                operand: self.type_name(),
            })),
        }
    }

    /// Adds two values.
    pub fn add(&self, other: &Value) -> ValueResult<Value> {
        let (lhs, rhs) = operand_pair("add", self, other)?;
        lhs.checked_add(rhs)
            .map(Value::Integer)
            .ok_or(ValueError::Overflow { op: "add" })
    }

    /// Subtracts one value from another.
    pub fn sub(&self, other: &Value) -> ValueResult<Value> {
        let (lhs, rhs) = operand_pair("sub", self, other)?;
        lhs.checked_sub(rhs)
            .map(Value::Integer)
            .ok_or(ValueError::Overflow { op: "sub" })
    }

    /// Multiplies values together.
    pub fn mul(&self, other: &Value) -> ValueResult<Value> {
        let (lhs, rhs) = operand_pair("mul", self, other)?;
        lhs.checked_mul(rhs)
            .map(Value::Integer)
            .ok_or(ValueError::Overflow { op: "mul" })
    }

    /// Divides one value by another, truncating toward zero.
    pub fn div(&self, other: &Value) -> ValueResult<Value> {
        let (lhs, rhs) = operand_pair("div", self, other)?;
        if rhs == 0 {
            return Err(ValueError::DivisionByZero { op: "div" });
        }
        lhs.checked_div(rhs)
            .map(Value::Integer)
            .ok_or(ValueError::Overflow { op: "div" })
    }

    /// Computes the remainder of dividing two values. The sign follows the dividend.
    pub fn rem(&self, other: &Value) -> ValueResult<Value> {
        let (lhs, rhs) = operand_pair("mod", self, other)?;
        if rhs == 0 {
            return Err(ValueError::DivisionByZero { op: "mod" });
        }
        lhs.checked_rem(rhs)
            .map(Value::Integer)
            .ok_or(ValueError::Overflow { op: "mod" })
    }

    /// Negates a numeric value.
    pub fn negate(&self) -> ValueResult<Value> {
        let value = self.to_operand("neg")?;
        value
            .checked_neg()
            .map(Value::Integer)
            .ok_or(ValueError::Overflow { op: "neg" })
    }

    /// Unary plus: coerces to an integer without changing it.
    pub fn identity(&self) -> ValueResult<Value> {
        self.to_operand("pos").map(Value::Integer)
    }
}

fn operand_pair(op: &'static str, left: &Value, right: &Value) -> ValueResult<(i64, i64)> {
    match (left.to_operand(op), right.to_operand(op)) {
        (Ok(lhs), Ok(rhs)) => Ok((lhs, rhs)),
        _ => Err(ValueError::Type(TypeError::InvalidOperation {
            op,
            left: left.type_name(),
            right: right.type_name(),
        })),
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<HostValue> for Value {
    fn from(value: HostValue) -> Self {
        Value::Host(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// An opaque, shareable value supplied by the host.
///
/// Two host values are equal only if they share the same allocation.
#[derive(Clone)]
pub struct HostValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// The Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HostValue").field(&self.type_name).finish()
    }
}

/// Errors produced by value operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    Type(TypeError),
    InvalidConversion {
        from: &'static str,
        to: &'static str,
    },
    OutOfRange {
        value: i64,
        target: &'static str,
    },
    DivisionByZero {
        op: &'static str,
    },
    Overflow {
        op: &'static str,
    },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::Type(err) => write!(f, "{err}"),
            ValueError::InvalidConversion { from, to } => {
                write!(f, "cannot convert {from} to {to}")
            }
            ValueError::OutOfRange { value, target } => {
                write!(f, "{value} does not fit in {target}")
            }
            ValueError::DivisionByZero { op } => write!(f, "operation '{op}' divides by zero"),
            ValueError::Overflow { op } => write!(f, "operation '{op}' overflows a 64-bit integer"),
        }
    }
}

impl std::error::Error for ValueError {}

impl From<TypeError> for ValueError {
    fn from(value: TypeError) -> Self {
        ValueError::Type(value)
    }
}

/// Type-level errors describing invalid operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    InvalidOperation {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    InvalidUnary {
        op: &'static str,
        operand: &'static str,
    },
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::InvalidOperation { op, left, right } => {
                write!(
                    f,
                    "operation '{op}' is not supported for {left} and {right}"
                )
            }
            TypeError::InvalidUnary { op, operand } => {
                write!(f, "operation '{op}' is not supported for {operand}")
            }
        }
    }
}

impl std::error::Error for TypeError {}
