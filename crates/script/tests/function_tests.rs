//! Tests for the function registry and the builtin functions.

use anyhow::anyhow;
use arith_script::{Arity, Function, FunctionError, FunctionRegistry, Value};

// =============================================================================
// Registry
// =============================================================================

#[test]
fn register_and_call() {
    let mut registry = FunctionRegistry::new();
    assert!(registry.is_empty());
    registry
        .register2("sub", true, |a, b| {
            Ok(Value::Integer(a.as_int64()? - b.as_int64()?))
        })
        .expect("register sub");

    assert!(registry.contains("sub"));
    assert_eq!(registry.len(), 1);
    let result = registry
        .call("sub", vec![Value::from(5), Value::from(3)])
        .expect("sub call succeeds");
    assert_eq!(result, Value::Integer(2));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut registry = FunctionRegistry::new();
    registry
        .register0("one", true, || Ok(Value::Integer(1)))
        .expect("register one");
    let err = registry
        .register1("one", false, Ok)
        .expect_err("duplicate should fail");
    assert!(matches!(err, FunctionError::AlreadyRegistered(ref name) if name == "one"));

    // The first registration is untouched.
    let function = registry.get("one").expect("one is registered");
    assert_eq!(function.arity(), Arity::Fixed(0));
    assert!(function.fold_eligible());
}

#[test]
fn remove_is_best_effort() {
    let mut registry = FunctionRegistry::new();
    registry
        .register0("one", true, || Ok(Value::Integer(1)))
        .expect("register one");
    assert!(registry.remove("one").is_some());
    assert!(registry.remove("one").is_none());
    assert!(!registry.contains("one"));
}

#[test]
fn calling_a_missing_function() {
    let registry = FunctionRegistry::new();
    let err = registry.call("nope", vec![]).expect_err("should fail");
    assert!(matches!(err, FunctionError::DoesNotExist(ref name) if name == "nope"));
}

#[test]
fn wrong_argument_count() {
    let mut registry = FunctionRegistry::new();
    registry
        .register3("pick", false, |a, _, _| Ok(a))
        .expect("register pick");
    let err = registry
        .call("pick", vec![Value::from(1)])
        .expect_err("should fail");
    assert!(matches!(
        err,
        FunctionError::IncorrectArgumentCount {
            expected: 3,
            found: 1,
            ..
        }
    ));
}

#[test]
fn every_arity_dispatches() {
    let mut registry = FunctionRegistry::new();
    registry
        .register0("zero", true, || Ok(Value::Integer(0)))
        .expect("register zero");
    registry
        .register1("first", true, Ok)
        .expect("register first");
    registry
        .register2("second", true, |_, b| Ok(b))
        .expect("register second");
    registry
        .register3("third", true, |_, _, c| Ok(c))
        .expect("register third");
    registry
        .register_variadic("count", true, |args| Ok(Value::from(args.len() as i64)))
        .expect("register count");

    let args = || vec![Value::from(1), Value::from(2), Value::from(3)];
    assert_eq!(registry.call("zero", vec![]).expect("zero"), Value::Integer(0));
    assert_eq!(
        registry.call("first", vec![Value::from(1)]).expect("first"),
        Value::Integer(1)
    );
    assert_eq!(
        registry
            .call("second", vec![Value::from(1), Value::from(2)])
            .expect("second"),
        Value::Integer(2)
    );
    assert_eq!(registry.call("third", args()).expect("third"), Value::Integer(3));
    assert_eq!(registry.call("count", args()).expect("count"), Value::Integer(3));
    assert_eq!(registry.call("count", vec![]).expect("count"), Value::Integer(0));
    assert_eq!(
        registry.names(),
        vec!["count", "first", "second", "third", "zero"]
    );
}

#[test]
fn arity_follows_the_callable_shape() {
    let shapes = [
        (Function::nullary("n", true, || Ok(Value::Null)), Arity::Fixed(0)),
        (Function::unary("u", true, Ok), Arity::Fixed(1)),
        (Function::binary("b", true, |a, _| Ok(a)), Arity::Fixed(2)),
        (Function::ternary("t", true, |a, _, _| Ok(a)), Arity::Fixed(3)),
        (Function::variadic("v", true, |_| Ok(Value::Null)), Arity::Variadic),
    ];
    for (function, arity) in shapes {
        assert_eq!(function.arity(), arity, "arity of {}", function.name());
    }
    assert!(Arity::Variadic.accepts(10));
    assert!(Arity::Fixed(2).accepts(2));
    assert!(!Arity::Fixed(2).accepts(1));
}

#[test]
fn udf_errors_are_preserved() {
    let function = Function::unary("fail", false, |_| Err(anyhow!("bad input").into()));
    let err = function.call(vec![Value::Null]).expect_err("should fail");
    assert_eq!(err.to_string(), "bad input");

    let function = Function::unary("strict", false, |v| Ok(Value::from(v.as_int64()?)));
    let err = function.call(vec![Value::from("x")]).expect_err("should fail");
    assert!(matches!(err, FunctionError::Value(_)));
}

// =============================================================================
// Builtins
// =============================================================================

#[test]
fn builtin_add_and_mul() {
    let registry = FunctionRegistry::builtins();
    let nums = || vec![Value::from(2), Value::from(3), Value::from(4)];
    assert_eq!(registry.call("add", nums()).expect("add"), Value::Integer(9));
    assert_eq!(registry.call("add", vec![]).expect("add"), Value::Integer(0));
    assert_eq!(registry.call("mul", nums()).expect("mul"), Value::Integer(24));
    assert_eq!(registry.call("mul", vec![]).expect("mul"), Value::Integer(1));
}

#[test]
fn builtin_overflow_is_an_error() {
    let registry = FunctionRegistry::builtins();
    let err = registry
        .call("add", vec![Value::from(i64::MAX), Value::from(1)])
        .expect_err("should overflow");
    assert!(matches!(err, FunctionError::Overflow(ref name) if name == "add"));
    assert!(registry.call("abs", vec![Value::from(i64::MIN)]).is_err());
}

#[test]
fn builtin_type_errors_name_the_argument() {
    let registry = FunctionRegistry::builtins();
    let err = registry
        .call("mul", vec![Value::from(1), Value::from("two")])
        .expect_err("should fail");
    match err {
        FunctionError::IncorrectArgumentType {
            name,
            index,
            found_type,
            expected_type,
        } => {
            assert_eq!(name, "mul");
            assert_eq!(index, 1);
            assert_eq!(found_type, "string");
            assert_eq!(expected_type, "integer");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(registry.call("len", vec![Value::from(3)]).is_err());
}

#[test]
fn builtin_min_max_abs_len() {
    let registry = FunctionRegistry::builtins();
    let pair = || vec![Value::from(-4), Value::from(7)];
    assert_eq!(registry.call("min", pair()).expect("min"), Value::Integer(-4));
    assert_eq!(registry.call("max", pair()).expect("max"), Value::Integer(7));
    assert_eq!(
        registry.call("abs", vec![Value::from(-4)]).expect("abs"),
        Value::Integer(4)
    );
    assert_eq!(
        registry.call("len", vec![Value::from("日本")]).expect("len"),
        Value::Integer(2)
    );
}

#[test]
fn builtin_len_counts_characters() {
    let registry = FunctionRegistry::builtins();
    assert_eq!(
        registry.call("len", vec![Value::from("")]).expect("len"),
        Value::Integer(0)
    );
    let long = "x".repeat(10_000);
    assert_eq!(
        registry.call("len", vec![Value::from(long)]).expect("len"),
        Value::Integer(10_000)
    );
    assert_eq!(registry.names(), vec!["abs", "add", "len", "max", "min", "mul"]);
}
