use arith_script::{HostValue, TypeError, Value, ValueError};

#[test]
fn display_renders_each_variant() {
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::from(-12).to_string(), "-12");
    assert_eq!(Value::from("text").to_string(), "text");
    assert!(Value::host(1.5f64).to_string().contains("f64"));
}

#[test]
fn conversions() {
    assert_eq!(Value::from(7u8), Value::Integer(7));
    assert_eq!(Value::from(u32::MAX), Value::Integer(u32::MAX as i64));
    assert_eq!(Value::from(String::from("x")), Value::String("x".into()));
    assert_eq!(Value::from(None::<i32>), Value::Null);
    assert_eq!(Value::from(Some(3)), Value::Integer(3));
}

#[test]
fn as_int64_only_accepts_integers() {
    assert_eq!(Value::from(5).as_int64(), Ok(5));
    assert_eq!(
        Value::Null.as_int64(),
        Err(ValueError::InvalidConversion {
            from: "null",
            to: "i64"
        })
    );
    assert!(Value::from("5").as_int64().is_err());
}

#[test]
fn as_int_checks_range() {
    assert_eq!(Value::from(-5).as_int(), Ok(-5));
    assert_eq!(
        Value::Integer(i64::MAX).as_int(),
        Err(ValueError::OutOfRange {
            value: i64::MAX,
            target: "i32"
        })
    );
}

#[test]
fn as_string_renders_integers() {
    assert_eq!(Value::from(42).as_string(), Ok("42".to_string()));
    assert_eq!(Value::from("hi").as_string(), Ok("hi".to_string()));
    assert!(Value::Null.as_string().is_err());
}

#[test]
fn null_is_zero_in_arithmetic() {
    assert_eq!(Value::Null.add(&Value::from(3)), Ok(Value::Integer(3)));
    assert_eq!(Value::from(3).mul(&Value::Null), Ok(Value::Integer(0)));
    assert_eq!(Value::Null.negate(), Ok(Value::Integer(0)));
}

#[test]
fn arithmetic_is_checked() {
    let max = Value::Integer(i64::MAX);
    let min = Value::Integer(i64::MIN);
    assert_eq!(
        max.add(&Value::from(1)),
        Err(ValueError::Overflow { op: "add" })
    );
    assert_eq!(
        min.sub(&Value::from(1)),
        Err(ValueError::Overflow { op: "sub" })
    );
    assert_eq!(
        min.div(&Value::from(-1)),
        Err(ValueError::Overflow { op: "div" })
    );
    assert_eq!(min.negate(), Err(ValueError::Overflow { op: "neg" }));
    assert_eq!(
        Value::from(1).rem(&Value::from(0)),
        Err(ValueError::DivisionByZero { op: "mod" })
    );
}

#[test]
fn non_integers_are_rejected_as_operands() {
    let err = Value::from("a")
        .sub(&Value::from(1))
        .expect_err("should fail");
    assert_eq!(
        err,
        ValueError::Type(TypeError::InvalidOperation {
            op: "sub",
            left: "string",
            right: "integer",
        })
    );
    assert!(matches!(
        Value::host(()).identity(),
        Err(ValueError::Type(TypeError::InvalidUnary { op: "pos", .. }))
    ));
}

#[test]
fn host_values_compare_by_identity() {
    let handle = HostValue::new(vec![1, 2, 3]);
    let same = Value::from(handle.clone());
    assert_eq!(same, Value::Host(handle));
    assert_ne!(Value::host(vec![1, 2, 3]), Value::host(vec![1, 2, 3]));
    assert_eq!(same.host_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
    assert_eq!(same.host_ref::<String>(), None);
    assert_eq!(same.type_name(), "host");
}

#[test]
fn from_json() {
    use serde_json::json;

    assert_eq!(Value::from_json(json!(12)), Value::Integer(12));
    assert_eq!(Value::from_json(json!("s")), Value::from("s"));
    assert_eq!(Value::from_json(json!(null)), Value::Null);

    let float = Value::from_json(json!(1.5));
    assert_eq!(
        float.host_ref::<serde_json::Value>(),
        Some(&json!(1.5))
    );
    let list = Value::from_json(json!([1, 2]));
    assert!(matches!(list, Value::Host(_)));
}
