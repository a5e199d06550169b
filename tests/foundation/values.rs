//! Integration tests for interpreter values

use mapscript_foundation::{ErrorKind, Fault, ObjectHandle, Value};

#[test]
fn zero_is_the_null_object() {
    assert_eq!(Value::object(None), Value::Int(0));
    assert_eq!(Value::Int(0).as_object().unwrap(), None);
    assert_eq!(Value::default(), Value::NULL);
}

#[test]
fn objects_round_trip() {
    let h = ObjectHandle::new(9, 2);
    assert_eq!(Value::object(Some(h)).as_object().unwrap(), Some(h));
}

#[test]
fn nonzero_int_is_not_an_object() {
    let err = Value::Int(5).as_object().unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::FatalScript(Fault::TypeMismatch {
            expected: "object",
            actual: "int"
        })
    ));
}

#[test]
fn floats_truncate_to_ints() {
    assert_eq!(Value::Float(2.9).as_int().unwrap(), 2);
    assert_eq!(Value::Float(-2.9).as_int().unwrap(), -2);
}

#[test]
fn strings_are_not_ints() {
    assert!(Value::string("x").as_int().unwrap_err().is_fatal());
    assert_eq!(Value::string("door").as_str().unwrap(), "door");
}

#[test]
fn truthiness() {
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::Float(0.0).is_truthy());
    assert!(Value::Int(-1).is_truthy());
    assert!(Value::string("").is_truthy());
    assert!(Value::Object(ObjectHandle::new(0, 0)).is_truthy());
}

#[test]
fn conversions() {
    assert_eq!(Value::from(true), Value::Int(1));
    assert_eq!(Value::from(7), Value::Int(7));
    assert_eq!(Value::Int(1).type_name(), "int");
    assert_eq!(Value::string("a").type_name(), "string");
}
