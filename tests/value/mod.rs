// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use launchspec::*;

#[test]
fn serialize_number() -> Result<()> {
    // Check that integer values are serialized without fractional part
    assert_eq!(serde_json::to_string_pretty(&Value::from(1.0))?, "1");
    assert_eq!(serde_json::to_string_pretty(&Value::from(-1.0))?, "-1");

    // Ensure that fractional parts are also serialized.
    assert_eq!(serde_json::to_string_pretty(&Value::from(1.1))?, "1.1");
    assert_eq!(serde_json::to_string_pretty(&Value::from(-1.1))?, "-1.1");

    Ok(())
}

#[test]
fn serialize_string() -> Result<()> {
    assert_eq!(
        Value::String("Hello, World\n".into()).to_json_str()?,
        "\"Hello, World\\n\""
    );
    Ok(())
}

#[test]
fn constructors() -> Result<()> {
    assert_eq!(Value::new_object(), Value::from_json_str("{}")?);
    assert_eq!(Value::new_array(), Value::from_json_str("[]")?);
    assert_eq!(Value::from(Map::new()), Value::new_object());
    assert_eq!(Value::from(vec![Value::Null]), Value::from_json_str("[null]")?);
    Ok(())
}

#[test]
fn text_form() -> Result<()> {
    assert_eq!(Value::from("raw").to_text(), "raw");
    assert_eq!(Value::from(3u64).to_text(), "3");
    assert_eq!(Value::from(-7i64).to_text(), "-7");
    assert_eq!(Value::from(2.0).to_text(), "2");
    assert_eq!(Value::from(0.5).to_text(), "0.5");
    assert_eq!(Value::Bool(true).to_text(), "true");
    assert_eq!(Value::Null.to_text(), "null");
    assert_eq!(
        Value::from_json_str(r#"{ "a": [1, "x"], "b": null }"#)?.to_text(),
        r#"{"a":[1,"x"],"b":null}"#
    );
    Ok(())
}

#[test]
fn objects_keep_insertion_order() -> Result<()> {
    let v = Value::from_json_str(r#"{ "z": 1, "a": 2, "m": 3 }"#)?;
    let keys: Vec<_> = v.as_object()?.keys().map(|k| k.as_ref()).collect();
    assert_eq!(keys, ["z", "a", "m"]);
    Ok(())
}

#[test]
fn yaml_scalar_keys_are_stringified() -> Result<()> {
    let v = Value::from_yaml_str("1: one\ntrue: yes\nnull: nothing\n")?;
    assert_eq!(v["1"], Value::from("one"));
    assert_eq!(v["true"], Value::from("yes"));
    assert_eq!(v["null"], Value::from("nothing"));
    Ok(())
}

#[test]
fn index() -> Result<()> {
    let v = Value::from_json_str(r#"{ "list": [10, 20] }"#)?;
    assert_eq!(v["list"][1], Value::from(20u64));
    assert_eq!(v["list"][5], Value::Null);
    assert_eq!(v["missing"]["deeper"], Value::Null);
    Ok(())
}

#[test]
fn overlay() -> Result<()> {
    let mut base = Value::from_yaml_str(
        "constants: { a: 1 }\ncontainers: 2\nrules: [{ target: x, value: 1 }]\n",
    )?;
    base.overlay(Value::from_yaml_str("constants: { b: 2 }\ncontainers: 5\n")?)?;

    // Top-level keys are replaced, not merged.
    assert_eq!(base["constants"], Value::from_json_str(r#"{ "b": 2 }"#)?);
    assert_eq!(base["containers"], Value::from(5u64));
    assert!(matches!(base["rules"], Value::Array(_)));

    let mut null = Value::Null;
    null.overlay(Value::from(1u64))?;
    assert_eq!(null, Value::from(1u64));

    assert!(Value::from("x").overlay(Value::new_object()).is_err());
    Ok(())
}

#[test]
fn numbers_compare_across_representations() {
    assert_eq!(Value::from(3u64), Value::from(3i64));
    assert_eq!(Value::from(3u64), Value::from(3.0));
    assert_ne!(Value::from(3u64), Value::from(3.5));
    assert_ne!(Value::from(3u64), Value::from("3"));
}
