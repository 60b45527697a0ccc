// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::env;

use anyhow::{bail, Result};
use launchspec::*;
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

mod launch;

fn display_values(c: &Value, e: &Value) -> Result<String> {
    Ok(format!(
        "\nleft  = {}\nright = {}\n",
        serde_json::to_string_pretty(c)?,
        serde_json::to_string_pretty(e)?
    ))
}

// On mismatch, reports the failing sub-value instead of the whole value.
fn match_values_impl(computed: &Value, expected: &Value) -> Result<()> {
    match (computed, expected) {
        (Value::Array(a1), Value::Array(a2)) => {
            if a1.len() != a2.len() {
                bail!(
                    "array length mismatch: {} != {}{}",
                    a1.len(),
                    a2.len(),
                    display_values(computed, expected)?
                );
            }
            for (v1, v2) in a1.iter().zip(a2.iter()) {
                match_values_impl(v1, v2)?;
            }
            Ok(())
        }
        (Value::Object(o1), Value::Object(o2)) => {
            if o1.len() != o2.len() {
                bail!(
                    "object length mismatch: {} != {}{}",
                    o1.len(),
                    o2.len(),
                    display_values(computed, expected)?
                );
            }
            for (k, v1) in o1.iter() {
                match o2.get(k) {
                    Some(v2) => match_values_impl(v1, v2)?,
                    None => bail!("unexpected key `{k}`{}", display_values(computed, expected)?),
                }
            }
            Ok(())
        }
        (Value::Number(n1), Value::Number(n2)) if n1 == n2 => Ok(()),
        (Value::String(s1), Value::String(s2)) if s1 == s2 => Ok(()),
        (Value::Bool(b1), Value::Bool(b2)) if b1 == b2 => Ok(()),
        (Value::Null, Value::Null) => Ok(()),
        _ => bail!("value mismatch: {}", display_values(computed, expected)?),
    }
}

fn match_values(computed: &Value, expected: &Value) -> Result<()> {
    match match_values_impl(computed, expected) {
        Ok(()) => Ok(()),
        Err(e) => bail!("\nmismatch in {}{}", display_values(computed, expected)?, e),
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct TestCase {
    note: String,
    config: Value,
    external: Option<Value>,
    constants: Option<Value>,
    working_dir: Option<String>,
    want_descriptors: Option<Vec<Value>>,
    error: Option<String>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn eval_case(case: &TestCase) -> launchspec::Result<Vec<Value>> {
    let mut engine = Engine::new(case.working_dir.as_deref().unwrap_or("/work"));
    if let Some(external) = &case.external {
        engine.add_constants(external.clone())?;
    }
    if let Some(Value::Object(overrides)) = &case.constants {
        for (name, value) in overrides.iter() {
            engine.set_constant(name, value.clone());
        }
    }

    let plan = engine.evaluate_value(&case.config)?;
    Ok(plan
        .descriptors()
        .iter()
        .map(|d| d.params().clone())
        .collect())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    println!("running {file}");

    for case in test.cases {
        print!("case {} ", case.note);
        if case.skip == Some(true) {
            println!("skipped");
            continue;
        }

        match (&case.want_descriptors, &case.error) {
            (Some(_), None) | (None, Some(_)) => (),
            _ => panic!("either want_descriptors or error must be specified in test case."),
        }

        match eval_case(&case) {
            Ok(descriptors) => match &case.want_descriptors {
                Some(want) => {
                    if descriptors.len() != want.len() {
                        bail!(
                            "generated {} descriptors, expected {}",
                            descriptors.len(),
                            want.len()
                        );
                    }
                    for (computed, expected) in descriptors.iter().zip(want.iter()) {
                        match_values(computed, expected)?;
                    }
                }
                None => bail!(
                    "expected error `{}`, got {}",
                    case.error.as_deref().unwrap_or_default(),
                    Value::from(descriptors)
                ),
            },
            Err(actual) => match &case.error {
                Some(error) => {
                    let actual = actual.to_string();
                    if !actual.contains(error.as_str()) {
                        bail!("error `{actual}` does not contain `{error}`");
                    }
                }
                None => return Err(actual.into()),
            },
        }

        println!("passed");
    }

    println!("{file} passed");
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for running a single yaml file given on the command line"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();

    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
        }
    }

    if file.is_empty() {
        bail!("missing <yaml-file>");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/engine/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
