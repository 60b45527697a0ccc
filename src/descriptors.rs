// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::config::ContainersSpec;
use crate::constants::ConstantTable;
use crate::error::{Error, Result};
use crate::expression::{evaluate_recursive, evaluate_str};
use crate::value::Value;

use log::info;
use serde::Serialize;

/// Launch parameters of one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Descriptor {
    params: Value,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Descriptor {
    pub fn new() -> Self {
        Self {
            params: Value::new_object(),
        }
    }

    pub fn from_value(params: Value) -> Result<Self> {
        if !params.is_object() {
            return Err(Error::InvalidContainersSpec {
                reason: format!("a container must be a mapping, got {}", params.kind()),
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Value {
        &mut self.params
    }


    pub fn name(&self) -> Option<&str> {
        match self.params.get("name") {
            Some(Value::String(s)) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Name used in logs: the `name` field or `#<index>`.
    pub fn label(&self, index: usize) -> String {
        match self.name() {
            Some(name) => name.to_owned(),
            None => format!("#{index}"),
        }
    }
}

fn empty_descriptors(count: u64) -> Result<Vec<Descriptor>> {
    let count = usize::try_from(count).map_err(|_| Error::InvalidContainersSpec {
        reason: format!("{count} containers is too many"),
    })?;
    Ok((0..count).map(|_| Descriptor::new()).collect())
}

/// Expand the `containers` field into the ordered descriptor list.
pub fn expand(globals: &ConstantTable, spec: &ContainersSpec) -> Result<Vec<Descriptor>> {
    let descriptors = match spec {
        ContainersSpec::Count(count) => empty_descriptors(*count)?,
        ContainersSpec::CountExpression(expr) => match evaluate_str(globals, expr, false)? {
            Value::Number(n) if n.is_integer() => match n.as_u64() {
                Some(count) => empty_descriptors(count)?,
                None => {
                    return Err(Error::InvalidContainersSpec {
                        reason: format!("`{expr}` evaluates to a negative count {n}"),
                    })
                }
            },
            other => {
                return Err(Error::InvalidContainersSpec {
                    reason: format!("`{expr}` evaluates to {}, not a count", other.kind()),
                })
            }
        },
        ContainersSpec::Explicit(data) => match evaluate_recursive(globals, data)? {
            Value::Array(items) => items
                .iter()
                .cloned()
                .map(Descriptor::from_value)
                .collect::<Result<Vec<_>>>()?,
            v @ Value::Object(_) => vec![Descriptor::from_value(v)?],
            other => {
                return Err(Error::InvalidContainersSpec {
                    reason: format!("unsupported {}", other.kind()),
                })
            }
        },
    };

    info!("generated {} descriptors", descriptors.len());
    Ok(descriptors)
}
