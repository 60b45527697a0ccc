// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Navigation of nested values by `->`-separated paths.
//!
//! Every segment is itself an expression, so `ports->$port` selects the field
//! named by the `port` constant. Segments index objects by their textual form
//! and arrays by integer position.

use crate::constants::ConstantTable;
use crate::error::{Error, Result};
use crate::expression::evaluate_str;
use crate::value::{Map, Value};

use std::rc::Rc;

pub const PATH_DELIMITER: &str = "->";

fn segments(constants: &ConstantTable, path: &str) -> Result<Vec<Value>> {
    path.split(PATH_DELIMITER)
        .map(|segment| evaluate_str(constants, segment, false))
        .collect()
}

fn array_index(segment: &Value) -> Option<usize> {
    match segment {
        Value::Number(n) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
        Value::String(s) => s.parse::<usize>().ok(),
        _ => None,
    }
}

fn child<'a>(data: &'a Value, segment: &Value) -> Option<&'a Value> {
    match data {
        Value::Object(fields) => fields.get(segment.to_text().as_str()),
        Value::Array(items) => array_index(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Read the value at `path` inside `data`.
pub fn get_by_path<'a>(constants: &ConstantTable, path: &str, data: &'a Value) -> Result<&'a Value> {
    let mut current = data;
    for segment in segments(constants, path)? {
        current = match child(current, &segment) {
            Some(v) => v,
            None => {
                return Err(Error::PathResolution {
                    path: path.into(),
                    segment: segment.to_text().into(),
                })
            }
        };
    }
    Ok(current)
}

fn child_mut<'a>(data: &'a mut Value, segment: &Value, path: &str) -> Result<&'a mut Value> {
    // Null is treated like a missing intermediate.
    if data.is_null() {
        *data = Value::new_object();
    }
    match data {
        Value::Object(fields) => Ok(Rc::make_mut(fields)
            .entry(segment.to_text().into())
            .or_insert_with(Value::new_object)),
        Value::Array(items) => {
            let items = Rc::make_mut(items);
            match array_index(segment) {
                Some(i) if i < items.len() => Ok(&mut items[i]),
                _ => Err(Error::InvalidPathTarget {
                    path: path.into(),
                    reason: format!("no element `{}` in array", segment.to_text()),
                }),
            }
        }
        other => Err(Error::InvalidPathTarget {
            path: path.into(),
            reason: format!("cannot descend into {}", other.kind()),
        }),
    }
}

/// Write `value` at `path` inside `data`, creating missing intermediate objects.
///
/// An empty path merges `value`, which must be an object, into `data`.
pub fn set_by_path(
    constants: &ConstantTable,
    path: Option<&str>,
    data: &mut Value,
    value: Value,
) -> Result<()> {
    let path = match path {
        Some(p) if !p.is_empty() => p,
        _ => return merge_into(data, value),
    };

    let segments = segments(constants, path)?;
    let Some((last, parents)) = segments.split_last() else {
        return merge_into(data, value);
    };

    let mut current = data;
    for segment in parents {
        current = child_mut(current, segment, path)?;
    }
    *child_mut(current, last, path)? = value;
    Ok(())
}

fn merge_into(data: &mut Value, value: Value) -> Result<()> {
    let fields: Map = match value {
        Value::Object(fields) => Rc::unwrap_or_clone(fields),
        other => {
            return Err(Error::InvalidPathTarget {
                path: "".into(),
                reason: format!("root merge needs an object, got {}", other.kind()),
            })
        }
    };

    if data.is_null() {
        *data = Value::new_object();
    }
    match data {
        Value::Object(target) => {
            let target = Rc::make_mut(target);
            for (k, v) in fields {
                target.insert(k, v);
            }
            Ok(())
        }
        other => Err(Error::InvalidPathTarget {
            path: "".into(),
            reason: format!("cannot merge into {}", other.kind()),
        }),
    }
}
