// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-descriptor local constants.

use crate::constants::ConstantTable;
use crate::error::{Error, Result};
use crate::expression::evaluate;
use crate::number::Number;
use crate::path::get_by_path;
use crate::value::{Map, Value};

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A local constant as written in a rule or hook.
///
/// Options (`start`, `source`) may be given next to `name` and `type` or
/// nested under `options`; nested options take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConstantDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<IndexMap<String, Value>>,
    #[serde(flatten)]
    pub inline_options: IndexMap<String, Value>,
}

/// The supported local constant evaluators.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalConstantKind {
    /// `index + start`, `start` defaulting to 0.
    AutoIncrement { start: Value },
    /// Copy of the descriptor field at `source`.
    FromProperty { source: Rc<str> },
}

impl LocalConstantDef {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: kind.to_owned(),
            options: None,
            inline_options: IndexMap::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: Value) -> Self {
        self.inline_options.insert(key.to_owned(), value);
        self
    }

    fn option(&self, key: &str) -> Option<&Value> {
        self.options
            .as_ref()
            .and_then(|o| o.get(key))
            .or_else(|| self.inline_options.get(key))
    }

    fn invalid(&self, reason: &str) -> Error {
        Error::InvalidLocalConstant {
            name: self.name.as_str().into(),
            reason: reason.into(),
        }
    }

    pub fn resolve_kind(&self) -> Result<LocalConstantKind> {
        match self.kind.as_str() {
            "auto_increment" => Ok(LocalConstantKind::AutoIncrement {
                start: self.option("start").cloned().unwrap_or(Value::from(0u64)),
            }),
            "from_property" => match self.option("source") {
                Some(Value::String(source)) => Ok(LocalConstantKind::FromProperty {
                    source: source.clone(),
                }),
                Some(_) => Err(self.invalid("`source` must be a path string")),
                None => Err(self.invalid("missing `source`")),
            },
            kind => Err(Error::UnknownLocalConstantType { kind: kind.into() }),
        }
    }

    fn evaluate(&self, globals: &ConstantTable, index: usize, descriptor: &Value) -> Result<Value> {
        match self.resolve_kind()? {
            LocalConstantKind::AutoIncrement { start } => {
                let start = match evaluate(globals, &start, false)? {
                    Value::Number(n) if n.is_integer() => n,
                    other => {
                        return Err(self.invalid(&format!(
                            "`start` must be an integer, got {}",
                            other.kind()
                        )))
                    }
                };
                match Number::from(index).add(&start) {
                    Some(n) => Ok(Value::from(n)),
                    None => Err(self.invalid("counter overflow")),
                }
            }
            LocalConstantKind::FromProperty { source } => {
                Ok(get_by_path(globals, &source, descriptor)?.clone())
            }
        }
    }
}

/// Compute the local constants of the descriptor at `index`.
///
/// Each definition sees only the global constants, the index and the
/// descriptor; definitions in the same list cannot refer to one another.
pub fn evaluate_locals(
    globals: &ConstantTable,
    defs: &[LocalConstantDef],
    index: usize,
    descriptor: &Value,
) -> Result<Map> {
    let mut values = Map::with_capacity(defs.len());
    for def in defs {
        let value = def.evaluate(globals, index, descriptor)?;
        values.insert(def.name.as_str().into(), value);
    }
    Ok(values)
}
