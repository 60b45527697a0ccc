// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The launch configuration document.

use crate::error::{Error, Result};
use crate::locals::LocalConstantDef;
use crate::value::{Map, Value};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub constants: Map,
    pub containers: ContainersSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RulesSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksSpec>,
}

/// The accepted shapes of the `containers` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContainersSpec {
    /// That many empty descriptors.
    Count(u64),
    /// An expression that must evaluate to a count.
    CountExpression(String),
    /// Descriptors spelled out, possibly containing expressions.
    Explicit(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesSpec {
    /// An expression yielding the rule list.
    Expression(String),
    List(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HooksSpec {
    /// An expression yielding the phase mapping.
    Expression(String),
    Phases(Map),
}

/// Where a rule writes its value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleTarget {
    /// Merge the value, which must be an object, into the descriptor.
    #[default]
    Root,
    Path(String),
    Paths(Vec<String>),
}

impl RuleTarget {
    /// Paths to write to, `None` standing for a root merge.
    pub fn paths(&self) -> Vec<Option<&str>> {
        match self {
            RuleTarget::Root => vec![None],
            RuleTarget::Path(p) if p.is_empty() => vec![None],
            RuleTarget::Path(p) => vec![Some(p.as_str())],
            RuleTarget::Paths(ps) if ps.is_empty() => vec![None],
            RuleTarget::Paths(ps) => ps
                .iter()
                .map(|p| (!p.is_empty()).then_some(p.as_str()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub target: RuleTarget,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_constants: Vec<LocalConstantDef>,
}

impl Rule {
    pub fn from_value(value: &Value) -> Result<Rule> {
        value.to_typed().map_err(|e| Error::InvalidRules {
            reason: e.to_string(),
        })
    }
}

impl Config {
    pub fn from_value(value: &Value) -> Result<Config> {
        if !value.is_object() {
            return Err(Error::Config {
                message: format!("expected a mapping, got {}", value.kind()),
            });
        }
        if value.get("containers").is_none() {
            return Err(Error::InvalidContainersSpec {
                reason: "`containers` is missing".to_owned(),
            });
        }
        Ok(value.to_typed()?)
    }

    pub fn from_json_str(json: &str) -> Result<Config> {
        Self::from_value(&Value::from_json_str(json)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Config> {
        Self::from_value(&Value::from_yaml_str(yaml)?)
    }
}
