// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::config::{Rule, RulesSpec};
use crate::constants::ConstantTable;
use crate::descriptors::Descriptor;
use crate::error::{Error, Result};
use crate::expression::{evaluate_definitions, evaluate_recursive};
use crate::locals::evaluate_locals;
use crate::path::set_by_path;
use crate::value::Value;

use log::{debug, info};

/// Turn the `rules` field into the ordered rule list.
///
/// Rule bodies are not evaluated here; their references are resolved per
/// descriptor when the rule is applied.
pub fn resolve_rules(globals: &ConstantTable, spec: &RulesSpec) -> Result<Vec<Rule>> {
    let items = match spec {
        RulesSpec::List(items) => items.clone(),
        RulesSpec::Expression(expr) => match evaluate_definitions(globals, expr)? {
            Value::Array(items) => items.to_vec(),
            other => {
                return Err(Error::InvalidRules {
                    reason: format!("`{expr}` evaluates to {}, not a list", other.kind()),
                })
            }
        },
    };

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.to_typed::<Rule>().map_err(|e| Error::InvalidRules {
                reason: format!("rule {idx}: {e}"),
            })
        })
        .collect()
}

/// Apply one rule to the descriptor at `index`.
fn apply_rule(
    globals: &ConstantTable,
    rule: &Rule,
    index: usize,
    descriptor: &mut Descriptor,
) -> Result<()> {
    let locals = evaluate_locals(globals, &rule.local_constants, index, descriptor.params())?;
    let scope = globals.scoped(&locals);

    let value = evaluate_recursive(&scope, &rule.value)?;
    debug!("rule value for {}: {value}", descriptor.label(index));

    // Every target receives the same computed value.
    for path in rule.target.paths() {
        set_by_path(&scope, path, descriptor.params_mut(), value.clone())?;
    }
    Ok(())
}

/// Apply the rules in order, each one to every descriptor in index order.
///
/// A rule sees the writes of the rules before it. A failure stops at once,
/// leaving the writes done so far in place.
pub fn apply_rules(
    globals: &ConstantTable,
    rules: &[Rule],
    descriptors: &mut [Descriptor],
) -> Result<()> {
    for (n, rule) in rules.iter().enumerate() {
        info!("applying rule {n} to {} descriptors", descriptors.len());
        for (index, descriptor) in descriptors.iter_mut().enumerate() {
            apply_rule(globals, rule, index, descriptor)?;
        }
    }
    Ok(())
}
