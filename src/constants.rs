// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::Result;
use crate::expression::evaluate_recursive;
use crate::value::{Map, Value};

use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};

/// Prefix marking a constant as lazy.
pub const LAZY_MARKER: char = '~';

/// Name under which the working directory is made available.
pub const WORKING_DIR_CONSTANT: &str = "base_dir";

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Resolved(Value),
    /// Raw value of a lazy constant, expanded on every reference.
    Deferred(Value),
}

pub fn is_lazy_name(name: &str) -> bool {
    name.starts_with(LAZY_MARKER)
}

/// Named values visible to expressions.
#[derive(Debug, Clone, Default)]
pub struct ConstantTable {
    entries: IndexMap<Rc<str>, Constant>,
}

impl ConstantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `name` as is. Lazy-marked names are bound deferred.
    pub fn define(&mut self, name: &str, value: Value) {
        let constant = if is_lazy_name(name) {
            Constant::Deferred(value)
        } else {
            Constant::Resolved(value)
        };
        self.entries.insert(name.into(), constant);
    }

    /// Bind `value` under `name` as a plain value, whatever the name.
    pub fn define_resolved(&mut self, name: &str, value: Value) {
        self.entries.insert(name.into(), Constant::Resolved(value));
    }

    pub fn get(&self, name: &str) -> Option<&Constant> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Constant)> {
        self.entries.iter()
    }

    /// A fresh table with `locals` layered on top. On a name clash the local wins.
    pub fn scoped(&self, locals: &Map) -> ConstantTable {
        if locals.is_empty() {
            return self.clone();
        }
        let mut scope = self.clone();
        for (name, value) in locals.iter() {
            scope
                .entries
                .insert(name.clone(), Constant::Resolved(value.clone()));
        }
        scope
    }
}

/// Builds the global constant table of one evaluation.
#[derive(Debug, Clone)]
pub struct ConstantsResolver {
    working_dir: PathBuf,
}

impl ConstantsResolver {
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolve declared constants on top of `external`, then apply `overrides`.
    ///
    /// Declarations are processed in order and may only refer to constants
    /// declared before them. Lazy declarations are stored unevaluated.
    /// Overrides are applied verbatim and take precedence over everything.
    pub fn build(&self, external: &Map, overrides: &Map, declared: &Map) -> Result<ConstantTable> {
        let mut table = ConstantTable::new();
        for (name, value) in external.iter() {
            table.define(name, value.clone());
        }

        table.define(
            WORKING_DIR_CONSTANT,
            Value::from(self.working_dir.to_string_lossy().as_ref()),
        );

        for (name, raw) in declared.iter() {
            if is_lazy_name(name) {
                debug!("constant {name} is lazy");
                table.define(name, raw.clone());
            } else {
                let value = evaluate_recursive(&table, raw)?;
                debug!("constant {name} = {value}");
                table.define(name, value);
            }
        }

        for (name, value) in overrides.iter() {
            table.define_resolved(name, value.clone());
        }

        info!("resolved {} constants", table.len());
        Ok(table)
    }
}
