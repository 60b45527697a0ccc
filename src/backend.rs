// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::descriptors::Descriptor;

use anyhow::{bail, Result};
use indexmap::IndexMap;
use log::info;

/// A running instance as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub name: Option<String>,
    /// Set when the instance already existed and was looked up, not started.
    pub reused: bool,
}

/// The collaborator that actually starts instances from descriptors.
pub trait Backend {
    /// Start an instance with the launch parameters in `descriptor`.
    fn start_instance(&mut self, descriptor: &Descriptor, detach: bool) -> Result<Instance>;

    /// Look up an already existing instance by name.
    fn find_instance(&mut self, name: &str) -> Result<Option<Instance>>;
}

/// Records the descriptors it is asked to start without starting anything.
#[derive(Debug, Clone, Default)]
pub struct DryRunBackend {
    started: Vec<Descriptor>,
    instances: IndexMap<String, Instance>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend that an instance called `name` is already running.
    pub fn with_existing(mut self, name: &str) -> Self {
        let instance = Instance {
            id: format!("existing-{name}"),
            name: Some(name.to_owned()),
            reused: false,
        };
        self.instances.insert(name.to_owned(), instance);
        self
    }

    /// Descriptors passed to `start_instance`, in call order.
    pub fn started(&self) -> &[Descriptor] {
        &self.started
    }
}

impl Backend for DryRunBackend {
    fn start_instance(&mut self, descriptor: &Descriptor, detach: bool) -> Result<Instance> {
        let name = descriptor.name().map(str::to_owned);
        if let Some(name) = &name {
            if self.instances.contains_key(name) {
                bail!("an instance named `{name}` already exists");
            }
        }

        let instance = Instance {
            id: format!("dry-run-{}", self.started.len()),
            name: name.clone(),
            reused: false,
        };
        info!(
            "dry run: would start {} (detach: {detach})",
            name.as_deref().unwrap_or("an unnamed descriptor")
        );
        self.started.push(descriptor.clone());
        if let Some(name) = name {
            self.instances.insert(name, instance.clone());
        }
        Ok(instance)
    }

    fn find_instance(&mut self, name: &str) -> Result<Option<Instance>> {
        Ok(self.instances.get(name).cloned())
    }
}
