// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::backend::{Backend, Instance};
use crate::config::Config;
use crate::constants::{ConstantTable, ConstantsResolver};
use crate::descriptors::{self, Descriptor};
use crate::error::{Error, Result};
use crate::hooks::{CommandRunner, HookPhase, HookPlan};
use crate::rules::{apply_rules, resolve_rules};
use crate::value::{Map, Value};

use std::path::{Path, PathBuf};

use log::info;

/// The launch configuration engine.
///
/// Holds the constants supplied from outside the configuration document and
/// the working directory, and turns configuration documents into [`Plan`]s.
#[derive(Debug, Clone)]
pub struct Engine {
    external: Map,
    overrides: Map,
    working_dir: PathBuf,
}

impl Engine {
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Self {
        Self {
            external: Map::new(),
            overrides: Map::new(),
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// Add constants visible to the document. The document may redefine them.
    pub fn add_constants(&mut self, constants: Value) -> Result<()> {
        match constants {
            Value::Object(map) => {
                for (name, value) in map.iter() {
                    self.external.insert(name.clone(), value.clone());
                }
                Ok(())
            }
            other => Err(Error::Config {
                message: format!("constants must be a mapping, got {}", other.kind()),
            }),
        }
    }

    /// Override a constant. Overrides are taken verbatim and win over the document.
    pub fn set_constant(&mut self, name: &str, value: Value) {
        self.overrides.insert(name.into(), value);
    }


    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Evaluate `config` into descriptors and hooks.
    pub fn evaluate(&self, config: &Config) -> Result<Plan> {
        let resolver = ConstantsResolver::new(&self.working_dir);
        let constants = resolver.build(&self.external, &self.overrides, &config.constants)?;

        let mut descriptors = descriptors::expand(&constants, &config.containers)?;
        if let Some(spec) = &config.rules {
            let rules = resolve_rules(&constants, spec)?;
            apply_rules(&constants, &rules, &mut descriptors)?;
        }

        let hooks = HookPlan::build(&constants, config.hooks.as_ref())?;
        Ok(Plan {
            constants,
            descriptors,
            hooks,
        })
    }

    pub fn evaluate_value(&self, config: &Value) -> Result<Plan> {
        self.evaluate(&Config::from_value(config)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run the hooks but start nothing.
    pub dry_run: bool,
    /// Forwarded to the backend.
    pub detach: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            detach: true,
        }
    }
}

/// The outcome of evaluating a configuration.
#[derive(Debug, Clone)]
pub struct Plan {
    constants: ConstantTable,
    descriptors: Vec<Descriptor>,
    hooks: HookPlan,
}

impl Plan {
    pub fn constants(&self) -> &ConstantTable {
        &self.constants
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn hooks(&self) -> &HookPlan {
        &self.hooks
    }


    /// Descriptors as a value array, in index order.
    pub fn descriptors_value(&self) -> Value {
        Value::from(
            self.descriptors
                .iter()
                .map(|d| d.params().clone())
                .collect::<Vec<_>>(),
        )
    }

    /// Run the hooks around starting every descriptor in index order.
    ///
    /// A failing hook or backend call aborts the launch. Instances started
    /// before the failure are left running.
    pub fn launch(
        &self,
        backend: &mut dyn Backend,
        runner: &mut dyn CommandRunner,
        options: &LaunchOptions,
    ) -> Result<Vec<Instance>> {
        self.hooks
            .run_global(&self.constants, HookPhase::PreUpGlobal, runner)?;

        let mut instances = Vec::with_capacity(self.descriptors.len());
        for (index, descriptor) in self.descriptors.iter().enumerate() {
            self.hooks
                .run_for(&self.constants, HookPhase::PreUp, index, descriptor, runner)?;

            if options.dry_run {
                info!("dry run: not starting {}", descriptor.label(index));
            } else {
                instances.push(start(backend, index, descriptor, options.detach)?);
            }

            self.hooks
                .run_for(&self.constants, HookPhase::PostUp, index, descriptor, runner)?;
        }

        self.hooks
            .run_global(&self.constants, HookPhase::PostUpGlobal, runner)?;
        Ok(instances)
    }
}

fn start(
    backend: &mut dyn Backend,
    index: usize,
    descriptor: &Descriptor,
    detach: bool,
) -> Result<Instance> {
    let label = descriptor.label(index);
    let backend_error = |e: anyhow::Error| Error::Backend {
        descriptor: label.clone(),
        message: format!("{e:#}"),
    };

    if let Some(name) = descriptor.name() {
        if let Some(mut instance) = backend.find_instance(name).map_err(backend_error)? {
            info!("reusing existing instance {label}");
            instance.reused = true;
            return Ok(instance);
        }
    }

    let instance = backend
        .start_instance(descriptor, detach)
        .map_err(backend_error)?;
    info!("started {label} as {}", instance.id);
    Ok(instance)
}
