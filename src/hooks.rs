// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hook phases and the command runner they are executed with.
//!
//! A hook plan is built once per evaluation and holds at most one unit per
//! phase. Units are resolved only when invoked: global phases against the
//! global constants, per-descriptor phases against the global constants with
//! the descriptor's local constants layered on top.

use crate::config::HooksSpec;
use crate::constants::ConstantTable;
use crate::descriptors::Descriptor;
use crate::error::{Error, Result};
use crate::expression::{evaluate, evaluate_definitions};
use crate::locals::{evaluate_locals, LocalConstantDef};
use crate::value::{Map, Value};

use core::fmt;
use core::str::FromStr;
use std::process::{Command, ExitStatus};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Resolved environment of a hook invocation, in declaration order.
pub type Environment = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPhase {
    #[serde(rename = "preup-global")]
    PreUpGlobal,
    #[serde(rename = "postup-global")]
    PostUpGlobal,
    #[serde(rename = "preup")]
    PreUp,
    #[serde(rename = "postup")]
    PostUp,
}

impl HookPhase {
    /// All phases, in the order a launch runs them.
    pub const ALL: [HookPhase; 4] = [
        HookPhase::PreUpGlobal,
        HookPhase::PreUp,
        HookPhase::PostUp,
        HookPhase::PostUpGlobal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HookPhase::PreUpGlobal => "preup-global",
            HookPhase::PostUpGlobal => "postup-global",
            HookPhase::PreUp => "preup",
            HookPhase::PostUp => "postup",
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, HookPhase::PreUpGlobal | HookPhase::PostUpGlobal)
    }

    fn slot(&self) -> usize {
        match self {
            HookPhase::PreUpGlobal => 0,
            HookPhase::PreUp => 1,
            HookPhase::PostUp => 2,
            HookPhase::PostUpGlobal => 3,
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HookPhase::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::Config {
                message: format!("unknown hook phase `{s}`"),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentVar {
    pub name: String,
    pub value: Value,
}

/// A hook as written in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDefinition {
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvironmentVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_constants: Vec<LocalConstantDef>,
}

/// Exit status of a hook command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// `None` when the command was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Executes hook commands.
pub trait CommandRunner {
    /// Run `command` with exactly `environment` as its environment.
    fn run(&mut self, command: &str, environment: &Environment) -> Result<CommandStatus>;
}

/// Runs each command through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: "sh".to_owned(),
        }
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shell(shell: &str) -> Self {
        Self {
            shell: shell.to_owned(),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str, environment: &Environment) -> Result<CommandStatus> {
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .env_clear()
            .envs(environment)
            .status()
            .map_err(|source| Error::CommandSpawn {
                command: command.to_owned(),
                source,
            })?;
        Ok(status.into())
    }
}

/// A fully resolved hook, ready to hand to a [`CommandRunner`].
#[derive(Debug, Clone, PartialEq)]
pub struct HookInvocation {
    phase: HookPhase,
    environment: Environment,
    commands: Vec<String>,
}

impl HookInvocation {
    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Run the commands in order, stopping at the first one that fails.
    pub fn execute(&self, runner: &mut dyn CommandRunner) -> Result<()> {
        for command in &self.commands {
            info!("{}: running `{command}`", self.phase);
            let status = runner.run(command, &self.environment)?;
            if !status.success() {
                return Err(Error::HookFailed {
                    phase: self.phase.name().to_owned(),
                    command: command.clone(),
                    status: status.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// The hook of one phase, resolved on invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct HookUnit {
    phase: HookPhase,
    definition: HookDefinition,
}

impl HookUnit {
    pub fn new(phase: HookPhase, definition: HookDefinition) -> Self {
        Self { phase, definition }
    }

    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    pub fn definition(&self) -> &HookDefinition {
        &self.definition
    }

    fn invocation(&self, scope: &ConstantTable) -> Result<HookInvocation> {
        let mut environment = Environment::new();
        for var in &self.definition.environment {
            let value = evaluate(scope, &var.value, true)?.to_text();
            environment.insert(var.name.clone(), value);
        }
        debug!("{} environment: {environment:?}", self.phase);

        Ok(HookInvocation {
            phase: self.phase,
            environment,
            commands: self.definition.commands.clone(),
        })
    }

    /// Resolve against the global constants only.
    pub fn resolve_global(&self, globals: &ConstantTable) -> Result<HookInvocation> {
        if !self.definition.local_constants.is_empty() {
            warn!("{}: local constants are ignored in a global phase", self.phase);
        }
        self.invocation(globals)
    }

    /// Resolve for the descriptor at `index`.
    pub fn resolve_for(
        &self,
        globals: &ConstantTable,
        index: usize,
        descriptor: &Descriptor,
    ) -> Result<HookInvocation> {
        let locals = evaluate_locals(
            globals,
            &self.definition.local_constants,
            index,
            descriptor.params(),
        )?;
        self.invocation(&globals.scoped(&locals))
    }
}

/// The hooks of one evaluation, at most one per phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookPlan {
    units: [Option<HookUnit>; 4],
}

impl HookPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(globals: &ConstantTable, spec: Option<&HooksSpec>) -> Result<HookPlan> {
        let phases = match spec {
            None => return Ok(HookPlan::new()),
            Some(HooksSpec::Phases(phases)) => phases.clone(),
            Some(HooksSpec::Expression(expr)) => match evaluate_definitions(globals, expr)? {
                Value::Object(phases) => (*phases).clone(),
                other => {
                    return Err(Error::InvalidHooks {
                        reason: format!("`{expr}` evaluates to {}, not a mapping", other.kind()),
                    })
                }
            },
        };
        Self::from_phases(&phases)
    }

    fn from_phases(phases: &Map) -> Result<HookPlan> {
        let mut plan = HookPlan::new();
        for (name, definition) in phases.iter() {
            let phase: HookPhase = name.parse()?;
            let definition: HookDefinition =
                definition.to_typed().map_err(|e| Error::InvalidHooks {
                    reason: format!("{phase}: {e}"),
                })?;
            plan.insert(HookUnit::new(phase, definition));
        }
        Ok(plan)
    }

    pub fn insert(&mut self, unit: HookUnit) {
        let slot = unit.phase.slot();
        self.units[slot] = Some(unit);
    }

    pub fn unit(&self, phase: HookPhase) -> Option<&HookUnit> {
        self.units[phase.slot()].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.units.iter().all(Option::is_none)
    }

    /// Run a global phase. A phase without a hook does nothing.
    pub fn run_global(
        &self,
        globals: &ConstantTable,
        phase: HookPhase,
        runner: &mut dyn CommandRunner,
    ) -> Result<()> {
        match self.unit(phase) {
            Some(unit) => {
                info!("running {phase} hook");
                unit.resolve_global(globals)?.execute(runner)
            }
            None => Ok(()),
        }
    }

    /// Run a per-descriptor phase for the descriptor at `index`.
    pub fn run_for(
        &self,
        globals: &ConstantTable,
        phase: HookPhase,
        index: usize,
        descriptor: &Descriptor,
        runner: &mut dyn CommandRunner,
    ) -> Result<()> {
        match self.unit(phase) {
            Some(unit) => {
                info!("running {phase} hook for {}", descriptor.label(index));
                unit.resolve_for(globals, index, descriptor)?.execute(runner)
            }
            None => Ok(()),
        }
    }
}
