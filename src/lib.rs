// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod backend;
mod config;
mod constants;
mod descriptors;
mod engine;
mod error;
mod expression;
mod hooks;
mod locals;
mod number;
mod path;
mod rules;
mod value;

pub use backend::{Backend, DryRunBackend, Instance};
pub use config::Config;
pub use descriptors::Descriptor;
pub use engine::{Engine, LaunchOptions, Plan};
pub use error::{Error, Result};
pub use hooks::{CommandRunner, CommandStatus, Environment, HookPhase, ShellRunner};
pub use number::Number;
pub use value::{Map, Value};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::config::*;
    pub use crate::constants::*;
    pub use crate::descriptors::expand;
    pub use crate::expression::*;
    pub use crate::hooks::{EnvironmentVar, HookDefinition, HookInvocation, HookPlan, HookUnit};
    pub use crate::locals::*;
    pub use crate::path::*;
    pub use crate::rules::*;
}
