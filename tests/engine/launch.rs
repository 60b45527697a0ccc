// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use launchspec::*;

#[derive(Default)]
struct Recorder {
    log: Vec<String>,
    fail_on: Option<&'static str>,
}

impl CommandRunner for Recorder {
    fn run(&mut self, command: &str, environment: &Environment) -> launchspec::Result<CommandStatus> {
        let env: Vec<_> = environment.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.log.push(format!("{command} [{}]", env.join(" ")));
        Ok(match self.fail_on {
            Some(f) if f == command => CommandStatus::from_code(2),
            _ => CommandStatus::from_code(0),
        })
    }
}

// Starts nothing, but refuses descriptors that ask for a missing image.
struct PickyBackend {
    started: Vec<String>,
}

impl Backend for PickyBackend {
    fn start_instance(&mut self, descriptor: &Descriptor, _detach: bool) -> Result<Instance> {
        if descriptor.params()["image"].is_null() {
            bail!("no image");
        }
        let name = descriptor.name().map(str::to_owned);
        self.started.push(name.clone().unwrap_or_default());
        Ok(Instance {
            id: format!("id-{}", self.started.len()),
            name,
            reused: false,
        })
    }

    fn find_instance(&mut self, _name: &str) -> Result<Option<Instance>> {
        Ok(None)
    }
}

const CONFIG: &str = r#"
constants:
  project: shop
  "~container_name": "$project++-++$slot"
containers:
  - image: postgres:16
  - image: redis:7
  - image: "$project++/api:latest"
rules:
  - target: name
    value: "$~container_name"
    local_constants:
      - name: slot
        type: auto_increment
        start: 1
  - target: ["labels->project", "environment->PROJECT"]
    value: $project
hooks:
  preup-global:
    commands: [create-network]
    environment:
      - name: NETWORK
        value: $project++-net
  preup:
    commands: [prepare]
    environment:
      - name: TARGET
        value: $name
    local_constants:
      - name: name
        type: from_property
        source: name
  postup:
    commands: [check]
  postup-global:
    commands: [announce]
"#;

fn plan() -> Result<Plan> {
    let engine = Engine::new("/opt/shop");
    Ok(engine.evaluate(&Config::from_yaml_str(CONFIG)?)?)
}

#[test]
fn descriptors_follow_rules_in_order() -> Result<()> {
    let plan = plan()?;
    let descriptors = plan.descriptors_value();
    assert_eq!(
        descriptors,
        Value::from_json_str(
            r#"[
            { "image": "postgres:16", "name": "shop-1",
              "labels": { "project": "shop" }, "environment": { "PROJECT": "shop" } },
            { "image": "redis:7", "name": "shop-2",
              "labels": { "project": "shop" }, "environment": { "PROJECT": "shop" } },
            { "image": "shop/api:latest", "name": "shop-3",
              "labels": { "project": "shop" }, "environment": { "PROJECT": "shop" } }
        ]"#
        )?
    );
    Ok(())
}

#[test]
fn launch_runs_hooks_around_each_start() -> Result<()> {
    let plan = plan()?;
    let mut backend = DryRunBackend::new();
    let mut runner = Recorder::default();

    let instances = plan.launch(&mut backend, &mut runner, &LaunchOptions::default())?;
    assert_eq!(instances.len(), 3);
    assert_eq!(backend.started().len(), 3);
    assert_eq!(
        runner.log,
        [
            "create-network [NETWORK=shop-net]",
            "prepare [TARGET=shop-1]",
            "check []",
            "prepare [TARGET=shop-2]",
            "check []",
            "prepare [TARGET=shop-3]",
            "check []",
            "announce []",
        ]
    );
    Ok(())
}

#[test]
fn failing_hook_aborts_launch() -> Result<()> {
    let plan = plan()?;
    let mut backend = DryRunBackend::new();
    let mut runner = Recorder {
        fail_on: Some("check"),
        ..Default::default()
    };

    match plan.launch(&mut backend, &mut runner, &LaunchOptions::default()) {
        Err(Error::HookFailed { phase, status, .. }) => {
            assert_eq!(phase, "postup");
            assert_eq!(status, "exit code 2");
        }
        r => bail!("unexpected {r:?}"),
    }
    // The first descriptor was started before its postup hook failed.
    assert_eq!(backend.started().len(), 1);
    assert_eq!(runner.log.len(), 3);
    Ok(())
}

#[test]
fn backend_failure_names_descriptor() -> Result<()> {
    let engine = Engine::new("/");
    let plan = engine.evaluate(&Config::from_json_str(
        r#"{ "containers": [{ "name": "ok", "image": "x" }, { "name": "broken" }] }"#,
    )?)?;

    let mut backend = PickyBackend { started: vec![] };
    let mut runner = Recorder::default();
    match plan.launch(&mut backend, &mut runner, &LaunchOptions::default()) {
        Err(Error::Backend {
            descriptor,
            message,
        }) => {
            assert_eq!(descriptor, "broken");
            assert_eq!(message, "no image");
        }
        r => bail!("unexpected {r:?}"),
    }
    assert_eq!(backend.started, ["ok"]);
    Ok(())
}

#[test]
fn existing_instances_are_reused() -> Result<()> {
    let plan = plan()?;
    let mut backend = DryRunBackend::new().with_existing("shop-2");
    let mut runner = Recorder::default();

    let instances = plan.launch(&mut backend, &mut runner, &LaunchOptions::default())?;
    let reused: Vec<_> = instances.iter().map(|i| i.reused).collect();
    assert_eq!(reused, [false, true, false]);
    let started: Vec<_> = backend.started().iter().map(|d| d.name()).collect();
    assert_eq!(started, [Some("shop-1"), Some("shop-3")]);
    Ok(())
}
