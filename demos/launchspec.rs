// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use launchspec::{
    Backend, Config, Descriptor, DryRunBackend, Engine, Instance, LaunchOptions, ShellRunner,
    Value,
};

// Hands descriptors over to whatever consumes stdout, one json document per line.
struct StdoutBackend {
    count: usize,
}

impl Backend for StdoutBackend {
    fn start_instance(&mut self, descriptor: &Descriptor, detach: bool) -> Result<Instance> {
        let mut request = Value::new_object();
        let fields = request.as_object_mut()?;
        fields.insert("detach".into(), Value::from(detach));
        fields.insert("params".into(), descriptor.params().clone());
        println!("{}", serde_json::to_string(&request)?);

        self.count += 1;
        Ok(Instance {
            id: format!("stdout-{}", self.count),
            name: descriptor.name().map(str::to_owned),
            reused: false,
        })
    }

    fn find_instance(&mut self, _name: &str) -> Result<Option<Instance>> {
        Ok(None)
    }
}

fn read_config(file: &str) -> Result<Value> {
    if file.ends_with(".json") {
        Value::from_json_file(file)
    } else if file.ends_with(".yaml") || file.ends_with(".yml") {
        Value::from_yaml_file(file)
    } else {
        bail!("Unsupported config file `{file}`. Must be json or yaml.")
    }
}

// Override values are json when they parse as such, plain strings otherwise.
fn parse_override(value: &str) -> Value {
    Value::from_json_str(value).unwrap_or_else(|_| Value::from(value))
}

#[derive(clap::Parser)]
#[command(author, version, about = "Runs containers described by a launch configuration.", long_about = None)]
struct Cli {
    /// Configuration files, overlaid in order.
    #[arg(long, short, value_name = "config.yaml|config.json", default_value = "config.yaml")]
    config: Vec<String>,

    /// Run hooks without starting anything.
    #[arg(long, short)]
    dry_run: bool,

    /// Do not detach from started instances.
    #[arg(long, short)]
    no_detach: bool,

    /// Override a constant.
    #[arg(long = "constant", short = 'C', num_args = 2, value_names = ["NAME", "VALUE"])]
    constants: Vec<String>,

    /// Directory exposed as `base_dir`. Defaults to the current directory.
    #[arg(long, short)]
    working_dir: Option<PathBuf>,

    /// Shell that hook commands are run with.
    #[arg(long, default_value = "sh")]
    shell: String,

    /// Print the generated descriptors before launching.
    #[arg(long)]
    show_plan: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut document = Value::Null;
    for file in &cli.config {
        let value = read_config(file).with_context(|| format!("Failed to load {file}"))?;
        if let Err(err) = document.overlay(value) {
            bail!("Error processing {file}. {err}");
        }
    }
    let config = Config::from_value(&document)?;

    let working_dir = match cli.working_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };
    let mut engine = Engine::new(working_dir);
    for pair in cli.constants.chunks(2) {
        if let [name, value] = pair {
            engine.set_constant(name, parse_override(value));
        }
    }

    let plan = engine.evaluate(&config)?;
    if cli.show_plan {
        println!("{}", plan.descriptors_value().to_json_str()?);
    }

    let options = LaunchOptions {
        dry_run: cli.dry_run,
        detach: !cli.no_detach,
    };
    let mut runner = ShellRunner::with_shell(&cli.shell);
    let instances = if cli.dry_run {
        plan.launch(&mut DryRunBackend::new(), &mut runner, &options)?
    } else {
        plan.launch(&mut StdoutBackend { count: 0 }, &mut runner, &options)?
    };

    log::info!("{} instances up", instances.len());
    Ok(())
}
