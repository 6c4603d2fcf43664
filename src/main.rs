use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod extract;
mod generate;
mod report;
mod schema;
mod submit;
#[cfg(test)]
mod test_support;
mod util;
mod workflow;

use cli::{Command, ExtractArgs, RootArgs, RunArgs, ValidateArgs};
use config::{Config, ValidationPolicy};
use error::VaultError;
use submit::{MockSubmitter, RemoteSubmitter, Submitter};
use workflow::{RepairLoop, WorkflowReport};

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);
    match dispatch(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(args: RootArgs) -> Result<ExitCode> {
    match args.command {
        Command::Run(run) => run_workflow(&run),
        Command::Validate(validate) => run_validate(&validate),
        Command::Extract(extract) => run_extract(&extract),
        Command::Config(_) => {
            println!("{}", config::config_stub()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_workflow(args: &RunArgs) -> Result<ExitCode> {
    let instruction = args.instruction_text();
    let report = match resolve_config(args) {
        Ok(config) => execute(&config, &instruction, args.mock),
        Err(err) => WorkflowReport::aborted(
            &instruction,
            &VaultError::Configuration(format!("{err:#}")),
        ),
    };

    if args.json {
        println!("{}", report::render_json(&report)?);
    } else {
        print!("{}", report::render_text(&report));
    }
    Ok(if report.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Environment, then config file, then flags.
fn resolve_config(args: &RunArgs) -> Result<Config> {
    let mut config = Config::from_env();
    if let Some(path) = &args.config {
        let file = config::load_config_file(path)?;
        config.apply_file(&file);
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(command) = &args.lm {
        config.lm_command = Some(command.clone());
    }
    if args.advisory_validation {
        config.validation = ValidationPolicy::Advisory;
    }
    config::validate_config(&config)?;
    Ok(config)
}

fn execute(config: &Config, instruction: &str, mock: bool) -> WorkflowReport {
    let generator = match generate::from_config(config) {
        Ok(generator) => generator,
        Err(err) => return WorkflowReport::aborted(instruction, &err),
    };
    let submitter: Box<dyn Submitter> = if mock {
        Box::new(MockSubmitter::new())
    } else {
        Box::new(RemoteSubmitter::new(config))
    };
    let backend = if config.lm_command.is_some() {
        "command"
    } else {
        "openai"
    };
    tracing::info!(
        backend,
        mock,
        policy = ?config.validation,
        "starting run"
    );
    RepairLoop::new(generator.as_ref(), submitter.as_ref())
        .with_policy(config.validation)
        .run(instruction)
}

fn run_validate(args: &ValidateArgs) -> Result<ExitCode> {
    let text = util::read_input(&args.path)?;
    let payload: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parse payload JSON {}", args.path.display()))?;
    let result = schema::validate(&payload);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serialize validation result")?
        );
    } else {
        println!("{}", report::validation_line(&result));
    }
    Ok(if result.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_extract(args: &ExtractArgs) -> Result<ExitCode> {
    let text = util::read_input(&args.path)?;
    match extract::extract(&text) {
        Ok(payload) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("serialize payload")?
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
