//! CLI argument parsing.
//!
//! The CLI only resolves inputs and configuration; the workflow itself lives
//! in `workflow` so it can run without a terminal.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "vaultpilot",
    version,
    about = "Turn a plain-language instruction into a PayPal Vault v3 payment-token request",
    after_help = "Environment:\n  OPENAI_API_KEY                 Model API key (HTTP backend)\n  VAULTPILOT_LM_COMMAND          Local LM command (replaces the HTTP backend)\n  PAYPAL_CLIENT_ID               Sandbox client id\n  PAYPAL_CLIENT_SECRET           Sandbox client secret\n  PAYPAL_SANDBOX_ACCESS_TOKEN    Pre-issued sandbox token (skips token exchange)\n\nExamples:\n  vaultpilot run --mock \"Vault a Visa card ending 1111 with CVV 123, expiry 2025-12\"\n  vaultpilot run --json \"Vault the PayPal account buyer@example.com\"\n  vaultpilot validate payload.json\n  vaultpilot config > vaultpilot.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log workflow progress to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Validate(ValidateArgs),
    Extract(ExtractArgs),
    Config(ConfigArgs),
}

/// Run the generate/validate/submit workflow for one instruction.
#[derive(Parser, Debug)]
#[command(about = "Generate, validate, and submit a vault request")]
pub struct RunArgs {
    /// What to vault, in plain language
    #[arg(required = true, value_name = "INSTRUCTION")]
    pub instruction: Vec<String>,

    /// Use the offline mock submitter instead of the PayPal sandbox
    #[arg(long)]
    pub mock: bool,

    /// Submit even when the payload fails schema validation
    #[arg(long)]
    pub advisory_validation: bool,

    /// Local LM command (prompt on stdin, response on stdout)
    #[arg(long, value_name = "CMD")]
    pub lm: Option<String>,

    /// Model name for the HTTP backend
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a payload file against the vault schema.
#[derive(Parser, Debug)]
#[command(about = "Validate a payload JSON file ('-' for stdin)")]
pub struct ValidateArgs {
    #[arg(value_name = "PATH", default_value = "-")]
    pub path: PathBuf,

    /// Emit the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Extract the payload object from saved model output.
#[derive(Parser, Debug)]
#[command(about = "Extract the payload JSON from model output ('-' for stdin)")]
pub struct ExtractArgs {
    #[arg(value_name = "PATH", default_value = "-")]
    pub path: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Print a config file stub with the defaults")]
pub struct ConfigArgs {}

impl RunArgs {
    pub fn instruction_text(&self) -> String {
        self.instruction.join(" ")
    }
}
