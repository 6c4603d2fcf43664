//! Payload generation through a generative model.
//!
//! A generator turns an instruction (plus, in repair mode, the previous error)
//! into raw model text. Two backends exist:
//!
//! - [`OpenAiGenerator`]: OpenAI-compatible chat completions over HTTP.
//! - [`CommandGenerator`]: a user-configured local command that reads the
//!   prompt on stdin and writes the response to stdout (`llm`, `ollama run`,
//!   or a script).
//!
//! Generators never retry. Bounded re-prompting is the workflow's job.
use crate::config::Config;
use crate::error::{VaultError, VaultResult};
use crate::util::truncate_string;

mod command;
mod openai;

pub use command::CommandGenerator;
pub use openai::OpenAiGenerator;

/// Longest slice of a previous response echoed back in a repair prompt.
const PREVIOUS_OUTPUT_LIMIT: usize = 1000;

const SYSTEM_PROMPT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/system.md"));
const GENERATE_PROMPT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/generate.md"));
const REPAIR_PROMPT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/repair.md"));

/// Error context for a repair round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairContext {
    /// The error text reported by validation or submission.
    pub error: String,
    /// Raw model output of the failed attempt, if any.
    pub previous_output: Option<String>,
}

pub trait PayloadGenerator {
    /// Produce raw model text for an instruction. The text should contain one
    /// JSON object but nothing guarantees it.
    fn generate(&self, instruction: &str, context: Option<&RepairContext>) -> VaultResult<String>;
}

/// Rendered system directive and user message.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
}

pub fn build_prompt(instruction: &str, context: Option<&RepairContext>) -> Prompt {
    let user = match context {
        None => fill(GENERATE_PROMPT, &[("instruction", instruction)]),
        Some(context) => {
            let previous = match context.previous_output.as_deref() {
                Some(text) if text.len() > PREVIOUS_OUTPUT_LIMIT => format!(
                    "{}...(truncated)",
                    truncate_string(text, PREVIOUS_OUTPUT_LIMIT)
                ),
                Some(text) => text.to_string(),
                None => "(none)".to_string(),
            };
            fill(
                REPAIR_PROMPT,
                &[
                    ("error", &context.error),
                    ("previous_output", &previous),
                    ("instruction", instruction),
                ],
            )
        }
    };
    Prompt {
        system: SYSTEM_PROMPT,
        user,
    }
}

/// Substitute `{name}` placeholders in one pass; substituted text is never
/// rescanned.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let placeholder = values
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Treat blank model output as a generation failure.
fn non_empty(text: String) -> VaultResult<String> {
    if text.trim().is_empty() {
        return Err(VaultError::Generation("model returned empty content".to_string()));
    }
    Ok(text)
}

/// Pick the backend the config asks for: a local command when one is set,
/// otherwise the HTTP model.
pub fn from_config(config: &Config) -> VaultResult<Box<dyn PayloadGenerator>> {
    if let Some(command) = &config.lm_command {
        return Ok(Box::new(CommandGenerator::new(command)?));
    }
    Ok(Box::new(OpenAiGenerator::new(config)))
}
