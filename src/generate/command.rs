//! Local LM command backend.
//!
//! The command string is split with shell-words. The system directive and the
//! user message are written to stdin, separated by a blank line; stdout is the
//! model response.
use super::{build_prompt, non_empty, PayloadGenerator, RepairContext};
use crate::error::{VaultError, VaultResult};
use crate::util::truncate_bytes;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::time::Instant;

pub struct CommandGenerator {
    argv: Vec<String>,
}

impl CommandGenerator {
    pub fn new(command: &str) -> VaultResult<Self> {
        let argv = shell_words::split(command).map_err(|err| {
            VaultError::Configuration(format!("parse LM command {command:?}: {err}"))
        })?;
        if argv.is_empty() {
            return Err(VaultError::Configuration("LM command is empty".to_string()));
        }
        Ok(Self { argv })
    }
}

impl PayloadGenerator for CommandGenerator {
    fn generate(&self, instruction: &str, context: Option<&RepairContext>) -> VaultResult<String> {
        let prompt = build_prompt(instruction, context);
        let input = format!("{}\n\n{}", prompt.system, prompt.user);

        let start = Instant::now();
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                VaultError::Generation(format!("spawn LM command {}: {err}", self.argv[0]))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Commands that ignore stdin may exit before the prompt is written.
            match stdin.write_all(input.as_bytes()) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    tracing::debug!("LM command closed stdin early");
                }
                Err(err) => {
                    return Err(VaultError::Generation(format!(
                        "write prompt to LM stdin: {err}"
                    )))
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|err| VaultError::Generation(format!("wait for LM command: {err}")))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            repair = context.is_some(),
            prompt_bytes = input.len(),
            response_bytes = output.stdout.len(),
            "lm invoke complete"
        );

        if !output.status.success() {
            return Err(VaultError::Generation(format!(
                "LM command failed with status {}: {}",
                output.status,
                truncate_bytes(&output.stderr, 500).trim()
            )));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|err| VaultError::Generation(format!("decode LM stdout as UTF-8: {err}")))?;
        non_empty(text)
    }
}
