//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Marker present only in repair prompts.
const REPAIR_MARKER: &str = "failed with this Vault API error";

const CREDENTIAL_VARS: [&str; 6] = [
    "OPENAI_API_KEY",
    "PAYPAL_CLIENT_ID",
    "PAYPAL_CLIENT_SECRET",
    "PAYPAL_SANDBOX_ACCESS_TOKEN",
    "VAULTPILOT_LM_COMMAND",
    "VAULTPILOT_MODEL",
];

/// A scripted local LM: answers `first` to the initial prompt and `repair`
/// to the repair prompt. Every prompt it receives is appended to a log.
pub struct ScriptedLm {
    dir: TempDir,
}

impl ScriptedLm {
    pub fn new(first: &str, repair: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join("first.txt"), first).expect("write first response");
        std::fs::write(dir.path().join("repair.txt"), repair).expect("write repair response");
        let script = format!(
            "#!/bin/sh\n\
             dir=$(dirname \"$0\")\n\
             prompt=$(cat)\n\
             printf '%s\\n---\\n' \"$prompt\" >> \"$dir/prompts.log\"\n\
             case \"$prompt\" in\n\
             *\"{REPAIR_MARKER}\"*) cat \"$dir/repair.txt\" ;;\n\
             *) cat \"$dir/first.txt\" ;;\n\
             esac\n"
        );
        std::fs::write(dir.path().join("lm.sh"), script).expect("write lm script");
        Self { dir }
    }

    /// Value for `--lm`.
    pub fn command(&self) -> String {
        format!("sh '{}'", self.dir.path().join("lm.sh").display())
    }

    /// Number of prompts the LM has answered.
    pub fn calls(&self) -> usize {
        std::fs::read_to_string(self.dir.path().join("prompts.log"))
            .map(|log| log.matches("\n---\n").count())
            .unwrap_or(0)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

pub fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vaultpilot"))
}

/// Command with credentials and LM settings cleared from the environment.
pub fn vaultpilot() -> Command {
    let mut command = Command::new(bin());
    for var in CREDENTIAL_VARS {
        command.env_remove(var);
    }
    command.env_remove("RUST_LOG");
    command
}

pub fn run(args: &[&str]) -> Output {
    vaultpilot().args(args).output().expect("run vaultpilot")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
