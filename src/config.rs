//! Runtime configuration.
//!
//! Secrets come from the process environment only. Non-secret settings come
//! from the environment, then an optional JSON config file, then CLI flags,
//! with later layers winning. The resolved `Config` is passed to components at
//! construction; nothing reads the environment after startup.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PAYPAL_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_PAYPAL_CLIENT_ID: &str = "PAYPAL_CLIENT_ID";
pub const ENV_PAYPAL_CLIENT_SECRET: &str = "PAYPAL_CLIENT_SECRET";
pub const ENV_PAYPAL_ACCESS_TOKEN: &str = "PAYPAL_SANDBOX_ACCESS_TOKEN";
pub const ENV_LM_COMMAND: &str = "VAULTPILOT_LM_COMMAND";
pub const ENV_MODEL: &str = "VAULTPILOT_MODEL";

/// A confidential value. `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Whether a schema violation stops the run before submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Invalid payloads go straight to the repair round.
    #[default]
    Blocking,
    /// Invalid payloads are reported and submitted anyway.
    Advisory,
}

#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<Secret>,
    pub paypal_client_id: Option<Secret>,
    pub paypal_client_secret: Option<Secret>,
    pub paypal_access_token: Option<Secret>,
}

/// On-disk config (`--config PATH`). Every field except the version is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paypal_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationPolicy>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub temperature: f32,
    pub openai_base_url: String,
    pub paypal_base_url: String,
    pub timeout: Duration,
    /// Local LM command; when set it replaces the HTTP model backend.
    pub lm_command: Option<String>,
    pub validation: ValidationPolicy,
    pub secrets: Secrets,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            paypal_base_url: DEFAULT_PAYPAL_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            lm_command: None,
            validation: ValidationPolicy::default(),
            secrets: Secrets::default(),
        }
    }
}

impl Config {
    /// Build a config from an environment lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let secret = |key: &str| read(key).map(Secret::new);

        let mut config = Config::default();
        if let Some(model) = read(ENV_MODEL) {
            config.model = model;
        }
        config.lm_command = read(ENV_LM_COMMAND);
        config.secrets = Secrets {
            openai_api_key: secret(ENV_OPENAI_API_KEY),
            paypal_client_id: secret(ENV_PAYPAL_CLIENT_ID),
            paypal_client_secret: secret(ENV_PAYPAL_CLIENT_SECRET),
            paypal_access_token: secret(ENV_PAYPAL_ACCESS_TOKEN),
        };
        config
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay settings from a config file.
    pub fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(model) = &file.model {
            self.model = model.clone();
        }
        if let Some(temperature) = file.temperature {
            self.temperature = temperature;
        }
        if let Some(url) = &file.openai_base_url {
            self.openai_base_url = url.clone();
        }
        if let Some(url) = &file.paypal_base_url {
            self.paypal_base_url = url.clone();
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(command) = &file.lm_command {
            self.lm_command = Some(command.clone());
        }
        if let Some(policy) = file.validation {
            self.validation = policy;
        }
    }
}

/// Render a pretty JSON config stub listing the defaults.
pub fn config_stub() -> Result<String> {
    let stub = ConfigFile {
        schema_version: CONFIG_SCHEMA_VERSION,
        model: Some(DEFAULT_MODEL.to_string()),
        temperature: Some(DEFAULT_TEMPERATURE),
        openai_base_url: Some(DEFAULT_OPENAI_BASE_URL.to_string()),
        paypal_base_url: Some(DEFAULT_PAYPAL_BASE_URL.to_string()),
        timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
        lm_command: None,
        validation: Some(ValidationPolicy::Blocking),
    };
    serde_json::to_string_pretty(&stub).context("serialize config stub")
}

pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let file: ConfigFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    if file.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {})",
            file.schema_version,
            CONFIG_SCHEMA_VERSION
        ));
    }
    Ok(file)
}

/// Reject settings no backend could work with.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.model.trim().is_empty() {
        return Err(anyhow!("model must be non-empty"));
    }
    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(anyhow!(
            "temperature must be between 0.0 and 2.0 (got {})",
            config.temperature
        ));
    }
    if config.timeout.is_zero() {
        return Err(anyhow!("timeout_secs must be greater than zero"));
    }
    validate_base_url(&config.openai_base_url, "openai_base_url")?;
    validate_base_url(&config.paypal_base_url, "paypal_base_url")?;
    if let Some(command) = &config.lm_command {
        if command.trim().is_empty() {
            return Err(anyhow!("lm_command must be non-empty when set"));
        }
    }
    Ok(())
}

fn validate_base_url(url: &str, label: &str) -> Result<()> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(anyhow!("{label} must be an http(s) URL (got {url:?})"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
