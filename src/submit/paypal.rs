//! PayPal sandbox submitter.
//!
//! Exchanges client credentials for a bearer token (or uses a pre-issued
//! sandbox token) and posts the payload to the Vault v3 payment-tokens
//! resource. Nothing is retried and tokens are never cached or logged.
use super::{SubmissionOutcome, Submitter};
use crate::config::{
    Config, Secret, Secrets, ENV_PAYPAL_ACCESS_TOKEN, ENV_PAYPAL_CLIENT_ID,
    ENV_PAYPAL_CLIENT_SECRET,
};
use crate::error::{VaultError, VaultResult};
use crate::util::{http_agent, truncate_string};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;

pub const TOKEN_PATH: &str = "/v1/oauth2/token";
pub const VAULT_PATH: &str = "/v3/vault/payment-tokens";

enum Credentials {
    AccessToken(Secret),
    ClientCredentials { id: Secret, secret: Secret },
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

pub struct RemoteSubmitter {
    agent: ureq::Agent,
    base_url: String,
    /// Missing credentials are kept as the error to report at submit time.
    credentials: Result<Credentials, String>,
}

impl RemoteSubmitter {
    pub fn new(config: &Config) -> Self {
        let base_url = config.paypal_base_url.trim_end_matches('/').to_string();
        Self {
            agent: http_agent(config.timeout, &base_url),
            base_url,
            credentials: resolve_credentials(&config.secrets),
        }
    }

    /// Transport failures are submission errors; a rejected exchange is an
    /// auth error.
    fn exchange_token(&self, id: &Secret, secret: &Secret) -> VaultResult<Secret> {
        let url = format!("{}{TOKEN_PATH}", self.base_url);
        let basic = STANDARD.encode(format!("{}:{}", id.expose(), secret.expose()));
        let authorization = format!("Basic {basic}");
        let start = Instant::now();
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", authorization.as_str())
            .header("Accept", "application/json")
            .header("Accept-Language", "en_US")
            .send_form([("grant_type", "client_credentials")])
            .map_err(|err| VaultError::Submission(format!("token request failed: {err}")))?;
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| VaultError::Submission(format!("read token response: {err}")))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status = status.as_u16(),
            "token exchange complete"
        );

        if !status.is_success() {
            return Err(VaultError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                truncate_string(body.trim(), 500)
            )));
        }
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| VaultError::Auth(format!("parse token response: {err}")))?;
        token
            .access_token
            .filter(|value| !value.trim().is_empty())
            .map(Secret::new)
            .ok_or_else(|| VaultError::Auth("token response missing access_token".to_string()))
    }
}

impl Submitter for RemoteSubmitter {
    fn submit(&self, payload: &Value) -> VaultResult<SubmissionOutcome> {
        let credentials = self
            .credentials
            .as_ref()
            .map_err(|message| VaultError::Configuration(message.clone()))?;
        let token = match credentials {
            Credentials::AccessToken(token) => token.clone(),
            Credentials::ClientCredentials { id, secret } => self.exchange_token(id, secret)?,
        };

        let url = format!("{}{VAULT_PATH}", self.base_url);
        let authorization = format!("Bearer {}", token.expose());
        let start = Instant::now();
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", authorization.as_str())
            .header("Accept", "application/json")
            .send_json(payload)
            .map_err(|err| VaultError::Submission(format!("vault request failed: {err}")))?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|err| VaultError::Submission(format!("read vault response: {err}")))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status,
            response_bytes = text.len(),
            "vault submit complete"
        );

        let body = parse_body(&text);
        if response.status().is_success() {
            return Ok(SubmissionOutcome::Accepted { status, body });
        }
        Ok(SubmissionOutcome::Rejected {
            category: error_category(&body, status),
            message: error_message(&body, &text, status),
            status: Some(status),
            body: Some(body),
        })
    }
}

fn resolve_credentials(secrets: &Secrets) -> Result<Credentials, String> {
    if let Some(token) = &secrets.paypal_access_token {
        return Ok(Credentials::AccessToken(token.clone()));
    }
    match (&secrets.paypal_client_id, &secrets.paypal_client_secret) {
        (Some(id), Some(secret)) => Ok(Credentials::ClientCredentials {
            id: id.clone(),
            secret: secret.clone(),
        }),
        (id, secret) => {
            let missing = [
                (id.is_none(), ENV_PAYPAL_CLIENT_ID),
                (secret.is_none(), ENV_PAYPAL_CLIENT_SECRET),
            ]
            .into_iter()
            .filter(|(absent, _)| *absent)
            .map(|(_, name)| name)
            .collect::<Vec<_>>()
            .join(", ");
            Err(format!(
                "PayPal sandbox credentials missing: set {missing} (or {ENV_PAYPAL_ACCESS_TOKEN})"
            ))
        }
    }
}

/// Keep non-JSON bodies as a JSON string so they still pass through.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn error_category(body: &Value, status: u16) -> String {
    body.get("name")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("http_{status}"))
}

/// PayPal error message plus each `details[]` issue, so the repair prompt sees
/// which field was rejected.
fn error_message(body: &Value, text: &str, status: u16) -> String {
    let base = body
        .get("message")
        .or_else(|| body.get("error_description"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                truncate_string(trimmed, 500)
            }
        });

    let issues = body
        .get("details")
        .and_then(Value::as_array)
        .map(|details| {
            details
                .iter()
                .filter_map(|detail| {
                    let issue = detail.get("issue").and_then(Value::as_str)?;
                    let mut line = issue.to_string();
                    if let Some(field) = detail.get("field").and_then(Value::as_str) {
                        line.push_str(&format!(" at {field}"));
                    }
                    if let Some(description) = detail.get("description").and_then(Value::as_str) {
                        line.push_str(&format!(": {description}"));
                    }
                    Some(line)
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if issues.is_empty() {
        base
    } else {
        format!("{base} ({})", issues.join("; "))
    }
}

#[cfg(test)]
#[path = "paypal_tests.rs"]
mod tests;
