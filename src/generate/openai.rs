//! OpenAI-compatible chat-completions backend.
use super::{build_prompt, non_empty, PayloadGenerator, RepairContext};
use crate::config::{Config, Secret, ENV_OPENAI_API_KEY};
use crate::error::{VaultError, VaultResult};
use crate::util::{http_agent, truncate_string};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiGenerator {
    agent: ureq::Agent,
    base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<Secret>,
}

impl OpenAiGenerator {
    pub fn new(config: &Config) -> Self {
        let base_url = config.openai_base_url.trim_end_matches('/').to_string();
        Self {
            agent: http_agent(config.timeout, &base_url),
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: config.secrets.openai_api_key.clone(),
        }
    }
}

impl PayloadGenerator for OpenAiGenerator {
    fn generate(&self, instruction: &str, context: Option<&RepairContext>) -> VaultResult<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            VaultError::Configuration(format!("{ENV_OPENAI_API_KEY} is not set"))
        })?;
        let prompt = build_prompt(instruction, context);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let authorization = format!("Bearer {}", api_key.expose());
        let start = Instant::now();
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", authorization.as_str())
            .send_json(&request)
            .map_err(|err| VaultError::Generation(format!("model request failed: {err}")))?;
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| VaultError::Generation(format!("read model response: {err}")))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status = status.as_u16(),
            model = %self.model,
            repair = context.is_some(),
            prompt_bytes = prompt.user.len(),
            response_bytes = body.len(),
            "lm invoke complete"
        );

        if !status.is_success() {
            return Err(VaultError::Generation(format!(
                "model endpoint returned {}: {}",
                status.as_u16(),
                truncate_string(body.trim(), 500)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|err| VaultError::Generation(format!("parse model response: {err}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        non_empty(content)
    }
}
