use std::time::Duration;

use regqa_core::config::{read_credential, GenerationConfig};
use regqa_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::Llm;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// OpenAI-compatible chat-completions backend.
#[derive(Clone)]
pub struct OpenAiLlm {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiLlm {
    /// Fails with `CONFIG_MISSING_CREDENTIAL` when no API key is configured,
    /// so callers learn about it before running any query.
    pub fn from_env(cfg: &GenerationConfig) -> Result<Self, AppError> {
        let api_key = read_credential(API_KEY_VAR)?;
        Ok(Self::new(api_key, cfg))
    }

    pub fn new(api_key: String, cfg: &GenerationConfig) -> Self {
        Self {
            api_key,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAiLlm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiLlm")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl Llm for OpenAiLlm {
    fn generate(&self, system: &str, user: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new(codes::DATA_ENCODE_FAILED, "Failed to encode generation request")
                .with_details(e.to_string())
        })?;

        let resp = ureq::post(&url)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(body);

        match resp {
            Ok(r) => {
                let v: ChatResponse = r.into_json().map_err(|e| {
                    AppError::new(codes::REMOTE_BAD_RESPONSE, "Failed to decode generation response")
                        .with_details(e.to_string())
                })?;
                let text = v
                    .choices
                    .into_iter()
                    .find_map(|c| c.message.content)
                    .unwrap_or_default();
                if text.trim().is_empty() {
                    return Err(AppError::new(
                        codes::REMOTE_BAD_RESPONSE,
                        "Generation response was empty",
                    ));
                }
                Ok(text)
            }
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                codes::REMOTE_BAD_RESPONSE,
                "Generation request failed",
            )
            .with_details(format!("status={status}; model={}", self.model))
            .with_retryable(status == 429 || status >= 500)),
            Err(e) => Err(AppError::remote("Failed to call generation endpoint")
                .with_details(e.to_string())),
        }
    }
}
