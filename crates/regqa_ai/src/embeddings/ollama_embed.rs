use regqa_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::OllamaClient;

/// Embeddings from a local Ollama server via the batch `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl Embedder for OllamaEmbedder {
    fn warm_up(&self, _model: &str) -> Result<(), AppError> {
        self.client.health_check()
    }

    fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let url = format!("{}/api/embed", self.client.base_url());
        let req = EmbedRequest {
            model,
            input: inputs,
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new(codes::DATA_ENCODE_FAILED, "Failed to encode embeddings request")
                .with_details(e.to_string())
        })?;

        match ureq::post(&url).timeout(self.client.timeout()).send_json(body) {
            Ok(r) => {
                let v: EmbedResponse = r.into_json().map_err(|e| {
                    AppError::new(codes::REMOTE_BAD_RESPONSE, "Failed to decode embeddings response")
                        .with_details(e.to_string())
                })?;
                if v.embeddings.iter().any(|e| e.is_empty()) {
                    return Err(AppError::new(
                        codes::REMOTE_BAD_RESPONSE,
                        "Embeddings response contained an empty vector",
                    ));
                }
                Ok(v.embeddings)
            }
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                codes::REMOTE_BAD_RESPONSE,
                "Embeddings request failed",
            )
            .with_details(format!("status={status}; model={model}"))
            .with_retryable(status == 429 || status >= 500)),
            Err(e) => Err(AppError::remote("Failed to call embeddings endpoint")
                .with_details(e.to_string())),
        }
    }
}
