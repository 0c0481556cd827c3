use std::time::Duration;

use regqa_core::error::{codes, AppError};

/// Client for a local Ollama server. Strictly limited to `127.0.0.1`.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let rest = base_url.strip_prefix("http://127.0.0.1").ok_or_else(|| not_local(&base_url))?;

        // Either nothing, or ":<port>" with a port in 1..=65535 and no path.
        if !rest.is_empty() {
            let port = rest.strip_prefix(':').ok_or_else(|| not_local(&base_url))?;
            let valid = !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
                && matches!(port.parse::<u32>(), Ok(p) if (1..=65535).contains(&p));
            if !valid {
                return Err(not_local(&base_url));
            }
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(10),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        match ureq::get(&url).timeout(Duration::from_millis(800)).call() {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                codes::REMOTE_UNAVAILABLE,
                "Ollama health check failed",
            )
            .with_details(format!("status={status}"))
            .with_retryable(true)),
            Err(e) => Err(AppError::remote("Failed to reach Ollama on 127.0.0.1")
                .with_details(e.to_string())),
        }
    }
}

fn not_local(base_url: &str) -> AppError {
    AppError::new(
        codes::CONFIG_REMOTE_NOT_ALLOWED,
        "Ollama base URL must be localhost (127.0.0.1)",
    )
    .with_details(format!("base_url={base_url}"))
}
