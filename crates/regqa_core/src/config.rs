//! Layered configuration.
//!
//! Built-in defaults are merged with an optional `regqa.toml` and then with
//! `REGQA_*` environment variables (nested keys separated by `__`, e.g.
//! `REGQA_CHUNKING__SIZE=800`). Credentials never live here; see
//! [`read_credential`].

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{codes, AppError};

pub const DEFAULT_CONFIG_FILE: &str = "regqa.toml";
pub const ENV_PREFIX: &str = "REGQA_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    pub paths: PathsConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Holds `pages.jsonl`, `chunks.jsonl` and the `index/` directory.
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
    pub min_page_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub batch_size: usize,
    pub workers: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub evidence_char_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/processed"),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 1200,
            overlap: 200,
            min_page_chars: 30,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "all-minilm".to_string(),
            batch_size: 32,
            workers: 1,
            timeout_secs: 10,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            evidence_char_cap: 1400,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

impl RagConfig {
    /// Load from `regqa.toml` in the working directory (if present) plus env.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let figment = Figment::from(Serialized::defaults(RagConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        let cfg: RagConfig = figment.extract().map_err(|e| {
            AppError::new(codes::CONFIG_INVALID, "Failed to load configuration")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunking.size == 0 || self.chunking.size <= self.chunking.overlap {
            return Err(AppError::new(
                codes::CONFIG_INVALID_CHUNKING,
                "Chunk size must be greater than overlap",
            )
            .with_details(format!(
                "size={}; overlap={}",
                self.chunking.size, self.chunking.overlap
            )));
        }
        if self.embedding.batch_size == 0 || self.embedding.workers == 0 {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "Embedding batch_size and workers must be at least 1",
            ));
        }
        if self.retrieval.evidence_char_cap == 0 {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "retrieval.evidence_char_cap must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn pages_path(&self) -> PathBuf {
        self.paths.data_dir.join("pages.jsonl")
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.paths.data_dir.join("chunks.jsonl")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.paths.data_dir.join("index")
    }
}

/// Read a secret from the environment, loading `.env` first if one exists.
///
/// A missing or blank value is a fatal configuration error.
pub fn read_credential(var: &str) -> Result<String, AppError> {
    // A missing .env file is fine; the variable may come from the real environment.
    let _ = dotenvy::dotenv();
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(AppError::new(
            codes::CONFIG_MISSING_CREDENTIAL,
            "Required credential is not set",
        )
        .with_details(format!("var={var}; set it in the environment or in .env"))),
    }
}
