//! One function per `regqa` subcommand. Each takes the loaded configuration
//! and returns a serializable report; printing is left to the binary.

use std::sync::Arc;
use std::time::Duration;

use regqa_ai::answer::{answer_question, AnswerRequest, GroundedAnswer};
use regqa_ai::embeddings::ollama_embed::OllamaEmbedder;
use regqa_ai::embeddings::EmbedderAdapter;
use regqa_ai::evidence::{ChunkStore, Evidence, IndexBuildInput, IndexStatus, IndexStore};
use regqa_ai::llm::openai_llm::OpenAiLlm;
use regqa_ai::ollama::OllamaClient;
use regqa_ai::retrieve::{Retriever, Snapshot};
use regqa_core::config::RagConfig;
use regqa_core::corpus::read_pages;
use regqa_core::error::AppError;
use regqa_core::now_rfc3339_utc;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChunkReport {
    pub pages_kept: usize,
    pub pages_dropped: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusReport {
    pub data_dir: String,
    pub pages_present: bool,
    pub chunks: Option<usize>,
    pub index: IndexStatus,
}

fn chunk_store(cfg: &RagConfig) -> ChunkStore {
    ChunkStore::open(cfg.chunks_path())
}

fn index_store(cfg: &RagConfig) -> IndexStore {
    IndexStore::open(cfg.index_dir())
}

fn embedder(cfg: &RagConfig) -> Result<Arc<EmbedderAdapter>, AppError> {
    let client = OllamaClient::new(&cfg.embedding.base_url)?
        .with_timeout(Duration::from_secs(cfg.embedding.timeout_secs));
    Ok(Arc::new(EmbedderAdapter::new(
        Box::new(OllamaEmbedder::new(client)),
        cfg.embedding.model.clone(),
    )))
}

fn open_retriever(cfg: &RagConfig) -> Result<Retriever, AppError> {
    let snapshot = Snapshot::load(&index_store(cfg), &chunk_store(cfg))?;
    Ok(Retriever::new(embedder(cfg)?, snapshot))
}

/// pages.jsonl -> chunks.jsonl
pub fn chunk(cfg: &RagConfig) -> Result<ChunkReport, AppError> {
    let load = read_pages(&cfg.pages_path(), cfg.chunking.min_page_chars)?;
    let summary = chunk_store(cfg).build_from_pages(
        &load.pages,
        cfg.chunking.size,
        cfg.chunking.overlap,
    )?;
    Ok(ChunkReport {
        pages_kept: summary.pages,
        pages_dropped: load.dropped,
        chunks: summary.chunks,
    })
}

/// chunks.jsonl -> (vectors, metadata) pair
pub fn index(cfg: &RagConfig) -> Result<IndexStatus, AppError> {
    let embedder = embedder(cfg)?;
    index_store(cfg).build(
        &chunk_store(cfg),
        &embedder,
        IndexBuildInput {
            batch_size: cfg.embedding.batch_size,
            workers: cfg.embedding.workers,
            built_at: now_rfc3339_utc()?,
        },
    )
}

pub fn retrieve(cfg: &RagConfig, query: &str, top_k: Option<usize>) -> Result<Vec<Evidence>, AppError> {
    let retriever = open_retriever(cfg)?;
    retriever.retrieve(query, top_k.unwrap_or(cfg.retrieval.top_k))
}

pub fn answer(cfg: &RagConfig, query: &str, top_k: Option<usize>) -> Result<GroundedAnswer, AppError> {
    // Credential first: a missing key must fail before any embedding call.
    let llm = OpenAiLlm::from_env(&cfg.generation)?;
    let retriever = open_retriever(cfg)?;
    answer_question(
        &retriever,
        &llm,
        AnswerRequest {
            query: query.to_string(),
            top_k: top_k.unwrap_or(cfg.retrieval.top_k),
            evidence_char_cap: cfg.retrieval.evidence_char_cap,
        },
    )
}

pub fn status(cfg: &RagConfig) -> Result<StatusReport, AppError> {
    let chunks = chunk_store(cfg);
    let chunk_count = if chunks.exists() {
        Some(chunks.read_all()?.len())
    } else {
        None
    };
    Ok(StatusReport {
        data_dir: cfg.paths.data_dir.display().to_string(),
        pages_present: cfg.pages_path().exists(),
        chunks: chunk_count,
        index: index_store(cfg).status()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use regqa_core::error::codes;

    fn config_in(dir: &std::path::Path) -> RagConfig {
        let mut cfg = RagConfig::default();
        cfg.paths.data_dir = dir.to_path_buf();
        cfg
    }

    #[test]
    fn chunk_then_status() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        std::fs::write(
            cfg.pages_path(),
            concat!(
                r#"{"source":"IFRS9.pdf","page":1,"text":"A significant increase in credit risk triggers Stage 2."}"#,
                "\n",
                r#"{"source":"IFRS9.pdf","page":2,"text":"Contents"}"#,
                "\n",
            ),
        )
        .unwrap();

        let report = chunk(&cfg).unwrap();
        assert_eq!(
            report,
            ChunkReport {
                pages_kept: 1,
                pages_dropped: 1,
                chunks: 1
            }
        );

        let st = status(&cfg).unwrap();
        assert!(st.pages_present);
        assert_eq!(st.chunks, Some(1));
        assert!(!st.index.ready);
    }

    #[test]
    fn retrieve_without_index_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let err = retrieve(&cfg, "What is SICR?", None).unwrap_err();
        assert_eq!(err.code, codes::CONFIG_MISSING_ARTIFACT);
    }

    #[test]
    fn non_local_embedding_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config_in(dir.path());
        cfg.embedding.base_url = "http://example.com:11434".to_string();
        let err = index(&cfg).unwrap_err();
        assert_eq!(err.code, codes::CONFIG_REMOTE_NOT_ALLOWED);
    }
}
