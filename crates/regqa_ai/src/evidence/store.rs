use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regqa_core::domain::{Chunk, PageRecord};
use regqa_core::error::{codes, AppError};
use regqa_core::io::{read_jsonl, write_jsonl_atomic};

use super::chunking::{chunk_page, validate_chunking};
use super::model::ChunkBuildSummary;

/// Line-delimited chunk store (`chunks.jsonl`), keyed by `chunk_id`.
///
/// Written once per build; read by the index build and by query-time text lookup.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    path: PathBuf,
}

impl ChunkStore {
    pub fn open(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Chunk every page and replace the store atomically.
    ///
    /// Nothing is written if any page fails to chunk or two chunks share an id.
    pub fn build_from_pages(
        &self,
        pages: &[PageRecord],
        size: usize,
        overlap: usize,
    ) -> Result<ChunkBuildSummary, AppError> {
        validate_chunking(size, overlap)?;
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for page in pages {
            for chunk in chunk_page(page, size, overlap)? {
                if !seen.insert(chunk.chunk_id.clone()) {
                    return Err(AppError::new(
                        codes::DATA_DUPLICATE_CHUNK,
                        "Duplicate chunk id; the corpus repeats a (source, page) pair",
                    )
                    .with_details(format!("chunk_id={}", chunk.chunk_id)));
                }
                chunks.push(chunk);
            }
        }

        write_jsonl_atomic(&self.path, &chunks)?;
        tracing::info!(
            path = %self.path.display(),
            pages = pages.len(),
            chunks = chunks.len(),
            "wrote chunk store"
        );
        Ok(ChunkBuildSummary {
            pages: pages.len(),
            chunks: chunks.len(),
        })
    }

    /// All chunks in file order. A missing store is a configuration error.
    pub fn read_all(&self) -> Result<Vec<Chunk>, AppError> {
        read_jsonl(&self.path)
    }
}
