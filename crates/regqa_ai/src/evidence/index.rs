//! Persisted (vectors, metadata) pair.
//!
//! Layout under the index root:
//!
//! ```text
//! CURRENT                 name of the live generation
//! g000003-<id>/vectors.json
//! g000003-<id>/meta.json
//! g000003-<id>/status.json
//! ```
//!
//! A build writes a complete new generation and then replaces `CURRENT`
//! (tmp -> rename), so readers never see vectors from one build paired with
//! metadata from another.

use std::fs;
use std::path::{Path, PathBuf};

use regqa_core::domain::{Chunk, IndexMeta};
use regqa_core::error::{codes, AppError};
use regqa_core::io::{ensure_dir, missing_artifact, read_json, write_atomic, write_json_atomic};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::store::ChunkStore;
use crate::embeddings::EmbedderAdapter;
use crate::retrieve::flat::{FlatIndex, VectorIndex};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub ready: bool,
    pub build_id: Option<String>,
    pub model: Option<String>,
    pub dims: Option<u32>,
    pub count: u32,
    pub built_at: Option<String>,
    /// Fingerprint of the chunk store the vectors were embedded from.
    #[serde(default)]
    pub chunks_digest: Option<String>,
}

impl IndexStatus {
    fn not_ready() -> Self {
        Self {
            ready: false,
            build_id: None,
            model: None,
            dims: None,
            count: 0,
            built_at: None,
            chunks_digest: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexBuildInput {
    pub batch_size: usize,
    pub workers: usize,
    pub built_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorsFile {
    build_id: String,
    dims: u32,
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetaFile {
    build_id: String,
    metas: Vec<IndexMeta>,
}

/// A loaded, validated pair.
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    pub index: FlatIndex,
    pub metas: Vec<IndexMeta>,
    pub status: IndexStatus,
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn current_path(&self) -> PathBuf {
        self.root.join("CURRENT")
    }

    fn current_generation(&self) -> Result<Option<String>, AppError> {
        let path = self.current_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|e| {
            AppError::new(codes::IO_FAILED, "Failed to read index CURRENT pointer")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let name = raw.trim();
        if name.is_empty() {
            return Ok(None);
        }
        Ok(Some(name.to_string()))
    }

    fn generations(&self) -> Result<Vec<String>, AppError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).map_err(|e| {
            AppError::new(codes::IO_FAILED, "Failed to list index directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })?;
        let mut out = Vec::new();
        for ent in entries.flatten() {
            let name = ent.file_name().to_string_lossy().to_string();
            if ent.path().is_dir() && generation_seq(&name).is_some() {
                out.push(name);
            }
        }
        out.sort();
        Ok(out)
    }

    pub fn status(&self) -> Result<IndexStatus, AppError> {
        match self.current_generation()? {
            Some(gen) => read_json(&self.root.join(gen).join("status.json")),
            None => Ok(IndexStatus::not_ready()),
        }
    }

    /// Full rebuild from the chunk store. The previous generation stays live
    /// until every embedding has succeeded and the new pair is on disk.
    pub fn build(
        &self,
        chunks: &ChunkStore,
        embedder: &EmbedderAdapter,
        input: IndexBuildInput,
    ) -> Result<IndexStatus, AppError> {
        let chunk_list = chunks.read_all()?;
        if chunk_list.is_empty() {
            return Err(AppError::new(
                codes::CONFIG_MISSING_ARTIFACT,
                "Chunk store is empty; build chunks before building the index",
            )
            .with_details(format!("path={}", chunks.path().display())));
        }

        tracing::info!(
            chunks = chunk_list.len(),
            model = embedder.model(),
            batch_size = input.batch_size,
            workers = input.workers,
            "embedding chunks"
        );
        let texts: Vec<String> = chunk_list.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batched(&texts, input.batch_size, input.workers)?;

        let dims = vectors.first().map(|v| v.len()).unwrap_or(0);
        let index = FlatIndex::build(dims, &vectors)?;
        let metas: Vec<IndexMeta> = chunk_list.iter().map(|c| c.meta()).collect();
        if index.len() != metas.len() {
            return Err(desync(index.len(), metas.len()));
        }

        let build_id = build_id(embedder.model(), dims, &metas);
        let status = IndexStatus {
            ready: true,
            build_id: Some(build_id.clone()),
            model: Some(embedder.model().to_string()),
            dims: Some(dims as u32),
            count: metas.len() as u32,
            built_at: Some(input.built_at),
            chunks_digest: Some(chunks_digest(&chunk_list)),
        };

        self.commit(&build_id, dims, vectors, metas, &status)?;
        tracing::info!(build_id = %build_id, count = status.count, dims, "index build committed");
        Ok(status)
    }

    fn commit(
        &self,
        build_id: &str,
        dims: usize,
        vectors: Vec<Vec<f32>>,
        metas: Vec<IndexMeta>,
        status: &IndexStatus,
    ) -> Result<(), AppError> {
        ensure_dir(&self.root)?;
        let existing = self.generations()?;
        let seq = existing
            .iter()
            .filter_map(|g| generation_seq(g))
            .max()
            .map_or(1, |s| s + 1);
        let gen = format!("g{seq:06}-{}", &build_id[..12]);
        let staging = self.root.join(format!(".staging-{gen}"));
        if staging.exists() {
            remove_dir(&staging)?;
        }
        ensure_dir(&staging)?;

        write_json_atomic(
            &staging.join("vectors.json"),
            &VectorsFile {
                build_id: build_id.to_string(),
                dims: dims as u32,
                vectors,
            },
        )?;
        write_json_atomic(
            &staging.join("meta.json"),
            &MetaFile {
                build_id: build_id.to_string(),
                metas,
            },
        )?;
        write_json_atomic(&staging.join("status.json"), status)?;

        let dest = self.root.join(&gen);
        fs::rename(&staging, &dest).map_err(|e| {
            AppError::new(codes::IO_FAILED, "Failed to finalize index generation")
                .with_details(format!("tmp={}; dest={}; err={}", staging.display(), dest.display(), e))
        })?;
        write_atomic(&self.current_path(), gen.as_bytes())?;

        for old in existing {
            if let Err(e) = remove_dir(&self.root.join(&old)) {
                tracing::warn!(generation = %old, error = %e, "failed to prune old index generation");
            }
        }
        Ok(())
    }

    /// Load the live pair, checking that vectors and metadata come from the same build.
    pub fn load(&self) -> Result<LoadedIndex, AppError> {
        let gen = self
            .current_generation()?
            .ok_or_else(|| missing_artifact(&self.current_path()))?;
        let dir = self.root.join(&gen);
        let vectors: VectorsFile = read_json(&dir.join("vectors.json"))?;
        let meta: MetaFile = read_json(&dir.join("meta.json"))?;
        let status: IndexStatus = read_json(&dir.join("status.json"))?;

        if vectors.build_id != meta.build_id || status.build_id.as_deref() != Some(meta.build_id.as_str()) {
            return Err(AppError::new(
                codes::CONFIG_INDEX_DESYNC,
                "Index vectors and metadata come from different builds",
            )
            .with_details(format!(
                "generation={gen}; vectors={}; meta={}",
                vectors.build_id, meta.build_id
            )));
        }

        let index = FlatIndex::build(vectors.dims as usize, &vectors.vectors)?;
        if index.len() != meta.metas.len() {
            return Err(desync(index.len(), meta.metas.len()));
        }
        tracing::debug!(generation = %gen, count = index.len(), "loaded index");
        Ok(LoadedIndex {
            index,
            metas: meta.metas,
            status,
        })
    }
}

/// Stable fingerprint of a build: model, width and the ordered chunk ids.
pub fn build_id(model: &str, dims: usize, metas: &[IndexMeta]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("v1|{model}|{dims}").as_bytes());
    for m in metas {
        hasher.update(b"\n");
        hasher.update(m.chunk_id.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint of chunk ids and texts in store order.
///
/// A re-chunked store changes this even when every chunk id is unchanged.
pub fn chunks_digest(chunks: &[Chunk]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"chunks-v1");
    for c in chunks {
        hasher.update(b"\n");
        hasher.update(c.chunk_id.as_bytes());
        hasher.update(b"\t");
        hasher.update(c.text.len().to_le_bytes());
        hasher.update(c.text.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn generation_seq(name: &str) -> Option<u64> {
    let rest = name.strip_prefix('g')?;
    let (seq, _) = rest.split_once('-')?;
    seq.parse().ok()
}

fn remove_dir(path: &Path) -> Result<(), AppError> {
    fs::remove_dir_all(path).map_err(|e| {
        AppError::new(codes::IO_FAILED, "Failed to remove directory")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn desync(vectors: usize, metas: usize) -> AppError {
    AppError::new(
        codes::CONFIG_INDEX_DESYNC,
        "Index vector count does not match metadata count",
    )
    .with_details(format!("vectors={vectors}; metas={metas}"))
}
