use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use regqa_core::domain::IndexMeta;
use regqa_core::error::{codes, AppError};

use crate::embeddings::EmbedderAdapter;
use crate::evidence::index::chunks_digest;
use crate::evidence::{ChunkStore, Evidence, IndexStore};

pub mod flat;
mod similarity;

use flat::VectorIndex;

/// One consistent view of the built corpus: index, position metadata and chunk text.
pub struct Snapshot {
    index: Box<dyn VectorIndex>,
    metas: Vec<IndexMeta>,
    texts: HashMap<String, String>,
    build_id: Option<String>,
}

impl Snapshot {
    pub fn new(
        index: impl VectorIndex + 'static,
        metas: Vec<IndexMeta>,
        texts: HashMap<String, String>,
        build_id: Option<String>,
    ) -> Result<Self, AppError> {
        if index.len() != metas.len() {
            return Err(AppError::new(
                codes::CONFIG_INDEX_DESYNC,
                "Index vector count does not match metadata count",
            )
            .with_details(format!("vectors={}; metas={}", index.len(), metas.len())));
        }
        Ok(Self {
            index: Box::new(index),
            metas,
            texts,
            build_id,
        })
    }

    /// Load the live index pair plus the chunk-text map.
    ///
    /// The chunk store must be the one the index was built from; a store
    /// rewritten since the last index build is rejected.
    pub fn load(index: &IndexStore, chunks: &ChunkStore) -> Result<Self, AppError> {
        let loaded = index.load()?;
        let chunk_list = chunks.read_all()?;
        let digest = chunks_digest(&chunk_list);
        if loaded.status.chunks_digest.as_deref() != Some(digest.as_str()) {
            return Err(AppError::new(
                codes::CONFIG_INDEX_DESYNC,
                "Chunk store changed since the index was built; rebuild the index",
            )
            .with_details(format!(
                "chunks={}; build_id={}",
                chunks.path().display(),
                loaded.status.build_id.as_deref().unwrap_or("-")
            )));
        }
        let texts = chunk_list
            .into_iter()
            .map(|c| (c.chunk_id, c.text))
            .collect();
        Self::new(loaded.index, loaded.metas, texts, loaded.status.build_id)
    }

    pub fn len(&self) -> usize {
        self.metas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.index.dims()
    }

    pub fn build_id(&self) -> Option<&str> {
        self.build_id.as_deref()
    }
}

/// The single read entry point: query text in, ranked evidence out.
///
/// The snapshot sits behind one handle; [`Retriever::swap`] replaces it whole,
/// and a query keeps the snapshot it started with.
pub struct Retriever {
    embedder: Arc<EmbedderAdapter>,
    current: RwLock<Arc<Snapshot>>,
}

impl Retriever {
    pub fn new(embedder: Arc<EmbedderAdapter>, snapshot: Snapshot) -> Self {
        Self {
            embedder,
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Install a rebuilt snapshot; returns the one it replaced.
    pub fn swap(&self, next: Snapshot) -> Arc<Snapshot> {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        let prev = std::mem::replace(&mut *guard, Arc::new(next));
        tracing::info!(
            previous = prev.build_id().unwrap_or("-"),
            current = guard.build_id().unwrap_or("-"),
            "swapped retrieval snapshot"
        );
        prev
    }

    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Evidence>, AppError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new(codes::INPUT_EMPTY_QUERY, "Query must not be empty"));
        }

        let snap = self.snapshot();
        let qv = self.embedder.embed_one(q)?;
        let hits = snap.index.search(&qv, top_k)?;

        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            let meta = snap.metas.get(hit.position).ok_or_else(|| {
                AppError::new(
                    codes::CONFIG_INDEX_DESYNC,
                    "Index returned a position with no metadata",
                )
                .with_details(format!("position={}; metas={}", hit.position, snap.metas.len()))
            })?;
            let (text, text_missing) = match snap.texts.get(&meta.chunk_id) {
                Some(t) => (t.clone(), false),
                None => {
                    tracing::warn!(
                        chunk_id = %meta.chunk_id,
                        position = hit.position,
                        "chunk text missing from store; returning empty evidence text"
                    );
                    (String::new(), true)
                }
            };
            out.push(Evidence {
                source: meta.source.clone(),
                page: meta.page,
                chunk_id: meta.chunk_id.clone(),
                text,
                distance: hit.distance,
                text_missing,
            });
        }
        tracing::debug!(query = q, top_k, hits = out.len(), "retrieved evidence");
        Ok(out)
    }
}
