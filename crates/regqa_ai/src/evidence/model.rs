use serde::{Deserialize, Serialize};

pub use regqa_core::domain::{Chunk, IndexMeta, PageRecord};

/// One retrieved chunk plus provenance. Built per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub source: String,
    pub page: u32,
    pub chunk_id: String,
    pub text: String,
    /// Squared L2 distance to the query vector.
    pub distance: f32,
    /// Set when the chunk store had no text for `chunk_id`; `text` is empty then.
    #[serde(default)]
    pub text_missing: bool,
}

impl Evidence {
    /// The `[source p.N]` tag used in evidence blocks and answer citations.
    pub fn citation_tag(&self) -> String {
        format!("[{} p.{}]", self.source, self.page)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkBuildSummary {
    pub pages: usize,
    pub chunks: usize,
}
