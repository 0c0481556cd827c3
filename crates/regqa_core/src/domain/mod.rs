use serde::{Deserialize, Serialize};

/// One page of extracted document text, as produced by the extraction step.
///
/// `page` is 1-based. Records are immutable once read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRecord {
    pub source: String,
    pub page: u32,
    pub text: String,
}

/// A bounded slice of a page; the unit of indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: String,
    pub source: String,
    pub page: u32,
    pub text: String,
}

/// Provenance for one vector position. `metas[i]` always describes vector `i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexMeta {
    pub source: String,
    pub page: u32,
    pub chunk_id: String,
}

/// Build the stable identifier `source::p{page}::c{sequence}`.
pub fn chunk_id(source: &str, page: u32, sequence: usize) -> String {
    format!("{source}::p{page}::c{sequence}")
}

impl Chunk {
    pub fn meta(&self) -> IndexMeta {
        IndexMeta {
            source: self.source.clone(),
            page: self.page,
            chunk_id: self.chunk_id.clone(),
        }
    }
}
