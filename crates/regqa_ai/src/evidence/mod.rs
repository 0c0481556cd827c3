pub mod block;
pub mod chunking;
pub mod index;
pub mod model;
pub mod store;

pub use block::{build_evidence_block, CONTINUATION_MARKER, DEFAULT_EVIDENCE_CHAR_CAP};
pub use chunking::{chunk_page, chunk_text};
pub use index::{IndexBuildInput, IndexStatus, IndexStore, LoadedIndex};
pub use model::{Chunk, ChunkBuildSummary, Evidence, IndexMeta, PageRecord};
pub use store::ChunkStore;
