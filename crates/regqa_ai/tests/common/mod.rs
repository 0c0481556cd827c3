#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use regqa_ai::embeddings::{Embedder, EmbedderAdapter};
use regqa_ai::evidence::{ChunkStore, IndexBuildInput, IndexStatus, IndexStore, PageRecord};
use regqa_core::error::AppError;

pub const VOCAB: [&str; 10] = [
    "sicr",
    "credit",
    "risk",
    "stage",
    "lease",
    "lessee",
    "asset",
    "liability",
    "impairment",
    "revenue",
];

/// Unit-normalised keyword counts over [`VOCAB`].
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; VOCAB.len()];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        if let Some(i) = VOCAB.iter().position(|w| *w == token) {
            v[i] += 1.0;
        }
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    v
}

impl Embedder for KeywordEmbedder {
    fn embed(&self, _model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|s| keyword_vector(s)).collect())
    }
}

/// Shares one call counter with the test body.
pub struct CountingKeywordEmbedder(pub Arc<KeywordEmbedder>);

impl Embedder for CountingKeywordEmbedder {
    fn embed(&self, model: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        self.0.embed(model, inputs)
    }
}

pub fn page(source: &str, page: u32, text: &str) -> PageRecord {
    PageRecord {
        source: source.to_string(),
        page,
        text: text.to_string(),
    }
}

pub fn sample_pages() -> Vec<PageRecord> {
    vec![
        page(
            "IFRS9.pdf",
            1,
            "A significant increase in credit risk (SICR) triggers Stage 2 classification.",
        ),
        page(
            "IFRS9.pdf",
            2,
            "Impairment requirements apply to financial assets measured at amortised cost.",
        ),
        page(
            "IFRS16.pdf",
            1,
            "A lessee shall recognise a right-of-use asset and a lease liability at commencement.",
        ),
        page(
            "IFRS15.pdf",
            7,
            "Revenue is recognised when control of goods transfers to the customer.",
        ),
    ]
}

pub fn keyword_adapter() -> Arc<EmbedderAdapter> {
    Arc::new(EmbedderAdapter::new(Box::new(KeywordEmbedder::new()), "keywords"))
}

pub fn build_input() -> IndexBuildInput {
    IndexBuildInput {
        batch_size: 2,
        workers: 2,
        built_at: "2026-02-10T00:00:00Z".to_string(),
    }
}

/// Chunk `pages` and build the index under `root`.
pub fn build_corpus(
    root: &Path,
    pages: &[PageRecord],
    embedder: &EmbedderAdapter,
) -> (ChunkStore, IndexStore, IndexStatus) {
    let chunks = ChunkStore::open(root.join("chunks.jsonl"));
    chunks
        .build_from_pages(pages, 1200, 200)
        .expect("build chunks");
    let index = IndexStore::open(root.join("index"));
    let status = index
        .build(&chunks, embedder, build_input())
        .expect("build index");
    (chunks, index, status)
}
