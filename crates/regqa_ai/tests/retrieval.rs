mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{build_corpus, keyword_adapter, keyword_vector, page, sample_pages};
use regqa_ai::evidence::IndexMeta;
use regqa_ai::retrieve::flat::FlatIndex;
use regqa_ai::retrieve::{Retriever, Snapshot};
use regqa_core::error::codes;
use tempfile::tempdir;

#[test]
fn sicr_query_finds_the_ifrs9_page() {
    let dir = tempdir().unwrap();
    let embedder = keyword_adapter();
    let pages = vec![page(
        "IFRS9.pdf",
        1,
        "A significant increase in credit risk (SICR) triggers Stage 2 classification.",
    )];
    let (chunks, index, _) = build_corpus(dir.path(), &pages, &embedder);

    let retriever = Retriever::new(embedder, Snapshot::load(&index, &chunks).unwrap());
    let evidence = retriever.retrieve("What is SICR?", 3).unwrap();

    assert!(!evidence.is_empty());
    assert_eq!(evidence[0].source, "IFRS9.pdf");
    assert_eq!(evidence[0].page, 1);
    assert!(evidence[0].text.contains("significant increase in credit risk"));
    assert!(!evidence[0].text_missing);
}

#[test]
fn ranks_by_distance_and_is_deterministic() {
    let dir = tempdir().unwrap();
    let embedder = keyword_adapter();
    let (chunks, index, _) = build_corpus(dir.path(), &sample_pages(), &embedder);
    let retriever = Retriever::new(embedder, Snapshot::load(&index, &chunks).unwrap());

    let first = retriever.retrieve("What is SICR?", 4).unwrap();
    let second = retriever.retrieve("What is SICR?", 4).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.len(), 4);
    assert_eq!(first[0].chunk_id, "IFRS9.pdf::p1::c0");
    assert!(first.windows(2).all(|w| w[0].distance <= w[1].distance));

    // The remaining pages are equidistant; ties keep build order.
    let rest: Vec<&str> = first[1..].iter().map(|e| e.chunk_id.as_str()).collect();
    assert_eq!(
        rest,
        vec!["IFRS9.pdf::p2::c0", "IFRS16.pdf::p1::c0", "IFRS15.pdf::p7::c0"]
    );
}

#[test]
fn top_k_bounds_results() {
    let dir = tempdir().unwrap();
    let embedder = keyword_adapter();
    let (chunks, index, _) = build_corpus(dir.path(), &sample_pages(), &embedder);
    let retriever = Retriever::new(embedder, Snapshot::load(&index, &chunks).unwrap());

    assert_eq!(retriever.retrieve("lease liability", 2).unwrap().len(), 2);
    assert_eq!(retriever.retrieve("lease liability", 50).unwrap().len(), 4);
    assert!(retriever.retrieve("lease liability", 0).unwrap().is_empty());
    assert_eq!(
        retriever.retrieve("lease liability", 1).unwrap()[0].source,
        "IFRS16.pdf"
    );
}

#[test]
fn zero_top_k_does_not_touch_the_embedder() {
    let dir = tempdir().unwrap();
    let counter = Arc::new(common::KeywordEmbedder::new());
    let adapter = Arc::new(regqa_ai::embeddings::EmbedderAdapter::new(
        Box::new(common::CountingKeywordEmbedder(counter.clone())),
        "keywords",
    ));
    let (chunks, index, _) = build_corpus(dir.path(), &sample_pages(), &adapter);
    let retriever = Retriever::new(adapter, Snapshot::load(&index, &chunks).unwrap());

    let before = counter.calls.load(std::sync::atomic::Ordering::SeqCst);
    assert!(retriever.retrieve("What is SICR?", 0).unwrap().is_empty());
    assert_eq!(counter.calls.load(std::sync::atomic::Ordering::SeqCst), before);
}

#[test]
fn missing_chunk_text_degrades_to_flagged_empty_evidence() {
    let embedder = keyword_adapter();
    let texts = vec![
        "credit risk stage".to_string(),
        "lease liability".to_string(),
    ];
    let vectors: Vec<Vec<f32>> = texts.iter().map(|t| keyword_vector(t)).collect();
    let metas = vec![
        IndexMeta {
            source: "IFRS9.pdf".to_string(),
            page: 5,
            chunk_id: "IFRS9.pdf::p5::c0".to_string(),
        },
        IndexMeta {
            source: "IFRS16.pdf".to_string(),
            page: 2,
            chunk_id: "IFRS16.pdf::p2::c0".to_string(),
        },
    ];
    // Only the second chunk has text in the store.
    let mut store = HashMap::new();
    store.insert("IFRS16.pdf::p2::c0".to_string(), texts[1].clone());

    let snap = Snapshot::new(
        FlatIndex::build(vectors[0].len(), &vectors).unwrap(),
        metas,
        store,
        None,
    )
    .unwrap();
    let retriever = Retriever::new(embedder, snap);

    let evidence = retriever.retrieve("credit risk", 2).unwrap();
    assert_eq!(evidence.len(), 2);
    assert_eq!(evidence[0].chunk_id, "IFRS9.pdf::p5::c0");
    assert_eq!(evidence[0].text, "");
    assert!(evidence[0].text_missing);
    assert_eq!(evidence[1].text, "lease liability");
    assert!(!evidence[1].text_missing);
}

#[test]
fn snapshot_rejects_mismatched_pair() {
    let vectors = vec![keyword_vector("credit"), keyword_vector("lease")];
    let err = Snapshot::new(
        FlatIndex::build(vectors[0].len(), &vectors).unwrap(),
        Vec::new(),
        HashMap::new(),
        None,
    )
    .err()
    .expect("length mismatch must fail");
    assert_eq!(err.code, codes::CONFIG_INDEX_DESYNC);
    assert!(err.is_configuration());
}

#[test]
fn blank_query_is_rejected() {
    let dir = tempdir().unwrap();
    let embedder = keyword_adapter();
    let (chunks, index, _) = build_corpus(dir.path(), &sample_pages(), &embedder);
    let retriever = Retriever::new(embedder, Snapshot::load(&index, &chunks).unwrap());
    let err = retriever.retrieve("   ", 3).unwrap_err();
    assert_eq!(err.code, codes::INPUT_EMPTY_QUERY);
}

#[test]
fn swap_replaces_the_whole_snapshot() {
    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();
    let embedder = keyword_adapter();
    let (chunks_a, index_a, _) = build_corpus(dir_a.path(), &sample_pages(), &embedder);
    let (chunks_b, index_b, status_b) = build_corpus(
        dir_b.path(),
        &[page("IFRS16.pdf", 9, "The lessee measures the lease liability.")],
        &embedder,
    );

    let retriever = Retriever::new(embedder, Snapshot::load(&index_a, &chunks_a).unwrap());
    let held = retriever.snapshot();
    assert_eq!(held.len(), 4);

    let prev = retriever.swap(Snapshot::load(&index_b, &chunks_b).unwrap());
    assert_eq!(prev.len(), 4);
    // A reader holding the old handle still sees a complete old snapshot.
    assert_eq!(held.len(), 4);

    let now = retriever.snapshot();
    assert_eq!(now.len(), 1);
    assert_eq!(now.build_id(), status_b.build_id.as_deref());
    let ev = retriever.retrieve("What is SICR?", 3).unwrap();
    assert_eq!(ev.len(), 1);
    assert_eq!(ev[0].page, 9);
}

#[test]
fn concurrent_queries_see_one_snapshot_or_the_other() {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();
    let embedder = keyword_adapter();
    let (chunks_a, index_a, _) = build_corpus(dir_a.path(), &sample_pages(), &embedder);
    let (chunks_b, index_b, _) = build_corpus(
        dir_b.path(),
        &[page("IFRS16.pdf", 9, "The lessee measures the lease liability.")],
        &embedder,
    );

    let expected_a: Vec<String> = vec![
        "IFRS9.pdf::p1::c0".to_string(),
        "IFRS9.pdf::p2::c0".to_string(),
        "IFRS16.pdf::p1::c0".to_string(),
        "IFRS15.pdf::p7::c0".to_string(),
    ];
    let expected_b: Vec<String> = vec!["IFRS16.pdf::p9::c0".to_string()];

    let retriever = Retriever::new(embedder, Snapshot::load(&index_a, &chunks_a).unwrap());
    let stop = AtomicBool::new(false);
    let seen_a = AtomicUsize::new(0);
    let seen_b = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while !stop.load(Ordering::SeqCst) {
                    let ev = retriever.retrieve("What is SICR?", 10).unwrap();
                    let ids: Vec<String> = ev.iter().map(|e| e.chunk_id.clone()).collect();
                    if ids == expected_a {
                        assert!(ev.iter().all(|e| !e.text_missing));
                        seen_a.fetch_add(1, Ordering::SeqCst);
                    } else if ids == expected_b {
                        assert_eq!(ev[0].text, "The lessee measures the lease liability.");
                        seen_b.fetch_add(1, Ordering::SeqCst);
                    } else {
                        panic!("mixed snapshot: {ids:?}");
                    }
                }
            });
        }

        for i in 0..200 {
            let next = if i % 2 == 0 {
                Snapshot::load(&index_b, &chunks_b).unwrap()
            } else {
                Snapshot::load(&index_a, &chunks_a).unwrap()
            };
            retriever.swap(next);
        }
        // Give readers time to run against the final snapshot too.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while seen_a.load(Ordering::SeqCst) + seen_b.load(Ordering::SeqCst) < 8
            && std::time::Instant::now() < deadline
        {
            std::thread::yield_now();
        }
        stop.store(true, Ordering::SeqCst);
    });

    assert!(seen_a.load(Ordering::SeqCst) + seen_b.load(Ordering::SeqCst) >= 8);
    assert_eq!(retriever.snapshot().len(), 4);
}
