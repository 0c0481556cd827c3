use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::PageRecord;
use crate::error::{codes, AppError};
use crate::io::read_jsonl;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLoad {
    pub pages: Vec<PageRecord>,
    pub dropped: usize,
}

/// Collapse every whitespace run to a single space, as the extractor does.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Noise filter: keep pages with at least `min_chars` characters of normalized text.
pub fn filter_pages(pages: Vec<PageRecord>, min_chars: usize) -> Result<PageLoad, AppError> {
    let mut kept = Vec::with_capacity(pages.len());
    let mut dropped = 0usize;
    for mut p in pages {
        if p.page < 1 {
            return Err(AppError::new(
                codes::DATA_INVALID_PAGE,
                "Page numbers are 1-based",
            )
            .with_details(format!("source={}; page={}", p.source, p.page)));
        }
        p.text = normalize_whitespace(&p.text);
        if p.text.chars().count() < min_chars {
            dropped += 1;
            continue;
        }
        kept.push(p);
    }
    Ok(PageLoad {
        pages: kept,
        dropped,
    })
}

/// Read `pages.jsonl` and apply the noise filter.
pub fn read_pages(path: &Path, min_chars: usize) -> Result<PageLoad, AppError> {
    let raw: Vec<PageRecord> = read_jsonl(path)?;
    let total = raw.len();
    let load = filter_pages(raw, min_chars)?;
    tracing::info!(
        path = %path.display(),
        total,
        kept = load.pages.len(),
        dropped = load.dropped,
        "loaded page records"
    );
    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(page: u32, text: &str) -> PageRecord {
        PageRecord {
            source: "IFRS9.pdf".to_string(),
            page,
            text: text.to_string(),
        }
    }

    #[test]
    fn drops_short_pages_and_normalizes_whitespace() {
        let load = filter_pages(
            vec![
                page(1, "Stage  2\n\tclassification applies when credit risk rises."),
                page(2, "  12  "),
            ],
            30,
        )
        .unwrap();
        assert_eq!(load.dropped, 1);
        assert_eq!(
            load.pages,
            vec![page(1, "Stage 2 classification applies when credit risk rises.")]
        );
    }

    #[test]
    fn rejects_zero_page_number() {
        let err = filter_pages(vec![page(0, "x".repeat(40).as_str())], 30).unwrap_err();
        assert_eq!(err.code, codes::DATA_INVALID_PAGE);
    }
}
