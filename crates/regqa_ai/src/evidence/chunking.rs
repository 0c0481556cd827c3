use regqa_core::domain::{chunk_id, Chunk, PageRecord};
use regqa_core::error::{codes, AppError};

pub fn validate_chunking(size: usize, overlap: usize) -> Result<(), AppError> {
    if size == 0 || size <= overlap {
        return Err(AppError::new(
            codes::CONFIG_INVALID_CHUNKING,
            "Chunk size must be greater than overlap",
        )
        .with_details(format!("size={size}; overlap={overlap}")));
    }
    Ok(())
}

/// Split `text` into overlapping windows of at most `size` characters.
///
/// The window advances by `size - overlap`; each window is trimmed and empty
/// windows are skipped. The window that reaches the end of the text is the last one.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, AppError> {
    validate_chunking(size, overlap)?;
    let stride = size - overlap;

    // Byte offset of every char boundary, so windows never split a code point.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n = bounds.len() - 1;

    let mut out = Vec::new();
    let mut start = 0usize;
    while start < n {
        let end = (start + size).min(n);
        let window = text[bounds[start]..bounds[end]].trim();
        if !window.is_empty() {
            out.push(window.to_string());
        }
        if end == n {
            break;
        }
        start += stride;
    }
    Ok(out)
}

/// Chunk one page; sequence numbers count emitted chunks only.
pub fn chunk_page(page: &PageRecord, size: usize, overlap: usize) -> Result<Vec<Chunk>, AppError> {
    let pieces = chunk_text(&page.text, size, overlap)?;
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(seq, text)| Chunk {
            chunk_id: chunk_id(&page.source, page.page, seq),
            source: page.source.clone(),
            page: page.page,
            text,
        })
        .collect())
}
