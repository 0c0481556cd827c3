use super::model::Evidence;

pub const DEFAULT_EVIDENCE_CHAR_CAP: usize = 1400;
pub const CONTINUATION_MARKER: &str = " ...";

/// Trim and cap `text` at `cap` characters, appending the continuation marker when cut.
pub fn truncate_with_marker(text: &str, cap: usize) -> String {
    let t = text.trim();
    match t.char_indices().nth(cap) {
        None => t.to_string(),
        Some((byte_end, _)) => {
            let mut s = t[..byte_end].to_string();
            s.push_str(CONTINUATION_MARKER);
            s
        }
    }
}

/// Render ranked evidence as labelled, citation-tagged blocks in input order.
///
/// ```text
/// Evidence 1: [IFRS9.pdf p.12]
/// <text, at most `cap` chars>
/// ```
pub fn build_evidence_block(evidence: &[Evidence], cap: usize) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, ev)| {
            format!(
                "Evidence {}: {}\n{}",
                i + 1,
                ev.citation_tag(),
                truncate_with_marker(&ev.text, cap)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
