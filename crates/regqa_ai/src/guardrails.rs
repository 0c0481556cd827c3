//! Checks for the grounded-answer contract.
//!
//! These inspect a generated answer (refusal, citation tags, section structure)
//! for logging and automated grading. Answers are never rejected on their basis.

use serde::{Deserialize, Serialize};

/// The fixed phrase the model must emit when the evidence cannot support an answer.
pub const REFUSAL_PHRASE: &str = "Insufficient evidence in the provided documents.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSection {
    Definition,
    Criteria,
    Classification,
    MissingEvidence,
}

impl AnswerSection {
    pub const ALL: [AnswerSection; 4] = [
        AnswerSection::Definition,
        AnswerSection::Criteria,
        AnswerSection::Classification,
        AnswerSection::MissingEvidence,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            AnswerSection::Definition => "Direct definition",
            AnswerSection::Criteria => "Practical assessment criteria",
            AnswerSection::Classification => "Classification implication",
            AnswerSection::MissingEvidence => "What evidence is missing",
        }
    }
}

/// A `[source p.N]` citation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CitationTag {
    pub source: String,
    pub page: u32,
}

/// Every well-formed `[source p.N]` tag in `text`, first occurrence order, no repeats.
pub fn extract_citation_tags(text: &str) -> Vec<CitationTag> {
    let mut out: Vec<CitationTag> = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            break;
        };
        let inner = &after[..close];
        if let Some(tag) = parse_tag(inner) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        rest = &after[close + 1..];
    }
    out
}

fn parse_tag(inner: &str) -> Option<CitationTag> {
    // A nested '[' means the real tag starts later.
    if inner.contains('[') {
        return parse_tag(&inner[inner.rfind('[')? + 1..]);
    }
    let (source, page) = inner.rsplit_once(" p.")?;
    let source = source.trim();
    if source.is_empty() || page.is_empty() || !page.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(CitationTag {
        source: source.to_string(),
        page: page.parse().ok()?,
    })
}

/// A refusal carries the fixed phrase and cites nothing.
pub fn is_refusal(answer: &str) -> bool {
    answer.contains(REFUSAL_PHRASE) && extract_citation_tags(answer).is_empty()
}

/// Sections of the four-part structure whose heading does not appear in `answer`.
pub fn missing_sections(answer: &str) -> Vec<AnswerSection> {
    let lower = answer.to_lowercase();
    AnswerSection::ALL
        .into_iter()
        .filter(|s| !lower.contains(&s.heading().to_lowercase()))
        .collect()
}
