use regqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use crate::evidence::{build_evidence_block, Evidence};
use crate::guardrails::{
    extract_citation_tags, is_refusal, missing_sections, AnswerSection, CitationTag, REFUSAL_PHRASE,
};
use crate::llm::Llm;
use crate::retrieve::Retriever;

pub mod prompts;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
    pub top_k: usize,
    pub evidence_char_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub query: String,
    pub answer: String,
    /// Evidence in retrieval order with full chunk text. The prompt carries each
    /// text truncated to `evidence_char_cap`.
    pub evidence: Vec<Evidence>,
    /// The answer is the refusal phrase; a valid outcome, not an error.
    pub refused: bool,
    pub citations: Vec<CitationTag>,
    pub missing_sections: Vec<AnswerSection>,
}

/// The full prompt pair handed to the model for `query` and its evidence.
pub fn build_prompts(query: &str, evidence: &[Evidence], cap: usize) -> (String, String) {
    let block = build_evidence_block(evidence, cap);
    (prompts::system_prompt(), prompts::user_prompt(query, &block))
}

/// Retrieve, assemble the bounded evidence block, and ask the model to answer from it.
///
/// With no evidence at all the refusal is returned without calling the model.
/// Remote failures propagate; no partial answer is produced.
pub fn answer_question(
    retriever: &Retriever,
    llm: &dyn Llm,
    req: AnswerRequest,
) -> Result<GroundedAnswer, AppError> {
    let evidence = retriever.retrieve(&req.query, req.top_k)?;
    if evidence.is_empty() {
        tracing::info!(query = %req.query, "no evidence retrieved; refusing");
        return Ok(GroundedAnswer {
            query: req.query,
            answer: REFUSAL_PHRASE.to_string(),
            evidence,
            refused: true,
            citations: Vec::new(),
            missing_sections: Vec::new(),
        });
    }

    let (system, user) = build_prompts(&req.query, &evidence, req.evidence_char_cap);
    let answer = llm.generate(&system, &user)?;

    let refused = is_refusal(&answer);
    let citations = extract_citation_tags(&answer);
    let missing = if refused {
        Vec::new()
    } else {
        missing_sections(&answer)
    };
    if !missing.is_empty() {
        tracing::warn!(query = %req.query, missing = ?missing, "answer is missing required sections");
    }
    tracing::info!(
        query = %req.query,
        evidence = evidence.len(),
        citations = citations.len(),
        refused,
        "generated grounded answer"
    );

    Ok(GroundedAnswer {
        query: req.query,
        answer,
        evidence,
        refused,
        citations,
        missing_sections: missing,
    })
}
