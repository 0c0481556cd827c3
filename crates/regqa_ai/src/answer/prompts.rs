use crate::guardrails::{AnswerSection, REFUSAL_PHRASE};

pub fn system_prompt() -> String {
    // Keep the contract explicit:
    // - Use ONLY evidence provided.
    // - Cite as [source p.X] using tags that appear in the evidence.
    // - Refuse with the fixed phrase when the evidence is insufficient.
    format!(
        r#"You are a regulatory and credit-risk (IFRS 9) assistant for banks.

Strict compliance rules:
- Use ONLY the provided evidence. Do not use external knowledge.
- If evidence is insufficient, say exactly: "{refusal}"
- Every key claim must have a citation like [source p.X].
- Cite ONLY the [source p.X] tags shown in the evidence. Do NOT invent sources, page numbers or paragraph numbers.

Answer format (follow exactly):
1) {s1} (1-2 sentences)
2) {s2} (bullets)
3) {s3} (e.g. Stage 1 vs Stage 2 vs Stage 3) - only if supported by evidence
4) {s4} (if any)
"#,
        refusal = REFUSAL_PHRASE,
        s1 = AnswerSection::Definition.heading(),
        s2 = AnswerSection::Criteria.heading(),
        s3 = AnswerSection::Classification.heading(),
        s4 = AnswerSection::MissingEvidence.heading(),
    )
}

pub fn user_prompt(query: &str, evidence_block: &str) -> String {
    format!(
        r#"Question:
{query}

Evidence:
{evidence_block}

Task:
Answer ONLY using the evidence. Add citations [source p.X] for key claims.
If evidence is insufficient, say "{REFUSAL_PHRASE}" and list what is missing.
"#
    )
}
