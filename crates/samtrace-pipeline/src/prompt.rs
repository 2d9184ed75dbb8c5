//! Oracle prompt assembly for the four extraction kinds
//!
//! The oracle holds the document text; these prompts carry the task, the
//! identifiers, and the exact output schema. Keeping the schema in the
//! prompt is what lets the parser reject anything off-vocabulary instead of
//! guessing.

use samtrace_domain::{CaseDocument, ClaimOrigin};

/// Prompt for a `claim_origin` extraction over one document.
pub(crate) fn origin_prompt(document: &CaseDocument) -> String {
    let mut prompt = String::new();

    prompt.push_str(ORIGIN_INSTRUCTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "Document: {} (id {}, acquired {})\n",
        document.filename, document.id, document.acquired_at
    ));
    if let Some(institution) = &document.institution {
        prompt.push_str(&format!("Producing institution: {}\n", institution));
    }
    prompt.push('\n');
    prompt.push_str(ORIGIN_FORMAT_REMINDER);

    prompt
}

/// Prompt for a `propagation` extraction over one ordered document pair.
pub(crate) fn propagation_prompt(
    source: &CaseDocument,
    target: &CaseDocument,
    claims: &[&ClaimOrigin],
) -> String {
    let mut prompt = String::new();

    prompt.push_str(PROPAGATION_INSTRUCTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "Source document: {} (id {}, acquired {})\n",
        source.filename, source.id, source.acquired_at
    ));
    prompt.push_str(&format!(
        "Target document: {} (id {}, acquired {})\n\n",
        target.filename, target.id, target.acquired_at
    ));

    prompt.push_str("Claims anchored in this case:\n");
    for claim in claims {
        prompt.push_str(&format!("- {}\n", claim.claim_text));
    }
    prompt.push('\n');
    prompt.push_str(PROPAGATION_FORMAT_REMINDER);

    prompt
}

/// Prompt for an `authority` extraction over one document.
pub(crate) fn authority_prompt(document: &CaseDocument, claims: &[&ClaimOrigin]) -> String {
    let mut prompt = String::new();

    prompt.push_str(AUTHORITY_INSTRUCTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "Document: {} (id {}, acquired {})\n",
        document.filename, document.id, document.acquired_at
    ));
    if let Some(institution) = &document.institution {
        prompt.push_str(&format!("Producing institution: {}\n", institution));
    }
    prompt.push('\n');

    prompt.push_str("Claims anchored in this case:\n");
    for claim in claims {
        prompt.push_str(&format!("- {}\n", claim.claim_text));
    }
    prompt.push('\n');
    prompt.push_str(AUTHORITY_FORMAT_REMINDER);

    prompt
}

/// Prompt for an `outcome` extraction over one case.
pub(crate) fn outcome_prompt(case_id: &str, documents: &[CaseDocument]) -> String {
    let mut prompt = String::new();

    prompt.push_str(OUTCOME_INSTRUCTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(&format!("Case: {}\n", case_id));
    prompt.push_str("Documents in acquisition order:\n");
    for document in documents {
        prompt.push_str(&format!(
            "- {} (id {}, acquired {})\n",
            document.filename, document.id, document.acquired_at
        ));
    }
    prompt.push('\n');
    prompt.push_str(OUTCOME_FORMAT_REMINDER);

    prompt
}

const ORIGIN_INSTRUCTIONS: &str = r#"Identify every discrete factual claim asserted in the document below.
For each claim report how it entered the record and whether the document
itself or other case material contradicts it.

Rules:
- One claim per item, stated as a single declarative sentence
- origin_type must be one of: primary_source, professional_opinion,
  hearsay, speculation, misattribution, fabrication
- Set is_false_premise true only when a documented contradiction exists,
  and cite it in contradicting_evidence
- false_premise_type must be one of: factual_error, misattribution,
  speculation_as_fact, context_stripping, selective_quotation,
  temporal_distortion
- Set factually_wrong true when the underlying assertion is wrong, not
  merely quoted out of context
- confidence_score reflects extraction confidence, 0.0 to 1.0
- Report the in-document date of the claim as origin_date (YYYY-MM-DD)
  and the page it first appears on, when visible"#;

const ORIGIN_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {
    "claim_text": "single declarative sentence",
    "origin_type": "hearsay",
    "confidence_score": 0.8,
    "origin_date": "2024-01-10",
    "page": 3,
    "is_false_premise": false,
    "false_premise_type": null,
    "factually_wrong": false,
    "contradicting_evidence": null
  }
]

Return ONLY valid JSON, no markdown code blocks, no explanations."#;

const PROPAGATION_INSTRUCTIONS: &str = r#"Compare the two documents below. For each anchored claim that appears in
the TARGET document, report how it relates to the SOURCE document's
rendition of the same claim.

Rules:
- Report one item per claim that appears in the target document
- explicit_citation is true only when the target attributes the claim to
  the source document
- target_cites names the document id the target credits as its source,
  when it credits one other than the source document
- relation_hint, when you can tell, is one of: implicit_adoption,
  authority_appeal
- source_excerpt and target_excerpt quote each document's rendition of
  the claim, verbatim
- source_date and target_date are the authorship dates stated inside each
  document (YYYY-MM-DD), not acquisition dates
- verification_performed is true only when the target's author
  re-examined the underlying evidence, never merely because the claim is
  repeated; report what they concluded in verification_outcome"#;

const PROPAGATION_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {
    "claim_text": "the anchored claim",
    "relation_hint": null,
    "explicit_citation": false,
    "target_cites": null,
    "source_excerpt": "exact words from the source",
    "target_excerpt": "exact words from the target",
    "source_date": "2024-01-10",
    "target_date": "2024-02-15",
    "verification_performed": false,
    "verification_outcome": null
  }
]

Return ONLY valid JSON, no markdown code blocks, no explanations."#;

const AUTHORITY_INSTRUCTIONS: &str = r#"Identify every place the document below invokes one of the anchored
claims with institutional weight.

Rules:
- authority_type must be one of: court_finding, expert_opinion,
  official_report, professional_assessment, police_conclusion,
  agency_determination
- endorsement_type, when you can tell, is one of: explicit_adoption,
  qualified_acceptance, implicit_reliance, referenced_without_verification
- independent_corroboration is true only when the document records
  evidence gathered independently of the claim's own chain
- authority_date is the date of the invocation (YYYY-MM-DD), when stated"#;

const AUTHORITY_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {
    "claim_text": "the anchored claim",
    "authority_type": "court_finding",
    "endorsement_type": "explicit_adoption",
    "authority_date": "2024-03-20",
    "independent_corroboration": false
  }
]

Return ONLY valid JSON, no markdown code blocks, no explanations."#;

const OUTCOME_INSTRUCTIONS: &str = r#"Identify every real-world consequence documented in this case: orders
made, findings entered, decisions taken, actions published.

Rules:
- outcome_type must be one of: court_order, finding_of_fact,
  recommendation, agency_decision, regulatory_action, media_publication
- supporting_documents lists the ids of the documents in which the
  consequence itself is recorded
- remediation_possible is false only when the consequence cannot be
  practically undone
- outcome_date is the date the consequence took effect (YYYY-MM-DD),
  when stated"#;

const OUTCOME_FORMAT_REMINDER: &str = r#"Output format (JSON array only, no additional text):
[
  {
    "description": "what happened, one sentence",
    "outcome_type": "court_order",
    "outcome_date": "2024-03-20",
    "supporting_documents": ["doc-id"],
    "remediation_possible": true,
    "harm_description": null
  }
]

Return ONLY valid JSON, no markdown code blocks, no explanations."#;
