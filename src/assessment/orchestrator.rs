use std::time::Instant;

use super::parser::parse_assessment;
use super::prompt::TRIAGE_SYSTEM_PROMPT;
use super::types::{AssessmentOutcome, LlmClient, UploadedDocument};
use super::AssessmentError;

/// Extra attempts after a transport failure (connect or timeout).
const MAX_LLM_RETRIES: usize = 1;

/// Run one referral through the model and parse the reply:
/// prompt → LLM → parse → outcome.
pub fn assess_document(
    client: &dyn LlmClient,
    document: &UploadedDocument,
) -> Result<AssessmentOutcome, AssessmentError> {
    if document.bytes.is_empty() {
        return Err(AssessmentError::EmptyDocument);
    }

    let start = Instant::now();
    let analysis = generate_with_retry(client, document)?;
    let assessment = parse_assessment(&analysis);

    if assessment.is_empty() {
        tracing::warn!(
            filename = %document.filename,
            response_len = analysis.len(),
            "Model response contained no recognised sections"
        );
    }

    tracing::info!(
        filename = %document.filename,
        client = client.name(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        triage = %assessment.triage_priority,
        urgent = assessment.is_urgent(),
        findings = assessment.clinical_findings.len(),
        "Referral assessed"
    );

    Ok(AssessmentOutcome {
        analysis,
        assessment,
    })
}

fn generate_with_retry(
    client: &dyn LlmClient,
    document: &UploadedDocument,
) -> Result<String, AssessmentError> {
    let mut attempt = 0;
    loop {
        match client.generate(TRIAGE_SYSTEM_PROMPT, document) {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() && attempt < MAX_LLM_RETRIES => {
                attempt += 1;
                tracing::warn!(attempt, error = %e, "LLM call failed, retrying");
            }
            Err(e) => return Err(e),
        }
    }
}
