use std::fmt;

use serde::{Deserialize, Serialize};

use super::AssessmentError;

/// Placeholder for any scalar field the model did not supply.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Structured triage assessment parsed from the model's free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub triage_priority: String,
    pub appointment_type: String,
    pub visual_field_test: String,
    pub clinical_findings: Vec<String>,
    pub reasoning: String,
}

impl Default for AssessmentRecord {
    fn default() -> Self {
        Self {
            triage_priority: NOT_SPECIFIED.into(),
            appointment_type: NOT_SPECIFIED.into(),
            visual_field_test: NOT_SPECIFIED.into(),
            clinical_findings: Vec::new(),
            reasoning: NOT_SPECIFIED.into(),
        }
    }
}

impl AssessmentRecord {
    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_urgent(&self) -> bool {
        self.triage_priority.eq_ignore_ascii_case("urgent")
    }
}

/// Renders the record in the same numbered layout the model is asked to produce.
impl fmt::Display for AssessmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "1. Triage Priority: {}", self.triage_priority)?;
        writeln!(f, "2. Appointment Type: {}", self.appointment_type)?;
        writeln!(f, "3. Visual Field Test Requirement: {}", self.visual_field_test)?;
        writeln!(f, "4. Key Clinical Findings:")?;
        for finding in &self.clinical_findings {
            writeln!(f, "   - {finding}")?;
        }
        write!(f, "5. Reasoning: {}", self.reasoning)
    }
}

/// A validated upload ready to be forwarded to the model.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Raw model output alongside its parsed form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentOutcome {
    pub analysis: String,
    pub assessment: AssessmentRecord,
}

/// Text-generation backend that reads a referral document.
pub trait LlmClient: Send + Sync {
    fn generate(
        &self,
        system: &str,
        document: &UploadedDocument,
    ) -> Result<String, AssessmentError>;

    /// Short label for logs and the health endpoint.
    fn name(&self) -> &str;
}
