//! Shared handler state and wire types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assessment::{AssessmentRecord, LlmClient};
use crate::upload::DEFAULT_MAX_UPLOAD_BYTES;

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    pub client: Arc<dyn LlmClient>,
    pub max_upload_bytes: usize,
}

impl ApiContext {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Successful `POST /analyze` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis_id: String,
    /// Model output exactly as received.
    pub analysis: String,
    pub assessment: AssessmentRecord,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub client: String,
}
