pub mod types;
pub mod prompt;
pub mod parser;
pub mod gemini;
pub mod orchestrator;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use gemini::*;
pub use orchestrator::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Model API is not reachable at {0}")]
    Connection(String),

    #[error("Model API request timed out after {0}s")]
    Timeout(u64),

    #[error("Model API returned error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl AssessmentError {
    /// Transport failures worth a second attempt. Upstream rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}
