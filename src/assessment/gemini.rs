use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::prompt::SAMPLE_ANALYSIS;
use super::types::{LlmClient, UploadedDocument};
use super::AssessmentError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, AssessmentError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AssessmentError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn map_send_error(&self, e: reqwest::Error) -> AssessmentError {
        if e.is_timeout() {
            AssessmentError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AssessmentError::Connection(self.base_url.clone())
        } else {
            AssessmentError::HttpClient(e.without_url().to_string())
        }
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Error envelope Google APIs return alongside non-2xx statuses.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorEnvelopeDetail>,
}

#[derive(Deserialize)]
struct ErrorEnvelopeDetail {
    message: Option<String>,
}

/// The instruction text goes first, the document travels inline as base64.
fn build_request<'a>(system: &'a str, document: &'a UploadedDocument) -> GenerateContentRequest<'a> {
    let data = base64::engine::general_purpose::STANDARD.encode(&document.bytes);
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: system },
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: &document.mime_type,
                        data,
                    },
                },
            ],
        }],
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, AssessmentError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            AssessmentError::MalformedResponse("no candidate text in response".into())
        })
}

fn upstream_error(status: u16, body: &str) -> AssessmentError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| format!("Gemini API Error: {status}"));
    AssessmentError::Upstream { status, message }
}

impl LlmClient for GeminiClient {
    fn generate(
        &self,
        system: &str,
        document: &UploadedDocument,
    ) -> Result<String, AssessmentError> {
        let body = build_request(system, document);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(upstream_error(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| AssessmentError::MalformedResponse(e.without_url().to_string()))?;

        extract_text(parsed)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

enum MockReply {
    Text(String),
    Upstream { status: u16, message: String },
    Unreachable,
}

/// Offline client. Returns a configured analysis without any network call.
pub struct MockLlmClient {
    reply: MockReply,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            reply: MockReply::Text(response.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock that answers with the built-in sample assessment.
    pub fn sample() -> Self {
        Self::new(SAMPLE_ANALYSIS)
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            reply: MockReply::Upstream {
                status,
                message: message.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reply: MockReply::Unreachable,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmClient for MockLlmClient {
    fn generate(
        &self,
        _system: &str,
        _document: &UploadedDocument,
    ) -> Result<String, AssessmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Upstream { status, message } => Err(AssessmentError::Upstream {
                status: *status,
                message: message.clone(),
            }),
            MockReply::Unreachable => Err(AssessmentError::Connection("mock".into())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
