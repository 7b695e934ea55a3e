use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::assessment::{
    AssessmentError, GeminiClient, LlmClient, MockLlmClient, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GEMINI_MODEL,
};
use crate::upload::DEFAULT_MAX_UPLOAD_BYTES;

/// Application-level constants
pub const APP_NAME: &str = "Referral Triage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "referral_triage_lib=info,referral_triage=info,tower_http=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which text-generation backend serves `/analyze`.
#[derive(Clone, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini {
        api_key: String,
        model: String,
        base_url: String,
        timeout_secs: u64,
    },
    /// Canned sample analysis, no network access.
    Mock,
}

impl fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini {
                model,
                base_url,
                timeout_secs,
                ..
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"<redacted>")
                .field("model", model)
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
            Self::Mock => f.write_str("Mock"),
        }
    }
}

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub backend: LlmBackend,
    pub max_upload_bytes: usize,
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            backend: LlmBackend::Mock,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: None,
        }
    }
}

impl Config {
    /// Load from the process environment, honouring a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let host = match get("HOST") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "HOST",
                value: v,
            })?,
            None => defaults.host,
        };
        let port = parse_or("PORT", get("PORT"), defaults.port)?;
        let max_upload_mb: usize = parse_or(
            "TRIAGE_MAX_UPLOAD_MB",
            get("TRIAGE_MAX_UPLOAD_MB"),
            defaults.max_upload_bytes / (1024 * 1024),
        )?;

        let mock = get("TRIAGE_MOCK_ANALYSIS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let backend = if mock {
            LlmBackend::Mock
        } else {
            LlmBackend::Gemini {
                api_key: get("GEMINI_API_KEY").ok_or(ConfigError::MissingApiKey)?,
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
                timeout_secs: parse_or(
                    "GEMINI_TIMEOUT_SECS",
                    get("GEMINI_TIMEOUT_SECS"),
                    DEFAULT_TIMEOUT_SECS,
                )?,
            }
        };

        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "TRIAGE_MAX_UPLOAD_MB",
                value: max_upload_mb.to_string(),
            })?;

        Ok(Self {
            host,
            port,
            backend,
            max_upload_bytes,
            static_dir: get("TRIAGE_STATIC_DIR").map(PathBuf::from),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Construct the configured model client.
    pub fn build_client(&self) -> Result<Arc<dyn LlmClient>, AssessmentError> {
        match &self.backend {
            LlmBackend::Gemini {
                api_key,
                model,
                base_url,
                timeout_secs,
            } => Ok(Arc::new(GeminiClient::new(
                base_url,
                model,
                api_key,
                *timeout_secs,
            )?)),
            LlmBackend::Mock => Ok(Arc::new(MockLlmClient::sample())),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
        None => Ok(default),
    }
}
