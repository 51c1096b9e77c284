//! Reputation backend adapters
//!
//! One adapter per external signal source. Each adapter is a pure
//! input-to-raw-response transform: it never touches persistent state and
//! never sees the submitting user. Network I/O is the only side effect.

pub mod llm;
pub mod phone;
pub mod url;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use llm::{GenerativeClassifier, GenerativeConfig};
pub use phone::PhoneReputationClient;
pub use url::UrlReputationClient;

#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The remote service was unreachable, timed out, or returned a
    /// non-success status.
    #[error("upstream service unavailable: {0}")]
    Unavailable(String),

    /// The remote service responded, but the body could not be parsed
    /// into the expected shape.
    #[error("upstream response malformed: {0}")]
    Malformed(String),
}

/// Verdict fields from the generative-text classifier.
///
/// The classifier is prompted for strict JSON; `risk score` arrives as
/// either a bare number or a numeric string, so it is kept loose here and
/// coerced during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAssessment {
    pub result: crate::Classification,
    pub explanation: String,
    #[serde(rename = "risk score", default)]
    pub risk_score: Option<serde_json::Value>,
}

/// Raw fields from the URL reputation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlReputation {
    pub risk_score: f64,
    #[serde(default)]
    pub suspicious: bool,
    #[serde(default)]
    pub phishing: bool,
    #[serde(default)]
    pub malware: bool,
    #[serde(default, rename = "unsafe")]
    pub unsafe_site: bool,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub page_title: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Raw fields from the phone reputation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneReputation {
    pub fraud_score: f64,
    #[serde(default)]
    pub spammer: bool,
    #[serde(default)]
    pub recent_abuse: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub line_type: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub do_not_call: bool,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Backend response before normalization. The variant identifies which
/// backend family produced it.
#[derive(Debug, Clone)]
pub enum RawBackendResponse {
    Generative(LlmAssessment),
    UrlReputation(UrlReputation),
    PhoneReputation(PhoneReputation),
}

/// Common interface over every reputation backend.
#[async_trait]
pub trait ScamAdapter: Send + Sync {
    /// Short backend name, used in logs.
    fn name(&self) -> &str;

    /// Evaluate one payload against the backend.
    async fn evaluate(&self, input: &str) -> Result<RawBackendResponse, UpstreamError>;
}

/// Connection settings for the score-lookup reputation services.
#[derive(Debug, Clone)]
pub struct ReputationConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}
