//! Generative-text classifier backend
//!
//! Submits a constrained prompt to a generative-text endpoint and expects
//! strict JSON back. Models in the wild still wrap their output in code
//! fences despite being told not to, so the fences are stripped before
//! parsing; anything that then fails to parse is a malformed upstream
//! response, surfaced as such rather than guessed at.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{http_client, LlmAssessment, RawBackendResponse, ScamAdapter, UpstreamError};

#[derive(Debug, Clone)]
pub struct GenerativeConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

pub struct GenerativeClassifier {
    client: Client,
    config: GenerativeConfig,
}

impl GenerativeClassifier {
    pub fn new(config: GenerativeConfig) -> Self {
        let client = http_client(config.timeout_secs);
        Self { client, config }
    }

    fn prompt(text: &str) -> String {
        format!(
            "This is a financial message: \"{text}\". \
             Is this message potentially a financial scam? \
             Reply strictly in JSON format like: \
             {{\"result\":\"scam\" or \"safe\",\"explanation\":\"long reason\", \"risk score\": \"out of 10\"}}. \
             No code block, no markdown - only pure JSON."
        )
    }
}

#[async_trait]
impl ScamAdapter for GenerativeClassifier {
    fn name(&self) -> &str {
        "generative-text"
    }

    async fn evaluate(&self, input: &str) -> Result<RawBackendResponse, UpstreamError> {
        let url = format!("{}?key={}", self.config.endpoint, self.config.api_key);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::prompt(input),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "classifier returned HTTP {}",
                response.status()
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        let content = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| {
                UpstreamError::Malformed("no candidates in classifier response".to_string())
            })?;

        Ok(RawBackendResponse::Generative(parse_assessment(content)?))
    }
}

/// Strip accidental code-fence wrappers from model output.
fn strip_code_fences(content: &str) -> String {
    content.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse classifier output into a typed assessment. Strict: after fence
/// stripping the content must be exactly the requested JSON object.
pub(crate) fn parse_assessment(content: &str) -> Result<LlmAssessment, UpstreamError> {
    let cleaned = strip_code_fences(content);
    serde_json::from_str(&cleaned)
        .map_err(|e| UpstreamError::Malformed(format!("classifier returned invalid JSON: {e}")))
}
