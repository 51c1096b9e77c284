//! URL reputation backend
//!
//! IPQS-style lookup: GET `{base}/url/{key}/{encoded-url}`. The checked
//! URL travels as a single percent-encoded path segment.

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{http_client, RawBackendResponse, ReputationConfig, ScamAdapter, UpstreamError, UrlReputation};

pub struct UrlReputationClient {
    client: Client,
    config: ReputationConfig,
}

impl UrlReputationClient {
    pub fn new(config: ReputationConfig) -> Self {
        let client = http_client(config.timeout_secs);
        Self { client, config }
    }

    fn lookup_url(&self, input: &str) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| UpstreamError::Unavailable(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Unavailable("base url cannot carry a path".to_string()))?
            .extend(["url", &self.config.api_key, input]);
        Ok(url)
    }
}

#[async_trait]
impl ScamAdapter for UrlReputationClient {
    fn name(&self) -> &str {
        "url-reputation"
    }

    async fn evaluate(&self, input: &str) -> Result<RawBackendResponse, UpstreamError> {
        let url = self.lookup_url(input)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "url reputation service returned HTTP {}",
                response.status()
            )));
        }

        let reputation: UrlReputation = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        Ok(RawBackendResponse::UrlReputation(reputation))
    }
}
