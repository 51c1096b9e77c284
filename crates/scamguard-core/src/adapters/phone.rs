//! Phone reputation backend
//!
//! IPQS-style lookup: GET `{base}/phone/{key}/{encoded-number}`.

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{http_client, PhoneReputation, RawBackendResponse, ReputationConfig, ScamAdapter, UpstreamError};

pub struct PhoneReputationClient {
    client: Client,
    config: ReputationConfig,
}

impl PhoneReputationClient {
    pub fn new(config: ReputationConfig) -> Self {
        let client = http_client(config.timeout_secs);
        Self { client, config }
    }

    fn lookup_url(&self, input: &str) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| UpstreamError::Unavailable(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Unavailable("base url cannot carry a path".to_string()))?
            .extend(["phone", &self.config.api_key, input]);
        Ok(url)
    }
}

#[async_trait]
impl ScamAdapter for PhoneReputationClient {
    fn name(&self) -> &str {
        "phone-reputation"
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
                "phone reputation service returned HTTP {}",
                response.status()
            )));
        }

        let reputation: PhoneReputation = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        Ok(RawBackendResponse::PhoneReputation(reputation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url_shape() {
        let client = PhoneReputationClient::new(ReputationConfig {
            base_url: "https://reputation.example.com/api/json".to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 5,
        });
        let url = client.lookup_url("+15551234567").unwrap();
        assert_eq!(
            url.as_str(),
            "https://reputation.example.com/api/json/phone/test-key/+15551234567"
        );
    }

    #[test]
    fn test_reputation_parses_full_payload() {
        let reputation: PhoneReputation = serde_json::from_str(
            r#"{"fraud_score": 85, "spammer": true, "recent_abuse": false,
                "active": true, "line_type": "Wireless", "carrier": "ExampleTel",
                "country": "US", "city": "Denver", "do_not_call": false,
                "timezone": "America/Denver"}"#,
        )
        .unwrap();
        assert_eq!(reputation.fraud_score, 85.0);
        assert!(reputation.spammer);
        assert_eq!(reputation.carrier.as_deref(), Some("ExampleTel"));
    }
}
