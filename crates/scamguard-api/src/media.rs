//! Object-storage uploader
//!
//! Upload bytes, receive a durable URL. Used to keep a durable copy of
//! submitted images; losing the copy is tolerable, failing the detection
//! over it is not, so callers treat upload errors as non-fatal.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use scamguard_core::UpstreamError;

pub struct MediaClient {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl MediaClient {
    pub fn new(endpoint: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }

    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String, UpstreamError> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "object storage returned HTTP {}",
                response.status()
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        Ok(parsed.url)
    }
}
