//! OCR collaborator client
//!
//! The OCR engine is an external service consumed as a black box:
//! image bytes in, recognized text out. OCR failure fails the whole
//! detection request.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use scamguard_core::UpstreamError;

pub struct OcrClient {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct OcrResponse {
    text: String,
}

impl OcrClient {
    pub fn new(endpoint: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }

    pub async fn recognize(&self, image: &[u8]) -> Result<String, UpstreamError> {
        let part = Part::bytes(image.to_vec()).file_name("image");
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UpstreamError::Unavailable(format!(
                "ocr service returned HTTP {}",
                response.status()
            )));
        }

        let parsed: OcrResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        Ok(parsed.text)
    }
}
