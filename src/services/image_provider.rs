//! Upstream text-to-image provider

use crate::{
    config::ImageConfig,
    error::{ApiError, Result},
    models::image::GeneratedImage,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{info, instrument};

/// Anything that turns a prompt into an image
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;
}

/// ClipDrop text-to-image API client
pub struct ClipdropClient {
    api_key: String,
    endpoint: String,
    http_client: reqwest::Client,
}

impl ClipdropClient {
    pub fn new(config: &ImageConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(10)) // 10s connection timeout
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            endpoint: format!("{}/text-to-image/v1", config.api_base.trim_end_matches('/')),
            http_client,
        })
    }
}

#[async_trait]
impl ImageGenerator for ClipdropClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let form = reqwest::multipart::Form::new().text("prompt", prompt.to_string());

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::UpstreamTimeout(format!("Image request timed out: {}", e))
                } else {
                    ApiError::Upstream(format!("Image request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Image API error ({}): {}",
                status, error_text
            )));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to read image body: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::Upstream("Image API returned an empty body".to_string()));
        }

        info!(
            size_bytes = bytes.len(),
            mime_type = %mime_type,
            "Image generated"
        );

        Ok(GeneratedImage {
            bytes: bytes.to_vec(),
            mime_type,
        })
    }
}
