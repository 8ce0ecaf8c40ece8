use super::ImageClient;
use crate::domain::error::{AppError, Result};
use crate::domain::image_model::{ImageBlob, ImageModelConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use tracing::{debug, warn};

const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/png";

/// Hugging Face hosted inference for text-to-image models.
///
/// The client carries no timeout of its own; a stalled request waits for
/// whatever the transport gives up on first.
pub struct HuggingFaceClient {
    client: reqwest::Client,
}

impl HuggingFaceClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn request_body(config: &ImageModelConfig, prompt: &str) -> serde_json::Value {
        json!({
            "inputs": prompt,
            "parameters": {
                "num_inference_steps": config.params.num_inference_steps,
                "guidance_scale": config.params.guidance_scale,
                "width": config.params.width,
                "height": config.params.height,
            }
        })
    }
}

impl Default for HuggingFaceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageClient for HuggingFaceClient {
    async fn text_to_image(
        &self,
        config: &ImageModelConfig,
        credential: &str,
        prompt: &str,
    ) -> Result<ImageBlob> {
        let body = Self::request_body(config, prompt);
        debug!(endpoint = %config.endpoint, prompt_len = prompt.len(), "Requesting image");

        let response = self
            .client
            .post(&config.endpoint)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::TransportError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Image endpoint returned an error");
            return Err(AppError::ApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to read response: {}", e)))?;

        Ok(ImageBlob {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
