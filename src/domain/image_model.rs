use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-schnell";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationParams {
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            num_inference_steps: 8,
            guidance_scale: 3.5,
            width: 512,
            height: 512,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageModelConfig {
    pub endpoint: String,
    #[serde(default)]
    pub params: GenerationParams,
}

impl Default for ImageModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            params: GenerationParams::default(),
        }
    }
}

/// Raw image bytes as returned by the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageBlob {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "image/png".to_string(),
        }
    }
}
