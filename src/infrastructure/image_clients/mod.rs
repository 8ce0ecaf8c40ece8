pub mod huggingface;

use crate::domain::error::Result;
use crate::domain::image_model::{ImageBlob, ImageModelConfig};
use async_trait::async_trait;

pub use huggingface::HuggingFaceClient;

#[async_trait]
pub trait ImageClient {
    /// One request, no retry. Non-2xx becomes `AppError::ApiError`.
    async fn text_to_image(
        &self,
        config: &ImageModelConfig,
        credential: &str,
        prompt: &str,
    ) -> Result<ImageBlob>;
}
