use crate::application::use_cases::history::HistoryStore;
use crate::application::use_cases::prompt_enhancer::enhance;
use crate::domain::error::Result;
use crate::domain::image_model::ImageModelConfig;
use crate::domain::sketch::{SketchRequest, SketchResult};
use crate::infrastructure::image_clients::ImageClient;
use crate::infrastructure::object_urls::ObjectUrlRegistry;
use std::sync::Arc;
use tracing::{error, info};

pub struct SketchPipeline {
    image_client: Arc<dyn ImageClient + Send + Sync>,
    model: ImageModelConfig,
    images: Arc<ObjectUrlRegistry>,
    history: Arc<HistoryStore>,
}

impl SketchPipeline {
    pub fn new(
        image_client: Arc<dyn ImageClient + Send + Sync>,
        model: ImageModelConfig,
        images: Arc<ObjectUrlRegistry>,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            image_client,
            model,
            images,
            history,
        }
    }

    /// One request to the model; the result is in history before it is returned.
    ///
    /// Callers are expected to have checked the request already.
    pub async fn generate(&self, request: &SketchRequest) -> Result<SketchResult> {
        let enhanced_prompt = enhance(&request.prompt);

        let blob = self
            .image_client
            .text_to_image(&self.model, &request.credential, &enhanced_prompt)
            .await
            .map_err(|err| {
                error!(error = %err, "Error generating sketch");
                err
            })?;

        let image_bytes = blob.bytes.len();
        let image_url = self.images.create(blob);
        let result = SketchResult::new(image_url, request.prompt.clone());

        let evicted = self.history.append(result.clone())?;
        for old in &evicted {
            self.images.revoke(&old.image_url);
        }

        info!(
            id = %result.id,
            image_bytes,
            evicted = evicted.len(),
            "Sketch generated"
        );
        Ok(result)
    }
}
