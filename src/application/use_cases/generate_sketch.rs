use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::application::use_cases::credential_holder::CredentialHolder;
use crate::application::use_cases::sketch_pipeline::SketchPipeline;
use crate::domain::error::{AppError, Result};
use crate::domain::sketch::{SketchRequest, SketchResult, PROMPT_SOFT_LIMIT};

/// Entry point for a submission from the view.
///
/// Checks the request before anything touches the network, then runs the
/// pipeline on its own task. If the caller goes away (the browser tab closes,
/// the HTTP request is dropped) the generation still finishes and still lands
/// in history.
pub struct GenerateSketchUseCase {
    credentials: Arc<CredentialHolder>,
    pipeline: Arc<SketchPipeline>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GenerateSketchUseCase {
    pub fn new(credentials: Arc<CredentialHolder>, pipeline: Arc<SketchPipeline>) -> Self {
        Self {
            credentials,
            pipeline,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn execute(&self, prompt: &str) -> Result<SketchResult> {
        let request = SketchRequest::new(prompt.trim(), self.credentials.current());
        request.check()?;

        if request.prompt.chars().count() > PROMPT_SOFT_LIMIT {
            warn!(
                chars = request.prompt.chars().count(),
                "Description is longer than the suggested limit"
            );
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(self.in_flight.clone());
        let pipeline = self.pipeline.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            pipeline.generate(&request).await
        });

        task.await
            .map_err(|e| AppError::Internal(format!("Generation task failed: {}", e)))?
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}
