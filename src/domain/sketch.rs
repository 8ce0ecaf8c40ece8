use std::borrow::Cow;

use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::error::{AppError, Result};

pub const MISSING_CREDENTIAL_MESSAGE: &str = "Please provide a valid API token first";
pub const BLANK_PROMPT_MESSAGE: &str = "Please describe the subject for the sketch";

/// Display limit for the description box. Not enforced anywhere.
pub const PROMPT_SOFT_LIMIT: usize = 500;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// One submission. Lives only as long as the call it drives.
#[derive(Debug, Clone, Validate)]
pub struct SketchRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prompt: String,
    #[validate(length(min = 1))]
    pub credential: String,
}

fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed(BLANK_PROMPT_MESSAGE));
        return Err(err);
    }
    Ok(())
}

impl SketchRequest {
    pub fn new(prompt: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            credential: credential.into(),
        }
    }

    /// Runs the field rules, reporting the credential problem before the prompt one.
    pub fn check(&self) -> Result<()> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };
        let fields = errors.field_errors();
        let failed = |field: &str| fields.keys().any(|name| name.to_string() == field);
        if failed("credential") {
            return Err(AppError::ValidationError(MISSING_CREDENTIAL_MESSAGE.to_string()));
        }
        if failed("prompt") {
            return Err(AppError::ValidationError(BLANK_PROMPT_MESSAGE.to_string()));
        }
        Err(AppError::from(errors))
    }
}

/// Record of one successful generation. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SketchResult {
    pub id: String,
    pub image_url: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub prompt: String,
}

impl SketchResult {
    pub fn new(image_url: String, prompt: String) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self {
            id: generate_sketch_id(timestamp),
            image_url,
            timestamp,
            prompt,
        }
    }

    pub fn download_filename(&self) -> String {
        format!("police-sketch-{}.png", self.id)
    }

    pub fn share_filename(&self) -> String {
        format!("sketch-{}.png", self.id)
    }
}

/// `sketch-<millis>-<9 base36 chars>`. Good enough for a local list key.
pub fn generate_sketch_id(timestamp_millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("sketch-{}-{}", timestamp_millis, suffix)
}
