//! API request and response models

use serde::{Deserialize, Serialize};

use crate::config::QualityLevel;
use crate::error::AppError;
use crate::gateway::GenerationRequest;
use crate::queue::QueueStats;

/// Body of `POST /image`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageRequest {
    /// Prompt used to generate the image
    pub prompt: String,

    /// One of `low`, `medium`, `high`, `extreme`; `low` when absent. Kept as
    /// text so an unknown value is reported as an invalid quality rather than
    /// a generic body error.
    #[serde(default)]
    pub image_quality: Option<String>,

    /// Seed used to generate the image
    #[serde(default)]
    pub seed: Option<i64>,
}

impl TryFrom<ImageRequest> for GenerationRequest {
    type Error = AppError;

    fn try_from(body: ImageRequest) -> Result<Self, Self::Error> {
        let image_quality = match body.image_quality.as_deref() {
            Some(value) => value.parse()?,
            None => QualityLevel::default(),
        };

        GenerationRequest::new(body.prompt, image_quality, body.seed)
    }
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue: QueueStats,
}
