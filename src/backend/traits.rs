//! Common traits and types for the diffusion engine collaborator

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// Pipeline class the engine instantiates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum PipelineVariant {
    /// Stable Diffusion 3 pipeline
    #[serde(rename = "sd3")]
    StableDiffusion3 {
        /// Whether the auxiliary T5 text encoder is loaded
        use_t5: bool,
    },
    /// FLUX pipeline
    #[serde(rename = "flux")]
    Flux,
}

/// Memory and precision switches applied to every pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceFlags {
    pub low_memory_mode: bool,
    /// Activations in 16-bit precision
    pub a16: bool,
    /// Weights in 16-bit precision
    pub w16: bool,
}

impl Default for PerformanceFlags {
    fn default() -> Self {
        Self {
            low_memory_mode: true,
            a16: true,
            w16: true,
        }
    }
}

/// Everything the engine needs to construct a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    #[serde(flatten)]
    pub variant: PipelineVariant,
    pub model_version: String,
    pub shift: f32,
    #[serde(flatten)]
    pub flags: PerformanceFlags,
}

/// Per-call sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub prompt: String,
    pub cfg_weight: f32,
    pub num_steps: u32,
    /// (height / 8, width / 8)
    pub latent_size: (u32, u32),
    /// `None` lets the engine pick a non-deterministic seed
    pub seed: Option<i64>,
    pub verbose: bool,
}

/// Image produced by a pipeline
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub image: DynamicImage,
    /// Auxiliary engine output; not used downstream
    pub metadata: Option<serde_json::Value>,
}

/// A constructed, ready-to-sample pipeline
#[async_trait]
pub trait DiffusionPipeline: Send + Sync {
    /// Parameters the pipeline was built with
    fn spec(&self) -> &PipelineSpec;

    /// Run the sampler and return the decoded image
    async fn generate_image(&self, params: &SamplingParams) -> Result<GeneratedImage>;
}

/// The external generation engine
#[async_trait]
pub trait DiffusionEngine: Send + Sync {
    /// Engine name for logging
    fn name(&self) -> &str;

    /// Construct a pipeline; potentially loads model weights
    async fn load_pipeline(&self, spec: &PipelineSpec) -> Result<Arc<dyn DiffusionPipeline>>;

    /// Clear the accelerator cache and collect garbage after a generation
    async fn release_resources(&self) -> Result<()>;
}
