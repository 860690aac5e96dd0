//! Generation dispatcher: tier → pipeline → image → PNG, with guaranteed cleanup

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::backend::selector::BackendSelector;
use crate::backend::traits::{DiffusionEngine, SamplingParams};
use crate::config::{ModelFamily, QualityLevel, Settings};
use crate::error::{AppError, Result};
use crate::gateway::tier;
use crate::response;

/// Validated per-call input
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image_quality: QualityLevel,
    pub seed: Option<i64>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, image_quality: QualityLevel, seed: Option<i64>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidRequest("prompt cannot be empty".to_string()));
        }

        Ok(Self {
            prompt,
            image_quality,
            seed,
        })
    }
}

/// Encoded image ready to be sent to the caller
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub image_quality: QualityLevel,
    pub model_name: String,
}

/// Orchestrates one generation and always releases engine resources afterwards
pub struct Dispatcher {
    settings: Arc<Settings>,
    selector: BackendSelector,
    timeout: Duration,
    attempts: AtomicU64,
}

impl Dispatcher {
    pub fn new(settings: Arc<Settings>, engine: Arc<dyn DiffusionEngine>) -> Self {
        let selector = BackendSelector::new(engine, settings.engine.reuse_pipelines);
        let timeout = Duration::from_millis(settings.engine.timeout_ms);

        Self {
            settings,
            selector,
            timeout,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    /// Number of generations started since the dispatcher was created
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Generate an image for a request.
    ///
    /// Cleanup runs exactly once after the attempt, whether it succeeded,
    /// failed or timed out, and before the outcome is returned.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "generate",
            request_id = %request_id,
            quality = %request.image_quality,
        );

        async move {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            let started = Instant::now();

            let outcome = match tokio::time::timeout(self.timeout, self.run(&request)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::Timeout(format!(
                    "Generation exceeded {} ms",
                    self.timeout.as_millis()
                ))),
            };

            self.cleanup().await;

            match &outcome {
                Ok(result) => info!(
                    model = %result.model_name,
                    bytes = result.bytes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Image generated"
                ),
                Err(e) => warn!(
                    error = %e,
                    kind = ?e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generation failed"
                ),
            }

            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let model = tier::resolve(&self.settings.models, request.image_quality);
        debug!(model = %model.model_name, family = %model.model_type, "Tier resolved");

        let pipeline = self
            .selector
            .select(&model.model_type, &model.model_name)
            .await?;
        debug!("Backend ready");

        let params = SamplingParams {
            prompt: request.prompt.clone(),
            cfg_weight: model.cfg_weight,
            num_steps: model.num_steps,
            latent_size: model.latent_size(),
            seed: request.seed,
            verbose: self.settings.model_verbose_output,
        };

        let generated = match pipeline.generate_image(&params).await {
            Ok(generated) => generated,
            Err(e) => {
                // The engine may have lost the pipeline; rebuild on next use
                if let Ok(family) = model.model_type.parse::<ModelFamily>() {
                    self.selector.evict(family, &model.model_name);
                }
                return Err(e);
            }
        };
        debug!(
            width = generated.image.width(),
            height = generated.image.height(),
            "Image sampled"
        );

        let bytes = response::encode_png(&generated.image)?;

        Ok(GenerationResult {
            bytes,
            content_type: response::MEDIA_TYPE,
            image_quality: request.image_quality,
            model_name: model.model_name.clone(),
        })
    }

    async fn cleanup(&self) {
        if let Err(e) = self.selector.engine().release_resources().await {
            warn!(error = %e, "Failed to release engine resources");
        }
    }
}
