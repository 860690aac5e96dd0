//! HTTP client for a local diffusion engine worker

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::traits::{
    DiffusionEngine, DiffusionPipeline, GeneratedImage, PipelineSpec, SamplingParams,
};
use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::response::base64;

/// Engine reached over HTTP
///
/// The worker owns the accelerator; this side only ships construction and
/// sampling parameters and receives base64 encoded images back.
pub struct HttpEngine {
    name: String,
    client: Client,
    endpoint: String,
}

/// Pipeline living inside the worker, addressed by id
struct HttpPipeline {
    client: Client,
    generate_url: String,
    spec: PipelineSpec,
}

#[derive(Debug, Deserialize)]
struct LoadPipelineResponse {
    pipeline_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiGenerateResponse {
    image: String,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpEngine {
    /// Create a new HTTP engine client from configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: format!("http:{}", config.endpoint),
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DiffusionEngine for HttpEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_pipeline(&self, spec: &PipelineSpec) -> Result<Arc<dyn DiffusionPipeline>> {
        let url = format!("{}/pipelines", self.endpoint);
        debug!(url = %url, model = %spec.model_version, "Requesting pipeline construction");

        let response = self.client.post(&url).json(spec).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let loaded: LoadPipelineResponse = response.json().await?;
        debug!(pipeline_id = %loaded.pipeline_id, "Pipeline constructed");

        Ok(Arc::new(HttpPipeline {
            client: self.client.clone(),
            generate_url: format!("{}/pipelines/{}/generate", self.endpoint, loaded.pipeline_id),
            spec: spec.clone(),
        }))
    }

    async fn release_resources(&self) -> Result<()> {
        let url = format!("{}/cache/clear", self.endpoint);

        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!(url = %url, error = %err, "Engine cache clear failed");
            return Err(err);
        }

        Ok(())
    }
}

#[async_trait]
impl DiffusionPipeline for HttpPipeline {
    fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    async fn generate_image(&self, params: &SamplingParams) -> Result<GeneratedImage> {
        debug!(
            url = %self.generate_url,
            steps = params.num_steps,
            latent_h = params.latent_size.0,
            latent_w = params.latent_size.1,
            "Sending generate request"
        );

        let response = self.client.post(&self.generate_url).json(params).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let generated: ApiGenerateResponse = response.json().await?;
        let image = base64::decode_image(&generated.image)?;

        Ok(GeneratedImage {
            image,
            metadata: generated.metadata,
        })
    }
}

/// Turn a non-success worker response into a failure carrying its message
async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.detail.or(b.error))
        .unwrap_or_else(|| format!("Engine returned {}: {}", status, body));

    AppError::GenerationFailure(message)
}
