//! Backend selection: model family to pipeline variant

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::traits::{
    DiffusionEngine, DiffusionPipeline, PerformanceFlags, PipelineSpec, PipelineVariant,
};
use crate::config::models::ModelFamily;
use crate::error::Result;

/// Scheduler shift for Stable Diffusion 3 pipelines
pub const SD3_SHIFT: f32 = 3.0;

/// Scheduler shift for FLUX pipelines
pub const FLUX_SHIFT: f32 = 1.0;

impl PipelineSpec {
    /// Construction parameters for a model family
    pub fn for_family(family: ModelFamily, model_name: &str) -> Self {
        let (variant, shift) = match family {
            ModelFamily::Sd3 => (PipelineVariant::StableDiffusion3 { use_t5: false }, SD3_SHIFT),
            ModelFamily::Flux => (PipelineVariant::Flux, FLUX_SHIFT),
        };

        Self {
            variant,
            model_version: model_name.to_string(),
            shift,
            flags: PerformanceFlags::default(),
        }
    }
}

type PipelineKey = (ModelFamily, String);

/// Builds pipelines through the engine and optionally keeps them for reuse
pub struct BackendSelector {
    engine: Arc<dyn DiffusionEngine>,
    reuse_pipelines: bool,
    pipelines: DashMap<PipelineKey, Arc<dyn DiffusionPipeline>>,
}

impl BackendSelector {
    pub fn new(engine: Arc<dyn DiffusionEngine>, reuse_pipelines: bool) -> Self {
        Self {
            engine,
            reuse_pipelines,
            pipelines: DashMap::new(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn DiffusionEngine> {
        &self.engine
    }

    /// Select the pipeline for a configured model.
    ///
    /// The family is parsed before anything else, so an unknown family never
    /// reaches the engine and leaves no cache entry behind.
    pub async fn select(
        &self,
        model_type: &str,
        model_name: &str,
    ) -> Result<Arc<dyn DiffusionPipeline>> {
        let family: ModelFamily = model_type.parse()?;
        let key = (family, model_name.to_string());

        if self.reuse_pipelines {
            if let Some(pipeline) = self.pipelines.get(&key).map(|e| e.value().clone()) {
                debug!(family = %family, model = %model_name, "Reusing cached pipeline");
                return Ok(pipeline);
            }
        }

        let spec = PipelineSpec::for_family(family, model_name);
        info!(
            engine = %self.engine.name(),
            family = %family,
            model = %model_name,
            shift = spec.shift,
            "Constructing pipeline"
        );
        let pipeline = self.engine.load_pipeline(&spec).await?;

        if self.reuse_pipelines {
            self.pipelines.insert(key, pipeline.clone());
        }

        Ok(pipeline)
    }

    /// Number of pipelines currently cached
    pub fn cached_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Drop the cached pipeline for a model, if any.
    ///
    /// Returns whether an entry was removed.
    pub fn evict(&self, family: ModelFamily, model_name: &str) -> bool {
        let removed = self
            .pipelines
            .remove(&(family, model_name.to_string()))
            .is_some();
        if removed {
            debug!(family = %family, model = %model_name, "Evicted cached pipeline");
        }
        removed
    }
}
