//! Backend module - engine traits, the HTTP engine client, and pipeline selection

pub mod http_backend;
pub mod selector;
pub mod traits;

pub use http_backend::HttpEngine;
pub use selector::BackendSelector;
pub use traits::{DiffusionEngine, DiffusionPipeline, PipelineSpec, SamplingParams};
