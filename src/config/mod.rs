//! Configuration module - settings loading and tier definitions

pub mod models;
pub mod settings;

pub use models::{ModelConfig, ModelFamily, ModelTiers, QualityLevel};
pub use settings::{
    CommonConfig, EngineConfig, LoggingConfig, RateLimitConfig, ServerConfig, Settings,
};
