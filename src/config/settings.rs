//! Application settings and configuration management

use crate::config::models::{ModelFamily, ModelTiers};
use crate::error::{AppError, Result};
use crate::queue::request_queue::QueueConfig;
use config::{Config, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the settings file, relative to the working directory
pub const DEFAULT_SETTINGS_PATH: &str = "config/default.ini";

/// Prefix for environment overrides, e.g. `IMAGE_GATEWAY__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "IMAGE_GATEWAY";

/// Root configuration structure
///
/// Built once at startup and shared read-only behind an `Arc`.
#[derive(Debug)]
pub struct Settings {
    /// Shared secret every caller must present in `X-Token`
    pub api_key: SecretString,
    pub model_verbose_output: bool,
    pub models: ModelTiers,
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub queue: QueueConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// The `[common]` section
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommonConfig {
    /// Name of the environment variable holding the API key (not the key itself)
    pub model_provider_api_key_name: String,
    pub model_verbose_output: bool,
}

/// Everything in the settings source except the model tiers
#[derive(Debug, Deserialize)]
struct SettingsSource {
    common: CommonConfig,
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    queue: QueueConfig,
    #[serde(default)]
    rate_limit: RateLimitConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Diffusion engine worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,
    /// Upper bound on a single generation, pipeline construction included
    #[serde(default = "default_engine_timeout")]
    pub timeout_ms: u64,
    /// Keep constructed pipelines keyed by (family, model name) instead of
    /// rebuilding one per request
    #[serde(default = "default_true")]
    pub reuse_pipelines: bool,
}

fn default_engine_endpoint() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_engine_timeout() -> u64 {
    600_000
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_engine_endpoint(),
            timeout_ms: default_engine_timeout(),
            reuse_pipelines: true,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_rps() -> u32 {
    2
}

fn default_burst() -> u32 {
    4
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Settings {
    /// Settings with the given key and tiers and defaults everywhere else
    pub fn new(api_key: impl Into<String>, models: ModelTiers) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            model_verbose_output: false,
            models,
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
            queue: QueueConfig::default(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load settings from the default settings file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_SETTINGS_PATH)
    }

    /// Load settings from a specific INI file path
    ///
    /// The API key is read from the environment variable named by
    /// `common.model_provider_api_key_name`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_string_lossy();
        let config = Config::builder()
            .add_source(File::new(&path, FileFormat::Ini).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self> {
        let models: ModelTiers = config.clone().try_deserialize()?;
        let source: SettingsSource = config.try_deserialize()?;

        let api_key = read_api_key(&source.common.model_provider_api_key_name)?;

        let settings = Self {
            api_key,
            model_verbose_output: source.common.model_verbose_output,
            models,
            server: source.server,
            engine: source.engine,
            queue: source.queue,
            rate_limit: source.rate_limit,
            logging: source.logging,
        };
        settings.validate()?;

        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.expose_secret().is_empty() {
            return Err(AppError::config("API key cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(AppError::config("Server port cannot be 0"));
        }

        if self.engine.endpoint.trim().is_empty() {
            return Err(AppError::config("Engine endpoint cannot be empty"));
        }

        if self.queue.max_concurrent == 0 {
            return Err(AppError::config("queue.max_concurrent must be at least 1"));
        }

        if self.queue.max_pending == 0 {
            return Err(AppError::config("queue.max_pending must be at least 1"));
        }

        self.models.validate()
    }

    /// Sections whose `model_type` is not a known family.
    ///
    /// These load fine; requests for the tier fail with `InvalidModelFamily`.
    pub fn unknown_model_types(&self) -> Vec<(&'static str, &str)> {
        self.models
            .sections()
            .into_iter()
            .filter(|(_, _, model)| model.model_type.parse::<ModelFamily>().is_err())
            .map(|(section, _, model)| (section, model.model_type.as_str()))
            .collect()
    }
}

fn read_api_key(var_name: &str) -> Result<SecretString> {
    if var_name.trim().is_empty() {
        return Err(AppError::config(
            "common.model_provider_api_key_name cannot be empty",
        ));
    }

    let value = std::env::var(var_name).map_err(|e| {
        AppError::config(format!(
            "environment variable '{}' could not be read: {}",
            var_name, e
        ))
    })?;

    Ok(SecretString::new(value))
}
