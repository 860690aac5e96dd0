//! Quality tiers and the model configuration each one resolves to

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// User-facing quality selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    #[default]
    Low,
    Medium,
    High,
    Extreme,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Extreme];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

impl FromStr for QualityLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "extreme" => Ok(Self::Extreme),
            other => Err(AppError::InvalidTier(other.to_string())),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diffusion model family; decides which pipeline variant the engine builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Stable Diffusion 3
    Sd3,
    /// FLUX
    Flux,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sd3 => "sd3",
            Self::Flux => "flux",
        }
    }
}

impl FromStr for ModelFamily {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sd3" => Ok(Self::Sd3),
            "flux" => Ok(Self::Flux),
            other => Err(AppError::InvalidModelFamily(other.to_string())),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully specified invocation parameters for one quality tier
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Model family identifier as written in the settings source. Parsed into
    /// a [`ModelFamily`] when a pipeline is selected.
    pub model_type: String,
    pub model_name: String,
    pub height: u32,
    pub width: u32,
    pub num_steps: u32,
    #[serde(rename = "cfgWeight", alias = "cfgweight", alias = "cfg_weight")]
    pub cfg_weight: f32,
}

impl ModelConfig {
    /// Latent grid the engine samples on; dimensions truncate on division by 8.
    pub fn latent_size(&self) -> (u32, u32) {
        (self.height / 8, self.width / 8)
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self, section: &str) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(AppError::config(format!(
                "[{section}] model_name cannot be empty"
            )));
        }
        for (field, value) in [("height", self.height), ("width", self.width)] {
            if value == 0 || value % 8 != 0 {
                return Err(AppError::config(format!(
                    "[{section}] {field} must be a positive multiple of 8, got {value}"
                )));
            }
        }
        if self.num_steps == 0 {
            return Err(AppError::config(format!(
                "[{section}] num_steps must be greater than 0"
            )));
        }
        if !self.cfg_weight.is_finite() || self.cfg_weight < 0.0 {
            return Err(AppError::config(format!(
                "[{section}] cfgWeight must be a non-negative number, got {}",
                self.cfg_weight
            )));
        }
        Ok(())
    }
}

/// One model configuration per quality level
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelTiers {
    #[serde(rename = "lowResModel", alias = "lowresmodel")]
    pub low: ModelConfig,
    #[serde(rename = "medResModel", alias = "medresmodel")]
    pub medium: ModelConfig,
    #[serde(rename = "highResModel", alias = "highresmodel")]
    pub high: ModelConfig,
    #[serde(rename = "extremeResModel", alias = "extremeresmodel")]
    pub extreme: ModelConfig,
}

impl ModelTiers {
    /// Iterate tiers with the section name each one is read from
    pub fn sections(&self) -> [(&'static str, QualityLevel, &ModelConfig); 4] {
        [
            ("lowResModel", QualityLevel::Low, &self.low),
            ("medResModel", QualityLevel::Medium, &self.medium),
            ("highResModel", QualityLevel::High, &self.high),
            ("extremeResModel", QualityLevel::Extreme, &self.extreme),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (section, _, model) in self.sections() {
            model.validate(section)?;
        }
        Ok(())
    }
}
