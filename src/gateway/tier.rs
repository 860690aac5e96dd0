//! Quality tier resolution

use crate::config::models::{ModelConfig, ModelTiers, QualityLevel};
use crate::error::Result;

/// Look up the model configuration for a quality level.
pub fn resolve(tiers: &ModelTiers, level: QualityLevel) -> &ModelConfig {
    match level {
        QualityLevel::Low => &tiers.low,
        QualityLevel::Medium => &tiers.medium,
        QualityLevel::High => &tiers.high,
        QualityLevel::Extreme => &tiers.extreme,
    }
}

/// Resolve a quality level given by name.
///
/// Unknown names fail with `InvalidTier`; there is no fallback tier.
pub fn resolve_named<'a>(tiers: &'a ModelTiers, name: &str) -> Result<&'a ModelConfig> {
    let level: QualityLevel = name.parse()?;
    Ok(resolve(tiers, level))
}
