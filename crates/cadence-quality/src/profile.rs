//! Quality profiles
//!
//! A profile carries every threshold the validation and assembly stages
//! gate on. Profiles are plain data so they can be loaded from YAML.

use serde::{Deserialize, Serialize};

/// Thresholds and fallbacks for scoring a calendar run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityProfile {
    /// Profile name (e.g., "standard@1.0")
    pub name: String,

    // === Status buckets (inclusive lower bounds) ===

    pub excellent_threshold: f64,
    pub good_threshold: f64,
    pub acceptable_threshold: f64,

    /// Dimensions scoring below this emit an improvement recommendation
    pub recommendation_threshold: f64,

    // === Drift buckets ===

    /// Drift at or below this is minimal
    pub drift_minimal_max: f64,

    /// Drift at or below this is moderate; above it is significant
    pub drift_moderate_max: f64,

    // === Fallbacks ===

    /// Calendar quality when no day carries quality metrics
    pub fallback_quality_score: f64,

    /// Strategy alignment when stage 11 reports none
    pub fallback_alignment_score: f64,
}

impl QualityProfile {
    /// The standard thresholds
    pub fn standard() -> Self {
        Self {
            name: "standard@1.0".to_string(),
            excellent_threshold: 0.9,
            good_threshold: 0.8,
            acceptable_threshold: 0.7,
            recommendation_threshold: 0.8,
            drift_minimal_max: 0.1,
            drift_moderate_max: 0.2,
            fallback_quality_score: 0.85,
            fallback_alignment_score: 0.85,
        }
    }

    /// Same buckets, but recommends improvements earlier
    pub fn strict() -> Self {
        Self {
            name: "strict@1.0".to_string(),
            recommendation_threshold: 0.85,
            ..Self::standard()
        }
    }

    /// Load profile from YAML; omitted fields take standard values
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let profile: Self = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check that thresholds are ordered and inside `[0, 1]`
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            self.excellent_threshold,
            self.good_threshold,
            self.acceptable_threshold,
            self.recommendation_threshold,
            self.drift_minimal_max,
            self.drift_moderate_max,
            self.fallback_quality_score,
            self.fallback_alignment_score,
        ];
        if all.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(format!("profile {}: thresholds must lie in [0, 1]", self.name));
        }
        if !(self.excellent_threshold >= self.good_threshold
            && self.good_threshold >= self.acceptable_threshold)
        {
            return Err(format!("profile {}: status thresholds out of order", self.name));
        }
        if self.drift_minimal_max > self.drift_moderate_max {
            return Err(format!("profile {}: drift thresholds out of order", self.name));
        }
        Ok(())
    }

    /// Get profile by name
    pub fn for_name(name: &str) -> Self {
        match name.split('@').next().unwrap_or_default() {
            "strict" => Self::strict(),
            _ => Self::standard(),
        }
    }
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self::standard()
    }
}
