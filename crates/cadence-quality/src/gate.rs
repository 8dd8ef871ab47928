//! Quality gate
//!
//! Buckets scores into a [`QualityStatus`] and drift values into a
//! [`DriftStatus`] using the thresholds of a [`QualityProfile`].

use super::profile::QualityProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict bucket for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Excellent,
    Good,
    Acceptable,
    NeedsImprovement,
}

impl QualityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityStatus::Excellent => "excellent",
            QualityStatus::Good => "good",
            QualityStatus::Acceptable => "acceptable",
            QualityStatus::NeedsImprovement => "needs_improvement",
        }
    }

    pub fn is_passing(&self) -> bool {
        !matches!(self, QualityStatus::NeedsImprovement)
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drift bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftStatus {
    Minimal,
    Moderate,
    Significant,
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DriftStatus::Minimal => write!(f, "minimal"),
            DriftStatus::Moderate => write!(f, "moderate"),
            DriftStatus::Significant => write!(f, "significant"),
        }
    }
}

/// Quality gate bound to a profile
#[derive(Debug, Clone)]
pub struct QualityGate {
    profile: QualityProfile,
}

impl QualityGate {
    pub fn new(profile: QualityProfile) -> Self {
        Self { profile }
    }

    /// Create a gate for a named profile
    pub fn for_profile(name: &str) -> Self {
        Self::new(QualityProfile::for_name(name))
    }

    pub fn profile(&self) -> &QualityProfile {
        &self.profile
    }

    /// Bucket a score; lower bounds are inclusive
    pub fn status(&self, score: f64) -> QualityStatus {
        if score >= self.profile.excellent_threshold {
            QualityStatus::Excellent
        } else if score >= self.profile.good_threshold {
            QualityStatus::Good
        } else if score >= self.profile.acceptable_threshold {
            QualityStatus::Acceptable
        } else {
            QualityStatus::NeedsImprovement
        }
    }

    /// Bucket a drift value; upper bounds are inclusive
    pub fn drift_status(&self, drift: f64) -> DriftStatus {
        if drift <= self.profile.drift_minimal_max {
            DriftStatus::Minimal
        } else if drift <= self.profile.drift_moderate_max {
            DriftStatus::Moderate
        } else {
            DriftStatus::Significant
        }
    }

    pub fn needs_recommendation(&self, score: f64) -> bool {
        score < self.profile.recommendation_threshold
    }

    pub fn drift_warning(&self, drift: f64) -> bool {
        drift > self.profile.drift_moderate_max
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(QualityProfile::default())
    }
}
