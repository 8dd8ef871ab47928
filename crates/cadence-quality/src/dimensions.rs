//! Weighted scoring dimensions
//!
//! Alignment dimensions re-check later stages against the original strategy;
//! consistency dimensions compare adjacent stages. Each set's weights sum to
//! 1.0.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension of strategy alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentDimension {
    BusinessGoals,
    TargetAudience,
    ContentPillars,
    PlatformStrategy,
    KpiAlignment,
}

impl AlignmentDimension {
    pub const ALL: [AlignmentDimension; 5] = [
        AlignmentDimension::BusinessGoals,
        AlignmentDimension::TargetAudience,
        AlignmentDimension::ContentPillars,
        AlignmentDimension::PlatformStrategy,
        AlignmentDimension::KpiAlignment,
    ];

    /// Areas tracked for strategy drift
    pub const DRIFT_AREAS: [AlignmentDimension; 3] = [
        AlignmentDimension::BusinessGoals,
        AlignmentDimension::TargetAudience,
        AlignmentDimension::ContentPillars,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            AlignmentDimension::BusinessGoals => 0.25,
            AlignmentDimension::TargetAudience => 0.20,
            AlignmentDimension::ContentPillars => 0.20,
            AlignmentDimension::PlatformStrategy => 0.15,
            AlignmentDimension::KpiAlignment => 0.20,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            AlignmentDimension::BusinessGoals => "business_goals",
            AlignmentDimension::TargetAudience => "target_audience",
            AlignmentDimension::ContentPillars => "content_pillars",
            AlignmentDimension::PlatformStrategy => "platform_strategy",
            AlignmentDimension::KpiAlignment => "kpi_alignment",
        }
    }

    /// Human label used in reports and prompts
    pub fn label(&self) -> &'static str {
        match self {
            AlignmentDimension::BusinessGoals => "Business goals",
            AlignmentDimension::TargetAudience => "Target audience",
            AlignmentDimension::ContentPillars => "Content pillars",
            AlignmentDimension::PlatformStrategy => "Platform strategy",
            AlignmentDimension::KpiAlignment => "KPI alignment",
        }
    }
}

impl fmt::Display for AlignmentDimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Dimension of adjacent-stage consistency (equal weights)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyDimension {
    CrossStepConsistency,
    DataFlowVerification,
    ContextPreservation,
    LogicalCoherence,
}

impl ConsistencyDimension {
    pub const ALL: [ConsistencyDimension; 4] = [
        ConsistencyDimension::CrossStepConsistency,
        ConsistencyDimension::DataFlowVerification,
        ConsistencyDimension::ContextPreservation,
        ConsistencyDimension::LogicalCoherence,
    ];

    pub fn weight(&self) -> f64 {
        0.25
    }

    pub fn key(&self) -> &'static str {
        match self {
            ConsistencyDimension::CrossStepConsistency => "cross_step_consistency",
            ConsistencyDimension::DataFlowVerification => "data_flow_verification",
            ConsistencyDimension::ContextPreservation => "context_preservation",
            ConsistencyDimension::LogicalCoherence => "logical_coherence",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsistencyDimension::CrossStepConsistency => "Cross-step consistency",
            ConsistencyDimension::DataFlowVerification => "Data flow verification",
            ConsistencyDimension::ContextPreservation => "Context preservation",
            ConsistencyDimension::LogicalCoherence => "Logical coherence",
        }
    }
}

impl fmt::Display for ConsistencyDimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}
