//! Data Model: StageId, StageResult
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the twelve pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageId {
    #[serde(rename = "step_01")]
    Step01,
    #[serde(rename = "step_02")]
    Step02,
    #[serde(rename = "step_03")]
    Step03,
    #[serde(rename = "step_04")]
    Step04,
    #[serde(rename = "step_05")]
    Step05,
    #[serde(rename = "step_06")]
    Step06,
    #[serde(rename = "step_07")]
    Step07,
    #[serde(rename = "step_08")]
    Step08,
    #[serde(rename = "step_09")]
    Step09,
    #[serde(rename = "step_10")]
    Step10,
    #[serde(rename = "step_11")]
    Step11,
    #[serde(rename = "step_12")]
    Step12,
}

impl StageId {
    pub const ALL: [StageId; 12] = [
        StageId::Step01,
        StageId::Step02,
        StageId::Step03,
        StageId::Step04,
        StageId::Step05,
        StageId::Step06,
        StageId::Step07,
        StageId::Step08,
        StageId::Step09,
        StageId::Step10,
        StageId::Step11,
        StageId::Step12,
    ];

    /// Stage number, 1-based
    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// Context key ("step_01" … "step_12")
    pub fn key(&self) -> &'static str {
        match self {
            StageId::Step01 => "step_01",
            StageId::Step02 => "step_02",
            StageId::Step03 => "step_03",
            StageId::Step04 => "step_04",
            StageId::Step05 => "step_05",
            StageId::Step06 => "step_06",
            StageId::Step07 => "step_07",
            StageId::Step08 => "step_08",
            StageId::Step09 => "step_09",
            StageId::Step10 => "step_10",
            StageId::Step11 => "step_11",
            StageId::Step12 => "step_12",
        }
    }

    /// Descriptive stage name
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Step01 => "content_strategy_analysis",
            StageId::Step02 => "gap_analysis",
            StageId::Step03 => "audience_platform_strategy",
            StageId::Step04 => "calendar_framework",
            StageId::Step05 => "content_pillar_distribution",
            StageId::Step06 => "platform_specific_strategy",
            StageId::Step07 => "weekly_theme_development",
            StageId::Step08 => "daily_content_planning",
            StageId::Step09 => "content_recommendations",
            StageId::Step10 => "performance_optimization",
            StageId::Step11 => "strategy_alignment_validation",
            StageId::Step12 => "final_calendar_assembly",
        }
    }

    /// Every stage that must have completed before this one
    pub fn predecessors(&self) -> &'static [StageId] {
        &Self::ALL[..*self as usize]
    }

    pub fn next(&self) -> Option<StageId> {
        Self::ALL.get(*self as usize + 1).copied()
    }

    /// Inclusive range of stages, in order
    pub fn range(from: StageId, to: StageId) -> &'static [StageId] {
        if from > to {
            return &[];
        }
        &Self::ALL[from as usize..=to as usize]
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StageId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.key() == s)
            .ok_or_else(|| format!("unknown stage id: {}", s))
    }
}

/// What a stage leaves behind in the context
///
/// Every field has a default so that hand-written fixtures such as
/// `{"completed": true, "output": {}}` are valid results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub completed: bool,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl StageResult {
    /// A completed result; the score is clamped to `[0, 1]`
    pub fn completed(output: Value, quality_score: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            completed: true,
            output,
            quality_score: clamp_score(quality_score),
            timestamp,
            error: None,
            metadata: Map::new(),
        }
    }

    /// A structured failure record
    pub fn failed(error: impl Into<String>, output: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            completed: false,
            output,
            quality_score: 0.0,
            timestamp,
            error: Some(error.into()),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
