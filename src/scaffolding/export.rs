use serde::{Deserialize, Serialize};

use crate::scaffolding::config::ScaffoldingConfig;
use crate::scaffolding::history::Outcome;
use crate::scaffolding::log::DecisionLogEntry;
use crate::scaffolding::types::ScaffoldLevel;

/// Decision-log entries recorded while each level was in force.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDistribution {
    pub level1: usize,
    pub level2: usize,
    pub level3: usize,
}

impl LevelDistribution {
    pub fn from_log(log: &[DecisionLogEntry]) -> Self {
        log.iter().fold(Self::default(), |mut dist, entry| {
            match entry.current_level {
                ScaffoldLevel::Hints => dist.level1 += 1,
                ScaffoldLevel::GuidedSteps => dist.level2 += 1,
                ScaffoldLevel::WorkedExamples => dist.level3 += 1,
            }
            dist
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub current_level: ScaffoldLevel,
    pub total_level_changes: u32,
    pub total_interactions: usize,
    pub proficiency: f64,
    pub trend: f64,
    pub success_rate: f64,
    /// Milliseconds since the session started.
    pub session_duration: i64,
    pub level_distribution: LevelDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchExport {
    pub config: ScaffoldingConfig,
    pub summary: SessionSummary,
    pub history: Vec<DecisionLogEntry>,
    pub performance_history: Vec<Outcome>,
    pub export_timestamp: i64,
}
