use serde::{Deserialize, Serialize};

use crate::scaffolding::error::ScaffoldError;
use crate::scaffolding::types::TopicDifficulty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DifficultyMultipliers {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl Default for DifficultyMultipliers {
    fn default() -> Self {
        Self {
            easy: 0.8,
            medium: 1.0,
            hard: 1.3,
        }
    }
}

/// Thresholds for the scaffolding decision tree.
///
/// Fixed for the lifetime of an engine; experiment variants construct a new
/// engine with a different config. The config is copied into every research
/// export so results can be reproduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScaffoldingConfig {
    pub attempts_for_level2: u32,
    pub attempts_for_level3: u32,
    pub time_for_level2_secs: f64,
    pub time_for_level3_secs: f64,
    pub low_proficiency_threshold: f64,
    pub high_proficiency_threshold: f64,
    /// Help requests per minute above which help seeking counts as high.
    pub high_help_frequency: f64,
    pub success_streak_for_deescalate: u32,
    /// Minimum dwell at a level before de-escalation is allowed.
    pub min_time_at_level_ms: i64,
    pub difficulty_multipliers: DifficultyMultipliers,
}

impl Default for ScaffoldingConfig {
    fn default() -> Self {
        Self {
            attempts_for_level2: 2,
            attempts_for_level3: 4,
            time_for_level2_secs: 180.0,
            time_for_level3_secs: 300.0,
            low_proficiency_threshold: 0.5,
            high_proficiency_threshold: 0.75,
            high_help_frequency: 0.5,
            success_streak_for_deescalate: 2,
            min_time_at_level_ms: 120_000,
            difficulty_multipliers: DifficultyMultipliers::default(),
        }
    }
}

impl ScaffoldingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_parse("SCAFFOLD_ATTEMPTS_LEVEL2") {
            config.attempts_for_level2 = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_ATTEMPTS_LEVEL3") {
            config.attempts_for_level3 = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_TIME_LEVEL2_SECS") {
            config.time_for_level2_secs = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_TIME_LEVEL3_SECS") {
            config.time_for_level3_secs = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_LOW_PROFICIENCY") {
            config.low_proficiency_threshold = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_HIGH_PROFICIENCY") {
            config.high_proficiency_threshold = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_HIGH_HELP_FREQUENCY") {
            config.high_help_frequency = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_SUCCESS_STREAK") {
            config.success_streak_for_deescalate = val;
        }
        if let Some(val) = env_parse("SCAFFOLD_MIN_TIME_AT_LEVEL_MS") {
            config.min_time_at_level_ms = val;
        }

        if let Err(err) = config.validate() {
            tracing::warn!(error = %err, "scaffolding env overrides rejected, using defaults");
            return Self::default();
        }

        config
    }

    pub fn validate(&self) -> Result<(), ScaffoldError> {
        if self.attempts_for_level3 < self.attempts_for_level2 {
            return Err(ScaffoldError::InvalidConfig(
                "attemptsForLevel3 must not be below attemptsForLevel2".to_string(),
            ));
        }
        if !(self.time_for_level2_secs >= 0.0 && self.time_for_level3_secs >= self.time_for_level2_secs) {
            return Err(ScaffoldError::InvalidConfig(
                "time thresholds must be non-negative and ordered".to_string(),
            ));
        }
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.low_proficiency_threshold)
            || !in_unit(self.high_proficiency_threshold)
            || self.low_proficiency_threshold >= self.high_proficiency_threshold
        {
            return Err(ScaffoldError::InvalidConfig(
                "proficiency thresholds must satisfy 0 <= low < high <= 1".to_string(),
            ));
        }
        if !(self.high_help_frequency >= 0.0) {
            return Err(ScaffoldError::InvalidConfig(
                "highHelpFrequency must be non-negative".to_string(),
            ));
        }
        if self.min_time_at_level_ms < 0 {
            return Err(ScaffoldError::InvalidConfig(
                "minTimeAtLevelMs must be non-negative".to_string(),
            ));
        }
        let m = &self.difficulty_multipliers;
        if [m.easy, m.medium, m.hard].iter().any(|v| !(*v > 0.0) || !v.is_finite()) {
            return Err(ScaffoldError::InvalidConfig(
                "difficulty multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn difficulty_multiplier(&self, difficulty: TopicDifficulty) -> f64 {
        match difficulty {
            TopicDifficulty::Easy => self.difficulty_multipliers.easy,
            TopicDifficulty::Medium => self.difficulty_multipliers.medium,
            TopicDifficulty::Hard => self.difficulty_multipliers.hard,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
