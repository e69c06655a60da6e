use serde::{Deserialize, Serialize};

use crate::scaffolding::error::ScaffoldError;

/// Support intensity presented to the student.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub enum ScaffoldLevel {
    #[default]
    Hints,
    GuidedSteps,
    WorkedExamples,
}

impl ScaffoldLevel {
    pub const ALL: [ScaffoldLevel; 3] = [Self::Hints, Self::GuidedSteps, Self::WorkedExamples];

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Hints => 1,
            Self::GuidedSteps => 2,
            Self::WorkedExamples => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hints => "hints",
            Self::GuidedSteps => "guided_steps",
            Self::WorkedExamples => "worked_examples",
        }
    }

    /// One step more support, saturating at worked examples.
    pub fn escalated(&self) -> Self {
        match self {
            Self::Hints => Self::GuidedSteps,
            _ => Self::WorkedExamples,
        }
    }

    /// One step less support, saturating at hints.
    pub fn deescalated(&self) -> Self {
        match self {
            Self::WorkedExamples => Self::GuidedSteps,
            _ => Self::Hints,
        }
    }

    pub fn from_number(value: i64) -> Result<Self, ScaffoldError> {
        match value {
            1 => Ok(Self::Hints),
            2 => Ok(Self::GuidedSteps),
            3 => Ok(Self::WorkedExamples),
            other => Err(ScaffoldError::InvalidLevelRequest(other)),
        }
    }
}

impl TryFrom<i64> for ScaffoldLevel {
    type Error = ScaffoldError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_number(value)
    }
}

impl From<ScaffoldLevel> for u8 {
    fn from(level: ScaffoldLevel) -> Self {
        level.as_u8()
    }
}

impl std::fmt::Display for ScaffoldLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl TopicDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

/// Per-turn input. Every field is optional; missing values are defaulted when
/// the engine resolves the context into [`Signals`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_on_task_seconds: Option<f64>,
    /// Epoch milliseconds; used to derive time on task when it is not supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_proficiency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_frequency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_difficulty: Option<TopicDifficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_level: Option<ScaffoldLevel>,
}

/// Context after defaults are applied, plus the history-derived signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    pub attempts: u32,
    pub time_on_task_seconds: f64,
    pub proficiency: f64,
    pub help_frequency: f64,
    /// Help frequency above the configured high-help threshold.
    pub high_help_seeking: bool,
    pub topic_difficulty: TopicDifficulty,
    pub recent_trend: f64,
    pub success_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Factors {
    pub attempt_score: f64,
    pub time_score: f64,
    pub proficiency_score: f64,
    pub help_score: f64,
    pub trend_score: f64,
    pub difficulty_multiplier: f64,
    pub support_need: f64,
    pub time_at_current_level_ms: i64,
}

/// Which branch of the decision tree produced a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    ExplicitRequest,
    AttemptsLevel3,
    AttemptsLevel2,
    TimeLevel3,
    TimeLevel2,
    LowProficiencyHighNeed,
    LowProficiencyModerateNeed,
    HighSupportNeed,
    ModerateSupportNeed,
    Deescalate,
    Hold,
}

impl DecisionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitRequest => "explicit_request",
            Self::AttemptsLevel3 => "attempts_level3",
            Self::AttemptsLevel2 => "attempts_level2",
            Self::TimeLevel3 => "time_level3",
            Self::TimeLevel2 => "time_level2",
            Self::LowProficiencyHighNeed => "low_proficiency_high_need",
            Self::LowProficiencyModerateNeed => "low_proficiency_moderate_need",
            Self::HighSupportNeed => "high_support_need",
            Self::ModerateSupportNeed => "moderate_support_need",
            Self::Deescalate => "deescalate",
            Self::Hold => "hold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeDirection {
    #[serde(rename = "ESCALATE")]
    Escalate,
    #[serde(rename = "DE-ESCALATE")]
    Deescalate,
    /// An explicit request re-applied the level already in force.
    #[serde(rename = "MAINTAIN")]
    Maintain,
}

impl ChangeDirection {
    pub fn between(from: ScaffoldLevel, to: ScaffoldLevel) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Self::Escalate,
            std::cmp::Ordering::Less => Self::Deescalate,
            std::cmp::Ordering::Equal => Self::Maintain,
        }
    }
}

/// Result of one `decide` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub level: ScaffoldLevel,
    pub previous_level: ScaffoldLevel,
    pub rule: DecisionRule,
    pub signals: Signals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<Factors>,
}

impl Decision {
    pub fn changed(&self) -> bool {
        self.level != self.previous_level
    }
}
