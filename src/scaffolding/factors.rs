//! Normalized support-need factors.
//!
//! Each behavioural signal maps onto a [0, 1] score through a step function,
//! then the scores are combined into one weighted support-need value scaled
//! by topic difficulty.

use crate::scaffolding::config::ScaffoldingConfig;
use crate::scaffolding::types::{Factors, Signals};

const ATTEMPT_WEIGHT: f64 = 0.25;
const TIME_WEIGHT: f64 = 0.15;
const PROFICIENCY_WEIGHT: f64 = 0.30;
const HELP_WEIGHT: f64 = 0.15;
const TREND_WEIGHT: f64 = 0.15;

const IMPROVING_TREND: f64 = 0.2;
const DECLINING_TREND: f64 = -0.2;

pub fn attempt_score(attempts: u32) -> f64 {
    match attempts {
        0 => 0.0,
        1 => 0.2,
        2 => 0.5,
        3 => 0.7,
        _ => 1.0,
    }
}

pub fn time_score(seconds: f64) -> f64 {
    if seconds < 60.0 {
        0.0
    } else if seconds < 120.0 {
        0.2
    } else if seconds < 180.0 {
        0.5
    } else if seconds < 300.0 {
        0.7
    } else {
        1.0
    }
}

pub fn proficiency_score(proficiency: f64) -> f64 {
    1.0 - proficiency
}

pub fn help_score(requests_per_minute: f64) -> f64 {
    if requests_per_minute <= 0.0 {
        0.0
    } else if requests_per_minute < 0.2 {
        0.3
    } else if requests_per_minute < 0.5 {
        0.6
    } else {
        1.0
    }
}

pub fn trend_score(trend: f64) -> f64 {
    if trend > IMPROVING_TREND {
        0.0
    } else if trend > DECLINING_TREND {
        0.4
    } else {
        0.8
    }
}

pub fn compute_factors(
    signals: &Signals,
    config: &ScaffoldingConfig,
    time_at_current_level_ms: i64,
) -> Factors {
    let attempt = attempt_score(signals.attempts);
    let time = time_score(signals.time_on_task_seconds);
    let proficiency = proficiency_score(signals.proficiency);
    let help = help_score(signals.help_frequency);
    let trend = trend_score(signals.recent_trend);
    let multiplier = config.difficulty_multiplier(signals.topic_difficulty);

    let weighted = ATTEMPT_WEIGHT * attempt
        + TIME_WEIGHT * time
        + PROFICIENCY_WEIGHT * proficiency
        + HELP_WEIGHT * help
        + TREND_WEIGHT * trend;

    Factors {
        attempt_score: attempt,
        time_score: time,
        proficiency_score: proficiency,
        help_score: help,
        trend_score: trend,
        difficulty_multiplier: multiplier,
        support_need: (weighted * multiplier).min(1.0),
        time_at_current_level_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffolding::types::TopicDifficulty;

    fn signals() -> Signals {
        Signals {
            attempts: 0,
            time_on_task_seconds: 10.0,
            proficiency: 0.7,
            help_frequency: 0.0,
            high_help_seeking: false,
            topic_difficulty: TopicDifficulty::Medium,
            recent_trend: 0.0,
            success_streak: 0,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = ATTEMPT_WEIGHT + TIME_WEIGHT + PROFICIENCY_WEIGHT + HELP_WEIGHT + TREND_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_step_functions() {
        assert_eq!(attempt_score(0), 0.0);
        assert_eq!(attempt_score(1), 0.2);
        assert_eq!(attempt_score(2), 0.5);
        assert_eq!(attempt_score(3), 0.7);
        assert_eq!(attempt_score(12), 1.0);

        assert_eq!(time_score(59.9), 0.0);
        assert_eq!(time_score(60.0), 0.2);
        assert_eq!(time_score(179.0), 0.5);
        assert_eq!(time_score(180.0), 0.7);
        assert_eq!(time_score(300.0), 1.0);

        assert_eq!(help_score(0.0), 0.0);
        assert_eq!(help_score(0.1), 0.3);
        assert_eq!(help_score(0.2), 0.6);
        assert_eq!(help_score(0.5), 1.0);
    }

    #[test]
    fn test_trend_score_boundaries() {
        assert_eq!(trend_score(0.5), 0.0);
        assert_eq!(trend_score(0.2), 0.4);
        assert_eq!(trend_score(-0.19), 0.4);
        assert_eq!(trend_score(-0.2), 0.8);
    }

    #[test]
    fn test_low_need_for_comfortable_student() {
        let factors = compute_factors(&signals(), &ScaffoldingConfig::default(), 0);
        // 0.30 * 0.3 + 0.15 * 0.4
        assert!((factors.support_need - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_clamps_at_one() {
        let s = Signals {
            attempts: 5,
            time_on_task_seconds: 400.0,
            proficiency: 0.0,
            help_frequency: 1.0,
            recent_trend: -1.0,
            topic_difficulty: TopicDifficulty::Hard,
            ..signals()
        };
        let factors = compute_factors(&s, &ScaffoldingConfig::default(), 0);
        assert_eq!(factors.difficulty_multiplier, 1.3);
        assert_eq!(factors.support_need, 1.0);
    }
}
