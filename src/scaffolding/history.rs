use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scaffolding::types::ScaffoldLevel;

pub const PERFORMANCE_HISTORY_CAPACITY: usize = 20;
pub const DEFAULT_PROFICIENCY: f64 = 0.7;
const MIN_TREND_SAMPLES: usize = 4;

const RESERVED_KEYS: [&str; 3] = ["successful", "level", "timestamp"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub successful: bool,
    pub level: ScaffoldLevel,
    pub timestamp: i64,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Outcome {
    /// Metadata keys that collide with the record's own fields are dropped.
    pub fn new(successful: bool, level: ScaffoldLevel, timestamp: i64, mut metadata: Map<String, Value>) -> Self {
        for key in RESERVED_KEYS {
            metadata.remove(key);
        }
        Self {
            successful,
            level,
            timestamp,
            metadata,
        }
    }
}

/// Bounded FIFO of the most recent problem outcomes, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceHistory {
    outcomes: VecDeque<Outcome>,
}

impl PerformanceHistory {
    pub fn new() -> Self {
        Self {
            outcomes: VecDeque::with_capacity(PERFORMANCE_HISTORY_CAPACITY + 1),
        }
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push_back(outcome);
        while self.outcomes.len() > PERFORMANCE_HISTORY_CAPACITY {
            self.outcomes.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
    }

    /// Recency-weighted success rate: the i-th oldest outcome has weight i.
    pub fn proficiency(&self) -> f64 {
        if self.outcomes.is_empty() {
            return DEFAULT_PROFICIENCY;
        }

        let (weighted, total) = self
            .outcomes
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(weighted, total), (i, outcome)| {
                let weight = (i + 1) as f64;
                let hit = if outcome.successful { 1.0 } else { 0.0 };
                (weighted + weight * hit, total + weight)
            });

        weighted / total
    }

    /// Success rate of the newer half minus that of the older half.
    pub fn recent_trend(&self) -> f64 {
        if self.outcomes.len() < MIN_TREND_SAMPLES {
            return 0.0;
        }

        let mid = self.outcomes.len() / 2;
        let earlier = success_rate(self.outcomes.range(..mid));
        let recent = success_rate(self.outcomes.range(mid..));
        recent - earlier
    }

    pub fn success_streak(&self) -> u32 {
        self.outcomes
            .iter()
            .rev()
            .take_while(|outcome| outcome.successful)
            .count() as u32
    }

    pub fn success_rate(&self) -> f64 {
        let successes = self.outcomes.iter().filter(|o| o.successful).count();
        successes as f64 / self.outcomes.len().max(1) as f64
    }
}

fn success_rate<'a>(outcomes: impl ExactSizeIterator<Item = &'a Outcome>) -> f64 {
    let len = outcomes.len();
    if len == 0 {
        return 0.0;
    }
    let successes = outcomes.filter(|o| o.successful).count();
    successes as f64 / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(results: &[bool]) -> PerformanceHistory {
        let mut history = PerformanceHistory::new();
        for (i, &ok) in results.iter().enumerate() {
            history.push(Outcome::new(ok, ScaffoldLevel::Hints, i as i64, Map::new()));
        }
        history
    }

    #[test]
    fn test_empty_defaults() {
        let history = PerformanceHistory::new();
        assert_eq!(history.proficiency(), 0.7);
        assert_eq!(history.recent_trend(), 0.0);
        assert_eq!(history.success_streak(), 0);
        assert_eq!(history.success_rate(), 0.0);
    }

    #[test]
    fn test_recency_weighting() {
        let late_success = history_of(&[false, false, false, true]);
        assert!((late_success.proficiency() - 0.4).abs() < 1e-9);
        assert!(late_success.proficiency() > 0.25);

        let early_success = history_of(&[true, false, false, false]);
        assert!((early_success.proficiency() - 0.1).abs() < 1e-9);
        assert!(early_success.proficiency() < 0.25);
    }

    #[test]
    fn test_trend_needs_four_samples() {
        assert_eq!(history_of(&[false, true, true]).recent_trend(), 0.0);
        assert_eq!(history_of(&[false, false, true, true]).recent_trend(), 1.0);
        assert_eq!(history_of(&[true, true, false, false]).recent_trend(), -1.0);
    }

    #[test]
    fn test_trend_odd_length_splits_at_floor() {
        // earlier = [F, T] (0.5), recent = [T, T, F] (2/3)
        let trend = history_of(&[false, true, true, true, false]).recent_trend();
        assert!((trend - (2.0 / 3.0 - 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_success_streak_stops_at_failure() {
        assert_eq!(history_of(&[true, false, true, true]).success_streak(), 2);
        assert_eq!(history_of(&[true, true, true]).success_streak(), 3);
        assert_eq!(history_of(&[true, true, false]).success_streak(), 0);
    }

    #[test]
    fn test_capacity_is_fifo() {
        let mut history = PerformanceHistory::new();
        for i in 0..25 {
            history.push(Outcome::new(true, ScaffoldLevel::Hints, i, Map::new()));
        }
        assert_eq!(history.len(), PERFORMANCE_HISTORY_CAPACITY);
        let timestamps: Vec<i64> = history.iter().map(|o| o.timestamp).collect();
        assert_eq!(timestamps, (5..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_reserved_metadata_keys_dropped() {
        let mut metadata = Map::new();
        metadata.insert("level".to_string(), Value::from(9));
        metadata.insert("problemId".to_string(), Value::from("p-1"));
        let outcome = Outcome::new(false, ScaffoldLevel::GuidedSteps, 10, metadata);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["level"], 2);
        assert_eq!(json["problemId"], "p-1");
    }
}
