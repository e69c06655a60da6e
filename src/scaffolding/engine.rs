use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::scaffolding::clock::{Clock, SystemClock};
use crate::scaffolding::config::ScaffoldingConfig;
use crate::scaffolding::export::{LevelDistribution, ResearchExport, SessionSummary};
use crate::scaffolding::factors::compute_factors;
use crate::scaffolding::history::{Outcome, PerformanceHistory};
use crate::scaffolding::log::{DecisionEvent, DecisionLogEntry, DecisionSink};
use crate::scaffolding::types::{
    ChangeDirection, Decision, DecisionRule, Factors, LearningContext, ScaffoldLevel, Signals,
};

const HIGH_NEED: f64 = 0.7;
const MODERATE_NEED: f64 = 0.5;
const LOW_PROFICIENCY_ESCALATE_NEED: f64 = 0.4;
const DEESCALATE_MAX_NEED: f64 = 0.3;

/// Per-session scaffolding state machine.
///
/// One engine serves exactly one tutoring session. Operations take `&mut self`
/// so callers sharing an engine must serialize access.
pub struct ScaffoldingEngine {
    session_id: String,
    config: ScaffoldingConfig,
    clock: Arc<dyn Clock>,
    sink: Option<Arc<dyn DecisionSink>>,
    current_level: ScaffoldLevel,
    last_level_change: Option<i64>,
    level_change_count: u32,
    session_start: i64,
    performance: PerformanceHistory,
    decision_log: Vec<DecisionLogEntry>,
}

impl std::fmt::Debug for ScaffoldingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScaffoldingEngine")
            .field("session_id", &self.session_id)
            .field("current_level", &self.current_level)
            .field("level_change_count", &self.level_change_count)
            .field("outcomes", &self.performance.len())
            .field("log_entries", &self.decision_log.len())
            .finish_non_exhaustive()
    }
}

impl Default for ScaffoldingEngine {
    fn default() -> Self {
        Self::new(ScaffoldingConfig::default())
    }
}

impl ScaffoldingEngine {
    pub fn new(config: ScaffoldingConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let session_start = clock.now_ms();
        Self {
            session_id: Uuid::new_v4().to_string(),
            config,
            clock,
            sink: None,
            current_level: ScaffoldLevel::Hints,
            last_level_change: None,
            level_change_count: 0,
            session_start,
            performance: PerformanceHistory::new(),
            decision_log: Vec::new(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Replaces the time source and restarts the session clock from it.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.session_start = clock.now_ms();
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &ScaffoldingConfig {
        &self.config
    }

    pub fn current_level(&self) -> ScaffoldLevel {
        self.current_level
    }

    pub fn level_change_count(&self) -> u32 {
        self.level_change_count
    }

    pub fn last_level_change(&self) -> Option<i64> {
        self.last_level_change
    }

    pub fn session_start(&self) -> i64 {
        self.session_start
    }

    pub fn decision_log(&self) -> &[DecisionLogEntry] {
        &self.decision_log
    }

    pub fn performance_history(&self) -> &PerformanceHistory {
        &self.performance
    }

    pub fn determine_level(&mut self, context: &LearningContext) -> ScaffoldLevel {
        self.decide(context).level
    }

    /// Runs one scaffolding decision and returns the full reasoning.
    pub fn decide(&mut self, context: &LearningContext) -> Decision {
        self.append(DecisionEvent::Start {
            context: context.clone(),
        });

        let previous_level = self.current_level;
        let signals = self.resolve_signals(context);

        if let Some(requested) = context.requested_level {
            self.change_level(requested, DecisionRule::ExplicitRequest, None);
            self.append(DecisionEvent::ExplicitRequest {
                requested_level: requested,
                previous_level,
            });
            return Decision {
                level: self.current_level,
                previous_level,
                rule: DecisionRule::ExplicitRequest,
                signals,
                factors: None,
            };
        }

        let factors = compute_factors(&signals, &self.config, self.time_at_current_level_ms());
        let (level, rule) = self.apply_rules(&signals, &factors);

        if level != self.current_level {
            self.change_level(level, rule, Some(factors.clone()));
        }

        self.append(DecisionEvent::Determine {
            level: self.current_level,
            rule,
            signals: signals.clone(),
            factors: factors.clone(),
        });

        Decision {
            level: self.current_level,
            previous_level,
            rule,
            signals,
            factors: Some(factors),
        }
    }

    /// Moves to `level` and logs a LEVEL_CHANGE. Always restarts the dwell
    /// timer and counts as a change, even when `level` is already in force.
    pub fn change_level(
        &mut self,
        level: ScaffoldLevel,
        reason: DecisionRule,
        factors: Option<Factors>,
    ) {
        let from = self.current_level;
        self.current_level = level;
        self.level_change_count += 1;
        self.last_level_change = Some(self.clock.now_ms());

        debug!(
            session_id = %self.session_id,
            from = from.as_u8(),
            to = level.as_u8(),
            reason = reason.as_str(),
            "scaffolding level changed"
        );

        self.append(DecisionEvent::LevelChange {
            from,
            to: level,
            direction: ChangeDirection::between(from, level),
            reason,
            factors,
        });
    }

    pub fn track_outcome(&mut self, successful: bool, metadata: Map<String, Value>) {
        let outcome = Outcome::new(successful, self.current_level, self.clock.now_ms(), metadata);
        self.performance.push(outcome);
    }

    pub fn calculate_proficiency(&self) -> f64 {
        self.performance.proficiency()
    }

    pub fn calculate_recent_trend(&self) -> f64 {
        self.performance.recent_trend()
    }

    pub fn recent_success_streak(&self) -> u32 {
        self.performance.success_streak()
    }

    pub fn time_at_current_level_ms(&self) -> i64 {
        let since = self.last_level_change.unwrap_or(self.session_start);
        self.clock.now_ms().saturating_sub(since)
    }

    pub fn should_deescalate(&self, signals: &Signals, factors: &Factors) -> bool {
        if factors.time_at_current_level_ms < self.config.min_time_at_level_ms {
            return false;
        }

        signals.proficiency > self.config.high_proficiency_threshold
            && signals.success_streak >= self.config.success_streak_for_deescalate
            && factors.support_need < DEESCALATE_MAX_NEED
            && self.current_level > ScaffoldLevel::Hints
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            current_level: self.current_level,
            total_level_changes: self.level_change_count,
            total_interactions: self.decision_log.len(),
            proficiency: self.calculate_proficiency(),
            trend: self.calculate_recent_trend(),
            success_rate: self.performance.success_rate(),
            session_duration: self.clock.now_ms().saturating_sub(self.session_start),
            level_distribution: LevelDistribution::from_log(&self.decision_log),
        }
    }

    pub fn export_for_research(&self) -> ResearchExport {
        ResearchExport {
            config: self.config.clone(),
            summary: self.summary(),
            history: self.decision_log.clone(),
            performance_history: self.performance.iter().cloned().collect(),
            export_timestamp: self.clock.now_ms(),
        }
    }

    /// Returns the engine to session-start state. Config, clock and sink are kept.
    pub fn reset(&mut self) {
        self.current_level = ScaffoldLevel::Hints;
        self.last_level_change = None;
        self.level_change_count = 0;
        self.session_start = self.clock.now_ms();
        self.performance.clear();
        self.decision_log.clear();
        debug!(session_id = %self.session_id, "scaffolding engine reset");
    }

    fn resolve_signals(&self, context: &LearningContext) -> Signals {
        let time_on_task_seconds = match context.time_on_task_seconds {
            Some(secs) if secs.is_finite() => secs.max(0.0),
            _ => context
                .problem_start_time
                .map(|start| self.clock.now_ms().saturating_sub(start).max(0) as f64 / 1000.0)
                .unwrap_or(0.0),
        };

        let proficiency = context
            .student_proficiency
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0))
            .unwrap_or_else(|| self.calculate_proficiency());

        let help_frequency = context
            .help_frequency
            .filter(|h| h.is_finite())
            .map(|h| h.max(0.0))
            .unwrap_or(0.0);

        Signals {
            attempts: context.attempts.unwrap_or(0),
            time_on_task_seconds,
            proficiency,
            help_frequency,
            high_help_seeking: help_frequency > self.config.high_help_frequency,
            topic_difficulty: context.topic_difficulty.unwrap_or_default(),
            recent_trend: self.calculate_recent_trend(),
            success_streak: self.recent_success_streak(),
        }
    }

    /// Decision tree; the first matching rule wins. Hard attempt and time
    /// triggers are checked before the composite score.
    fn apply_rules(&self, signals: &Signals, factors: &Factors) -> (ScaffoldLevel, DecisionRule) {
        let config = &self.config;
        let current = self.current_level;
        let at_hints = current == ScaffoldLevel::Hints;
        let need = factors.support_need;

        if signals.attempts >= config.attempts_for_level3 {
            return (ScaffoldLevel::WorkedExamples, DecisionRule::AttemptsLevel3);
        }
        if signals.attempts >= config.attempts_for_level2 && at_hints {
            return (ScaffoldLevel::GuidedSteps, DecisionRule::AttemptsLevel2);
        }
        if signals.time_on_task_seconds >= config.time_for_level3_secs {
            return (ScaffoldLevel::WorkedExamples, DecisionRule::TimeLevel3);
        }
        if signals.time_on_task_seconds >= config.time_for_level2_secs && at_hints {
            return (ScaffoldLevel::GuidedSteps, DecisionRule::TimeLevel2);
        }
        if signals.proficiency < config.low_proficiency_threshold {
            if need > HIGH_NEED {
                return (ScaffoldLevel::WorkedExamples, DecisionRule::LowProficiencyHighNeed);
            }
            if need > LOW_PROFICIENCY_ESCALATE_NEED && at_hints {
                return (ScaffoldLevel::GuidedSteps, DecisionRule::LowProficiencyModerateNeed);
            }
        }
        if need > HIGH_NEED {
            return (current.escalated(), DecisionRule::HighSupportNeed);
        }
        if need > MODERATE_NEED && at_hints {
            return (ScaffoldLevel::GuidedSteps, DecisionRule::ModerateSupportNeed);
        }
        if self.should_deescalate(signals, factors) {
            return (current.deescalated(), DecisionRule::Deescalate);
        }

        (current, DecisionRule::Hold)
    }

    fn append(&mut self, event: DecisionEvent) {
        let entry = DecisionLogEntry {
            timestamp: self.clock.now_ms(),
            current_level: self.current_level,
            event,
        };
        if let Some(sink) = &self.sink {
            sink.record(&self.session_id, &entry);
        }
        self.decision_log.push(entry);
    }
}
