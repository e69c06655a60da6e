//! Property-Based Tests for the Scaffolding Engine
//!
//! Tests the following invariants:
//! - Level bounds: every decision lands on level 1, 2 or 3
//! - History bound: performance history never exceeds twenty outcomes
//! - Hard trigger: attempts at or above the level-3 threshold force worked examples
//! - Ranges: proficiency stays in [0, 1] and trend in [-1, 1]
//! - Audit trail: every decision appends START first and never loses entries

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Map;

use scaffold_backend::scaffolding::{
    DecisionEventType, LearningContext, ManualClock, ScaffoldLevel, ScaffoldingConfig,
    ScaffoldingEngine, TopicDifficulty,
};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_f64_0_1() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_topic_difficulty() -> impl Strategy<Value = TopicDifficulty> {
    prop_oneof![
        Just(TopicDifficulty::Easy),
        Just(TopicDifficulty::Medium),
        Just(TopicDifficulty::Hard),
    ]
}

fn arb_scaffold_level() -> impl Strategy<Value = ScaffoldLevel> {
    prop_oneof![
        Just(ScaffoldLevel::Hints),
        Just(ScaffoldLevel::GuidedSteps),
        Just(ScaffoldLevel::WorkedExamples),
    ]
}

fn arb_context() -> impl Strategy<Value = LearningContext> {
    (
        proptest::option::of(0u32..20),                 // attempts
        proptest::option::of(0.0f64..1200.0),          // time on task
        proptest::option::of(arb_f64_0_1()),           // proficiency
        proptest::option::of(0.0f64..3.0),             // help frequency
        proptest::option::of(arb_topic_difficulty()),  // difficulty
        proptest::option::weighted(0.1, arb_scaffold_level()), // explicit request
    )
        .prop_map(
            |(attempts, time_on_task_seconds, student_proficiency, help_frequency, topic_difficulty, requested_level)| {
                LearningContext {
                    attempts,
                    time_on_task_seconds,
                    problem_start_time: None,
                    student_proficiency,
                    help_frequency,
                    topic_difficulty,
                    requested_level,
                }
            },
        )
}

#[derive(Debug, Clone)]
enum Step {
    Determine(LearningContext),
    Outcome(bool),
    Wait(i64),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => arb_context().prop_map(Step::Determine),
        3 => any::<bool>().prop_map(Step::Outcome),
        1 => (0i64..300_000).prop_map(Step::Wait),
    ]
}

fn run(steps: &[Step]) -> (ScaffoldingEngine, Vec<ScaffoldLevel>) {
    let clock = ManualClock::new(1_700_000_000_000);
    let mut engine =
        ScaffoldingEngine::new(ScaffoldingConfig::default()).with_clock(Arc::new(clock.clone()));
    let mut levels = Vec::new();

    for step in steps {
        match step {
            Step::Determine(context) => levels.push(engine.determine_level(context)),
            Step::Outcome(ok) => engine.track_outcome(*ok, Map::new()),
            Step::Wait(ms) => clock.advance_ms(*ms),
        }
    }
    (engine, levels)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_levels_stay_in_range(steps in prop::collection::vec(arb_step(), 1..60)) {
        let (engine, levels) = run(&steps);
        for level in levels {
            prop_assert!((1..=3).contains(&level.as_u8()));
        }
        prop_assert!((1..=3).contains(&engine.current_level().as_u8()));
    }

    #[test]
    fn prop_history_is_bounded(outcomes in prop::collection::vec(any::<bool>(), 0..80)) {
        let steps: Vec<Step> = outcomes.into_iter().map(Step::Outcome).collect();
        let (engine, _) = run(&steps);
        prop_assert!(engine.performance_history().len() <= 20);
    }

    #[test]
    fn prop_attempt_threshold_forces_worked_examples(
        warmup in prop::collection::vec(arb_step(), 0..30),
        context in arb_context(),
        attempts in 4u32..100,
    ) {
        let (mut engine, _) = run(&warmup);
        let context = LearningContext {
            attempts: Some(attempts),
            requested_level: None,
            ..context
        };
        prop_assert_eq!(engine.determine_level(&context), ScaffoldLevel::WorkedExamples);
    }

    #[test]
    fn prop_proficiency_and_trend_ranges(steps in prop::collection::vec(arb_step(), 0..60)) {
        let (engine, _) = run(&steps);
        let proficiency = engine.calculate_proficiency();
        let trend = engine.calculate_recent_trend();
        prop_assert!((0.0..=1.0).contains(&proficiency));
        prop_assert!((-1.0..=1.0).contains(&trend));
    }

    #[test]
    fn prop_support_need_is_normalized(context in arb_context()) {
        let (mut engine, _) = run(&[]);
        let context = LearningContext { requested_level: None, ..context };
        let decision = engine.decide(&context);
        let factors = decision.factors.expect("automatic decisions carry factors");
        prop_assert!((0.0..=1.0).contains(&factors.support_need));
    }

    #[test]
    fn prop_each_decision_starts_with_start_entry(steps in prop::collection::vec(arb_step(), 0..40)) {
        let (engine, levels) = run(&steps);
        let starts = engine
            .decision_log()
            .iter()
            .filter(|e| e.event_type() == DecisionEventType::Start)
            .count();
        prop_assert_eq!(starts, levels.len());
        if let Some(first) = engine.decision_log().first() {
            prop_assert_eq!(first.event_type(), DecisionEventType::Start);
        }
        let changes = engine
            .decision_log()
            .iter()
            .filter(|e| e.event_type() == DecisionEventType::LevelChange)
            .count();
        prop_assert_eq!(changes as u32, engine.level_change_count());
    }
}
