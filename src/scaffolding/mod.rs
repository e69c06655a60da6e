//! Adaptive scaffolding: picks hints, guided steps or worked examples for a
//! student from behavioural signals, with hysteresis on de-escalation and a
//! full decision audit trail.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod factors;
pub mod history;
pub mod log;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ScaffoldingConfig;
pub use engine::ScaffoldingEngine;
pub use error::ScaffoldError;
pub use export::{LevelDistribution, ResearchExport, SessionSummary};
pub use history::{Outcome, PerformanceHistory};
pub use log::{DecisionEventType, DecisionLogEntry, DecisionSink, MemoryDecisionSink, TracingDecisionSink};
pub use types::*;
