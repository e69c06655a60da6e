use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::scaffolding::types::{
    ChangeDirection, DecisionRule, Factors, LearningContext, ScaffoldLevel, Signals,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionEventType {
    Start,
    Determine,
    ExplicitRequest,
    LevelChange,
}

impl DecisionEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Determine => "DETERMINE",
            Self::ExplicitRequest => "EXPLICIT_REQUEST",
            Self::LevelChange => "LEVEL_CHANGE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionEvent {
    Start {
        context: LearningContext,
    },
    #[serde(rename_all = "camelCase")]
    Determine {
        level: ScaffoldLevel,
        rule: DecisionRule,
        signals: Signals,
        factors: Factors,
    },
    #[serde(rename_all = "camelCase")]
    ExplicitRequest {
        requested_level: ScaffoldLevel,
        previous_level: ScaffoldLevel,
    },
    #[serde(rename_all = "camelCase")]
    LevelChange {
        from: ScaffoldLevel,
        to: ScaffoldLevel,
        direction: ChangeDirection,
        reason: DecisionRule,
        #[serde(skip_serializing_if = "Option::is_none")]
        factors: Option<Factors>,
    },
}

impl DecisionEvent {
    pub fn event_type(&self) -> DecisionEventType {
        match self {
            Self::Start { .. } => DecisionEventType::Start,
            Self::Determine { .. } => DecisionEventType::Determine,
            Self::ExplicitRequest { .. } => DecisionEventType::ExplicitRequest,
            Self::LevelChange { .. } => DecisionEventType::LevelChange,
        }
    }
}

/// One audit-trail record. `current_level` is the level in force when the
/// entry was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionLogEntry {
    pub timestamp: i64,
    pub current_level: ScaffoldLevel,
    #[serde(flatten)]
    pub event: DecisionEvent,
}

impl DecisionLogEntry {
    pub fn event_type(&self) -> DecisionEventType {
        self.event.event_type()
    }
}

/// Receives every decision-log entry as the engine appends it.
pub trait DecisionSink: Send + Sync {
    fn record(&self, session_id: &str, entry: &DecisionLogEntry);
}

/// Emits entries as structured tracing events on the research target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDecisionSink;

impl DecisionSink for TracingDecisionSink {
    fn record(&self, session_id: &str, entry: &DecisionLogEntry) {
        let payload = serde_json::to_string(entry).unwrap_or_default();
        tracing::info!(
            target: "scaffolding::research",
            session_id,
            event_type = entry.event_type().as_str(),
            level = entry.current_level.as_u8(),
            timestamp = entry.timestamp,
            %payload,
            "scaffolding decision"
        );
    }
}

/// Collects entries in memory, keyed by session.
#[derive(Debug, Clone, Default)]
pub struct MemoryDecisionSink {
    entries: Arc<Mutex<Vec<(String, DecisionLogEntry)>>>,
}

impl MemoryDecisionSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, DecisionLogEntry)> {
        self.entries.lock().clone()
    }

    pub fn entries_for(&self, session_id: &str) -> Vec<DecisionLogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|(id, _)| id == session_id)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DecisionSink for MemoryDecisionSink {
    fn record(&self, session_id: &str, entry: &DecisionLogEntry) {
        self.entries.lock().push((session_id.to_string(), entry.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> DecisionLogEntry {
        DecisionLogEntry {
            timestamp: 1_700_000_000_000,
            current_level: ScaffoldLevel::GuidedSteps,
            event: DecisionEvent::LevelChange {
                from: ScaffoldLevel::Hints,
                to: ScaffoldLevel::GuidedSteps,
                direction: ChangeDirection::Escalate,
                reason: DecisionRule::AttemptsLevel2,
                factors: None,
            },
        }
    }

    #[test]
    fn test_entry_serializes_flat_with_event_type() {
        let json = serde_json::to_value(sample_entry()).unwrap();
        assert_eq!(json["eventType"], "LEVEL_CHANGE");
        assert_eq!(json["currentLevel"], 2);
        assert_eq!(json["direction"], "ESCALATE");
        assert_eq!(json["reason"], "attempts_level2");
        assert!(json.get("factors").is_none());
    }

    #[test]
    fn test_memory_sink_filters_by_session() {
        let sink = MemoryDecisionSink::new();
        sink.record("a", &sample_entry());
        sink.record("b", &sample_entry());
        sink.record("a", &sample_entry());

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.entries_for("a").len(), 2);
        assert_eq!(sink.entries_for("b")[0].event_type(), DecisionEventType::LevelChange);
    }
}
