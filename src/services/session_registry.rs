use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::scaffolding::{
    Clock, DecisionSink, ResearchExport, ScaffoldError, ScaffoldingConfig, ScaffoldingEngine,
    SystemClock,
};

pub type SharedEngine = Arc<Mutex<ScaffoldingEngine>>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("session limit reached ({0})")]
    LimitReached(usize),
    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),
}

pub const DEFAULT_IDLE_TTL_MS: i64 = 30 * 60 * 1000;

struct SessionEntry {
    engine: SharedEngine,
    last_touched_ms: AtomicI64,
}

impl SessionEntry {
    fn idle_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_touched_ms.load(Ordering::Relaxed))
    }
}

/// Owns one scaffolding engine per tutoring session.
///
/// Each engine sits behind its own mutex, so calls within a session are
/// serialized while different sessions proceed independently. The map lock
/// is only held for lookups and inserts.
///
/// Sessions untouched for longer than the idle TTL are swept on `create`;
/// their research exports are emitted on the `scaffolding::research` target.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    default_config: ScaffoldingConfig,
    sink: Arc<dyn DecisionSink>,
    clock: Arc<dyn Clock>,
    max_sessions: usize,
    idle_ttl_ms: i64,
    last_sweep_ms: AtomicI64,
}

impl SessionRegistry {
    pub fn new(
        default_config: ScaffoldingConfig,
        sink: Arc<dyn DecisionSink>,
        max_sessions: usize,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now_ms();
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_config,
            sink,
            clock,
            max_sessions,
            idle_ttl_ms: DEFAULT_IDLE_TTL_MS,
            last_sweep_ms: AtomicI64::new(now),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.last_sweep_ms = AtomicI64::new(clock.now_ms());
        self.clock = clock;
        self
    }

    pub fn with_idle_ttl_ms(mut self, idle_ttl_ms: i64) -> Self {
        self.idle_ttl_ms = idle_ttl_ms.max(1);
        self
    }

    pub fn default_config(&self) -> &ScaffoldingConfig {
        &self.default_config
    }

    pub fn idle_ttl_ms(&self) -> i64 {
        self.idle_ttl_ms
    }

    /// Starts a session, optionally with an experiment-specific config.
    pub fn create(
        &self,
        config: Option<ScaffoldingConfig>,
    ) -> Result<(String, SharedEngine), SessionError> {
        let config = config.unwrap_or_else(|| self.default_config.clone());
        config.validate()?;

        let now = self.clock.now_ms();
        let since_sweep = now.saturating_sub(self.last_sweep_ms.load(Ordering::Relaxed));
        let sweep_due = since_sweep >= self.idle_ttl_ms;
        if sweep_due || self.len() >= self.max_sessions {
            self.sweep_idle();
        }

        let session_id = Uuid::new_v4().to_string();
        let engine = ScaffoldingEngine::new(config)
            .with_session_id(session_id.clone())
            .with_clock(Arc::clone(&self.clock))
            .with_sink(Arc::clone(&self.sink));
        let shared = Arc::new(Mutex::new(engine));

        {
            let mut sessions = self.sessions.write();
            if sessions.len() >= self.max_sessions {
                return Err(SessionError::LimitReached(self.max_sessions));
            }
            sessions.insert(
                session_id.clone(),
                SessionEntry {
                    engine: Arc::clone(&shared),
                    last_touched_ms: AtomicI64::new(now),
                },
            );
        }

        info!(session_id = %session_id, "scaffolding session started");
        Ok((session_id, shared))
    }

    /// Looks up a session and marks it as active.
    pub fn get(&self, session_id: &str) -> Result<SharedEngine, SessionError> {
        let sessions = self.sessions.read();
        let entry = sessions
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        entry
            .last_touched_ms
            .store(self.clock.now_ms(), Ordering::Relaxed);
        Ok(Arc::clone(&entry.engine))
    }

    /// Ends a session and hands back its research export.
    pub fn end(&self, session_id: &str) -> Result<ResearchExport, SessionError> {
        let entry = self
            .sessions
            .write()
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        let export = entry.engine.lock().export_for_research();
        info!(
            session_id = %session_id,
            interactions = export.summary.total_interactions,
            level_changes = export.summary.total_level_changes,
            "scaffolding session ended"
        );
        Ok(export)
    }

    /// Drops sessions idle for at least the TTL. Returns how many were removed.
    pub fn sweep_idle(&self) -> usize {
        let now = self.clock.now_ms();
        let ttl = self.idle_ttl_ms;
        self.last_sweep_ms.store(now, Ordering::Relaxed);

        let expired: Vec<(String, SharedEngine)> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<String> = sessions
                .iter()
                .filter(|(_, entry)| entry.idle_ms(now) >= ttl)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|entry| (id, entry.engine)))
                .collect()
        };

        for (session_id, engine) in &expired {
            let export = engine.lock().export_for_research();
            let payload = match serde_json::to_string(&export) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "serialize session export failed");
                    String::new()
                }
            };
            info!(
                target: "scaffolding::research",
                session_id = %session_id,
                interactions = export.summary.total_interactions,
                level_changes = export.summary.total_level_changes,
                %payload,
                "scaffolding session expired"
            );
        }

        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffolding::{LearningContext, ManualClock, MemoryDecisionSink, ScaffoldLevel};

    fn make_registry(max_sessions: usize) -> (SessionRegistry, MemoryDecisionSink) {
        let sink = MemoryDecisionSink::new();
        let registry = SessionRegistry::new(
            ScaffoldingConfig::default(),
            Arc::new(sink.clone()),
            max_sessions,
        );
        (registry, sink)
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (registry, sink) = make_registry(10);
        let (a, engine_a) = registry.create(None).unwrap();
        let (b, _) = registry.create(None).unwrap();

        engine_a.lock().determine_level(&LearningContext {
            attempts: Some(4),
            ..Default::default()
        });

        assert_eq!(
            registry.get(&a).unwrap().lock().current_level(),
            ScaffoldLevel::WorkedExamples
        );
        assert_eq!(registry.get(&b).unwrap().lock().current_level(), ScaffoldLevel::Hints);
        assert_eq!(sink.entries_for(&a).len(), 3);
        assert!(sink.entries_for(&b).is_empty());
    }

    #[test]
    fn test_limit_and_invalid_config() {
        let (registry, _) = make_registry(1);
        registry.create(None).unwrap();
        assert!(matches!(registry.create(None), Err(SessionError::LimitReached(1))));

        let (registry, _) = make_registry(5);
        let bad = ScaffoldingConfig {
            attempts_for_level2: 9,
            attempts_for_level3: 1,
            ..Default::default()
        };
        assert!(matches!(registry.create(Some(bad)), Err(SessionError::Scaffold(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_end_removes_session() {
        let (registry, _) = make_registry(5);
        let (id, _) = registry.create(None).unwrap();

        let export = registry.end(&id).unwrap();
        assert_eq!(export.summary.current_level, ScaffoldLevel::Hints);
        assert!(matches!(registry.get(&id), Err(SessionError::NotFound(_))));
        assert!(matches!(registry.end(&id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_idle_sessions_are_swept_when_full() {
        let clock = ManualClock::new(1_700_000_000_000);
        let (registry, _) = make_registry(3);
        let registry = registry
            .with_clock(Arc::new(clock.clone()))
            .with_idle_ttl_ms(60_000);

        let (stale, _) = registry.create(None).unwrap();
        registry.create(None).unwrap();
        clock.advance_ms(30_000);
        let (fresh, _) = registry.create(None).unwrap();
        assert!(matches!(registry.create(None), Err(SessionError::LimitReached(3))));

        clock.advance_ms(30_000);
        let (replacement, _) = registry.create(None).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(matches!(registry.get(&stale), Err(SessionError::NotFound(_))));
        assert!(registry.get(&fresh).is_ok());
        assert!(registry.get(&replacement).is_ok());
    }

    #[test]
    fn test_get_keeps_session_alive() {
        let clock = ManualClock::new(1_700_000_000_000);
        let (registry, _) = make_registry(10);
        let registry = registry
            .with_clock(Arc::new(clock.clone()))
            .with_idle_ttl_ms(60_000);

        let (active, _) = registry.create(None).unwrap();
        let (idle, _) = registry.create(None).unwrap();
        clock.advance_ms(45_000);
        registry.get(&active).unwrap();
        clock.advance_ms(45_000);

        assert_eq!(registry.sweep_idle(), 1);
        assert!(registry.get(&active).is_ok());
        assert!(matches!(registry.get(&idle), Err(SessionError::NotFound(_))));
    }
}
