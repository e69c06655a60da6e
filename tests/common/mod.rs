use std::sync::Arc;

use axum::Router;
use scaffold_backend::scaffolding::{MemoryDecisionSink, ScaffoldingConfig};
use scaffold_backend::services::session_registry::SessionRegistry;
use scaffold_backend::state::AppState;

pub fn create_test_app(max_sessions: usize) -> (Router, MemoryDecisionSink) {
    let sink = MemoryDecisionSink::new();
    let registry = SessionRegistry::new(
        ScaffoldingConfig::default(),
        Arc::new(sink.clone()),
        max_sessions,
    );
    let app = scaffold_backend::create_app(AppState::new(Arc::new(registry)));
    (app, sink)
}
