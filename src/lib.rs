pub mod config;
pub mod logging;
pub mod response;
pub mod routes;
pub mod scaffolding;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::scaffolding::{DecisionSink, TracingDecisionSink};
use crate::state::AppState;

/// Wraps the routes in the HTTP tracing and CORS layers.
pub fn create_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn default_sink() -> Arc<dyn DecisionSink> {
    Arc::new(TracingDecisionSink)
}
