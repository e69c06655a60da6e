use std::sync::Arc;

use scaffold_backend::config::Config;
use scaffold_backend::logging::init_tracing;
use scaffold_backend::scaffolding::ScaffoldingConfig;
use scaffold_backend::services::session_registry::SessionRegistry;
use scaffold_backend::state::AppState;
use scaffold_backend::{create_app, default_sink};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let scaffolding_config = ScaffoldingConfig::from_env();
    tracing::info!(
        attempts_for_level2 = scaffolding_config.attempts_for_level2,
        attempts_for_level3 = scaffolding_config.attempts_for_level3,
        min_time_at_level_ms = scaffolding_config.min_time_at_level_ms,
        max_sessions = config.max_sessions,
        session_idle_ttl_secs = config.session_idle_ttl_secs,
        "scaffolding config loaded"
    );

    let registry = Arc::new(
        SessionRegistry::new(scaffolding_config, default_sink(), config.max_sessions)
            .with_idle_ttl_ms(config.session_idle_ttl_ms()),
    );
    let app = create_app(AppState::new(Arc::clone(&registry)));

    let addr = config.bind_addr();
    tracing::info!(%addr, "scaffold-backend listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "bind listener failed");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!(
        active_sessions = registry.len(),
        "HTTP server stopped, discarding active sessions"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
