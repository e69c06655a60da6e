use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{filter_fn, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Target carrying decision-log entries and expired-session exports.
pub const RESEARCH_TARGET: &str = "scaffolding::research";

pub struct FileLogGuard {
    _service: WorkerGuard,
    _research: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn is_research_target(target: &str) -> bool {
    target == RESEARCH_TARGET
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber.
///
/// Stdout follows `RUST_LOG`. With `ENABLE_FILE_LOGS`, service logs roll daily
/// into `scaffold.log` under `LOG_DIR`, and the research trail goes to its own
/// `research.log` as JSON lines. The research file records every entry
/// regardless of `RUST_LOG`, and the research target is kept out of the
/// service file.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_filter(env_filter(log_level));

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            eprintln!("failed to create log directory {log_dir}: {err}");
        } else {
            let service_appender =
                RollingFileAppender::new(Rotation::DAILY, &log_dir, "scaffold.log");
            let (service_writer, service_guard) = tracing_appender::non_blocking(service_appender);
            let service_layer = fmt::layer()
                .with_writer(service_writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter(log_level))
                .with_filter(filter_fn(|meta| !is_research_target(meta.target())));

            let research_appender =
                RollingFileAppender::new(Rotation::DAILY, &log_dir, "research.log");
            let (research_writer, research_guard) =
                tracing_appender::non_blocking(research_appender);
            let research_layer = fmt::layer()
                .json()
                .with_writer(research_writer)
                .with_target(false)
                .with_filter(Targets::new().with_target(RESEARCH_TARGET, Level::INFO));

            tracing_subscriber::registry()
                .with(stdout_layer)
                .with(service_layer)
                .with(research_layer)
                .init();

            return Some(FileLogGuard {
                _service: service_guard,
                _research: research_guard,
            });
        }
    }

    tracing_subscriber::registry().with(stdout_layer).init();

    None
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_target_split() {
        assert!(is_research_target("scaffolding::research"));
        assert!(!is_research_target("scaffold_backend::services::session_registry"));
        assert!(!is_research_target("tower_http::trace::on_response"));
    }
}
