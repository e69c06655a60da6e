use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_MAX_SESSIONS: usize = 10_000;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub max_sessions: usize,
    pub session_idle_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let max_sessions = std::env::var("MAX_SESSIONS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_SESSIONS);

        let session_idle_ttl_secs = std::env::var("SESSION_IDLE_TTL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_SESSION_IDLE_TTL_SECS);

        Self {
            host,
            port,
            log_level,
            max_sessions,
            session_idle_ttl_secs,
        }
    }

    pub fn session_idle_ttl_ms(&self) -> i64 {
        i64::try_from(self.session_idle_ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 3000,
            log_level: "info".to_string(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_idle_ttl_secs: DEFAULT_SESSION_IDLE_TTL_SECS,
        }
    }
}
