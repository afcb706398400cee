/// Session configuration from environment variables
///
/// Controls persisted-record lifetime and where the file-backed store keeps
/// its data. Defaults match the production frontend: 24-hour sessions.
use chrono::Duration;
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// How long a persisted connection record stays valid
    pub session_ttl: Duration,
    /// Base directory for the file-backed local store
    pub storage_dir: PathBuf,
}

impl SessionConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SESSION_TTL_HOURS`: record lifetime in hours (default 24)
    /// - `SESSION_STORAGE_DIR`: base directory for the file store (default "./session-data")
    pub fn from_env() -> Self {
        let ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);

        let storage_dir = env::var("SESSION_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./session-data"));

        log::info!(
            "Session config: ttl={}h, storage_dir={:?}",
            ttl_hours,
            storage_dir
        );

        Self {
            session_ttl: Duration::hours(ttl_hours),
            storage_dir,
        }
    }
}

impl Default for SessionConfig {
    /// Default configuration (24-hour sessions)
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(24),
            storage_dir: PathBuf::from("./session-data"),
        }
    }
}
