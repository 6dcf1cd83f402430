//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use photoshare_shared::constants::{
    BROADCAST_CAPACITY, DEFAULT_HTTP_PORT, MAX_UPLOAD_SIZE, RECENT_ACTIVITY_LIMIT,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./data/photoshare.db`
    pub database_path: PathBuf,

    /// Directory holding uploaded image files.
    /// Env: `IMAGES_PATH`
    /// Default: `./images`
    pub images_path: PathBuf,

    /// Maximum accepted upload size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 50 MiB
    pub max_upload_size: usize,

    /// Number of entries returned by the recent activity feed.
    /// Env: `ACTIVITY_FEED_LIMIT`
    /// Default: `5`
    pub activity_feed_limit: usize,

    /// Buffered events per live activity subscriber before it starts lagging.
    /// Env: `BROADCAST_CAPACITY`
    /// Default: `256`
    pub broadcast_capacity: usize,

    /// Optional JSON file of accounts to create (without credentials) at
    /// startup.
    /// Env: `SEED_USERS_PATH`
    pub seed_users_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./data/photoshare.db"),
            images_path: PathBuf::from("./images"),
            max_upload_size: MAX_UPLOAD_SIZE,
            activity_feed_limit: RECENT_ACTIVITY_LIMIT,
            broadcast_capacity: BROADCAST_CAPACITY,
            seed_users_path: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("IMAGES_PATH") {
            config.images_path = PathBuf::from(path);
        }

        if let Some(n) = parse_positive(&lookup, "MAX_UPLOAD_SIZE") {
            config.max_upload_size = n;
        }

        if let Some(n) = parse_positive(&lookup, "ACTIVITY_FEED_LIMIT") {
            config.activity_feed_limit = n;
        }

        if let Some(n) = parse_positive(&lookup, "BROADCAST_CAPACITY") {
            config.broadcast_capacity = n;
        }

        if let Some(path) = lookup("SEED_USERS_PATH") {
            if !path.is_empty() {
                config.seed_users_path = Some(PathBuf::from(path));
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 3000).into());
        assert_eq!(config.activity_feed_limit, 5);
        assert!(config.seed_users_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("HTTP_ADDR", "127.0.0.1:8081"),
            ("IMAGES_PATH", "/srv/images"),
            ("ACTIVITY_FEED_LIMIT", "10"),
            ("SEED_USERS_PATH", "seed.json"),
        ]);
        assert_eq!(config.http_addr, ([127, 0, 0, 1], 8081).into());
        assert_eq!(config.images_path, PathBuf::from("/srv/images"));
        assert_eq!(config.activity_feed_limit, 10);
        assert_eq!(config.seed_users_path, Some(PathBuf::from("seed.json")));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_map(&[
            ("HTTP_ADDR", "not-an-address"),
            ("MAX_UPLOAD_SIZE", "-4"),
            ("BROADCAST_CAPACITY", "0"),
        ]);
        let defaults = ServerConfig::default();
        assert_eq!(config.http_addr, defaults.http_addr);
        assert_eq!(config.max_upload_size, defaults.max_upload_size);
        assert_eq!(config.broadcast_capacity, defaults.broadcast_capacity);
    }
}
