//! Server configuration read from the environment (and `.env`, via `dotenv`).
//!
//! Every field has a default so a bare `cargo run` serves on port 8080 with a
//! local SQLite file.

use std::{net::SocketAddr, time::Duration};

use crate::relay::Heartbeat;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Env: `BIND_ADDR`. Default: `0.0.0.0:8080`
    pub bind_addr: SocketAddr,

    /// Env: `DATABASE_URL`. Default: `sqlite://socialhub.db?mode=rwc`
    pub database_url: String,

    /// Env: `DB_MAX_CONNECTIONS`. Default: `16`
    pub db_max_connections: u32,

    /// Minutes of inactivity before a login session expires.
    /// Env: `SESSION_IDLE_MINUTES`. Default: `30`
    pub session_idle_minutes: i64,

    /// Env: `SECURE_COOKIES` (true/false). Default: `false`
    pub secure_cookies: bool,

    /// Seconds between relay pings. Env: `PING_INTERVAL_SECS`. Default: `30`
    pub ping_interval_secs: u64,

    /// Seconds a relay client may stay silent after a ping before it is
    /// dropped. Env: `PONG_TIMEOUT_SECS`. Default: `10`
    pub pong_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            database_url: "sqlite://socialhub.db?mode=rwc".to_owned(),
            db_max_connections: 16,
            session_idle_minutes: 30,
            secure_cookies: false,
            ping_interval_secs: 30,
            pong_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            match addr.parse() {
                Ok(parsed) => config.bind_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid BIND_ADDR, using default"),
            }
        }

        if let Some(url) = lookup("DATABASE_URL") {
            if !url.is_empty() {
                config.database_url = url;
            }
        }

        if let Some(val) = lookup("DB_MAX_CONNECTIONS") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.db_max_connections = n,
                _ => tracing::warn!(value = %val, "Invalid DB_MAX_CONNECTIONS, using default"),
            }
        }

        if let Some(val) = lookup("SESSION_IDLE_MINUTES") {
            match val.parse::<i64>() {
                Ok(n) if n > 0 => config.session_idle_minutes = n,
                _ => tracing::warn!(value = %val, "Invalid SESSION_IDLE_MINUTES, using default"),
            }
        }

        if let Some(val) = lookup("SECURE_COOKIES") {
            match parse_flag(&val) {
                Some(flag) => config.secure_cookies = flag,
                None => tracing::warn!(value = %val, "Invalid SECURE_COOKIES, using default"),
            }
        }

        if let Some(val) = lookup("PING_INTERVAL_SECS") {
            match val.parse::<u64>() {
                Ok(n) if n > 0 => config.ping_interval_secs = n,
                _ => tracing::warn!(value = %val, "Invalid PING_INTERVAL_SECS, using default"),
            }
        }

        if let Some(val) = lookup("PONG_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(n) if n > 0 => config.pong_timeout_secs = n,
                _ => tracing::warn!(value = %val, "Invalid PONG_TIMEOUT_SECS, using default"),
            }
        }

        config
    }

    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            interval: Duration::from_secs(self.ping_interval_secs),
            timeout: Duration::from_secs(self.pong_timeout_secs),
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.db_max_connections, 16);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("SESSION_IDLE_MINUTES", "5"),
            ("SECURE_COOKIES", "true"),
            ("PING_INTERVAL_SECS", "15"),
        ]));
        assert_eq!(config.bind_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.session_idle_minutes, 5);
        assert!(config.secure_cookies);
        assert_eq!(config.heartbeat().interval, Duration::from_secs(15));
        assert_eq!(config.heartbeat().timeout, Duration::from_secs(10));
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("BIND_ADDR", "not an address"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("SESSION_IDLE_MINUTES", "soon"),
            ("PONG_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config.bind_addr, ServerConfig::default().bind_addr);
        assert_eq!(config.db_max_connections, 16);
        assert_eq!(config.session_idle_minutes, 30);
        assert_eq!(config.pong_timeout_secs, 10);
    }

    #[test]
    fn secure_cookies_rejects_unknown_words() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("yes"), None);

        let config = ServerConfig::from_lookup(lookup_from(&[("SECURE_COOKIES", "yes")]));
        assert!(!config.secure_cookies);
    }
}
