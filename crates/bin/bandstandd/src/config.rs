//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `bandstand.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use chrono::Duration;
use serde::Deserialize;

use bandstand_app::services::auth_service::DEFAULT_SESSION_TTL_HOURS;

/// Longest accepted session lifetime (one year).
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Session settings.
    pub auth: AuthConfig,
    /// WebSocket fan-out settings.
    pub realtime: RealtimeConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Login session configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Hours a bearer token stays valid after login.
    pub session_ttl_hours: i64,
}

/// Real-time channel configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Notifications queued per connection before new ones are dropped.
    pub connection_buffer: usize,
}

impl Config {
    /// Load configuration from `bandstand.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("bandstand.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("BANDSTAND_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("BANDSTAND_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(bind) = var("BANDSTAND_BIND")
            && let Some((host, port)) = bind.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("BANDSTAND_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("BANDSTAND_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(hours) = var("BANDSTAND_SESSION_TTL_HOURS").and_then(|val| val.parse().ok()) {
            self.auth.session_ttl_hours = hours;
        }
        if let Some(size) = var("BANDSTAND_CONNECTION_BUFFER").and_then(|val| val.parse().ok()) {
            self.realtime.connection_buffer = size;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::Validation(format!(
                "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}"
            )));
        }
        if self.realtime.connection_buffer == 0 {
            return Err(ConfigError::Validation(
                "connection_buffer must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Return how long a login session lasts.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.auth.session_ttl_hours)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:bandstand.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "bandstandd=info,bandstand=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connection_buffer: 64,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn overridden(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.url, "sqlite:bandstand.db?mode=rwc");
        assert_eq!(config.auth.session_ttl_hours, 24);
        assert_eq!(config.realtime.connection_buffer, 64);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [auth]
            session_ttl_hours = 2

            [realtime]
            connection_buffer = 8
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.session_ttl(), Duration::hours(2));
        assert_eq!(config.realtime.connection_buffer, 8);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [server]
            port = 8080
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.url, "sqlite:bandstand.db?mode=rwc");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn should_split_bind_override_into_host_and_port() {
        let config = overridden(&[("BANDSTAND_BIND", "127.0.0.1:7000")]);
        assert_eq!(config.bind_addr(), "127.0.0.1:7000");
    }

    #[test]
    fn should_prefer_rust_log_over_bandstand_log() {
        let config = overridden(&[("BANDSTAND_LOG", "warn"), ("RUST_LOG", "trace")]);
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_numeric_overrides() {
        let config = overridden(&[
            ("BANDSTAND_PORT", "http"),
            ("BANDSTAND_SESSION_TTL_HOURS", "forever"),
        ]);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.session_ttl_hours, 24);
    }

    #[test]
    fn should_apply_session_and_buffer_overrides() {
        let config = overridden(&[
            ("BANDSTAND_SESSION_TTL_HOURS", "48"),
            ("BANDSTAND_CONNECTION_BUFFER", "16"),
            ("BANDSTAND_DATABASE_URL", "sqlite::memory:"),
        ]);
        assert_eq!(config.session_ttl(), Duration::hours(48));
        assert_eq!(config.realtime.connection_buffer, 16);
        assert_eq!(config.database_url(), "sqlite::memory:");
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_non_positive_session_ttl() {
        let mut config = Config::default();
        config.auth.session_ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_session_ttl_beyond_one_year() {
        let config = overridden(&[("BANDSTAND_SESSION_TTL_HOURS", "2000000000000")]);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.auth.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_connection_buffer() {
        let mut config = Config::default();
        config.realtime.connection_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }
}
