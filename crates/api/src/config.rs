//! API configuration, loaded from environment variables with development defaults.

use std::net::SocketAddr;

use ledgerly_observability::LogFormat;

pub const DEV_JWT_SECRET: &str = "ledgerly-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address (`BIND_ADDR`, default `0.0.0.0:8080`)
    pub bind_addr: SocketAddr,

    /// SQLite URL (`DATABASE_URL`)
    pub database_url: String,

    /// Pool size (`DB_MAX_CONNECTIONS`, default 5)
    pub db_max_connections: u32,

    /// HS256 signing secret (`JWT_SECRET`)
    pub jwt_secret: String,

    /// Access token lifetime in seconds (`JWT_TTL_SECS`, default 1 day)
    pub jwt_ttl_secs: i64,

    /// `LOG_FORMAT=json|pretty`
    pub log_format: LogFormat,
}

impl ApiConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ApiConfig {
            bind_addr: parse_var(&lookup, "BIND_ADDR", "0.0.0.0:8080")?,

            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://ledgerly.db?mode=rwc".to_string()),

            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", "5")?,

            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),

            jwt_ttl_secs: parse_var(&lookup, "JWT_TTL_SECS", "86400")?,

            log_format: parse_var(&lookup, "LOG_FORMAT", "json")?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_TTL_SECS".to_string()));
        }
        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError> {
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.jwt_ttl_secs, 86_400);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_SECS", "600"),
            ("LOG_FORMAT", "pretty"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.jwt_ttl_secs, 600);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = ApiConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "many")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for DB_MAX_CONNECTIONS");

        let err = ApiConfig::from_lookup(lookup(&[("JWT_TTL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var) if var == "JWT_TTL_SECS"));
    }
}
