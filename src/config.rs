//! Configuration module
//!
//! Each service reads its own TOML file. Keys absent from the file keep the
//! service's defaults, so a file only needs to name what it changes:
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [security]
//! jwt_secret_path = "/run/secrets/jwt"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::database::repositories::DEFAULT_BANDWIDTH;
use crate::infrastructure::DatabaseConfig;
use crate::shared::utills::RetryConfig;

/// Which of the three services a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Auth,
    Booking,
    Lease,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Booking => "booking",
            Self::Lease => "lease",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Auth => 3000,
            Self::Lease => 3001,
            Self::Booking => 3002,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(Self::Auth),
            "booking" => Ok(Self::Booking),
            "lease" => Ok(Self::Lease),
            other => Err(ConfigError::Invalid(format!("unknown service '{}'", other))),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot encode defaults: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests after a shutdown signal.
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file, or `:memory:`.
    pub path: String,
}

impl DatabaseSettings {
    pub fn connection_config(&self) -> DatabaseConfig {
        if self.path == ":memory:" {
            DatabaseConfig::in_memory()
        } else {
            DatabaseConfig::sqlite(&self.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// File holding the raw HMAC signing key.
    pub jwt_secret_path: PathBuf,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// IDs reserved per store commit.
    pub bandwidth: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Attempts per admission, counting the first, when commits conflict.
    pub max_attempts: u32,
    /// Pause before re-running a conflicted admission; 0 retries at once.
    pub retry_delay_ms: u64,
}

impl AdmissionConfig {
    pub fn retry_config(&self) -> RetryConfig {
        let config = RetryConfig::immediate(self.max_attempts);
        if self.retry_delay_ms == 0 {
            config
        } else {
            config.with_delay(Duration::from_millis(self.retry_delay_ms))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub security: SecurityConfig,
    pub sequence: SequenceConfig,
    pub admission: AdmissionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Built-in defaults of `service`.
    pub fn for_service(service: ServiceKind) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: service.default_port(),
                shutdown_timeout: 30,
            },
            database: DatabaseSettings {
                path: format!("./{}.db", service.as_str()),
            },
            security: SecurityConfig {
                jwt_secret_path: PathBuf::from("/etc/jwt-secret"),
                token_ttl_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            sequence: SequenceConfig {
                bandwidth: DEFAULT_BANDWIDTH,
            },
            admission: AdmissionConfig {
                max_attempts: 3,
                retry_delay_ms: 0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }

    /// Read `path` on top of the defaults of `service`.
    pub fn load(path: &Path, service: ServiceKind) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, service)
    }

    pub fn from_toml(text: &str, service: ServiceKind) -> Result<Self, ConfigError> {
        let mut merged = toml::Value::try_from(Self::for_service(service))?;
        let overrides: toml::Value = toml::from_str(text)?;
        merge(&mut merged, overrides);

        let config: Self = merged.try_into()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("server.host is empty".into()));
        }
        if self.database.path.is_empty() {
            return Err(ConfigError::Invalid("database.path is empty".into()));
        }
        if self.sequence.bandwidth == 0 {
            return Err(ConfigError::Invalid("sequence.bandwidth must be positive".into()));
        }
        if self.admission.max_attempts == 0 {
            return Err(ConfigError::Invalid("admission.max_attempts must be positive".into()));
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid("security.bcrypt_cost must be within 4..=31".into()));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be text or json, got '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        if self.server.host.contains(':') {
            format!("[{}]:{}", self.server.host, self.server.port)
        } else {
            format!("{}:{}", self.server.host, self.server.port)
        }
    }

    /// Apply a `host:port` override.
    pub fn set_address(&mut self, addr: &str) -> Result<(), ConfigError> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::Invalid(format!("address '{}' lacks a port", addr)))?;
        let port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bad port in address '{}'", addr)))?;
        self.server.host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        self.server.port = port;
        Ok(())
    }
}

/// Overlay `overrides` onto `base`, table by table.
fn merge(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base), toml::Value::Table(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, value) => *base = value,
    }
}

/// `<config dir>/car-rental/<service>.toml`
pub fn default_config_path(service: ServiceKind) -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("car-rental")
        .join(format!("{}.toml", service.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_defaults() {
        let auth = AppConfig::for_service(ServiceKind::Auth);
        let lease = AppConfig::for_service(ServiceKind::Lease);
        let booking = AppConfig::for_service(ServiceKind::Booking);

        assert_eq!(auth.address(), "127.0.0.1:3000");
        assert_eq!(lease.address(), "127.0.0.1:3001");
        assert_eq!(booking.address(), "127.0.0.1:3002");
        assert_eq!(booking.database.path, "./booking.db");
        assert_eq!(booking.sequence.bandwidth, 100_000);
        assert_eq!(booking.admission.max_attempts, 3);
        assert_eq!(auth.security.jwt_secret_path, PathBuf::from("/etc/jwt-secret"));
        assert!(booking.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_service_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            host = "0.0.0.0"

            [admission]
            retry_delay_ms = 5
            "#,
            ServiceKind::Lease,
        )
        .unwrap();

        assert_eq!(config.address(), "0.0.0.0:3001");
        assert_eq!(config.admission.max_attempts, 3);
        assert_eq!(config.database.path, "./lease.db");
        assert_eq!(
            config.admission.retry_config().initial_delay,
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[sequence]\nbandwidth = 0", ServiceKind::Booking),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[server]\nport = \"x\"", ServiceKind::Booking),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[logging]\nformat = \"xml\"", ServiceKind::Auth),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/car-rental.toml"), ServiceKind::Auth)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_address_override() {
        let mut config = AppConfig::for_service(ServiceKind::Booking);
        config.set_address("0.0.0.0:9000").unwrap();
        assert_eq!(config.address(), "0.0.0.0:9000");
        assert!(config.set_address("nohost").is_err());
        config.set_address("[::1]:3000").unwrap();
        assert_eq!(config.address(), "[::1]:3000");
        assert!("auth".parse::<ServiceKind>().is_ok());
        assert!("billing".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn test_memory_database() {
        let settings = DatabaseSettings {
            path: ":memory:".into(),
        };
        assert!(settings.connection_config().is_in_memory());
    }
}
