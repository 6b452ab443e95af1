//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tourney::store::DatabaseConfig;
use tourney::tournament::EngineConfig;

/// Default server bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Document store the server runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store; contents are lost on restart
    Memory,
    /// PostgreSQL-backed store
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(ConfigError::Invalid {
                var: "STORE_BACKEND".to_string(),
                reason: format!("Unknown backend '{other}', expected 'memory' or 'postgres'"),
            }),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::Postgres => f.write_str("postgres"),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Document store backend
    pub backend: StoreBackend,
    /// Database configuration (used by the postgres backend)
    pub database: DatabaseConfig,
    /// Tournament engine configuration
    pub engine: EngineConfig,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `backend_override` - Optional store backend override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        backend_override: Option<StoreBackend>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND", std::env::var("SERVER_BIND").ok())?
                .map_or_else(default_bind, Ok)?,
        };

        let backend = match backend_override {
            Some(backend) => backend,
            None => std::env::var("STORE_BACKEND")
                .ok()
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(StoreBackend::Memory),
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let metrics_bind = parse_addr("METRICS_BIND", std::env::var("METRICS_BIND").ok())?;

        Ok(ServerConfig {
            bind,
            backend,
            database,
            engine: EngineConfig::from_env(),
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scoring = &self.engine.scoring;
        if scoring.points_per_win <= scoring.points_per_draw {
            return Err(ConfigError::Invalid {
                var: "POINTS_PER_WIN".to_string(),
                reason: format!(
                    "Must be greater than points per draw ({})",
                    scoring.points_per_draw
                ),
            });
        }

        if scoring.points_per_draw < scoring.points_per_loss {
            return Err(ConfigError::Invalid {
                var: "POINTS_PER_DRAW".to_string(),
                reason: format!(
                    "Must be at least points per loss ({})",
                    scoring.points_per_loss
                ),
            });
        }

        if self.engine.retry.base_backoff > Duration::from_secs(1) {
            return Err(ConfigError::Invalid {
                var: "TX_BACKOFF_MS".to_string(),
                reason: "Must be at most 1000 milliseconds".to_string(),
            });
        }

        if self.backend == StoreBackend::Postgres
            && self.database.min_connections > self.database.max_connections
        {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> Result<SocketAddr, ConfigError> {
    DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
        var: "SERVER_BIND".to_string(),
        reason: format!("Default address {DEFAULT_BIND} is not a socket address"),
    })
}

fn parse_addr(var: &str, value: Option<String>) -> Result<Option<SocketAddr>, ConfigError> {
    value
        .map(|v| {
            v.parse().map_err(|_| ConfigError::Invalid {
                var: var.to_string(),
                reason: format!("'{v}' is not a socket address (expected IP:PORT)"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourney::tournament::ScoringRules;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            backend: StoreBackend::Memory,
            database: DatabaseConfig::development(),
            engine: EngineConfig::default(),
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            var: "SERVER_BIND".to_string(),
            reason: "bad".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SERVER_BIND"));
        assert!(msg.contains("bad"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_addr() {
        assert!(parse_addr("X", None).unwrap().is_none());
        assert!(parse_addr("X", Some("0.0.0.0:9000".to_string())).unwrap().is_some());
        assert!(parse_addr("X", Some("nonsense".to_string())).is_err());
    }

    #[test]
    fn test_config_validation_scoring_order() {
        let mut config = config();
        config.engine.scoring = ScoringRules {
            points_per_win: 1,
            points_per_draw: 1,
            points_per_loss: 0,
        };

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "POINTS_PER_WIN"));
    }

    #[test]
    fn test_config_validation_metrics_bind_clash() {
        let mut config = config();
        config.metrics_bind = Some(config.bind);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "METRICS_BIND"));
    }
}
