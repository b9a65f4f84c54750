//! # Application State & Configuration
//!
//! [`AppConfig`] is read once from the environment at startup.
//! [`AppState`] is the Axum router state: the configuration, the store
//! handle, and one service per entity, all cheap to clone.

use thiserror::Error;

use crate::db::Database;
use crate::services::{ActivityService, BuildingService, OrganizationService};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Error reading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be a valid port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("DATABASE_MAX_CONNECTIONS must be a positive integer, got {0:?}")]
    InvalidMaxConnections(String),
}

/// Application configuration.
///
/// Custom `Debug` redacts the API key and the database URL.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret for `/api/v1`. `None` disables authentication.
    pub api_key: Option<String>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// Postgres URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("cors_origins", &self.cors_origins)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("database_max_connections", &self.database_max_connections)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            cors_origins: Vec::new(),
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match (get("APP_PORT"), get("PORT")) {
            (Some(value), _) => parse_port("APP_PORT", value)?,
            (None, Some(value)) => parse_port("PORT", value)?,
            (None, None) => DEFAULT_PORT,
        };

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidMaxConnections(value)),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            api_key: get("API_KEY"),
            cors_origins: get("CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            database_url: get("DATABASE_URL"),
            database_max_connections,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort { var, value })
}

/// Split a comma-separated origin list. A `*` entry means any origin and
/// collapses the list to empty.
fn parse_origins(value: &str) -> Vec<String> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub activities: ActivityService,
    pub buildings: BuildingService,
    pub organizations: OrganizationService,
}

impl AppState {
    /// Default configuration over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), Database::in_memory())
    }

    pub fn with_config(config: AppConfig, db: Database) -> Self {
        Self {
            config,
            activities: ActivityService::new(db.clone()),
            buildings: BuildingService::new(db.clone()),
            organizations: OrganizationService::new(db.clone()),
            db,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert!(config.api_key.is_none());
        assert!(config.database_url.is_none());
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.database_max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn app_port_wins_over_port() {
        let config = config_from(&[("APP_PORT", "9000"), ("PORT", "7000")]).unwrap();
        assert_eq!(config.port, 9000);
        let config = config_from(&[("PORT", "7000")]).unwrap();
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        assert!(matches!(
            config_from(&[("APP_PORT", "eighty")]),
            Err(ConfigError::InvalidPort { var: "APP_PORT", .. })
        ));
        assert!(matches!(
            config_from(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidMaxConnections(_))
        ));
    }

    #[test]
    fn cors_origins_are_split_and_star_means_any() {
        let config =
            config_from(&[("CORS_ORIGINS", "https://a.example, https://b.example,")]).unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        let config = config_from(&[("CORS_ORIGINS", "*")]).unwrap();
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let config = config_from(&[("API_KEY", "  ")]).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = config_from(&[
            ("API_KEY", "hunter2"),
            ("DATABASE_URL", "postgres://u:pw@db/secunda"),
        ])
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("pw@db"));
    }
}
