//! Catalog configuration
//!
//! Connection and timeout budgets, read from the environment with code-level
//! defaults. `DATABASE_URL` is the only required setting.

use std::time::Duration;

use crate::error::CatalogError;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_CONNECT_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Maximum wait for a pooled connection before the operation fails
    /// with a timeout.
    pub acquire_timeout: Duration,
    /// Server-side execution budget per statement.
    pub statement_timeout: Duration,
    /// Server-side wait budget for row/table locks.
    pub lock_timeout: Duration,
    /// Bounded retry attempts for the initial connection.
    pub connect_retries: u32,
}

impl CatalogConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
            statement_timeout: Duration::from_millis(DEFAULT_STATEMENT_TIMEOUT_MS),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            connect_retries: DEFAULT_CONNECT_RETRIES,
        }
    }

    /// Read configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self, CatalogError> {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| CatalogError::Validation("DATABASE_URL is not set".into()))?;
        let mut config = Self::new(database_url);
        if let Some(v) = env_parse::<u32>("CATALOG_MAX_CONNECTIONS")? {
            config.max_connections = v;
        }
        if let Some(v) = env_parse::<u64>("CATALOG_ACQUIRE_TIMEOUT_MS")? {
            config.acquire_timeout = Duration::from_millis(v);
        }
        if let Some(v) = env_parse::<u64>("CATALOG_STATEMENT_TIMEOUT_MS")? {
            config.statement_timeout = Duration::from_millis(v);
        }
        if let Some(v) = env_parse::<u64>("CATALOG_LOCK_TIMEOUT_MS")? {
            config.lock_timeout = Duration::from_millis(v);
        }
        if let Some(v) = env_parse::<u32>("CATALOG_CONNECT_RETRIES")? {
            config.connect_retries = v;
        }
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, CatalogError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| CatalogError::Validation(format!("{key} is not a valid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::new("postgresql://localhost/catalog");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.statement_timeout, Duration::from_millis(5_000));
        assert_eq!(config.lock_timeout, Duration::from_millis(2_000));
        assert_eq!(config.connect_retries, 3);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        std::env::set_var("CATALOG_TEST_BAD_VALUE", "not-a-number");
        let err = env_parse::<u32>("CATALOG_TEST_BAD_VALUE").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        std::env::remove_var("CATALOG_TEST_BAD_VALUE");
    }
}
