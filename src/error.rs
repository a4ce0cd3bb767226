//! Catalog error taxonomy
//!
//! Every storage failure is surfaced as one of a small set of kinds so
//! callers can tell "already exists" from "does not exist" from "network
//! problem" without parsing driver messages.

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("unique constraint violated ({})", .constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    #[error("reference violated ({})", .constraint.as_deref().unwrap_or("unknown"))]
    ReferenceViolation { constraint: Option<String> },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("operation timed out")]
    Timeout,

    #[error("database unreachable: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CatalogError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// Timeouts and connectivity failures are safe to retry with backoff;
    /// constraint and validation failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection(_))
    }
}

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";
/// SQLSTATE raised when `lock_timeout` expires while waiting on a lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";

fn classify(kind: ErrorKind, code: Option<&str>, constraint: Option<&str>) -> Option<CatalogError> {
    let constraint = constraint.map(str::to_owned);
    match kind {
        ErrorKind::UniqueViolation => Some(CatalogError::UniqueViolation { constraint }),
        ErrorKind::ForeignKeyViolation => Some(CatalogError::ReferenceViolation { constraint }),
        // Check and not-null failures are field-level faults, same kind as
        // input validation.
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => Some(CatalogError::Validation(
            format!("constraint {} rejected the value", constraint.as_deref().unwrap_or("unknown")),
        )),
        _ => match code {
            Some(QUERY_CANCELED) | Some(LOCK_NOT_AVAILABLE) => Some(CatalogError::Timeout),
            _ => None,
        },
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CatalogError::not_found("row"),
            sqlx::Error::PoolTimedOut => CatalogError::Timeout,
            sqlx::Error::Database(db) => {
                let code = db.code().map(|c| c.into_owned());
                match classify(db.kind(), code.as_deref(), db.constraint()) {
                    Some(mapped) => mapped,
                    None => CatalogError::Database(sqlx::Error::Database(db)),
                }
            }
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed) => CatalogError::Connection(e),
            e => CatalogError::Database(e),
        }
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(err: validator::ValidationErrors) -> Self {
        CatalogError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unique() {
        let err = classify(ErrorKind::UniqueViolation, Some("23505"), Some("products_slug_key"));
        match err {
            Some(CatalogError::UniqueViolation { constraint }) => {
                assert_eq!(constraint.as_deref(), Some("products_slug_key"));
            }
            other => panic!("expected unique violation, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_foreign_key() {
        let err = classify(ErrorKind::ForeignKeyViolation, Some("23503"), Some("products_category_id_fkey"));
        assert!(matches!(err, Some(CatalogError::ReferenceViolation { .. })));
    }

    #[test]
    fn test_classify_check_as_validation() {
        let err = classify(ErrorKind::CheckViolation, Some("23514"), Some("product_variants_stock_check"));
        assert!(matches!(err, Some(CatalogError::Validation(_))));
    }

    #[test]
    fn test_classify_timeout_codes() {
        assert!(matches!(classify(ErrorKind::Other, Some("57014"), None), Some(CatalogError::Timeout)));
        assert!(matches!(classify(ErrorKind::Other, Some("55P03"), None), Some(CatalogError::Timeout)));
        assert!(classify(ErrorKind::Other, Some("42601"), None).is_none());
    }

    #[test]
    fn test_transient_kinds() {
        assert!(CatalogError::Timeout.is_transient());
        assert!(!CatalogError::not_found("product").is_transient());
        assert!(!CatalogError::UniqueViolation { constraint: None }.is_transient());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: CatalogError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }
}
