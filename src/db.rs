//! Catalog connection handle and transactions
//!
//! `Catalog` owns the PostgreSQL pool. Execution and lock-wait budgets are
//! installed as server-side session options, so every statement issued
//! through the pool carries them without per-call wrappers; exceeded budgets
//! surface as `CatalogError::Timeout`.

use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::Result;

/// Transaction isolation, selected per transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TxOptions {
    pub isolation: IsolationLevel,
    pub read_only: bool,
}

impl TxOptions {
    pub fn serializable() -> Self {
        Self { isolation: IsolationLevel::Serializable, read_only: false }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

fn set_transaction_sql(options: &TxOptions) -> String {
    let mut stmt = String::from("SET TRANSACTION ISOLATION LEVEL ");
    stmt.push_str(options.isolation.as_sql());
    if options.read_only {
        stmt.push_str(", READ ONLY");
    }
    stmt
}

/// Handle to the catalog database.
#[derive(Clone)]
pub struct Catalog {
    pool: PgPool,
}

impl Catalog {
    /// Build the pool and verify connectivity, retrying a bounded number of
    /// times with exponential backoff on transient failures.
    pub async fn connect(config: &CatalogConfig) -> Result<Self> {
        let options = PgConnectOptions::from_str(&config.database_url)
            .map_err(|e| CatalogError::Validation(format!("invalid DATABASE_URL: {e}")))?
            .options([
                ("statement_timeout", config.statement_timeout.as_millis().to_string()),
                ("lock_timeout", config.lock_timeout.as_millis().to_string()),
            ]);

        let mut attempt: u32 = 0;
        let mut backoff = Duration::from_millis(250);
        let pool = loop {
            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout)
                .connect_with(options.clone())
                .await;
            match result {
                Ok(pool) => break pool,
                Err(err) => {
                    let err = CatalogError::from(err);
                    if attempt >= config.connect_retries || !err.is_transient() {
                        return Err(err);
                    }
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "catalog connection failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        };
        tracing::info!(max_connections = config.max_connections, "catalog pool ready");
        Ok(Self { pool })
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("catalog migrations applied");
        Ok(())
    }

    /// The underlying pool. Accessor functions take any `PgExecutor`, so this
    /// is both their usual argument and the raw escape hatch: statements the
    /// typed surface cannot express go through `sqlx::query(..).bind(..)`
    /// against this pool, keeping parameters out of the SQL text.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check out a dedicated connection, for the composite reads that run
    /// several statements.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(Into::into)
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Begin a transaction with default options (read committed).
    pub async fn begin(&self) -> Result<CatalogTx> {
        self.begin_with(TxOptions::default()).await
    }

    /// Begin a transaction with explicit isolation, for read-then-write
    /// sequences such as stock checks under concurrent order placement.
    pub async fn begin_with(&self, options: TxOptions) -> Result<CatalogTx> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&set_transaction_sql(&options))
            .execute(&mut *tx)
            .await?;
        tracing::debug!(isolation = ?options.isolation, read_only = options.read_only, "transaction started");
        Ok(CatalogTx { tx })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An open transaction. Dropping it without `commit` rolls back.
pub struct CatalogTx {
    tx: Transaction<'static, Postgres>,
}

impl CatalogTx {
    /// The transaction's connection; pass this to any accessor function to
    /// run it inside the transaction.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(Into::into)
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_sql() {
        assert_eq!(IsolationLevel::ReadCommitted.as_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_set_transaction_statement() {
        assert_eq!(
            set_transaction_sql(&TxOptions::default()),
            "SET TRANSACTION ISOLATION LEVEL READ COMMITTED"
        );
        assert_eq!(
            set_transaction_sql(&TxOptions::serializable().read_only()),
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE, READ ONLY"
        );
    }
}
