//! Database connection manager
//!
//! Wraps a sqlx `PgPool`. The pool connects lazily, so constructing a manager
//! never touches the network; the first acquire does.

use once_cell::sync::OnceCell;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::Transaction;
use tracing::{debug, error, info};

use crate::config::{load_dotenv, DatabaseConfig};
use crate::error::Result;
use crate::health::HealthStatus;
use crate::params::SqlParam;

/// Unit of work bound to the pool.
///
/// Nothing is persisted until `commit()`; dropping the session rolls back.
pub type Session = Transaction<'static, Postgres>;

static DB_MANAGER: OnceCell<DatabaseManager> = OnceCell::new();

/// Process-wide manager, built from the environment (and `.env` files) on
/// first use.
///
/// Prefer constructing a [`DatabaseManager`] once at startup and passing it
/// around; this accessor exists for callers that cannot thread a handle
/// through. Initialization runs at most once even under concurrent callers.
/// Must be called from within a Tokio runtime.
pub fn get_db_manager() -> Result<&'static DatabaseManager> {
    DB_MANAGER.get_or_try_init(DatabaseManager::from_env)
}

#[derive(Clone, Debug)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Create a manager with a lazily-connecting pool.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the connection string does not parse.
    /// No connection is attempted here.
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let connect_options = config.connect_options()?;

        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.pool_size)
            .idle_timeout(config.overflow_idle_timeout)
            .test_before_acquire(config.pre_ping);
        if let Some(timeout) = config.acquire_timeout {
            options = options.acquire_timeout(timeout);
        }

        let pool = options.connect_lazy_with(connect_options);

        info!(
            url = %config.redacted_url(),
            pool_size = config.pool_size,
            max_overflow = config.max_overflow,
            "Database connection initialized"
        );

        Ok(Self { pool })
    }

    /// Create a manager from `DATABASE_URL` and optional overrides.
    ///
    /// `.env` files are loaded first; variables already set win.
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Self::new(&DatabaseConfig::from_env()?)
    }

    /// Wrap an existing pool (tests, embedding applications).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Acquire a pooled connection. It returns to the pool when dropped.
    pub async fn get_connection(&self) -> Result<PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(|e| {
            error!(error = %e, "Failed to acquire database connection");
            e.into()
        })
    }

    /// Begin a session; the caller must `commit()` explicitly.
    pub async fn get_session(&self) -> Result<Session> {
        self.pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin database session");
            e.into()
        })
    }

    /// Round-trip `SELECT 1`. Never fails; the cause is only logged.
    pub async fn health_check(&self) -> bool {
        self.diagnose().await.is_healthy()
    }

    /// Like [`health_check`](Self::health_check), but classifies the failure.
    pub async fn diagnose(&self) -> HealthStatus {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                info!("Database connection successful");
                HealthStatus::Healthy
            }
            Err(e) => {
                error!(error = %e, "Database connection failed");
                HealthStatus::from_error(&e)
            }
        }
    }

    /// Run a statement with positional parameters and return every row.
    ///
    /// Failures are logged and returned unchanged; there is no retry.
    pub async fn execute_query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<PgRow>> {
        let mut conn = self.get_connection().await?;
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, param| param.bind_to(query));

        let rows = query.fetch_all(&mut *conn).await.map_err(|e| {
            error!(error = %e, "Query execution failed");
            e
        })?;
        debug!(rows = rows.len(), "query returned");
        Ok(rows)
    }

    /// Close every pooled connection. Safe to call more than once.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            debug!("Database pool already closed");
            return;
        }
        self.pool.close().await;
        info!("Database connections closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use std::time::Duration;

    fn unreachable_config() -> DatabaseConfig {
        // Port 1 is closed on any sane host, so connects are refused quickly.
        DatabaseConfig::new("postgres://cx:cx@127.0.0.1:1/cx_insights")
            .with_acquire_timeout(Duration::from_secs(2))
    }

    #[test]
    fn invalid_url_fails_before_connecting() {
        let err = DatabaseManager::new(&DatabaseConfig::new("postgres://localhost:notaport/cx"))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidDatabaseUrl { .. }));
    }

    #[tokio::test]
    async fn construction_is_lazy() {
        let db = DatabaseManager::new(&unreachable_config()).expect("lazy pool");
        assert!(!db.is_closed());
        db.close().await;
    }

    #[tokio::test]
    async fn health_check_is_false_when_unreachable() {
        let db = DatabaseManager::new(&unreachable_config()).expect("lazy pool");

        assert!(!db.health_check().await);
        assert_eq!(db.diagnose().await, HealthStatus::Unreachable);

        db.close().await;
    }

    #[tokio::test]
    async fn query_errors_propagate_when_unreachable() {
        let db = DatabaseManager::new(&unreachable_config()).expect("lazy pool");

        let err = db.execute_query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx { .. }));

        db.close().await;
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let db = DatabaseManager::new(&unreachable_config()).expect("lazy pool");
        db.close().await;
        db.close().await;
        assert!(db.is_closed());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn health_check_is_true_with_live_database() {
        let db = DatabaseManager::from_env().expect("DATABASE_URL required");
        assert!(db.health_check().await);
        db.close().await;
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn global_manager_is_shared() {
        let first = get_db_manager().expect("DATABASE_URL required");
        let second = get_db_manager().expect("DATABASE_URL required");
        assert!(std::ptr::eq(first, second));
        assert!(second.health_check().await);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_pool_access() {
        let db = DatabaseManager::from_env().expect("DATABASE_URL required");

        // More tasks than the core pool size, fewer than size + overflow
        let handles: Vec<_> = (0..12)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move {
                    let rows = db
                        .execute_query("SELECT $1::int8 AS n", &[SqlParam::Int(i)])
                        .await
                        .expect("concurrent query failed");
                    sqlx::Row::get::<i64, _>(&rows[0], "n")
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.expect("task panicked");
            assert_eq!(result, i as i64);
        }

        db.close().await;
    }
}
