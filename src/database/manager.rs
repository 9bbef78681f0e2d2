use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config;

/// Errors from the storage layer. Every sqlx failure is folded into one of
/// these variants so HTTP translation can match exhaustively.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Value rejected by the database (bad cast, check constraint, not-null)
    #[error("Invalid value: {0}")]
    Validation(String),

    /// Unique constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connectivity problem: I/O, TLS, pool exhausted or closed
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Database operation exceeded {0:?}")]
    Timeout(Duration),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

impl DatabaseError {
    /// Whether the error means the cached pool can no longer be trusted
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, DatabaseError::Unavailable(_))
    }

    fn from_sqlstate(code: Option<&str>, message: String) -> Self {
        match code {
            // unique_violation
            Some("23505") => DatabaseError::Conflict(message),
            // not_null_violation, check_violation, invalid_text_representation,
            // numeric_value_out_of_range, invalid_datetime_format,
            // character_not_in_repertoire
            Some("23502" | "23514" | "22P02" | "22003" | "22007" | "22021") => DatabaseError::Validation(message),
            // connection exceptions and server shutdown
            Some(code) if code.starts_with("08") || code.starts_with("57P") => DatabaseError::Unavailable(message),
            _ => DatabaseError::QueryError(message),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                DatabaseError::from_sqlstate(db_err.code().as_deref(), db_err.message().to_string())
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DatabaseError::Validation(format!("column {}: {}", index, source))
            }
            sqlx::Error::Io(e) => DatabaseError::Unavailable(e.to_string()),
            sqlx::Error::Tls(e) => DatabaseError::Unavailable(e.to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::Unavailable("connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => DatabaseError::Unavailable("connection pool closed".to_string()),
            sqlx::Error::WorkerCrashed => DatabaseError::Unavailable("connection worker crashed".to_string()),
            sqlx::Error::Migrate(e) => DatabaseError::MigrationError(e.to_string()),
            other => DatabaseError::QueryError(other.to_string()),
        }
    }
}

/// Process-wide connection pool holder.
///
/// The pool is created on first use and replaced wholesale after a
/// connection failure. Concurrent first callers wait on a single
/// initialization instead of racing to open several pools.
pub struct DatabaseManager {
    pool: RwLock<Option<PgPool>>,
    connecting: Mutex<()>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager {
            pool: RwLock::new(None),
            connecting: Mutex::new(()),
        })
    }

    /// Get the shared pool, connecting on first use
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        Self::instance().get_pool().await
    }

    async fn get_pool(&self) -> Result<PgPool, DatabaseError> {
        // Fast path: try read lock
        if let Some(pool) = self.cached().await {
            return Ok(pool);
        }

        // Only one task opens the pool; the rest wait here and reuse it
        let _guard = self.connecting.lock().await;
        if let Some(pool) = self.cached().await {
            return Ok(pool);
        }

        let pool = Self::connect().await?;
        *self.pool.write().await = Some(pool.clone());
        Ok(pool)
    }

    async fn cached(&self) -> Option<PgPool> {
        let pool = self.pool.read().await;
        pool.as_ref().filter(|p| !p.is_closed()).cloned()
    }

    async fn connect() -> Result<PgPool, DatabaseError> {
        let settings = &config::config().database;
        let connection_string = Self::connection_string()?;

        let pool = PgPoolOptions::new()
            .min_connections(settings.min_connections)
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connection_timeout))
            .idle_timeout(Duration::from_secs(settings.idle_timeout))
            .connect(&connection_string)
            .await
            .map_err(|e| {
                warn!("Database connection failed: {}", e);
                DatabaseError::from(e)
            })?;

        if settings.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        }

        info!(
            "Database pool established (min {}, max {})",
            settings.min_connections, settings.max_connections
        );
        Ok(pool)
    }

    fn connection_string() -> Result<String, DatabaseError> {
        let raw = std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        Self::validate_connection_string(&raw)
    }

    fn validate_connection_string(raw: &str) -> Result<String, DatabaseError> {
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(url.into()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }

    /// Drop the cached pool so the next caller reconnects from scratch
    pub async fn invalidate() {
        let previous = Self::instance().pool.write().await.take();
        if let Some(pool) = previous {
            warn!("Invalidating database pool after connection failure");
            tokio::spawn(async move { pool.close().await });
        }
    }

    /// Run a database operation under the configured time allowance.
    ///
    /// Connection-class failures invalidate the cached pool before the
    /// error is handed back.
    pub async fn run<T, F>(operation: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let limit = Duration::from_millis(config::config().database.query_timeout_ms);
        let result = match tokio::time::timeout(limit, operation).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => DatabaseError::from(e),
            Err(_) => DatabaseError::Timeout(limit),
        };

        if result.is_connection_failure() {
            Self::invalidate().await;
        }
        Err(result)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;
        Self::run(sqlx::query("SELECT 1").execute(&pool)).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        let previous = Self::instance().pool.write().await.take();
        if let Some(pool) = previous {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
