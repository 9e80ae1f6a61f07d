use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbErr, TransactionError,
    TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use uuid::Uuid;
use tracing::{debug, error, info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(10),
            acquire_timeout: Duration::from_secs(8),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl DbConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let url = cfg
            .database_url()
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        Ok(Self {
            url,
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections.min(cfg.db_max_connections),
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
        })
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns a `ServiceError` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    let mut opt = ConnectOptions::new(config.url.clone());

    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("sales_report_db.max_connections", config.max_connections as f64);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Database connection pool established successfully");
    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg = DbConfig::from_app_config(cfg)?;
    establish_connection_with_config(&db_cfg).await
}

/// Bounds a store operation by `limit`. An expired limit is reported as
/// `ServiceError::Timeout` and the pending operation is dropped, which
/// rolls back any open transaction it held.
pub async fn with_timeout<T, Fut>(
    operation: &str,
    limit: Duration,
    fut: Fut,
) -> Result<T, ServiceError>
where
    Fut: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation = %operation, limit = ?limit, "store operation timed out");
            counter!("sales_report_db.timeouts", 1, "operation" => operation.to_string());
            Err(ServiceError::Timeout(format!(
                "{} did not finish within {:?}",
                operation, limit
            )))
        }
    }
}

/// Future returned by a unit of work run inside [`transaction`].
pub type TxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Runs `f` inside one transaction: committed when it returns `Ok`, rolled
/// back on `Err` or when the future is dropped.
pub async fn transaction<F, T, E>(pool: &DbPool, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> TxFuture<'a, T, E> + Send,
    T: Send,
    E: From<DbErr> + Send + std::error::Error,
{
    let transaction_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    debug!(transaction_id = %transaction_id, "Starting database transaction");
    counter!("sales_report_db.transaction.started", 1);

    let result = pool.transaction(move |txn| f(txn)).await;

    let elapsed = start.elapsed();
    histogram!("sales_report_db.transaction.duration", elapsed);

    match &result {
        Ok(_) => {
            counter!("sales_report_db.transaction.committed", 1);
            debug!(transaction_id = %transaction_id, "Transaction committed in {:?}", elapsed);
        }
        Err(_) => {
            counter!("sales_report_db.transaction.rolled_back", 1);
            warn!(transaction_id = %transaction_id, "Transaction rolled back after {:?}", elapsed);
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(e) => E::from(e),
        TransactionError::Transaction(e) => e,
    })
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = std::time::Instant::now();
    let result = pool.ping().await.map_err(ServiceError::DatabaseError);

    match &result {
        Ok(_) => debug!("Database connection check successful in {:?}", start.elapsed()),
        Err(e) => {
            error!(
                "Database connection check failed after {:?}: {}",
                start.elapsed(),
                e
            );
            counter!("sales_report_db.connection_failures", 1);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn with_timeout_passes_results_through() {
        let value = with_timeout("noop", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn with_timeout_reports_expiry() {
        let result: Result<(), ServiceError> =
            with_timeout("slow", Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert_matches!(result, Err(ServiceError::Timeout(msg)) if msg.starts_with("slow"));
    }

    #[test]
    fn pool_minimum_never_exceeds_maximum() {
        let cfg = AppConfig {
            db_max_connections: 1,
            db_min_connections: 4,
            ..AppConfig::with_database_url("sqlite::memory:")
        };
        let db_cfg = DbConfig::from_app_config(&cfg).unwrap();
        assert_eq!(db_cfg.min_connections, 1);
        assert_eq!(db_cfg.url, "sqlite::memory:");
    }
}
