use thiserror::Error;

/// Errors surfaced by the store's critical operations.
///
/// Best-effort operations (reads, analytics, heartbeats and system events)
/// log these and hand back an empty value instead.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Pool initialization failed: {0}")]
    PoolInit(#[source] sqlx::Error),

    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(#[source] sqlx::Error),

    #[error("Failed to acquire connection: {0}")]
    ConnectionAcquire(#[source] sqlx::Error),

    #[error("Query failed during {operation}: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub(crate) fn query(operation: &'static str, source: sqlx::Error) -> Self {
        StoreError::Query { operation, source }
    }

    /// Classify a failed pool checkout.
    pub(crate) fn acquire(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted(source),
            other => StoreError::ConnectionAcquire(other),
        }
    }

    /// Whether the failure is transient and the call may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::PoolExhausted(_) | StoreError::ConnectionAcquire(_)
        )
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
