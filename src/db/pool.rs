use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use tracing::{debug, error, info};

/// Bounded pool of connections to the traffic database.
///
/// Constructed once at startup and torn down once with [`close_all`].
///
/// [`close_all`]: ConnectionPool::close_all
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: PgPool,
}

impl ConnectionPool {
    /// Connect and verify the backend answers before handing the pool out.
    pub async fn initialize(config: &DatabaseConfig) -> StoreResult<Self> {
        info!(
            "Initializing connection pool ({}..{} connections)",
            config.min_connections, config.max_connections
        );

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.connection_url())
            .await
            .map_err(|e| {
                error!("Failed to initialize database connection pool: {}", e);
                StoreError::PoolInit(e)
            })?;

        let pool = Self { pool };
        pool.verify().await?;

        info!("Traffic database connection pool initialized");
        Ok(pool)
    }

    /// Round-trip a trivial query; failure here is fatal for startup.
    async fn verify(&self) -> StoreResult<()> {
        let (health, timestamp): (i32, chrono::DateTime<chrono::Utc>) =
            sqlx::query_as("SELECT 1 AS health_check, NOW() AS timestamp")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    error!("Database liveness check failed: {}", e);
                    StoreError::PoolInit(e)
                })?;

        debug!("Database answered health check {} at {}", health, timestamp);
        Ok(())
    }

    /// Check out an exclusive connection.
    pub async fn acquire(&self) -> StoreResult<PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(|e| {
            error!("Failed to get database connection: {}", e);
            StoreError::acquire(e)
        })
    }

    /// Hand a connection back for reuse. Never fails.
    pub fn release(&self, conn: PoolConnection<Postgres>) {
        drop(conn);
        debug!(
            "Connection released ({} open, {} idle)",
            self.pool.size(),
            self.pool.num_idle()
        );
    }

    /// Best-effort liveness probe.
    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                error!("Database health check failed: {}", e);
                false
            }
        }
    }

    /// Close every connection. Calling it again is a no-op.
    pub async fn close_all(&self) {
        if self.pool.is_closed() {
            debug!("Connection pool already closed");
            return;
        }
        self.pool.close().await;
        info!("All database connections closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Underlying pool, for schema setup.
    pub(crate) fn inner(&self) -> &PgPool {
        &self.pool
    }
}
