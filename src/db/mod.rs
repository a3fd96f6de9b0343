use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use std::sync::Arc;
use tracing::info;

pub mod ids;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod repositories;

#[cfg(test)]
mod tests;

pub use pool::ConnectionPool;
use repositories::{
    AnalyticsRepository, DetectionsRepository, EventsRepository, HospitalsRepository,
    MaintenanceRepository, RoutesRepository, SignalsRepository,
};

/// Pooled access to the traffic database.
///
/// Cloning is cheap; every clone shares the same pool. Close it once at
/// shutdown with [`TrafficStore::close`].
#[derive(Clone)]
pub struct TrafficStore {
    pool: Arc<ConnectionPool>,
    pub signals: SignalsRepository,
    pub detections: DetectionsRepository,
    pub routes: RoutesRepository,
    pub events: EventsRepository,
    pub hospitals: HospitalsRepository,
    pub analytics: AnalyticsRepository,
    pub maintenance: MaintenanceRepository,
}

impl TrafficStore {
    /// Open the pool, verify the backend and optionally apply the schema
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Initializing traffic store");

        let pool = ConnectionPool::initialize(config).await?;
        let store = Self::from_pool(Arc::new(pool));

        if config.auto_migrate {
            store.run_migrations().await?;
        }

        Ok(store)
    }

    pub fn from_pool(pool: Arc<ConnectionPool>) -> Self {
        Self {
            signals: SignalsRepository::new(pool.clone()),
            detections: DetectionsRepository::new(pool.clone()),
            routes: RoutesRepository::new(pool.clone()),
            events: EventsRepository::new(pool.clone()),
            hospitals: HospitalsRepository::new(pool.clone()),
            analytics: AnalyticsRepository::new(pool.clone()),
            maintenance: MaintenanceRepository::new(pool.clone()),
            pool,
        }
    }

    /// Apply the embedded schema
    pub async fn run_migrations(&self) -> StoreResult<()> {
        info!("Running database migrations");

        migrations::run_migrations(self.pool.inner())
            .await
            .map_err(|e| StoreError::query("run migrations", e))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Health check for database
    pub async fn health_check(&self) -> bool {
        self.pool.health_check().await
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Release every pooled connection
    pub async fn close(&self) {
        self.pool.close_all().await;
    }
}
