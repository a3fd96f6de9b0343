use crate::error::{StoreError, StoreResult};
use sqlx::{Connection, PgConnection, Postgres, Transaction};
use tracing::{error, warn};

pub mod analytics;
pub mod detections;
pub mod events;
pub mod hospitals;
pub mod maintenance;
pub mod routes;
pub mod signals;

pub use analytics::AnalyticsRepository;
pub use detections::DetectionsRepository;
pub use events::EventsRepository;
pub use hospitals::HospitalsRepository;
pub use maintenance::MaintenanceRepository;
pub use routes::RoutesRepository;
pub use signals::SignalsRepository;

/// Open a transaction on a checked-out connection.
pub(crate) async fn begin<'c>(
    conn: &'c mut PgConnection,
    operation: &'static str,
) -> StoreResult<Transaction<'c, Postgres>> {
    Connection::begin(conn)
        .await
        .map_err(|e| StoreError::query(operation, e))
}

/// Commit when the work succeeded, roll back when it did not.
///
/// The rollback happens before the error is returned, so the connection goes
/// back to the pool clean. A failed rollback is only logged.
pub(crate) async fn settle<T>(
    tx: Transaction<'_, Postgres>,
    operation: &'static str,
    result: StoreResult<T>,
) -> StoreResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| StoreError::query(operation, e))?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback after failed {} also failed: {}", operation, rollback_err);
            }
            Err(e)
        }
    }
}

/// Collapse a failure into the empty value, logging it.
pub(crate) fn best_effort<T: Default>(operation: &str, result: StoreResult<T>) -> T {
    result.unwrap_or_else(|e| {
        error!("Failed to {}: {}", operation, e);
        T::default()
    })
}
