use super::{begin, settle};
use crate::{
    db::{
        models::{CleanupReport, RetentionCutoffs},
        pool::ConnectionPool,
    },
    error::{StoreError, StoreResult},
};
use chrono::Utc;
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{error, info};

const CLEANUP: &str = "clean up old data";

/// Maintenance repository for retention sweeps
#[derive(Clone)]
pub struct MaintenanceRepository {
    pool: Arc<ConnectionPool>,
}

impl MaintenanceRepository {
    /// Create a new maintenance repository
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Delete raw records older than `days_to_keep` days and aggregated
    /// analytics older than twice that.
    ///
    /// All deletions share one transaction: either every table is swept or,
    /// on failure, none is.
    pub async fn cleanup_old_data(&self, days_to_keep: u32) -> StoreResult<CleanupReport> {
        let cutoffs = RetentionCutoffs::new(Utc::now(), days_to_keep);

        let result = self.try_cleanup(cutoffs).await;
        match &result {
            Ok(report) => info!(
                "Cleaned up data older than {} days: {} detections, {} state changes, {} events, {} analytics rows",
                days_to_keep,
                report.detections_deleted,
                report.state_history_deleted,
                report.events_deleted,
                report.analytics_deleted
            ),
            Err(e) => error!("Failed to clean up old data: {}", e),
        }
        result
    }

    async fn try_cleanup(&self, cutoffs: RetentionCutoffs) -> StoreResult<CleanupReport> {
        let mut conn = self.pool.acquire().await?;
        let result = {
            let mut tx = begin(&mut conn, CLEANUP).await?;
            let deleted = delete_expired(&mut tx, cutoffs).await;
            settle(tx, CLEANUP, deleted).await
        };
        self.pool.release(conn);
        result
    }
}

async fn delete_expired(conn: &mut PgConnection, cutoffs: RetentionCutoffs) -> StoreResult<CleanupReport> {
    let detections_deleted = sqlx::query("DELETE FROM emergency_detections WHERE detection_time < $1")
        .bind(cutoffs.raw_before)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::query(CLEANUP, e))?
        .rows_affected();

    let state_history_deleted = sqlx::query("DELETE FROM signal_state_history WHERE start_time < $1")
        .bind(cutoffs.raw_before)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::query(CLEANUP, e))?
        .rows_affected();

    let events_deleted = sqlx::query("DELETE FROM system_events WHERE timestamp < $1")
        .bind(cutoffs.raw_before)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::query(CLEANUP, e))?
        .rows_affected();

    let analytics_deleted = sqlx::query("DELETE FROM traffic_analytics WHERE date < $1")
        .bind(cutoffs.aggregated_before)
        .execute(&mut *conn)
        .await
        .map_err(|e| StoreError::query(CLEANUP, e))?
        .rows_affected();

    Ok(CleanupReport {
        cutoffs,
        detections_deleted,
        state_history_deleted,
        events_deleted,
        analytics_deleted,
    })
}
