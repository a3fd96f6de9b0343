use super::{begin, best_effort, settle};
use crate::{
    db::{
        models::{ConnectionStatus, NewStateChange, SignalStateRecord, TrafficSignal},
        pool::ConnectionPool,
    },
    error::{StoreError, StoreResult},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{debug, error};

const LOG_STATE_CHANGE: &str = "log signal state change";
const UPDATE_HEARTBEAT: &str = "update signal heartbeat";

/// Signals repository for signal lookups, heartbeats and state history
#[derive(Clone)]
pub struct SignalsRepository {
    pool: Arc<ConnectionPool>,
}

impl SignalsRepository {
    /// Create a new signals repository
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Get all active signals, ordered by name
    pub async fn get_all_signals(&self) -> Vec<TrafficSignal> {
        best_effort("get all signals", self.fetch_all().await)
    }

    async fn fetch_all(&self) -> StoreResult<Vec<TrafficSignal>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, TrafficSignal>(
            r#"
            SELECT id, name, latitude, longitude, location_description,
                   signal_type, status, installation_date, last_maintenance,
                   default_timing, emergency_override_enabled, ai_detection_enabled,
                   ip_address, last_heartbeat, connection_status
            FROM traffic_signals
            WHERE status = 'active'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get all signals", e));
        self.pool.release(conn);

        result
    }

    /// Get signal by ID
    pub async fn get_signal_by_id(&self, signal_id: &str) -> Option<TrafficSignal> {
        match self.fetch_by_id(signal_id).await {
            Ok(signal) => signal,
            Err(e) => {
                error!("Failed to get signal {}: {}", signal_id, e);
                None
            }
        }
    }

    async fn fetch_by_id(&self, signal_id: &str) -> StoreResult<Option<TrafficSignal>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, TrafficSignal>(
            r#"
            SELECT id, name, latitude, longitude, location_description,
                   signal_type, status, installation_date, last_maintenance,
                   default_timing, emergency_override_enabled, ai_detection_enabled,
                   ip_address, last_heartbeat, connection_status
            FROM traffic_signals
            WHERE id = $1
            "#,
        )
        .bind(signal_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get signal by id", e));
        self.pool.release(conn);

        result
    }

    /// Stamp a heartbeat from the signal controller.
    ///
    /// Best-effort: returns whether a signal row was updated, never an error.
    pub async fn update_signal_heartbeat(&self, signal_id: &str, status: ConnectionStatus) -> bool {
        match self.try_update_heartbeat(signal_id, status).await {
            Ok(updated) => {
                debug!("Heartbeat from signal {} ({})", signal_id, status);
                updated
            }
            Err(e) => {
                error!("Failed to update heartbeat for signal {}: {}", signal_id, e);
                false
            }
        }
    }

    async fn try_update_heartbeat(&self, signal_id: &str, status: ConnectionStatus) -> StoreResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let result = {
            let mut tx = begin(&mut conn, UPDATE_HEARTBEAT).await?;
            let now = Utc::now();
            let updated = sqlx::query(
                r#"
                UPDATE traffic_signals
                SET last_heartbeat = $1, connection_status = $2, updated_at = $3
                WHERE id = $4
                "#,
            )
            .bind(now)
            .bind(status)
            .bind(now)
            .bind(signal_id)
            .execute(&mut *tx)
            .await
            .map(|done| done.rows_affected() > 0)
            .map_err(|e| StoreError::query(UPDATE_HEARTBEAT, e));
            settle(tx, UPDATE_HEARTBEAT, updated).await
        };
        self.pool.release(conn);
        result
    }

    /// Append a state interval to the signal's history and return its row id.
    ///
    /// Critical: any failure is rolled back and returned.
    pub async fn log_state_change(&self, change: &NewStateChange) -> StoreResult<i64> {
        let result = self.try_log_state_change(change).await;
        match &result {
            Ok(id) => debug!(
                "Signal {} entered {} for {}s (history {})",
                change.signal_id, change.state, change.duration, id
            ),
            Err(e) => error!(
                "Failed to log state change for signal {}: {}",
                change.signal_id, e
            ),
        }
        result
    }

    async fn try_log_state_change(&self, change: &NewStateChange) -> StoreResult<i64> {
        let mut conn = self.pool.acquire().await?;
        let result = {
            let mut tx = begin(&mut conn, LOG_STATE_CHANGE).await?;
            let inserted = insert_state_change(&mut tx, change, Utc::now()).await;
            settle(tx, LOG_STATE_CHANGE, inserted).await
        };
        self.pool.release(conn);
        result
    }

    /// Latest state intervals for a signal, newest first
    pub async fn get_state_history(&self, signal_id: &str, limit: Option<i64>) -> Vec<SignalStateRecord> {
        best_effort(
            "get signal state history",
            self.fetch_state_history(signal_id, limit.unwrap_or(100)).await,
        )
    }

    async fn fetch_state_history(&self, signal_id: &str, limit: i64) -> StoreResult<Vec<SignalStateRecord>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, SignalStateRecord>(
            r#"
            SELECT id, signal_id, state, state_duration, is_emergency_override,
                   override_reason, traffic_density, start_time, end_time
            FROM signal_state_history
            WHERE signal_id = $1
            ORDER BY start_time DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(signal_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get signal state history", e));
        self.pool.release(conn);

        if let Ok(rows) = &result {
            debug!("Loaded {} state history rows for signal {}", rows.len(), signal_id);
        }
        result
    }
}

async fn insert_state_change(
    conn: &mut PgConnection,
    change: &NewStateChange,
    now: DateTime<Utc>,
) -> StoreResult<i64> {
    let (start_time, end_time) = change.interval(now);

    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO signal_state_history (
            signal_id, state, state_duration, is_emergency_override, override_reason,
            traffic_density, start_time, end_time
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&change.signal_id)
    .bind(&change.state)
    .bind(change.duration)
    .bind(change.is_emergency_override)
    .bind(&change.override_reason)
    .bind(change.traffic_density)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::query(LOG_STATE_CHANGE, e))
}
