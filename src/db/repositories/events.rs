use super::{begin, best_effort, settle};
use crate::{
    db::{
        ids::{self, IdKind},
        models::{NewSystemEvent, SystemEvent},
        pool::ConnectionPool,
    },
    error::{StoreError, StoreResult},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{debug, error};

const LOG_EVENT: &str = "log system event";

/// Events repository for the audit/diagnostic event log
#[derive(Clone)]
pub struct EventsRepository {
    pool: Arc<ConnectionPool>,
}

impl EventsRepository {
    /// Create a new events repository
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Record a system event and return its `SE-<yyyymmdd>-<seq>` id.
    ///
    /// Best-effort: a failure is rolled back, logged and reported as `None`.
    pub async fn log_system_event(&self, event: &NewSystemEvent) -> Option<String> {
        match self.try_log_event(event).await {
            Ok(event_id) => {
                debug!(
                    "Logged {} event {} from {}",
                    event.event_type, event_id, event.event_source
                );
                Some(event_id)
            }
            Err(e) => {
                error!(
                    "Failed to log system event {} from {}: {}",
                    event.event_type, event.event_source, e
                );
                None
            }
        }
    }

    async fn try_log_event(&self, event: &NewSystemEvent) -> StoreResult<String> {
        let mut conn = self.pool.acquire().await?;
        let result = {
            let mut tx = begin(&mut conn, LOG_EVENT).await?;
            let inserted = insert_event(&mut tx, event, Utc::now()).await;
            settle(tx, LOG_EVENT, inserted).await
        };
        self.pool.release(conn);
        result
    }

    /// Get event by its generated id
    pub async fn get_system_event(&self, event_id: &str) -> Option<SystemEvent> {
        best_effort("get system event", self.fetch_event(event_id).await)
    }

    async fn fetch_event(&self, event_id: &str) -> StoreResult<Option<SystemEvent>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, SystemEvent>(
            r#"
            SELECT id, event_id, event_type, event_source, event_data, severity,
                   message, signal_id, timestamp
            FROM system_events
            WHERE event_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get system event", e));
        self.pool.release(conn);

        result
    }

    /// Latest events, newest first
    pub async fn get_recent_events(&self, limit: Option<i64>) -> Vec<SystemEvent> {
        best_effort(
            "get recent system events",
            self.fetch_recent(limit.unwrap_or(100)).await,
        )
    }

    async fn fetch_recent(&self, limit: i64) -> StoreResult<Vec<SystemEvent>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, SystemEvent>(
            r#"
            SELECT id, event_id, event_type, event_source, event_data, severity,
                   message, signal_id, timestamp
            FROM system_events
            ORDER BY timestamp DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get recent system events", e));
        self.pool.release(conn);

        result
    }
}

async fn insert_event(
    conn: &mut PgConnection,
    event: &NewSystemEvent,
    now: DateTime<Utc>,
) -> StoreResult<String> {
    let event_id = ids::next_id(&mut *conn, IdKind::Event, now.date_naive())
        .await
        .map_err(|e| StoreError::query(LOG_EVENT, e))?;

    sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO system_events (
            event_id, event_type, event_source, event_data, severity, message,
            signal_id, timestamp
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING event_id
        "#,
    )
    .bind(&event_id)
    .bind(&event.event_type)
    .bind(&event.event_source)
    .bind(&event.event_data)
    .bind(event.severity)
    .bind(&event.message)
    .bind(&event.signal_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::query(LOG_EVENT, e))
}
