use super::{begin, best_effort, settle};
use crate::{
    db::{
        ids::{self, IdKind},
        models::{EmergencyDetection, EmergencyDetectionDb, NewDetection},
        pool::ConnectionPool,
    },
    error::{StoreError, StoreResult},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{error, info};

const LOG_DETECTION: &str = "log emergency detection";

/// Detections repository for emergency-vehicle sightings
#[derive(Clone)]
pub struct DetectionsRepository {
    pool: Arc<ConnectionPool>,
}

impl DetectionsRepository {
    /// Create a new detections repository
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Record a detection and return its generated `ED-<year>-<seq>` id.
    ///
    /// Critical: any failure is rolled back and returned.
    pub async fn log_detection(&self, detection: &NewDetection) -> StoreResult<String> {
        let result = self.try_log_detection(detection).await;
        match &result {
            Ok(detection_id) => info!(
                "Logged {} detection {} at signal {}",
                detection.vehicle_type, detection_id, detection.signal_id
            ),
            Err(e) => error!(
                "Failed to log emergency detection at signal {}: {}",
                detection.signal_id, e
            ),
        }
        result
    }

    async fn try_log_detection(&self, detection: &NewDetection) -> StoreResult<String> {
        let bbox = detection
            .bbox_coordinates
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let features = detection
            .features_detected
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let mut conn = self.pool.acquire().await?;
        let result = {
            let mut tx = begin(&mut conn, LOG_DETECTION).await?;
            let inserted = insert_detection(&mut tx, detection, bbox, features, Utc::now()).await;
            settle(tx, LOG_DETECTION, inserted).await
        };
        self.pool.release(conn);
        result
    }

    /// Get a detection by its generated id; the newest row wins if the id recurs.
    pub async fn get_detection(&self, detection_id: &str) -> Option<EmergencyDetection> {
        best_effort(
            "get emergency detection",
            self.fetch_detection(detection_id).await,
        )
    }

    async fn fetch_detection(&self, detection_id: &str) -> StoreResult<Option<EmergencyDetection>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, EmergencyDetectionDb>(
            r#"
            SELECT id, detection_id, signal_id, vehicle_type, confidence, detection_time,
                   image_path, bbox_coordinates, features_detected, action_taken,
                   response_time_ms, created_at
            FROM emergency_detections
            WHERE detection_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(detection_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get emergency detection", e));
        self.pool.release(conn);

        Ok(result?.map(EmergencyDetection::from))
    }

    /// Most recent detections at a signal, newest first
    pub async fn get_recent_detections(&self, signal_id: &str, limit: Option<i64>) -> Vec<EmergencyDetection> {
        best_effort(
            "get recent detections",
            self.fetch_recent(signal_id, limit.unwrap_or(100)).await,
        )
    }

    async fn fetch_recent(&self, signal_id: &str, limit: i64) -> StoreResult<Vec<EmergencyDetection>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, EmergencyDetectionDb>(
            r#"
            SELECT id, detection_id, signal_id, vehicle_type, confidence, detection_time,
                   image_path, bbox_coordinates, features_detected, action_taken,
                   response_time_ms, created_at
            FROM emergency_detections
            WHERE signal_id = $1
            ORDER BY detection_time DESC
            LIMIT $2
            "#,
        )
        .bind(signal_id)
        .bind(limit)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get recent detections", e));
        self.pool.release(conn);

        Ok(result?.into_iter().map(EmergencyDetection::from).collect())
    }
}

async fn insert_detection(
    conn: &mut PgConnection,
    detection: &NewDetection,
    bbox: Option<serde_json::Value>,
    features: Option<serde_json::Value>,
    now: DateTime<Utc>,
) -> StoreResult<String> {
    let detection_id = ids::next_id(&mut *conn, IdKind::Detection, now.date_naive())
        .await
        .map_err(|e| StoreError::query(LOG_DETECTION, e))?;

    sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO emergency_detections (
            detection_id, signal_id, vehicle_type, confidence, detection_time,
            image_path, bbox_coordinates, features_detected, action_taken,
            response_time_ms, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING detection_id
        "#,
    )
    .bind(&detection_id)
    .bind(&detection.signal_id)
    .bind(detection.vehicle_type)
    .bind(detection.confidence)
    .bind(detection.detection_time)
    .bind(&detection.image_path)
    .bind(bbox)
    .bind(features)
    .bind(&detection.action_taken)
    .bind(detection.response_time_ms)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::query(LOG_DETECTION, e))
}
