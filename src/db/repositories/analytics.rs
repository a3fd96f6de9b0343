//! Aggregations over detections and routes for dashboard reporting.
//!
//! Both reports run their queries on a single checked-out connection and fall
//! back to an empty report, keeping the requested period, if anything fails.
//! Days are UTC calendar dates and both bounds are inclusive.

use crate::{
    db::{
        models::{
            full_day_distribution, AnalyticsPeriod, DailyDetections, DetectionOverview,
            EmergencyAnalytics, HourlyDetections, ResponseTimeStatistics, RouteStatistics,
            SignalDetectionStats, TrafficAnalytics, EMERGENCY_WINDOW_DAYS, TRAFFIC_WINDOW_DAYS,
        },
        pool::ConnectionPool,
    },
    error::{StoreError, StoreResult},
};
use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{debug, error};

/// Analytics repository
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: Arc<ConnectionPool>,
}

impl AnalyticsRepository {
    /// Create a new analytics repository
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Detection report; defaults to the trailing 7 days.
    pub async fn get_traffic_analytics(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> TrafficAnalytics {
        let period = AnalyticsPeriod::resolve(
            start_date,
            end_date,
            TRAFFIC_WINDOW_DAYS,
            Utc::now().date_naive(),
        );

        match self.collect_traffic(period).await {
            Ok(analytics) => {
                debug!(
                    "Traffic analytics {}..{}: {} detections",
                    period.start_date, period.end_date, analytics.overall.total_detections
                );
                analytics
            }
            Err(e) => {
                error!("Failed to get traffic analytics: {}", e);
                TrafficAnalytics::empty(period)
            }
        }
    }

    async fn collect_traffic(&self, period: AnalyticsPeriod) -> StoreResult<TrafficAnalytics> {
        let mut conn = self.pool.acquire().await?;
        let result = traffic_report(&mut conn, period).await;
        self.pool.release(conn);
        result
    }

    /// Emergency response report; defaults to the trailing 30 days.
    pub async fn get_emergency_analytics(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> EmergencyAnalytics {
        let period = AnalyticsPeriod::resolve(
            start_date,
            end_date,
            EMERGENCY_WINDOW_DAYS,
            Utc::now().date_naive(),
        );

        match self.collect_emergency(period).await {
            Ok(analytics) => analytics,
            Err(e) => {
                error!("Failed to get emergency analytics: {}", e);
                EmergencyAnalytics::empty(period)
            }
        }
    }

    async fn collect_emergency(&self, period: AnalyticsPeriod) -> StoreResult<EmergencyAnalytics> {
        let mut conn = self.pool.acquire().await?;
        let result = emergency_report(&mut conn, period).await;
        self.pool.release(conn);
        result
    }
}

async fn traffic_report(conn: &mut PgConnection, period: AnalyticsPeriod) -> StoreResult<TrafficAnalytics> {
    let overall = sqlx::query_as::<_, DetectionOverview>(
        r#"
        SELECT
            COUNT(*) AS total_detections,
            COUNT(DISTINCT signal_id) AS signals_with_detections,
            AVG(confidence)::float8 AS avg_confidence,
            COUNT(*) FILTER (WHERE vehicle_type = 'ambulance') AS ambulance_detections,
            COUNT(*) FILTER (WHERE vehicle_type = 'police') AS police_detections,
            COUNT(*) FILTER (WHERE vehicle_type = 'fire_truck') AS fire_truck_detections
        FROM emergency_detections
        WHERE (detection_time AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        "#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::query("traffic analytics overview", e))?;

    let daily_breakdown = sqlx::query_as::<_, DailyDetections>(
        r#"
        SELECT
            (detection_time AT TIME ZONE 'UTC')::date AS date,
            COUNT(*) AS detections,
            COUNT(DISTINCT signal_id) AS signals_involved,
            AVG(confidence)::float8 AS avg_confidence
        FROM emergency_detections
        WHERE (detection_time AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| StoreError::query("traffic analytics daily breakdown", e))?;

    // LEFT JOIN keeps signals without detections in the range.
    let signal_statistics = sqlx::query_as::<_, SignalDetectionStats>(
        r#"
        SELECT
            s.id, s.name,
            COUNT(ed.id) AS detections,
            AVG(ed.confidence)::float8 AS avg_confidence,
            MAX(ed.detection_time) AS last_detection
        FROM traffic_signals s
        LEFT JOIN emergency_detections ed ON s.id = ed.signal_id
            AND (ed.detection_time AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        GROUP BY s.id, s.name
        ORDER BY detections DESC, s.name
        "#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| StoreError::query("traffic analytics signal statistics", e))?;

    Ok(TrafficAnalytics {
        period,
        overall,
        daily_breakdown,
        signal_statistics,
    })
}

async fn emergency_report(conn: &mut PgConnection, period: AnalyticsPeriod) -> StoreResult<EmergencyAnalytics> {
    let route_statistics = sqlx::query_as::<_, RouteStatistics>(
        r#"
        SELECT
            COUNT(*) AS total_routes,
            COUNT(*) FILTER (WHERE status = 'completed') AS completed_routes,
            AVG(total_distance)::float8 AS avg_distance,
            AVG(estimated_duration)::float8 AS avg_estimated_duration,
            AVG(actual_duration)::float8 AS avg_actual_duration,
            AVG(time_saved)::float8 AS avg_time_saved,
            COUNT(*) FILTER (WHERE vehicle_type = 'ambulance') AS ambulance_routes,
            COUNT(*) FILTER (WHERE vehicle_type = 'police') AS police_routes,
            COUNT(*) FILTER (WHERE vehicle_type = 'fire_truck') AS fire_truck_routes
        FROM emergency_routes
        WHERE (created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        "#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::query("emergency analytics route statistics", e))?;

    let response_time_statistics = sqlx::query_as::<_, ResponseTimeStatistics>(
        r#"
        SELECT
            AVG(response_time_ms)::float8 AS avg_response_time,
            MIN(response_time_ms) AS min_response_time,
            MAX(response_time_ms) AS max_response_time,
            COUNT(*) FILTER (WHERE response_time_ms < 1000) AS fast_responses,
            COUNT(*) FILTER (WHERE response_time_ms >= 1000 AND response_time_ms < 3000) AS medium_responses,
            COUNT(*) FILTER (WHERE response_time_ms >= 3000) AS slow_responses
        FROM emergency_detections
        WHERE (detection_time AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
          AND response_time_ms IS NOT NULL
        "#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::query("emergency analytics response times", e))?;

    let hourly = sqlx::query_as::<_, HourlyDetections>(
        r#"
        SELECT
            EXTRACT(HOUR FROM detection_time AT TIME ZONE 'UTC')::int4 AS hour,
            COUNT(*) AS detections
        FROM emergency_detections
        WHERE (detection_time AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| StoreError::query("emergency analytics hourly distribution", e))?;

    Ok(EmergencyAnalytics {
        period,
        route_statistics,
        response_time_statistics,
        hourly_distribution: full_day_distribution(&hourly),
    })
}
