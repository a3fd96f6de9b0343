use super::{begin, best_effort, settle};
use crate::{
    db::{
        ids::{self, IdKind},
        models::{EmergencyRoute, EmergencyRouteDb, NewRoute, RouteCompletion},
        pool::ConnectionPool,
    },
    error::{StoreError, StoreResult},
};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{error, info};

const CREATE_ROUTE: &str = "create emergency route";
const COMPLETE_ROUTE: &str = "update route completion";

/// Serialized JSON payloads of a route, prepared before the transaction opens
struct RoutePayloads {
    start_location: serde_json::Value,
    end_location: serde_json::Value,
    route_waypoints: Option<serde_json::Value>,
    signals_coordinated: Option<serde_json::Value>,
}

impl RoutePayloads {
    fn from_route(route: &NewRoute) -> Result<Self, serde_json::Error> {
        Ok(Self {
            start_location: serde_json::to_value(&route.start_location)?,
            end_location: serde_json::to_value(&route.end_location)?,
            route_waypoints: route
                .route_waypoints
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
            signals_coordinated: route
                .signals_coordinated
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        })
    }
}

/// Routes repository for emergency dispatch routes
#[derive(Clone)]
pub struct RoutesRepository {
    pool: Arc<ConnectionPool>,
}

impl RoutesRepository {
    /// Create a new routes repository
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Record a dispatched route in `pending` state and return its `ER-<year>-<seq>` id.
    pub async fn create_route(&self, route: &NewRoute) -> StoreResult<String> {
        let result = self.try_create_route(route).await;
        match &result {
            Ok(route_id) => info!("Created {} route {}", route.vehicle_type, route_id),
            Err(e) => error!("Failed to create emergency route: {}", e),
        }
        result
    }

    async fn try_create_route(&self, route: &NewRoute) -> StoreResult<String> {
        let payloads = RoutePayloads::from_route(route)?;

        let mut conn = self.pool.acquire().await?;
        let result = {
            let mut tx = begin(&mut conn, CREATE_ROUTE).await?;
            let inserted = insert_route(&mut tx, route, payloads, Utc::now()).await;
            settle(tx, CREATE_ROUTE, inserted).await
        };
        self.pool.release(conn);
        result
    }

    /// Close out a route with its measured outcome.
    ///
    /// Only `actual_duration`, `time_saved`, `status` and `completed_at` change.
    /// An unknown `route_id` is reported as [`StoreError::NotFound`].
    pub async fn update_route_completion(
        &self,
        route_id: &str,
        completion: RouteCompletion,
    ) -> StoreResult<()> {
        let result = self.try_complete_route(route_id, completion).await;
        match &result {
            Ok(()) => info!(
                "Route {} {} in {}s ({}s saved)",
                route_id, completion.status, completion.actual_duration, completion.time_saved
            ),
            Err(e) => error!("Failed to update route completion for {}: {}", route_id, e),
        }
        result
    }

    async fn try_complete_route(&self, route_id: &str, completion: RouteCompletion) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        let result = {
            let mut tx = begin(&mut conn, COMPLETE_ROUTE).await?;
            let updated = complete_route(&mut tx, route_id, completion, Utc::now()).await;
            settle(tx, COMPLETE_ROUTE, updated).await
        };
        self.pool.release(conn);
        result
    }

    /// Get a route by its generated id; the newest row wins if the id recurs.
    pub async fn get_route(&self, route_id: &str) -> Option<EmergencyRoute> {
        best_effort("get emergency route", self.fetch_route(route_id).await)
    }

    async fn fetch_route(&self, route_id: &str) -> StoreResult<Option<EmergencyRoute>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query_as::<_, EmergencyRouteDb>(
            r#"
            SELECT id, route_id, vehicle_type, start_location, end_location, route_waypoints,
                   signals_coordinated, total_distance, estimated_duration, actual_duration,
                   time_saved, priority_level, status, created_at, completed_at
            FROM emergency_routes
            WHERE route_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(route_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StoreError::query("get emergency route", e));
        self.pool.release(conn);

        Ok(result?.map(EmergencyRoute::from))
    }
}

async fn insert_route(
    conn: &mut PgConnection,
    route: &NewRoute,
    payloads: RoutePayloads,
    now: DateTime<Utc>,
) -> StoreResult<String> {
    let route_id = ids::next_id(&mut *conn, IdKind::Route, now.date_naive())
        .await
        .map_err(|e| StoreError::query(CREATE_ROUTE, e))?;

    sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO emergency_routes (
            route_id, vehicle_type, start_location, end_location, route_waypoints,
            signals_coordinated, total_distance, estimated_duration, priority_level,
            status, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10)
        RETURNING route_id
        "#,
    )
    .bind(&route_id)
    .bind(route.vehicle_type)
    .bind(payloads.start_location)
    .bind(payloads.end_location)
    .bind(payloads.route_waypoints)
    .bind(payloads.signals_coordinated)
    .bind(route.total_distance)
    .bind(route.estimated_duration)
    .bind(route.priority_level)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::query(CREATE_ROUTE, e))
}

async fn complete_route(
    conn: &mut PgConnection,
    route_id: &str,
    completion: RouteCompletion,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    // Ids recur across days; only the newest route carrying it is completed.
    let updated = sqlx::query(
        r#"
        UPDATE emergency_routes
        SET actual_duration = $1, time_saved = $2, status = $3, completed_at = $4
        WHERE id = (
            SELECT id FROM emergency_routes
            WHERE route_id = $5
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        )
        "#,
    )
    .bind(completion.actual_duration)
    .bind(completion.time_saved)
    .bind(completion.status)
    .bind(now)
    .bind(route_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| StoreError::query(COMPLETE_ROUTE, e))?;

    if updated.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("emergency route {}", route_id)));
    }
    Ok(())
}
