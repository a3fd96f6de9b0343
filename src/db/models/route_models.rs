use super::VehicleType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

text_enum! {
    /// Route lifecycle status
    pub enum RouteStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
    }
}

/// A point on the road network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
        }
    }

    pub fn named(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: Some(name.into()),
        }
    }
}

/// Route to be created at dispatch time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoute {
    pub vehicle_type: VehicleType,
    pub start_location: GeoLocation,
    pub end_location: GeoLocation,
    pub route_waypoints: Option<Vec<GeoLocation>>,
    pub signals_coordinated: Option<Vec<String>>,
    /// Kilometres
    pub total_distance: Option<f64>,
    /// Seconds
    pub estimated_duration: Option<i32>,
    pub priority_level: i32,
}

impl NewRoute {
    pub fn new(vehicle_type: VehicleType, start_location: GeoLocation, end_location: GeoLocation) -> Self {
        Self {
            vehicle_type,
            start_location,
            end_location,
            route_waypoints: None,
            signals_coordinated: None,
            total_distance: None,
            estimated_duration: None,
            priority_level: 1,
        }
    }
}

/// Outcome reported when a vehicle reaches its destination
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteCompletion {
    /// Seconds
    pub actual_duration: i32,
    /// Seconds
    pub time_saved: i32,
    pub status: RouteStatus,
}

impl RouteCompletion {
    pub fn completed(actual_duration: i32, time_saved: i32) -> Self {
        Self {
            actual_duration,
            time_saved,
            status: RouteStatus::Completed,
        }
    }
}

/// Emergency route model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyRoute {
    pub id: i64,
    pub route_id: String,
    pub vehicle_type: VehicleType,
    pub start_location: GeoLocation,
    pub end_location: GeoLocation,
    pub route_waypoints: Option<Vec<GeoLocation>>,
    pub signals_coordinated: Option<Vec<String>>,
    pub total_distance: Option<f64>,
    pub estimated_duration: Option<i32>,
    pub actual_duration: Option<i32>,
    pub time_saved: Option<i32>,
    pub priority_level: i32,
    pub status: RouteStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmergencyRouteDb {
    pub id: i64,
    pub route_id: String,
    pub vehicle_type: VehicleType,
    pub start_location: Json<GeoLocation>,
    pub end_location: Json<GeoLocation>,
    pub route_waypoints: Option<Json<Vec<GeoLocation>>>,
    pub signals_coordinated: Option<Json<Vec<String>>>,
    pub total_distance: Option<f64>,
    pub estimated_duration: Option<i32>,
    pub actual_duration: Option<i32>,
    pub time_saved: Option<i32>,
    pub priority_level: i32,
    pub status: RouteStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<EmergencyRouteDb> for EmergencyRoute {
    fn from(db: EmergencyRouteDb) -> Self {
        Self {
            id: db.id,
            route_id: db.route_id,
            vehicle_type: db.vehicle_type,
            start_location: db.start_location.0,
            end_location: db.end_location.0,
            route_waypoints: db.route_waypoints.map(|Json(w)| w),
            signals_coordinated: db.signals_coordinated.map(|Json(s)| s),
            total_distance: db.total_distance,
            estimated_duration: db.estimated_duration,
            actual_duration: db.actual_duration,
            time_saved: db.time_saved,
            priority_level: db.priority_level,
            status: db.status,
            created_at: db.created_at,
            completed_at: db.completed_at,
        }
    }
}
