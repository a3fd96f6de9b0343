use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

text_enum! {
    /// Class of emergency vehicle the detector recognised
    pub enum VehicleType {
        Ambulance => "ambulance",
        Police => "police",
        FireTruck => "fire_truck",
        Other => "other",
    }
}

/// Pixel-space box around the detected vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Detection to be logged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDetection {
    pub signal_id: String,
    pub vehicle_type: VehicleType,
    pub confidence: f64,
    pub detection_time: DateTime<Utc>,
    pub bbox_coordinates: Option<BoundingBox>,
    pub features_detected: Option<Vec<String>>,
    pub action_taken: Option<String>,
    pub response_time_ms: Option<i32>,
    pub image_path: Option<String>,
}

impl NewDetection {
    pub fn new(
        signal_id: impl Into<String>,
        vehicle_type: VehicleType,
        confidence: f64,
        detection_time: DateTime<Utc>,
    ) -> Self {
        Self {
            signal_id: signal_id.into(),
            vehicle_type,
            confidence,
            detection_time,
            bbox_coordinates: None,
            features_detected: None,
            action_taken: None,
            response_time_ms: None,
            image_path: None,
        }
    }
}

/// Emergency detection model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyDetection {
    pub id: i64,
    pub detection_id: String,
    pub signal_id: String,
    pub vehicle_type: VehicleType,
    pub confidence: f64,
    pub detection_time: DateTime<Utc>,
    pub image_path: Option<String>,
    pub bbox_coordinates: Option<BoundingBox>,
    pub features_detected: Option<Vec<String>>,
    pub action_taken: Option<String>,
    pub response_time_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmergencyDetectionDb {
    pub id: i64,
    pub detection_id: String,
    pub signal_id: String,
    pub vehicle_type: VehicleType,
    pub confidence: f64,
    pub detection_time: DateTime<Utc>,
    pub image_path: Option<String>,
    pub bbox_coordinates: Option<Json<BoundingBox>>,
    pub features_detected: Option<Json<Vec<String>>>,
    pub action_taken: Option<String>,
    pub response_time_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<EmergencyDetectionDb> for EmergencyDetection {
    fn from(db: EmergencyDetectionDb) -> Self {
        Self {
            id: db.id,
            detection_id: db.detection_id,
            signal_id: db.signal_id,
            vehicle_type: db.vehicle_type,
            confidence: db.confidence,
            detection_time: db.detection_time,
            image_path: db.image_path,
            bbox_coordinates: db.bbox_coordinates.map(|Json(b)| b),
            features_detected: db.features_detected.map(|Json(f)| f),
            action_taken: db.action_taken,
            response_time_ms: db.response_time_ms,
            created_at: db.created_at,
        }
    }
}
