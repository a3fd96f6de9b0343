use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Operational status of a signal
    pub enum SignalStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

text_enum! {
    /// Link state between the platform and a signal controller
    pub enum ConnectionStatus {
        Connected => "connected",
        Disconnected => "disconnected",
        Unknown => "unknown",
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::Connected
    }
}

/// Traffic signal model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrafficSignal {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_description: Option<String>,
    pub signal_type: String,
    pub status: SignalStatus,
    pub installation_date: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
    pub default_timing: Option<serde_json::Value>,
    pub emergency_override_enabled: bool,
    pub ai_detection_enabled: bool,
    pub ip_address: Option<String>,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub connection_status: ConnectionStatus,
}

/// A signal entering a state for a fixed number of seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStateChange {
    pub signal_id: String,
    pub state: String,
    /// Seconds the signal stays in `state`
    pub duration: i32,
    #[serde(default)]
    pub is_emergency_override: bool,
    pub override_reason: Option<String>,
    pub traffic_density: Option<f64>,
}

impl NewStateChange {
    pub fn new(signal_id: impl Into<String>, state: impl Into<String>, duration: i32) -> Self {
        Self {
            signal_id: signal_id.into(),
            state: state.into(),
            duration,
            is_emergency_override: false,
            override_reason: None,
            traffic_density: None,
        }
    }

    /// Mark the state as forced by an emergency vehicle.
    pub fn emergency_override(mut self, reason: impl Into<String>) -> Self {
        self.is_emergency_override = true;
        self.override_reason = Some(reason.into());
        self
    }

    /// The interval the state covers when it begins at `start_time`.
    pub fn interval(&self, start_time: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (start_time, start_time + Duration::seconds(i64::from(self.duration)))
    }
}

/// Signal state history row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SignalStateRecord {
    pub id: i64,
    pub signal_id: String,
    pub state: String,
    pub state_duration: i32,
    pub is_emergency_override: bool,
    pub override_reason: Option<String>,
    pub traffic_density: Option<f64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
