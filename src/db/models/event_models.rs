use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Event severity
    pub enum Severity {
        Debug => "debug",
        Info => "info",
        Warning => "warning",
        Error => "error",
        Critical => "critical",
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

/// System event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSystemEvent {
    pub event_type: String,
    pub event_source: String,
    pub event_data: Option<serde_json::Value>,
    #[serde(default)]
    pub severity: Severity,
    pub message: Option<String>,
    pub signal_id: Option<String>,
}

impl NewSystemEvent {
    pub fn new(event_type: impl Into<String>, event_source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            event_source: event_source.into(),
            event_data: None,
            severity: Severity::default(),
            message: None,
            signal_id: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.event_data = Some(data);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn for_signal(mut self, signal_id: impl Into<String>) -> Self {
        self.signal_id = Some(signal_id.into());
        self
    }
}

/// System event model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemEvent {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub event_source: String,
    pub event_data: Option<serde_json::Value>,
    pub severity: Severity,
    pub message: Option<String>,
    pub signal_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}
