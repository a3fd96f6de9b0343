use serde::{Deserialize, Serialize};

/// Hospital model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hospital {
    pub id: i32,
    pub name: String,
    pub hospital_type: String,
    pub emergency_services: bool,
    pub status: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Narrowing applied to hospital lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalFilter {
    pub hospital_type: Option<String>,
    #[serde(default)]
    pub emergency_only: bool,
}

impl HospitalFilter {
    pub fn of_type(hospital_type: impl Into<String>) -> Self {
        Self {
            hospital_type: Some(hospital_type.into()),
            emergency_only: false,
        }
    }

    pub fn emergency_only(mut self) -> Self {
        self.emergency_only = true;
        self
    }
}
