use super::best_effort;
use crate::{
    db::{
        models::{Hospital, HospitalFilter},
        pool::ConnectionPool,
    },
    error::{StoreError, StoreResult},
};
use std::sync::Arc;

/// Hospitals repository, read-only
#[derive(Clone)]
pub struct HospitalsRepository {
    pool: Arc<ConnectionPool>,
}

impl HospitalsRepository {
    /// Create a new hospitals repository
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Active hospitals matching the filter, ordered by name
    pub async fn get_hospitals(&self, filter: &HospitalFilter) -> Vec<Hospital> {
        best_effort("get hospitals", self.fetch(filter).await)
    }

    async fn fetch(&self, filter: &HospitalFilter) -> StoreResult<Vec<Hospital>> {
        let mut sql = String::from(
            r#"
            SELECT id, name, hospital_type, emergency_services, status, address, latitude, longitude
            FROM hospitals
            WHERE status = 'active'
            "#,
        );

        if filter.hospital_type.is_some() {
            sql.push_str(" AND hospital_type = $1");
        }
        if filter.emergency_only {
            sql.push_str(" AND emergency_services = true");
        }
        sql.push_str(" ORDER BY name");

        let mut query = sqlx::query_as::<_, Hospital>(&sql);
        if let Some(hospital_type) = &filter.hospital_type {
            query = query.bind(hospital_type);
        }

        let mut conn = self.pool.acquire().await?;
        let result = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| StoreError::query("get hospitals", e));
        self.pool.release(conn);

        result
    }
}
