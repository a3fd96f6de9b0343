use sqlx::PgPool;
use tracing::info;

/// Embedded schema files, applied in order.
///
/// Every statement is idempotent (`IF NOT EXISTS`), so applying them against a
/// database that production migrations already set up changes nothing.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_traffic_schema.sql",
    include_str!("sql/001_traffic_schema.sql"),
)];

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for (name, sql) in MIGRATIONS {
        sqlx::raw_sql(sql).execute(pool).await?;
        info!("Applied migration: {}", name);
    }

    Ok(())
}
