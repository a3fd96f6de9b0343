//! Human-readable, day-bucketed sequential identifiers.
//!
//! `ED-2026-007` is the seventh detection stored today, `SE-20261019-0042` the
//! forty-second system event. The sequence is one past the highest sequence
//! already issued in today's bucket, so it restarts at 1 every UTC day and
//! never repeats within a day even after rows are deleted. Detection and route
//! ids only carry the year and therefore recur on different days.
//!
//! The lookup and the insert that follows must share one transaction. An
//! advisory lock per tag, held until that transaction ends, keeps concurrent
//! writers from reading the same sequence.

use chrono::NaiveDate;
use sqlx::PgConnection;

/// Which record family an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Detection,
    Route,
    Event,
}

impl IdKind {
    pub fn tag(self) -> &'static str {
        match self {
            IdKind::Detection => "ED",
            IdKind::Route => "ER",
            IdKind::Event => "SE",
        }
    }

    fn width(self) -> usize {
        match self {
            IdKind::Detection | IdKind::Route => 3,
            IdKind::Event => 4,
        }
    }

    pub fn date_component(self, day: NaiveDate) -> String {
        match self {
            IdKind::Detection | IdKind::Route => day.format("%Y").to_string(),
            IdKind::Event => day.format("%Y%m%d").to_string(),
        }
    }

    fn last_sequence_sql(self) -> &'static str {
        match self {
            IdKind::Detection => {
                r#"
                SELECT COALESCE(MAX(split_part(detection_id, '-', 3)::bigint)
                                FILTER (WHERE detection_id ~ '^ED-[0-9]+-[0-9]+$'), 0)
                FROM emergency_detections
                WHERE (created_at AT TIME ZONE 'UTC')::date = $1
                "#
            }
            IdKind::Route => {
                r#"
                SELECT COALESCE(MAX(split_part(route_id, '-', 3)::bigint)
                                FILTER (WHERE route_id ~ '^ER-[0-9]+-[0-9]+$'), 0)
                FROM emergency_routes
                WHERE (created_at AT TIME ZONE 'UTC')::date = $1
                "#
            }
            IdKind::Event => {
                r#"
                SELECT COALESCE(MAX(split_part(event_id, '-', 3)::bigint)
                                FILTER (WHERE event_id ~ '^SE-[0-9]+-[0-9]+$'), 0)
                FROM system_events
                WHERE (timestamp AT TIME ZONE 'UTC')::date = $1
                "#
            }
        }
    }

    fn lock_key(self) -> i64 {
        // 'T','R','F' followed by the tag bytes
        let tag = self.tag().as_bytes();
        i64::from_be_bytes([0, 0, 0, b'T', b'R', b'F', tag[0], tag[1]])
    }
}

/// Render an identifier for the given bucket and sequence number.
pub fn format_id(kind: IdKind, day: NaiveDate, sequence: i64) -> String {
    format!(
        "{}-{}-{:0width$}",
        kind.tag(),
        kind.date_component(day),
        sequence,
        width = kind.width()
    )
}

/// Allocate the next identifier in `day`'s bucket.
///
/// `conn` must be inside the transaction that inserts the row.
pub(crate) async fn next_id(
    conn: &mut PgConnection,
    kind: IdKind,
    day: NaiveDate,
) -> Result<String, sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(kind.lock_key())
        .execute(&mut *conn)
        .await?;

    let last: i64 = sqlx::query_scalar(kind.last_sequence_sql())
        .bind(day)
        .fetch_one(&mut *conn)
        .await?;

    Ok(format_id(kind, day, last + 1))
}
