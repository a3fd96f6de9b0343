use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Trailing window used by traffic analytics when no dates are given
pub const TRAFFIC_WINDOW_DAYS: i64 = 7;
/// Trailing window used by emergency analytics when no dates are given
pub const EMERGENCY_WINDOW_DAYS: i64 = 30;

/// Inclusive range of UTC calendar dates an analytics query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AnalyticsPeriod {
    /// Fill in missing bounds with a window of `trailing_days` ending `today`.
    pub fn resolve(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        trailing_days: i64,
        today: NaiveDate,
    ) -> Self {
        Self {
            start_date: start_date.unwrap_or(today - Duration::days(trailing_days)),
            end_date: end_date.unwrap_or(today),
        }
    }
}

/// Detection totals over the whole period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DetectionOverview {
    pub total_detections: i64,
    pub signals_with_detections: i64,
    pub avg_confidence: Option<f64>,
    pub ambulance_detections: i64,
    pub police_detections: i64,
    pub fire_truck_detections: i64,
}

/// Detections on a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyDetections {
    pub date: NaiveDate,
    pub detections: i64,
    pub signals_involved: i64,
    pub avg_confidence: Option<f64>,
}

/// Detections at one signal; zero for signals that saw none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SignalDetectionStats {
    pub id: String,
    pub name: String,
    pub detections: i64,
    pub avg_confidence: Option<f64>,
    pub last_detection: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficAnalytics {
    pub period: AnalyticsPeriod,
    pub overall: DetectionOverview,
    pub daily_breakdown: Vec<DailyDetections>,
    pub signal_statistics: Vec<SignalDetectionStats>,
}

impl TrafficAnalytics {
    pub fn empty(period: AnalyticsPeriod) -> Self {
        Self {
            period,
            overall: DetectionOverview::default(),
            daily_breakdown: Vec::new(),
            signal_statistics: Vec::new(),
        }
    }
}

/// Route totals over the period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RouteStatistics {
    pub total_routes: i64,
    pub completed_routes: i64,
    pub avg_distance: Option<f64>,
    pub avg_estimated_duration: Option<f64>,
    pub avg_actual_duration: Option<f64>,
    pub avg_time_saved: Option<f64>,
    pub ambulance_routes: i64,
    pub police_routes: i64,
    pub fire_truck_routes: i64,
}

/// Detection-to-action latency, over detections that report one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResponseTimeStatistics {
    pub avg_response_time: Option<f64>,
    pub min_response_time: Option<i32>,
    pub max_response_time: Option<i32>,
    /// Under 1000 ms
    pub fast_responses: i64,
    /// 1000 ms up to 3000 ms
    pub medium_responses: i64,
    /// 3000 ms and above
    pub slow_responses: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HourlyDetections {
    pub hour: i32,
    pub detections: i64,
}

/// Expand sparse per-hour rows into all 24 hours of the day.
pub fn full_day_distribution(rows: &[HourlyDetections]) -> Vec<HourlyDetections> {
    (0..24)
        .map(|hour| HourlyDetections {
            hour,
            detections: rows
                .iter()
                .filter(|row| row.hour == hour)
                .map(|row| row.detections)
                .sum(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyAnalytics {
    pub period: AnalyticsPeriod,
    pub route_statistics: RouteStatistics,
    pub response_time_statistics: ResponseTimeStatistics,
    pub hourly_distribution: Vec<HourlyDetections>,
}

impl EmergencyAnalytics {
    pub fn empty(period: AnalyticsPeriod) -> Self {
        Self {
            period,
            route_statistics: RouteStatistics::default(),
            response_time_statistics: ResponseTimeStatistics::default(),
            hourly_distribution: full_day_distribution(&[]),
        }
    }
}
