use crate::config::RetentionConfig;
use crate::db::models::{CleanupReport, NewSystemEvent};
use crate::db::TrafficStore;
use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::time::{interval, Duration};

const EVENT_SOURCE: &str = "retention_service";

/// Periodic retention sweep over the traffic database
pub struct RetentionService {
    config: RetentionConfig,
    store: TrafficStore,
}

impl RetentionService {
    /// Create a new retention service
    pub fn new(config: RetentionConfig, store: TrafficStore) -> Self {
        Self { config, store }
    }

    /// Start the retention loop in the background.
    ///
    /// The first sweep runs immediately, then once per check interval.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        if !self.config.enabled {
            info!("Retention service is disabled");
            return Ok(());
        }

        info!(
            "Starting retention service: keeping {} days, checking every {} seconds",
            self.config.days_to_keep, self.config.check_interval_secs
        );

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(self.config.check_interval_secs.max(1)));

            loop {
                interval.tick().await;

                if let Err(e) = self.run_sweep().await {
                    error!("Error running retention sweep: {}", e);
                }
            }
        });

        Ok(())
    }

    /// Run one sweep and record its outcome as a system event
    pub async fn run_sweep(&self) -> Result<CleanupReport> {
        info!("Running retention sweep");

        let report = self
            .store
            .maintenance
            .cleanup_old_data(self.config.days_to_keep)
            .await?;

        if self
            .store
            .events
            .log_system_event(&cleanup_event(self.config.days_to_keep, &report))
            .await
            .is_none()
        {
            warn!("Failed to record data cleanup event");
        }

        Ok(report)
    }
}

fn cleanup_event(days_to_keep: u32, report: &CleanupReport) -> NewSystemEvent {
    NewSystemEvent::new("data_cleanup", EVENT_SOURCE)
        .with_message(format!(
            "Removed {} records older than {} days",
            report.total(),
            days_to_keep
        ))
        .with_data(serde_json::json!({
            "days_to_keep": days_to_keep,
            "raw_cutoff": report.cutoffs.raw_before.to_rfc3339(),
            "aggregated_cutoff": report.cutoffs.aggregated_before.to_string(),
            "detections_deleted": report.detections_deleted,
            "state_history_deleted": report.state_history_deleted,
            "events_deleted": report.events_deleted,
            "analytics_deleted": report.analytics_deleted,
            "total_deleted": report.total(),
        }))
}
