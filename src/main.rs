use anyhow::{Context, Result};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use traffic_store::db::models::NewSystemEvent;
use traffic_store::{load_config, RetentionService, TrafficStore};

const EVENT_SOURCE: &str = "traffic_store";

async fn run_app() -> Result<()> {
    // Initialize logging
    env_logger::init();
    info!("Starting traffic store");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    info!("Configuration loaded");

    let store = TrafficStore::connect(&config.database)
        .await
        .context("Failed to connect to the traffic database")?;
    info!("Database pool ready");

    if store
        .events
        .log_system_event(
            &NewSystemEvent::new("system_startup", EVENT_SOURCE).with_data(serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        )
        .await
        .is_none()
    {
        warn!("Failed to record system startup event");
    }

    let retention = Arc::new(RetentionService::new(config.retention.clone(), store.clone()));
    retention.start().await?;

    // Wait for termination signals
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    if store
        .events
        .log_system_event(
            &NewSystemEvent::new("system_shutdown", EVENT_SOURCE)
                .with_data(serde_json::json!({"reason": "Normal shutdown"})),
        )
        .await
        .is_none()
    {
        error!("Failed to record shutdown event");
    }

    store.close().await;
    info!("Database pool closed");

    Ok(())
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_app()) {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
