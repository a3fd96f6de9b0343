pub mod config;
pub mod db;
pub mod error;
pub mod retention;

// Re-export main components for easier use
pub use config::{load_config, Config, DatabaseConfig, RetentionConfig};
pub use db::{ConnectionPool, TrafficStore};
pub use error::{StoreError, StoreResult};
pub use retention::RetentionService;
