pub mod health_monitor;

// Re-export main types
pub use crate::modules::provider::domain::value_objects::HealthMonitorConfig;
pub use health_monitor::HealthMonitor;
