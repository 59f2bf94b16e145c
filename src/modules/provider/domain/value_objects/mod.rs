pub mod provider_health;
pub mod search_criteria;

pub use provider_health::{HealthMonitorConfig, HealthStatus, ProviderHealth, SourceHealth};
pub use search_criteria::{SearchFilters, SourceRequirements};
