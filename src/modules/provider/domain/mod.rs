pub mod services;
pub mod value_objects;

// Re-exports for easy access
pub use services::{ProviderSelectionService, SelectionCandidate};
pub use value_objects::{
    HealthMonitorConfig, HealthStatus, SearchFilters, SourceHealth, SourceRequirements,
};
