pub mod adapters;
pub mod cache;
pub mod decorators;
pub mod http_client;
pub mod manager;
pub mod monitoring;
pub mod service;

pub use adapters::{AniListSource, JikanSource};
pub use cache::{CacheStats, CacheTtlConfig};
pub use decorators::SourceAdapter;
pub use http_client::{RateLimitClient, RetryPolicy};
pub use manager::{ManagerConfig, SourceInfo, SourceManager, SourceManagerBuilder};
pub use monitoring::HealthMonitor;
pub use service::{ResolverConfig, StreamingResolver};
