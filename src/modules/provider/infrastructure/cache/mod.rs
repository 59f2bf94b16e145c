pub mod provider_cache;

pub use provider_cache::{AdapterCache, CacheStats, CacheTtlConfig, TtlCache};
