//! Multi-source anime aggregation engine
//!
//! Sources implementing [`AnimeSource`] are registered with a
//! [`SourceManagerBuilder`]; the resulting [`SourceManager`] handles
//! failover, fan-out, health tracking and caching across them.

pub mod config;
pub mod modules;
pub mod shared;

pub use config::AggregatorConfig;
pub use modules::anime::{
    AggregatedSearch, AnimeRecord, EpisodeList, EpisodeRecord, SearchPage, ServerList,
    StreamCategory, StreamServer, StreamingBundle,
};
pub use modules::provider::{
    AnimeSource, HealthStatus, SearchFilters, SourceHealth, SourceInfo, SourceManager,
    SourceManagerBuilder, SourceProfile, SourceRequirements,
};
pub use shared::errors::{AppError, AppResult};
