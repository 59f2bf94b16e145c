pub mod domain;

// Re-export the canonical model for shorter imports
pub use domain::entities::{
    AggregatedSearch, AnimeRecord, EmptyResult, EpisodeList, EpisodeRecord, SearchPage, ServerList,
    StreamServer, StreamingBundle, NO_SOURCE,
};
pub use domain::value_objects::{AnimeStatus, AnimeType, StreamCategory, VideoQuality};
