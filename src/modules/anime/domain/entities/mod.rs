pub mod anime_record;
pub mod empty_result;
pub mod episode_record;
pub mod search_page;
pub mod streaming_bundle;

pub use anime_record::{
    normalize_title, qualify_id, strip_source_prefix, AnimeRecord, EpisodeCounts,
};
pub use empty_result::EmptyResult;
pub use episode_record::{EpisodeList, EpisodeRecord, ServerList, StreamServer};
pub use search_page::{AggregatedSearch, SearchPage, NO_SOURCE};
pub use streaming_bundle::{StreamingBundle, SubtitleTrack, TimeRange, VideoVariant};
