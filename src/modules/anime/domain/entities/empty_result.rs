use super::{
    anime_record::AnimeRecord, episode_record::EpisodeRecord, episode_record::StreamServer,
    search_page::SearchPage, streaming_bundle::StreamingBundle,
};

/// "Was anything found?" for every canonical result shape
///
/// Fallback walks and the cache only ever ask this question; they never
/// inspect errors.
pub trait EmptyResult {
    fn is_empty_result(&self) -> bool;
}

impl EmptyResult for SearchPage {
    fn is_empty_result(&self) -> bool {
        self.results.is_empty()
    }
}

impl EmptyResult for StreamingBundle {
    fn is_empty_result(&self) -> bool {
        self.sources.is_empty()
    }
}

impl EmptyResult for AnimeRecord {
    fn is_empty_result(&self) -> bool {
        false
    }
}

impl EmptyResult for Vec<EpisodeRecord> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl EmptyResult for Vec<StreamServer> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl<T: EmptyResult> EmptyResult for Option<T> {
    fn is_empty_result(&self) -> bool {
        self.as_ref().map_or(true, EmptyResult::is_empty_result)
    }
}
