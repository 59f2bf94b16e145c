use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::modules::anime::domain::{
    entities::{AnimeRecord, EpisodeRecord, SearchPage, StreamServer, StreamingBundle},
    value_objects::{StreamCategory, VideoQuality},
};
use crate::modules::provider::domain::value_objects::SearchFilters;
use crate::shared::errors::{AppError, AppResult};

/// Provider-specific implementation of the source capability set
///
/// Implementations may fail freely; the `SourceAdapter` wrapping each one
/// absorbs errors into empty results, applies timeouts, caches and reports
/// health. Ids handed back to the caller should be `"{name}-{native}"`,
/// and the adapter re-prefixes any that are not.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnimeSource: Send + Sync {
    /// Static capabilities; `profile().name` is the registry key
    fn profile(&self) -> SourceProfile;

    /// Cheap liveness probe against the upstream
    async fn health_check(&self) -> AppResult<()>;

    async fn search(&self, query: &str, page: u32, filters: &SearchFilters)
        -> AppResult<SearchPage>;

    /// Look up one anime by its source-qualified id
    async fn get_details(&self, id: &str) -> AppResult<Option<AnimeRecord>>;

    async fn get_episodes(&self, anime_id: &str) -> AppResult<Vec<EpisodeRecord>>;

    async fn get_servers(&self, episode_id: &str) -> AppResult<Vec<StreamServer>>;

    async fn get_streaming_links(
        &self,
        episode_id: &str,
        server: Option<String>,
        category: StreamCategory,
    ) -> AppResult<StreamingBundle>;

    /// Genre listing (optional - not all sources support this)
    async fn get_by_genre(&self, _genre: &str, _page: u32) -> AppResult<SearchPage> {
        Err(AppError::NotImplemented(format!(
            "Genre listing not supported by {}",
            self.profile().name
        )))
    }

    /// Trending / homepage listing (optional - not all sources support this)
    async fn get_trending(&self, _page: u32) -> AppResult<SearchPage> {
        Err(AppError::NotImplemented(format!(
            "Trending not supported by {}",
            self.profile().name
        )))
    }
}

/// What a source can serve, declared once at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceProfile {
    pub name: String,
    pub display_name: String,
    pub max_quality: VideoQuality,
    pub has_adult_content: bool,
    pub supports_dub: bool,
    pub supports_streaming: bool,
    /// Servers to try, best first, when resolving streams
    pub server_priority: Vec<String>,
}

impl SourceProfile {
    /// Metadata-only profile with no streaming servers
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            max_quality: VideoQuality::Auto,
            has_adult_content: false,
            supports_dub: false,
            supports_streaming: false,
            server_priority: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Mark the source as streaming-capable with the given server order
    pub fn streaming<I, S>(mut self, max_quality: VideoQuality, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supports_streaming = true;
        self.max_quality = max_quality;
        self.server_priority = servers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dub(mut self, supports_dub: bool) -> Self {
        self.supports_dub = supports_dub;
        self
    }

    pub fn with_adult_content(mut self, has_adult_content: bool) -> Self {
        self.has_adult_content = has_adult_content;
        self
    }
}
