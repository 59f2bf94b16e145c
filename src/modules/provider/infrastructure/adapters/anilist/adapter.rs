//! AniList metadata source
//!
//! GraphQL-based source for the AniList API exposing the same operations
//! as the Jikan source. AniList publishes no playback data, so servers and
//! streaming links are not supported.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    modules::anime::domain::{
        entities::{
            strip_source_prefix, AnimeRecord, EpisodeRecord, SearchPage, StreamServer,
            StreamingBundle,
        },
        value_objects::StreamCategory,
    },
    modules::provider::{
        domain::value_objects::SearchFilters,
        infrastructure::http_client::RateLimitClient,
        traits::{AnimeSource, SourceProfile},
    },
    shared::errors::{AppError, AppResult},
};

use super::{mapper::AniListMapper, models::*, queries};

pub const ANILIST_SOURCE: &str = "anilist";
const ANILIST_BASE_URL: &str = "https://graphql.anilist.co";
const PAGE_SIZE: u32 = 20;

pub struct AniListSource {
    http_client: RateLimitClient,
    base_url: String,
}

impl AniListSource {
    pub fn new() -> Self {
        Self::with_client(RateLimitClient::for_anilist(), ANILIST_BASE_URL)
    }

    /// Create a source with a custom HTTP client and endpoint (for testing)
    pub fn with_client(http_client: RateLimitClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }

    fn media_id(id: &str) -> AppResult<i32> {
        strip_source_prefix(ANILIST_SOURCE, id)
            .unwrap_or(id)
            .parse()
            .map_err(|_| AppError::ValidationError(format!("Invalid AniList ID: {}", id)))
    }

    /// Make a GraphQL request to AniList API
    async fn graphql<T>(&self, query: &str, variables: Option<Value>) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut body = json!({ "query": query });
        if let Some(vars) = variables {
            body["variables"] = vars;
        }

        log::debug!("AniList: Sending GraphQL request body: {:?}", body);

        let mut response: Value = self.http_client.post_json(&self.base_url, &body).await?;

        if let Some(errors) = response.get("errors").filter(|e| !e.is_null()) {
            let errors: Vec<AniListError> =
                serde_json::from_value(errors.clone()).unwrap_or_default();
            log::error!("AniList: GraphQL errors in response: {:?}", errors);

            let message = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if errors.iter().any(|e| e.status == Some(404)) {
                return Err(AppError::NotFound(format!("AniList: {}", message)));
            }
            return Err(AppError::ApiError(format!(
                "AniList GraphQL errors: {}",
                message
            )));
        }

        let data = response
            .get_mut("data")
            .map(Value::take)
            .filter(|d| !d.is_null())
            .ok_or_else(|| AppError::ApiError("No data field in AniList response".to_string()))?;

        serde_json::from_value(data).map_err(|e| {
            AppError::SerializationError(format!("Failed to deserialize AniList data: {}", e))
        })
    }

    fn search_variables(query: &str, page: u32, filters: &SearchFilters) -> Value {
        let mut variables = json!({
            "search": query,
            "page": page,
            "perPage": PAGE_SIZE,
        });

        if let Some(anime_type) = filters.anime_type {
            variables["format"] = json!(AniListMapper::format_for(anime_type));
        }
        if let Some(status) = filters.status {
            variables["status"] = json!(AniListMapper::status_for(status));
        }
        let genres: Vec<&str> = filters
            .genres
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .collect();
        if !genres.is_empty() {
            variables["genres"] = json!(genres);
        }
        if let Some(year) = filters.year {
            variables["seasonYear"] = json!(year);
        }
        if !filters.include_adult {
            variables["isAdult"] = json!(false);
        }
        variables
    }

    async fn fetch_media(&self, id: i32) -> AppResult<Option<Media>> {
        let result: AppResult<MediaResponse> = self
            .graphql(&queries::media_detail_query(), Some(json!({ "id": id })))
            .await;

        match result {
            Ok(response) => Ok(response.media),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_page(&self, query: &str, variables: Value, page: u32) -> AppResult<SearchPage> {
        let response: PageResponse = self.graphql(query, Some(variables)).await?;
        Ok(AniListMapper::to_page(ANILIST_SOURCE, response.page, page))
    }
}

impl Default for AniListSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnimeSource for AniListSource {
    fn profile(&self) -> SourceProfile {
        SourceProfile::new(ANILIST_SOURCE).with_display_name("AniList")
    }

    async fn health_check(&self) -> AppResult<()> {
        let _: Value = self.graphql(queries::HEALTH_QUERY, None).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        filters: &SearchFilters,
    ) -> AppResult<SearchPage> {
        log::info!("AniList: Searching for '{}' (page: {})", query, page);

        let variables = Self::search_variables(query, page, filters);
        let search_page = self
            .fetch_page(&queries::search_query(), variables, page)
            .await?;

        log::info!(
            "AniList: Found {} results for '{}'",
            search_page.results.len(),
            query
        );
        Ok(search_page)
    }

    async fn get_details(&self, id: &str) -> AppResult<Option<AnimeRecord>> {
        let media_id = Self::media_id(id)?;
        log::info!("AniList: Getting anime by ID '{}'", media_id);

        let media = self.fetch_media(media_id).await?;
        if media.is_none() {
            log::info!("AniList: No anime found for ID '{}'", media_id);
        }
        Ok(media.map(|m| AniListMapper::to_record(ANILIST_SOURCE, m)))
    }

    async fn get_episodes(&self, anime_id: &str) -> AppResult<Vec<EpisodeRecord>> {
        let media_id = Self::media_id(anime_id)?;
        let episodes = self
            .fetch_media(media_id)
            .await?
            .map(|media| AniListMapper::to_episodes(&media))
            .unwrap_or_default();

        log::info!(
            "AniList: {} episodes for anime '{}'",
            episodes.len(),
            media_id
        );
        Ok(episodes)
    }

    async fn get_servers(&self, _episode_id: &str) -> AppResult<Vec<StreamServer>> {
        Err(AppError::NotImplemented(
            "AniList is a metadata-only source".to_string(),
        ))
    }

    async fn get_streaming_links(
        &self,
        _episode_id: &str,
        _server: Option<String>,
        _category: StreamCategory,
    ) -> AppResult<StreamingBundle> {
        Err(AppError::NotImplemented(
            "AniList is a metadata-only source".to_string(),
        ))
    }

    async fn get_by_genre(&self, genre: &str, page: u32) -> AppResult<SearchPage> {
        let collection: GenreCollectionResponse =
            self.graphql(queries::GENRE_COLLECTION_QUERY, None).await?;
        let Some(genre) = collection
            .genres
            .into_iter()
            .find(|g| g.eq_ignore_ascii_case(genre.trim()))
        else {
            log::info!("AniList: Unknown genre '{}'", genre);
            return Ok(SearchPage::empty(page));
        };

        let variables = json!({ "genre": genre, "page": page, "perPage": PAGE_SIZE });
        self.fetch_page(&queries::genre_query(), variables, page)
            .await
    }

    async fn get_trending(&self, page: u32) -> AppResult<SearchPage> {
        let variables = json!({ "page": page, "perPage": PAGE_SIZE });
        self.fetch_page(&queries::trending_query(), variables, page)
            .await
    }
}
