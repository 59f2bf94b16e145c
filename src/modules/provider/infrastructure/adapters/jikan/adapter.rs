use async_trait::async_trait;
use serde_json::Value;

use crate::{
    modules::anime::domain::{
        entities::{
            strip_source_prefix, AnimeRecord, EpisodeRecord, SearchPage, StreamServer,
            StreamingBundle,
        },
        value_objects::{AnimeStatus, StreamCategory},
    },
    modules::provider::{
        domain::value_objects::SearchFilters,
        infrastructure::http_client::RateLimitClient,
        traits::{AnimeSource, SourceProfile},
    },
    shared::errors::{AppError, AppResult},
};

use super::mapper::JikanMapper;
use super::models::*;

pub const JIKAN_SOURCE: &str = "jikan";
const JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";
const PAGE_SIZE: u32 = 25;
/// Episode listings are fetched 100 per page; longer runs are truncated so
/// one call stays inside the adapter timeout under the Jikan rate limit
const MAX_EPISODE_PAGES: u32 = 4;

/// Jikan (MyAnimeList) metadata source over the REST API
pub struct JikanSource {
    http_client: RateLimitClient,
    base_url: String,
}

impl JikanSource {
    pub fn new() -> Self {
        Self::with_client(RateLimitClient::for_jikan(), JIKAN_BASE_URL)
    }

    /// Create a source with a custom HTTP client and base URL (for testing)
    pub fn with_client(http_client: RateLimitClient, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// MAL id from either a qualified (`jikan-20`) or bare (`20`) id
    fn mal_id(id: &str) -> AppResult<u32> {
        strip_source_prefix(JIKAN_SOURCE, id)
            .unwrap_or(id)
            .parse()
            .map_err(|_| AppError::ValidationError(format!("Invalid MAL ID: {}", id)))
    }

    fn search_url(
        &self,
        query: &str,
        page: u32,
        filters: &SearchFilters,
        genre_ids: &[MalId],
    ) -> String {
        let mut url = format!(
            "{}/anime?q={}&page={}&limit={}",
            self.base_url,
            urlencoding::encode(query),
            page,
            PAGE_SIZE
        );

        if let Some(anime_type) = filters.anime_type {
            url.push_str(&format!("&type={}", anime_type.as_str().to_lowercase()));
        }
        if let Some(status) = filters.status {
            let value = match status {
                AnimeStatus::Ongoing => "airing",
                AnimeStatus::Completed => "complete",
                AnimeStatus::Upcoming => "upcoming",
            };
            url.push_str(&format!("&status={}", value));
        }
        if !genre_ids.is_empty() {
            let ids: Vec<String> = genre_ids.iter().map(|id| id.to_string()).collect();
            url.push_str(&format!("&genres={}", ids.join(",")));
        }
        if let Some(year) = filters.year {
            url.push_str(&format!("&start_date={}-01-01&end_date={}-12-31", year, year));
        }
        if !filters.include_adult {
            url.push_str("&sfw=true");
        }
        url
    }

    /// MAL ids for `names`, or None when any of them is not a Jikan genre
    async fn genre_ids(&self, names: &[String]) -> AppResult<Option<Vec<MalId>>> {
        let url = format!("{}/genres/anime", self.base_url);
        let genres: JikanList<GenreEntry> = self.http_client.get(&url).await?;
        Ok(match_genres(&genres.data, names))
    }
}

fn match_genres(known: &[GenreEntry], names: &[String]) -> Option<Vec<MalId>> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            known
                .iter()
                .find(|entry| entry.name.eq_ignore_ascii_case(name))
                .map(|entry| entry.mal_id)
        })
        .collect()
}

/// Next episode page to request, if any
fn next_episode_page(page: u32, has_next: bool) -> Option<u32> {
    (has_next && page < MAX_EPISODE_PAGES).then_some(page + 1)
}

impl Default for JikanSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnimeSource for JikanSource {
    fn profile(&self) -> SourceProfile {
        SourceProfile::new(JIKAN_SOURCE).with_display_name("MyAnimeList (Jikan)")
    }

    async fn health_check(&self) -> AppResult<()> {
        let url = format!("{}/top/anime?limit=1", self.base_url);
        let _: Value = self.http_client.get(&url).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        filters: &SearchFilters,
    ) -> AppResult<SearchPage> {
        let genre_ids = if filters.genres.is_empty() {
            Vec::new()
        } else {
            match self.genre_ids(&filters.genres).await? {
                Some(ids) => ids,
                None => {
                    log::info!("Jikan: Unknown genre in {:?}", filters.genres);
                    return Ok(SearchPage::empty(page));
                }
            }
        };
        let url = self.search_url(query, page, filters, &genre_ids);
        log::info!("Jikan: Searching for '{}' (page: {})", query, page);

        let response: JikanList<Anime> = self.http_client.get(&url).await?;
        let search_page = JikanMapper::to_page(JIKAN_SOURCE, response, page);

        log::info!(
            "Jikan: Found {} results for '{}'",
            search_page.results.len(),
            query
        );
        Ok(search_page)
    }

    async fn get_details(&self, id: &str) -> AppResult<Option<AnimeRecord>> {
        let mal_id = Self::mal_id(id)?;
        let url = format!("{}/anime/{}", self.base_url, mal_id);

        log::info!("Jikan: Getting anime by ID '{}'", mal_id);

        match self.http_client.get::<JikanItem<Anime>>(&url).await {
            Ok(response) => Ok(Some(JikanMapper::to_record(JIKAN_SOURCE, response.data))),
            Err(AppError::NotFound(_)) => {
                log::info!("Jikan: No anime found for ID '{}'", mal_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_episodes(&self, anime_id: &str) -> AppResult<Vec<EpisodeRecord>> {
        let mal_id = Self::mal_id(anime_id)?;
        let native = mal_id.to_string();
        let mut episodes = Vec::new();
        let mut page = 1;

        loop {
            let url = format!("{}/anime/{}/episodes?page={}", self.base_url, mal_id, page);
            let response: JikanList<AnimeEpisode> = self.http_client.get(&url).await?;
            let has_next = response
                .pagination
                .as_ref()
                .map_or(false, |p| p.has_next_page);

            episodes.extend(
                response
                    .data
                    .into_iter()
                    .map(|episode| JikanMapper::to_episode(&native, episode)),
            );

            match next_episode_page(page, has_next) {
                Some(next) => page = next,
                None => {
                    if has_next {
                        log::warn!(
                            "Jikan: Episode list for '{}' truncated after {} pages",
                            mal_id,
                            MAX_EPISODE_PAGES
                        );
                    }
                    break;
                }
            }
        }

        log::info!("Jikan: {} episodes for anime '{}'", episodes.len(), mal_id);
        Ok(episodes)
    }

    async fn get_servers(&self, _episode_id: &str) -> AppResult<Vec<StreamServer>> {
        Err(AppError::NotImplemented(
            "Jikan is a metadata-only source".to_string(),
        ))
    }

    async fn get_streaming_links(
        &self,
        _episode_id: &str,
        _server: Option<String>,
        _category: StreamCategory,
    ) -> AppResult<StreamingBundle> {
        Err(AppError::NotImplemented(
            "Jikan is a metadata-only source".to_string(),
        ))
    }

    async fn get_by_genre(&self, genre: &str, page: u32) -> AppResult<SearchPage> {
        let Some(genre_ids) = self.genre_ids(&[genre.to_string()]).await? else {
            log::info!("Jikan: Unknown genre '{}'", genre);
            return Ok(SearchPage::empty(page));
        };
        let Some(genre_id) = genre_ids.first() else {
            return Ok(SearchPage::empty(page));
        };

        let url = format!(
            "{}/anime?genres={}&page={}&limit={}&order_by=popularity&sfw=true",
            self.base_url, genre_id, page, PAGE_SIZE
        );
        let response: JikanList<Anime> = self.http_client.get(&url).await?;
        Ok(JikanMapper::to_page(JIKAN_SOURCE, response, page))
    }

    async fn get_trending(&self, page: u32) -> AppResult<SearchPage> {
        let url = format!(
            "{}/top/anime?filter=airing&page={}&limit={}",
            self.base_url, page, PAGE_SIZE
        );
        let response: JikanList<Anime> = self.http_client.get(&url).await?;
        Ok(JikanMapper::to_page(JIKAN_SOURCE, response, page))
    }
}
