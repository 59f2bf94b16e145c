use crate::modules::anime::domain::{
    entities::{AnimeRecord, EpisodeCounts, EpisodeRecord, SearchPage},
    value_objects::{AnimeStatus, AnimeType, RatingScale},
};

use super::models::{Anime, AnimeEpisode, Images, JikanList, MalEntity};

/// Jikan (MyAnimeList) to canonical model mapping
#[derive(Debug, Clone, Default)]
pub struct JikanMapper;

impl JikanMapper {
    pub fn to_record(source: &str, anime: Anime) -> AnimeRecord {
        let title = anime
            .title
            .clone()
            .or_else(|| anime.title_english.clone())
            .unwrap_or_else(|| format!("MAL #{}", anime.mal_id));

        let is_adult = Self::is_adult(&anime);
        let genres = [
            &anime.genres,
            &anime.explicit_genres,
            &anime.themes,
            &anime.demographics,
        ]
        .into_iter()
        .flat_map(|group| Self::names(group))
        .collect::<Vec<_>>();

        let total = anime.episodes.and_then(|n| u32::try_from(n).ok());

        let mut record = AnimeRecord::new(source, &anime.mal_id.to_string(), title)
            .with_rating(anime.score, RatingScale::TenPoint)
            .with_genres(genres);

        record.native_title = anime.title_japanese;
        record.image_url = Self::extract_image_url(&anime.images);
        record.description = anime.synopsis;
        record.anime_type = anime.r#type.as_deref().and_then(AnimeType::parse);
        record.status = anime.status.as_deref().and_then(AnimeStatus::parse);
        record.episodes = EpisodeCounts {
            sub: total,
            dub: None,
            total,
        };
        record.studios = Self::names(&anime.studios);
        record.season = anime.season;
        record.year = anime.year;
        record.is_adult = is_adult;
        record
    }

    pub fn to_page(source: &str, list: JikanList<Anime>, page: u32) -> SearchPage {
        let (total_pages, has_next) = list
            .pagination
            .as_ref()
            .map(|p| (p.last_visible_page, p.has_next_page))
            .unwrap_or((page, false));

        let results = list
            .data
            .into_iter()
            .map(|anime| Self::to_record(source, anime))
            .collect();

        let mut search_page = SearchPage::new(results, page, total_pages);
        search_page.has_next_page = has_next;
        search_page
    }

    /// Episode ids are `"{mal anime id}-{episode number}"`
    pub fn to_episode(anime_id: &str, episode: AnimeEpisode) -> EpisodeRecord {
        let mut record =
            EpisodeRecord::new(format!("{}-{}", anime_id, episode.mal_id), episode.mal_id);
        record.title = episode.title;
        record.is_filler = episode.filler.unwrap_or(false) || episode.recap.unwrap_or(false);
        record
    }

    /// Extract best image URL from Jikan images
    fn extract_image_url(images: &Option<Images>) -> Option<String> {
        images.as_ref().and_then(|img| {
            // Prefer larger images
            [img.jpg.as_ref(), img.webp.as_ref()]
                .into_iter()
                .flatten()
                .find_map(|urls| {
                    urls.large_image_url
                        .clone()
                        .or_else(|| urls.image_url.clone())
                        .or_else(|| urls.small_image_url.clone())
                })
        })
    }

    fn names(entities: &Option<Vec<MalEntity>>) -> Vec<String> {
        entities
            .as_ref()
            .map(|e| e.iter().map(|entity| entity.name.clone()).collect())
            .unwrap_or_default()
    }

    fn is_adult(anime: &Anime) -> bool {
        let rx_rating = anime
            .rating
            .as_deref()
            .map_or(false, |r| r.starts_with("Rx"));
        let hentai = anime
            .explicit_genres
            .iter()
            .chain(anime.genres.iter())
            .flatten()
            .any(|g| g.name.eq_ignore_ascii_case("hentai"));
        rx_rating || hentai
    }
}
