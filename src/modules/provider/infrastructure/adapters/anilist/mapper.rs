use crate::modules::anime::domain::{
    entities::{AnimeRecord, EpisodeCounts, EpisodeRecord, SearchPage},
    value_objects::{AnimeStatus, AnimeType, RatingScale},
};

use super::models::{
    Media, MediaCoverImage, MediaFormat, MediaSeason, MediaStatus, Page, StudioConnection,
};

/// AniList to canonical model mapping
#[derive(Debug, Clone, Default)]
pub struct AniListMapper;

impl AniListMapper {
    pub fn to_record(source: &str, media: Media) -> AnimeRecord {
        let title = media
            .title
            .as_ref()
            .and_then(|t| t.english.clone().or_else(|| t.romaji.clone()))
            .unwrap_or_else(|| format!("AniList #{}", media.id));
        let total = media.episodes.and_then(|n| u32::try_from(n).ok());

        let mut record = AnimeRecord::new(source, &media.id.to_string(), title)
            .with_rating(media.average_score.map(|s| s as f32), RatingScale::Percent)
            .with_genres(media.genres.clone().unwrap_or_default());

        record.native_title = media.title.and_then(|t| t.native);
        record.image_url = Self::extract_cover_image(&media.cover_image);
        record.cover_url = media.banner_image;
        record.description = media.description;
        record.anime_type = Self::map_anime_type(media.format);
        record.status = Self::map_anime_status(media.status);
        record.episodes = EpisodeCounts {
            sub: total,
            dub: None,
            total,
        };
        record.studios = Self::extract_studios(&media.studios);
        record.season = Self::map_season(media.season);
        record.year = media.season_year;
        record.is_adult = media.is_adult.unwrap_or(false);
        record
    }

    pub fn to_page(source: &str, page: Page, requested: u32) -> SearchPage {
        let info = page.page_info.unwrap_or_default();
        let current = info
            .current_page
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(requested);
        let last = info
            .last_page
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(current);

        let results = page
            .media
            .into_iter()
            .map(|media| Self::to_record(source, media))
            .collect();

        let mut search_page = SearchPage::new(results, current, last);
        search_page.has_next_page = info.has_next_page.unwrap_or(false);
        search_page
    }

    /// AniList has no episode endpoint, so the list is derived from the
    /// episode count and enriched with streaming episode titles when present.
    /// Episode ids are `"{anilist id}-{episode number}"`.
    pub fn to_episodes(media: &Media) -> Vec<EpisodeRecord> {
        let streaming = media.streaming_episodes.as_deref().unwrap_or_default();
        let count = media
            .episodes
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
            .max(streaming.len());

        (1..=count)
            .map(|number| {
                let mut episode =
                    EpisodeRecord::new(format!("{}-{}", media.id, number), number as u32);
                if let Some(entry) = streaming.get(number - 1) {
                    episode.title = entry.title.clone();
                    episode.thumbnail = entry.thumbnail.clone();
                }
                episode
            })
            .collect()
    }

    fn map_anime_status(status: Option<MediaStatus>) -> Option<AnimeStatus> {
        match status? {
            MediaStatus::Finished => Some(AnimeStatus::Completed),
            MediaStatus::Releasing | MediaStatus::Hiatus => Some(AnimeStatus::Ongoing),
            MediaStatus::NotYetReleased => Some(AnimeStatus::Upcoming),
            MediaStatus::Cancelled | MediaStatus::Unknown => None,
        }
    }

    fn map_anime_type(format: Option<MediaFormat>) -> Option<AnimeType> {
        match format? {
            MediaFormat::Tv | MediaFormat::TvShort => Some(AnimeType::TV),
            MediaFormat::Movie => Some(AnimeType::Movie),
            MediaFormat::Special => Some(AnimeType::Special),
            MediaFormat::Ova => Some(AnimeType::OVA),
            MediaFormat::Ona => Some(AnimeType::ONA),
            MediaFormat::Music | MediaFormat::Unknown => None,
        }
    }

    /// Filter value for a canonical type
    pub fn format_for(anime_type: AnimeType) -> &'static str {
        match anime_type {
            AnimeType::TV => "TV",
            AnimeType::Movie => "MOVIE",
            AnimeType::OVA => "OVA",
            AnimeType::ONA => "ONA",
            AnimeType::Special => "SPECIAL",
        }
    }

    /// Filter value for a canonical status
    pub fn status_for(status: AnimeStatus) -> &'static str {
        match status {
            AnimeStatus::Ongoing => "RELEASING",
            AnimeStatus::Completed => "FINISHED",
            AnimeStatus::Upcoming => "NOT_YET_RELEASED",
        }
    }

    fn map_season(season: Option<MediaSeason>) -> Option<String> {
        let name = match season? {
            MediaSeason::Winter => "winter",
            MediaSeason::Spring => "spring",
            MediaSeason::Summer => "summer",
            MediaSeason::Fall => "fall",
            MediaSeason::Unknown => return None,
        };
        Some(name.to_string())
    }

    /// Main studios first; every studio when none is flagged as main
    fn extract_studios(studios: &Option<StudioConnection>) -> Vec<String> {
        let Some(connection) = studios.as_ref() else {
            return Vec::new();
        };

        let mut entries: Vec<(String, bool)> = Vec::new();
        if let Some(nodes) = &connection.nodes {
            entries.extend(
                nodes
                    .iter()
                    .filter_map(|s| Some((s.name.clone()?, s.is_main.unwrap_or(false)))),
            );
        }
        if let Some(edges) = &connection.edges {
            entries.extend(edges.iter().filter_map(|edge| {
                let name = edge.node.as_ref()?.name.clone()?;
                Some((name, edge.is_main.unwrap_or(false)))
            }));
        }

        let main: Vec<String> = entries
            .iter()
            .filter(|(_, is_main)| *is_main)
            .map(|(name, _)| name.clone())
            .collect();
        if main.is_empty() {
            entries.into_iter().map(|(name, _)| name).collect()
        } else {
            main
        }
    }

    fn extract_cover_image(cover_image: &Option<MediaCoverImage>) -> Option<String> {
        cover_image.as_ref().and_then(|img| {
            img.extra_large
                .clone()
                .or_else(|| img.large.clone())
                .or_else(|| img.medium.clone())
        })
    }
}
