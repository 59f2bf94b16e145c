// Jikan v4 API models, limited to what the source reads
// https://docs.api.jikan.moe/

use serde::{Deserialize, Serialize};

// Response envelopes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JikanItem<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JikanList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub last_visible_page: u32,
    pub has_next_page: bool,
    #[serde(default)]
    pub current_page: Option<u32>,
}

pub type MalId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalEntity {
    pub mal_id: MalId,
    #[serde(default)]
    pub r#type: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageUrls>,
    #[serde(default)]
    pub webp: Option<ImageUrls>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrls {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub mal_id: MalId,
    #[serde(default)]
    pub images: Option<Images>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub r#type: Option<String>, // TV, Movie, OVA, etc.
    #[serde(default)]
    pub episodes: Option<i32>,
    #[serde(default)]
    pub status: Option<String>, // Finished Airing, Currently Airing
    #[serde(default)]
    pub rating: Option<String>, // G, PG-13, R, Rx, etc.
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub season: Option<String>, // winter, spring, summer, fall
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub studios: Option<Vec<MalEntity>>,
    #[serde(default)]
    pub genres: Option<Vec<MalEntity>>,
    #[serde(default)]
    pub explicit_genres: Option<Vec<MalEntity>>,
    #[serde(default)]
    pub themes: Option<Vec<MalEntity>>,
    #[serde(default)]
    pub demographics: Option<Vec<MalEntity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeEpisode {
    pub mal_id: MalId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub filler: Option<bool>,
    #[serde(default)]
    pub recap: Option<bool>,
}

/// Entry of `/genres/anime`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreEntry {
    pub mal_id: MalId,
    pub name: String,
    #[serde(default)]
    pub count: Option<u32>,
}
