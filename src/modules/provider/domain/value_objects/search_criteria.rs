use serde::{Deserialize, Serialize};

use crate::modules::anime::domain::value_objects::{AnimeStatus, AnimeType};

/// Optional narrowing applied to a search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(rename = "type")]
    pub anime_type: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub include_adult: bool,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stable fingerprint used inside cache keys
    pub fn cache_key(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut genres: Vec<String> = self
            .genres
            .iter()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .collect();
        genres.sort();
        genres.dedup();

        format!(
            "t={};s={};g={};y={};a={}",
            self.anime_type.map(|t| t.as_str()).unwrap_or_default(),
            self.status.map(|s| s.to_string()).unwrap_or_default(),
            genres.join(","),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            self.include_adult
        )
    }

    pub fn with_type(mut self, anime_type: AnimeType) -> Self {
        self.anime_type = Some(anime_type);
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }
}

/// Constraints for the best-source advisory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRequirements {
    /// Rank candidates by maximum stream quality
    pub prefer_high_quality: bool,
    pub exclude_adult: bool,
    pub require_dub: bool,
    pub require_streaming: bool,
}
