use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::modules::anime::domain::value_objects::{
    normalize_rating, AnimeStatus, AnimeType, RatingScale,
};

// ================================================================================================
// HELPER TYPES
// ================================================================================================

/// Episode counts as reported by a source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeCounts {
    pub sub: Option<u32>,
    pub dub: Option<u32>,
    pub total: Option<u32>,
}

// ================================================================================================
// MAIN RECORD
// ================================================================================================

/// Provider-independent anime record
///
/// `id` is always `"{source}-{native id}"` so records from different
/// sources never collide. `rating` is always on a 0–10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeRecord {
    pub id: String,
    pub title: String,
    pub native_title: Option<String>,
    pub image_url: Option<String>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<AnimeType>,
    pub status: Option<AnimeStatus>,
    pub rating: Option<f32>,
    pub episodes: EpisodeCounts,
    pub genres: BTreeSet<String>,
    pub studios: Vec<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub source: String,
    pub is_adult: bool,
}

impl AnimeRecord {
    /// Create a record owned by `source` from the provider's native id
    pub fn new(source: &str, native_id: &str, title: impl Into<String>) -> Self {
        Self {
            id: qualify_id(source, native_id),
            title: title.into(),
            native_title: None,
            image_url: None,
            cover_url: None,
            description: None,
            anime_type: None,
            status: None,
            rating: None,
            episodes: EpisodeCounts::default(),
            genres: BTreeSet::new(),
            studios: Vec::new(),
            season: None,
            year: None,
            source: source.to_string(),
            is_adult: false,
        }
    }

    /// Set the rating from a native scale
    pub fn with_rating(mut self, value: Option<f32>, scale: RatingScale) -> Self {
        self.rating = value.and_then(|v| normalize_rating(v, scale));
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres
            .into_iter()
            .map(Into::into)
            .map(|g: String| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        self
    }

    /// Native id with the owning source's prefix removed
    pub fn native_id(&self) -> &str {
        strip_source_prefix(&self.source, &self.id).unwrap_or(&self.id)
    }

    /// Title key used for cross-source de-duplication
    pub fn dedup_key(&self) -> String {
        normalize_title(&self.title)
    }

    /// Re-assert the record's invariants after it crossed an adapter boundary
    pub fn enforce_invariants(&mut self, source: &str) {
        if self.source != source {
            if let Some(native) = strip_source_prefix(&self.source, &self.id) {
                self.id = native.to_string();
            }
            self.source = source.to_string();
        }
        self.id = qualify_id(source, &self.id);
        self.rating = self
            .rating
            .and_then(|r| normalize_rating(r, RatingScale::TenPoint));
    }
}

/// Prefix `native_id` with the source name unless it already is
pub fn qualify_id(source: &str, native_id: &str) -> String {
    if strip_source_prefix(source, native_id).is_some() {
        native_id.to_string()
    } else {
        format!("{}-{}", source, native_id)
    }
}

/// Remove `"{source}-"` from an id, if present
pub fn strip_source_prefix<'a>(source: &str, id: &'a str) -> Option<&'a str> {
    id.strip_prefix(source)
        .and_then(|rest| rest.strip_prefix('-'))
        .filter(|rest| !rest.is_empty())
}

/// Lowercase, trim and collapse inner whitespace
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
