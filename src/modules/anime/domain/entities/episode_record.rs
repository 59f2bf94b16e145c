use serde::{Deserialize, Serialize};

use crate::modules::anime::domain::value_objects::StreamCategory;

/// One episode as listed by a source
///
/// `id` is the source's opaque token and is only meaningful to the source
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    pub id: String,
    pub number: u32,
    pub title: Option<String>,
    pub is_filler: bool,
    pub has_sub: bool,
    pub has_dub: bool,
    pub thumbnail: Option<String>,
}

impl EpisodeRecord {
    pub fn new(id: impl Into<String>, number: u32) -> Self {
        Self {
            id: id.into(),
            number: number.max(1),
            title: None,
            is_filler: false,
            has_sub: true,
            has_dub: false,
            thumbnail: None,
        }
    }
}

/// A playback server offered for an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamServer {
    pub id: String,
    pub name: String,
    pub category: StreamCategory,
}

/// Episodes tagged with the source that listed them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeList {
    pub episodes: Vec<EpisodeRecord>,
    pub source: String,
}

/// Servers tagged with the source that listed them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerList {
    pub servers: Vec<StreamServer>,
    pub source: String,
}
