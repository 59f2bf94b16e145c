use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::modules::anime::domain::value_objects::VideoQuality;

/// One playable rendition of an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoVariant {
    pub url: String,
    pub quality: VideoQuality,
    pub is_hls: bool,
    pub is_dash: bool,
}

impl VideoVariant {
    /// Build a variant, inferring container hints from the URL
    pub fn new(url: impl Into<String>, quality: VideoQuality) -> Self {
        let url = url.into();
        let path = url.split('?').next().unwrap_or_default().to_lowercase();
        Self {
            is_hls: path.ends_with(".m3u8"),
            is_dash: path.ends_with(".mpd"),
            url,
            quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrack {
    pub url: String,
    pub lang: String,
    pub label: String,
}

/// Start/end offsets in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

/// Everything a player needs for one episode
///
/// An empty `sources` list is a valid result: the episode exists but
/// nothing playable was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingBundle {
    pub sources: Vec<VideoVariant>,
    pub subtitles: Vec<SubtitleTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outro: Option<TimeRange>,
    pub source: String,
    pub server: Option<String>,
}

impl StreamingBundle {
    /// The "nothing playable" terminal result
    pub fn empty() -> Self {
        Self {
            source: super::search_page::NO_SOURCE.to_string(),
            ..Self::default()
        }
    }

    pub fn is_playable(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Order variants best-first; variants of equal quality keep their order
    pub fn sort_variants(&mut self) {
        self.sources.sort_by_key(|variant| variant.quality.rank());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_hints_come_from_url() {
        let hls = VideoVariant::new("https://cdn.test/master.m3u8?token=abc", VideoQuality::Auto);
        assert!(hls.is_hls);
        assert!(!hls.is_dash);

        let dash = VideoVariant::new("https://cdn.test/manifest.MPD", VideoQuality::P720);
        assert!(dash.is_dash);
    }

    #[test]
    fn sort_puts_best_quality_first() {
        let mut bundle = StreamingBundle {
            sources: vec![
                VideoVariant::new("a", VideoQuality::Auto),
                VideoVariant::new("b", VideoQuality::P480),
                VideoVariant::new("c", VideoQuality::P1080),
                VideoVariant::new("d", VideoQuality::P720),
                VideoVariant::new("e", VideoQuality::P480),
            ],
            ..StreamingBundle::default()
        };
        bundle.sort_variants();

        let urls: Vec<_> = bundle.sources.iter().map(|v| v.url.as_str()).collect();
        assert_eq!(urls, vec!["c", "d", "b", "e", "a"]);
        assert!(bundle
            .sources
            .windows(2)
            .all(|pair| pair[0].quality.rank() <= pair[1].quality.rank()));
    }

    #[test]
    fn empty_bundle_serializes_without_optional_fields() {
        let json = serde_json::to_value(StreamingBundle::empty()).unwrap();
        assert_eq!(json["sources"].as_array().unwrap().len(), 0);
        assert!(json.get("headers").is_none());
        assert_eq!(json["source"], "none");
    }
}
