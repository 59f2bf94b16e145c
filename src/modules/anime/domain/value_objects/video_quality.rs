use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Playback quality of one video variant
///
/// Ordering follows player preference: `1080p` is the greatest value and
/// `auto` (an adaptive or unlabelled stream) the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoQuality {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "auto")]
    Auto,
}

impl VideoQuality {
    /// Rank used by the player contract: 0 is the default pick
    pub fn rank(&self) -> u8 {
        match self {
            VideoQuality::P1080 => 0,
            VideoQuality::P720 => 1,
            VideoQuality::P480 => 2,
            VideoQuality::P360 => 3,
            VideoQuality::Auto => 4,
        }
    }

    /// Parse an upstream quality label; unknown labels become `Auto`
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        let digits: String = normalized.chars().filter(|c| c.is_ascii_digit()).collect();

        match digits.parse::<u32>().ok() {
            Some(height) if height >= 1080 => VideoQuality::P1080,
            Some(height) if height >= 720 => VideoQuality::P720,
            Some(height) if height >= 480 => VideoQuality::P480,
            Some(height) if height >= 240 => VideoQuality::P360,
            _ => match normalized.as_str() {
                "fhd" | "fullhd" | "full hd" => VideoQuality::P1080,
                "hd" => VideoQuality::P720,
                "sd" => VideoQuality::P480,
                _ => VideoQuality::Auto,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoQuality::P1080 => "1080p",
            VideoQuality::P720 => "720p",
            VideoQuality::P480 => "480p",
            VideoQuality::P360 => "360p",
            VideoQuality::Auto => "auto",
        }
    }
}

impl Ord for VideoQuality {
    fn cmp(&self, other: &Self) -> Ordering {
        other.rank().cmp(&self.rank())
    }
}

impl PartialOrd for VideoQuality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
