use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimeType {
    TV,
    Movie,
    OVA,
    ONA,
    Special,
}

impl AnimeType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "TV" | "TV_SHORT" | "TV SHORT" | "SERIES" => Some(AnimeType::TV),
            "MOVIE" | "FILM" => Some(AnimeType::Movie),
            "OVA" => Some(AnimeType::OVA),
            "ONA" | "WEB" => Some(AnimeType::ONA),
            "SPECIAL" | "TV_SPECIAL" | "TV SPECIAL" => Some(AnimeType::Special),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimeType::TV => "TV",
            AnimeType::Movie => "Movie",
            AnimeType::OVA => "OVA",
            AnimeType::ONA => "ONA",
            AnimeType::Special => "Special",
        }
    }
}

impl fmt::Display for AnimeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown anime type: {}", s))
    }
}
