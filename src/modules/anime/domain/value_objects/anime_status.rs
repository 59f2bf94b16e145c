use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Airing status, normalized across sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimeStatus {
    Ongoing,
    Completed,
    Upcoming,
}

impl AnimeStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            AnimeStatus::Ongoing => "Ongoing",
            AnimeStatus::Completed => "Completed",
            AnimeStatus::Upcoming => "Upcoming",
        }
    }

    /// Map the many upstream spellings onto the canonical status
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(&['_', '-'][..], " ").as_str() {
            "currently airing" | "airing" | "ongoing" | "releasing" | "current" => {
                Some(AnimeStatus::Ongoing)
            }
            "finished airing" | "finished" | "completed" | "complete" | "ended" => {
                Some(AnimeStatus::Completed)
            }
            "not yet aired" | "not yet released" | "upcoming" | "tba" | "announced" => {
                Some(AnimeStatus::Upcoming)
            }
            _ => None,
        }
    }
}

impl fmt::Display for AnimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for AnimeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown anime status: {}", s))
    }
}
