pub mod anilist;
pub mod jikan;

pub use anilist::{AniListSource, ANILIST_SOURCE};
pub use jikan::{JikanSource, JIKAN_SOURCE};
