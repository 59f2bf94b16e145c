pub mod anime_status;
pub mod anime_type;
pub mod rating;
pub mod stream_category;
pub mod video_quality;

pub use anime_status::AnimeStatus;
pub use anime_type::AnimeType;
pub use rating::{normalize_rating, RatingScale};
pub use stream_category::StreamCategory;
pub use video_quality::VideoQuality;
