pub mod domain;
pub mod infrastructure;
pub mod traits;

pub use domain::value_objects::{HealthStatus, SearchFilters, SourceHealth, SourceRequirements};
pub use infrastructure::{SourceInfo, SourceManager, SourceManagerBuilder};
pub use traits::{AnimeSource, SourceProfile};
