pub mod provider_manager;

pub use provider_manager::{ManagerConfig, SourceInfo, SourceManager, SourceManagerBuilder};
