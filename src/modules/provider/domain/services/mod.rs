pub mod provider_selection_service;

pub use provider_selection_service::{ProviderSelectionService, SelectionCandidate};
