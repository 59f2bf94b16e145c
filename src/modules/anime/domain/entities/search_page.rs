use serde::{Deserialize, Serialize};

use super::anime_record::AnimeRecord;

/// Source tag used when every candidate came back empty
pub const NO_SOURCE: &str = "none";

/// One page of a listing (search, genre, trending)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub results: Vec<AnimeRecord>,
    pub total_pages: u32,
    pub current_page: u32,
    pub has_next_page: bool,
    pub source: String,
}

impl SearchPage {
    /// The canonical "nothing found" page
    pub fn empty(page: u32) -> Self {
        Self {
            results: Vec::new(),
            total_pages: 0,
            current_page: page,
            has_next_page: false,
            source: NO_SOURCE.to_string(),
        }
    }

    pub fn new(results: Vec<AnimeRecord>, current_page: u32, total_pages: u32) -> Self {
        // A page that holds results is at least as far as the reported total
        let total_pages = if results.is_empty() {
            total_pages
        } else {
            total_pages.max(current_page)
        };
        Self {
            has_next_page: current_page < total_pages,
            results,
            total_pages,
            current_page,
            source: NO_SOURCE.to_string(),
        }
    }
}

/// Merged result of querying several sources at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSearch {
    pub results: Vec<AnimeRecord>,
    pub current_page: u32,
    /// Sources that contributed at least one record, in priority order
    pub sources: Vec<String>,
    /// Sources that were asked but returned nothing in time
    pub failed_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_is_tagged_none() {
        let page = SearchPage::empty(3);
        assert!(page.results.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.current_page, 3);
        assert!(!page.has_next_page);
        assert_eq!(page.source, NO_SOURCE);
    }

    #[test]
    fn next_page_is_derived_from_totals() {
        assert!(SearchPage::new(Vec::new(), 1, 4).has_next_page);
        assert!(!SearchPage::new(Vec::new(), 4, 4).has_next_page);
    }
}
