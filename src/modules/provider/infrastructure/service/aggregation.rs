use std::collections::HashMap;
use tracing::{debug, info};

use crate::modules::anime::domain::entities::{AggregatedSearch, AnimeRecord};

/// Outcome of one source in a fan-out, in priority order
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: String,
    pub results: Vec<AnimeRecord>,
}

/// Merges fan-out results into one de-duplicated listing
pub struct SearchAggregator;

impl SearchAggregator {
    /// Merge per-source results
    ///
    /// Records are de-duplicated by normalized title. The first record seen,
    /// walking sources in priority order, is kept as-is; later duplicates are
    /// dropped whole so every field of a record comes from the source its id
    /// belongs to.
    pub fn merge(outcomes: Vec<SourceOutcome>, current_page: u32) -> AggregatedSearch {
        let mut merged: Vec<AnimeRecord> = Vec::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();
        let mut sources = Vec::new();
        let mut failed_sources = Vec::new();

        for outcome in outcomes {
            if outcome.results.is_empty() {
                failed_sources.push(outcome.source);
                continue;
            }

            let mut contributed = 0;
            for record in outcome.results {
                let key = record.dedup_key();
                match index_by_key.get(&key) {
                    Some(&existing) => {
                        debug!(
                            "Duplicate '{}' from {} dropped in favour of {}",
                            record.title, outcome.source, merged[existing].source
                        );
                    }
                    None => {
                        index_by_key.insert(key, merged.len());
                        merged.push(record);
                        contributed += 1;
                    }
                }
            }
            debug!("{} contributed {} unique records", outcome.source, contributed);
            sources.push(outcome.source);
        }

        info!(
            "Merged results from {} sources ({} failed), final count: {}",
            sources.len(),
            failed_sources.len(),
            merged.len()
        );

        AggregatedSearch {
            results: merged,
            current_page,
            sources,
            failed_sources,
        }
    }
}
