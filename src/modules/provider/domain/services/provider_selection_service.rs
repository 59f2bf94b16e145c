use std::cmp::Ordering;

use crate::modules::provider::{
    domain::value_objects::{HealthStatus, SourceHealth, SourceRequirements},
    traits::SourceProfile,
};

/// A registered source as seen by the selection policy
#[derive(Debug, Clone, Copy)]
pub struct SelectionCandidate<'a> {
    pub profile: &'a SourceProfile,
    pub health: &'a SourceHealth,
}

/// Pure selection policy over the health table; never touches the network
pub struct ProviderSelectionService;

impl ProviderSelectionService {
    /// Fallback order as indices into `statuses` (which is in priority order)
    ///
    /// Sources are stably grouped Online/Unknown, then Degraded, then
    /// Offline. Nothing is removed. The preferred source, if any, moves to
    /// the front of its own group.
    pub fn order_candidates(
        statuses: &[(&str, HealthStatus)],
        preferred: Option<&str>,
    ) -> Vec<usize> {
        let mut order: Vec<usize> = (0..statuses.len()).collect();
        order.sort_by_key(|&index| {
            let (name, status) = statuses[index];
            let not_preferred = preferred.map_or(true, |p| !p.eq_ignore_ascii_case(name));
            (status.group(), not_preferred, index)
        });
        order
    }

    /// Fan-out participants: every non-Offline source, or all of them when
    /// every source is Offline
    pub fn fan_out_targets(statuses: &[HealthStatus]) -> Vec<usize> {
        let live: Vec<usize> = statuses
            .iter()
            .enumerate()
            .filter(|(_, status)| !status.is_offline())
            .map(|(index, _)| index)
            .collect();

        if live.is_empty() {
            (0..statuses.len()).collect()
        } else {
            live
        }
    }

    /// Best source for the given requirements, from health data alone
    ///
    /// Offline sources and sources failing a hard requirement are never
    /// returned. Remaining ties fall back to priority order.
    pub fn best_source(
        candidates: &[SelectionCandidate<'_>],
        requirements: &SourceRequirements,
    ) -> Option<String> {
        let mut eligible: Vec<(usize, &SelectionCandidate<'_>)> = candidates
            .iter()
            .enumerate()
            .filter(|(_, candidate)| Self::satisfies(candidate, requirements))
            .collect();

        eligible.sort_by(|(index_a, a), (index_b, b)| {
            a.health
                .status
                .group()
                .cmp(&b.health.status.group())
                .then_with(|| {
                    if requirements.prefer_high_quality {
                        b.profile.max_quality.cmp(&a.profile.max_quality)
                    } else {
                        Ordering::Equal
                    }
                })
                .then_with(|| {
                    b.health
                        .success_rate
                        .partial_cmp(&a.health.success_rate)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| index_a.cmp(index_b))
        });

        eligible
            .first()
            .map(|(_, candidate)| candidate.profile.name.clone())
    }

    fn satisfies(candidate: &SelectionCandidate<'_>, requirements: &SourceRequirements) -> bool {
        if candidate.health.status.is_offline() {
            return false;
        }
        if requirements.exclude_adult && candidate.profile.has_adult_content {
            return false;
        }
        if requirements.require_dub && !candidate.profile.supports_dub {
            return false;
        }
        if requirements.require_streaming && !candidate.profile.supports_streaming {
            return false;
        }
        true
    }
}
