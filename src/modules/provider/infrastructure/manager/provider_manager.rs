use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::RwLock,
    task::JoinHandle,
    time::{interval, timeout, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::AggregatorConfig,
    modules::{
        anime::domain::{
            entities::{
                strip_source_prefix, AggregatedSearch, AnimeRecord, EpisodeList, SearchPage,
                ServerList, StreamingBundle, NO_SOURCE,
            },
            value_objects::{StreamCategory, VideoQuality},
        },
        provider::{
            domain::{
                services::{ProviderSelectionService, SelectionCandidate},
                value_objects::{HealthStatus, SearchFilters, SourceHealth, SourceRequirements},
            },
            infrastructure::{
                cache::CacheStats,
                decorators::SourceAdapter,
                monitoring::HealthMonitor,
                service::{SearchAggregator, SourceOutcome, StreamingResolver},
            },
            traits::AnimeSource,
        },
    },
    shared::{
        errors::{AppError, AppResult},
        utils::{
            logger::{LogContext, TimedOperation},
            validation::Validator,
        },
    },
};

/// Timeouts and background intervals of the manager
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Upper bound for one upstream call
    pub call_timeout: Duration,
    /// Overall deadline of a fan-out search
    pub fanout_deadline: Duration,
    pub health_check_timeout: Duration,
    /// How often expired cache entries are swept
    pub sweep_interval: Duration,
    /// How often every source is re-probed
    pub health_probe_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
            fanout_deadline: Duration::from_secs(12),
            health_check_timeout: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(5 * 60),
            health_probe_interval: Duration::from_secs(2 * 60),
        }
    }
}

/// Registry entry as shown to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub display_name: String,
    pub max_quality: VideoQuality,
    pub has_adult_content: bool,
    pub supports_dub: bool,
    pub supports_streaming: bool,
    pub status: HealthStatus,
}

/// Collects sources in priority order and builds the manager once
#[derive(Default)]
pub struct SourceManagerBuilder {
    config: AggregatorConfig,
    sources: Vec<Arc<dyn AnimeSource>>,
}

impl SourceManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the next source; registration order is priority order
    pub fn register(mut self, source: Arc<dyn AnimeSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> AppResult<SourceManager> {
        let health = Arc::new(HealthMonitor::new(self.config.health.clone()));
        let manager_config = self.config.manager;
        let mut adapters: Vec<SourceAdapter> = Vec::with_capacity(self.sources.len());

        for source in self.sources {
            let adapter = SourceAdapter::new(
                source,
                Arc::clone(&health),
                &self.config.cache,
                manager_config.call_timeout,
                manager_config.health_check_timeout,
            );

            let name = adapter.name().trim();
            if name.is_empty() {
                return Err(AppError::ConfigError(
                    "Source names must not be empty".to_string(),
                ));
            }
            if adapters
                .iter()
                .any(|existing| existing.name().eq_ignore_ascii_case(name))
            {
                return Err(AppError::ConfigError(format!(
                    "Source '{}' is registered twice",
                    name
                )));
            }
            adapters.push(adapter);
        }

        info!(
            "Source manager ready with {} sources: [{}]",
            adapters.len(),
            adapters
                .iter()
                .map(|a| a.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(SourceManager {
            adapters,
            health,
            preferred: RwLock::new(None),
            resolver: StreamingResolver::new(self.config.resolver),
            config: manager_config,
        })
    }
}

/// Orchestrates every registered source
///
/// Undirected requests walk the sources in health-adjusted priority order
/// and return the first non-empty answer. Directed requests go to one
/// source only. Upstream trouble never surfaces as an error; the only
/// errors are validation failures.
pub struct SourceManager {
    adapters: Vec<SourceAdapter>,
    health: Arc<HealthMonitor>,
    preferred: RwLock<Option<String>>,
    resolver: StreamingResolver,
    config: ManagerConfig,
}

impl SourceManager {
    pub fn builder() -> SourceManagerBuilder {
        SourceManagerBuilder::new()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // =============================================================================
    // LISTINGS
    // =============================================================================

    pub async fn search(
        &self,
        query: &str,
        page: u32,
        source: Option<&str>,
        filters: &SearchFilters,
    ) -> AppResult<SearchPage> {
        let query = Validator::validate_query(query)?;
        Validator::validate_page(page)?;
        let timer = TimedOperation::new("search");

        for adapter in self.candidates(source, "search").await? {
            let result = adapter.search(&query, page, filters).await;
            if !result.results.is_empty() {
                LogContext::search_operation(&query, Some(adapter.name()), result.results.len());
                timer.finish();
                return Ok(result);
            }
            debug!(
                "{} had nothing for '{}', trying next source",
                adapter.name(),
                query
            );
        }

        LogContext::search_operation(&query, None, 0);
        timer.finish();
        Ok(SearchPage::empty(page))
    }

    /// Query every live source at once and merge the answers
    pub async fn search_all(&self, query: &str, page: u32) -> AppResult<AggregatedSearch> {
        let query = Validator::validate_query(query)?;
        Validator::validate_page(page)?;
        let timer = TimedOperation::new("search_all");

        let names = self.names();
        let statuses = self.health.statuses(&names).await;
        let targets = ProviderSelectionService::fan_out_targets(&statuses);
        let filters = SearchFilters::default();
        let deadline = self.config.fanout_deadline;

        let calls = targets.iter().map(|&index| {
            let adapter = &self.adapters[index];
            let query = query.as_str();
            let filters = &filters;
            async move {
                let results = match timeout(deadline, adapter.search(query, page, filters)).await
                {
                    Ok(result) => result.results,
                    Err(_) => {
                        warn!(
                            "{} missed the fan-out deadline of {:?}",
                            adapter.name(),
                            deadline
                        );
                        Vec::new()
                    }
                };
                SourceOutcome {
                    source: adapter.name().to_string(),
                    results,
                }
            }
        });

        let outcomes = join_all(calls).await;
        let merged = SearchAggregator::merge(outcomes, page);

        LogContext::search_operation(&query, None, merged.results.len());
        timer.finish_with_info(&format!(
            "{} sources answered, {} failed",
            merged.sources.len(),
            merged.failed_sources.len()
        ));
        Ok(merged)
    }

    pub async fn get_by_genre(
        &self,
        genre: &str,
        page: u32,
        source: Option<&str>,
    ) -> AppResult<SearchPage> {
        let genre = Validator::validate_genre(genre)?;
        Validator::validate_page(page)?;

        for adapter in self.candidates(source, "get_by_genre").await? {
            let result = adapter.get_by_genre(&genre, page).await;
            if !result.results.is_empty() {
                return Ok(result);
            }
        }
        Ok(SearchPage::empty(page))
    }

    pub async fn get_trending(&self, page: u32, source: Option<&str>) -> AppResult<SearchPage> {
        Validator::validate_page(page)?;

        for adapter in self.candidates(source, "get_trending").await? {
            let result = adapter.get_trending(page).await;
            if !result.results.is_empty() {
                return Ok(result);
            }
        }
        Ok(SearchPage::empty(page))
    }

    // =============================================================================
    // SINGLE TITLES AND EPISODES
    // =============================================================================

    pub async fn get_details(
        &self,
        id: &str,
        source: Option<&str>,
    ) -> AppResult<Option<AnimeRecord>> {
        let id = Validator::validate_id(id, "anime id")?;
        let source = source.or_else(|| self.owner_of(&id));

        for adapter in self.candidates(source, "get_details").await? {
            if let Some(record) = adapter.get_details(&id).await {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    pub async fn get_episodes(
        &self,
        anime_id: &str,
        source: Option<&str>,
    ) -> AppResult<EpisodeList> {
        let anime_id = Validator::validate_id(anime_id, "anime id")?;
        let source = source.or_else(|| self.owner_of(&anime_id));

        for adapter in self.candidates(source, "get_episodes").await? {
            let episodes = adapter.get_episodes(&anime_id).await;
            if !episodes.is_empty() {
                return Ok(EpisodeList {
                    episodes,
                    source: adapter.name().to_string(),
                });
            }
        }
        Ok(EpisodeList {
            episodes: Vec::new(),
            source: NO_SOURCE.to_string(),
        })
    }

    pub async fn get_servers(
        &self,
        episode_id: &str,
        source: Option<&str>,
    ) -> AppResult<ServerList> {
        let episode_id = Validator::validate_id(episode_id, "episode id")?;

        for adapter in self.candidates(source, "get_servers").await? {
            let servers = adapter.get_servers(&episode_id).await;
            if !servers.is_empty() {
                return Ok(ServerList {
                    servers,
                    source: adapter.name().to_string(),
                });
            }
        }
        Ok(ServerList {
            servers: Vec::new(),
            source: NO_SOURCE.to_string(),
        })
    }

    /// Playable sources for one episode
    ///
    /// Directed requests run the resolver against that source. Otherwise
    /// streaming-capable sources are tried in candidate order.
    pub async fn get_streaming_links(
        &self,
        episode_id: &str,
        server: Option<&str>,
        category: StreamCategory,
        source: Option<&str>,
    ) -> AppResult<StreamingBundle> {
        let episode_id = Validator::validate_id(episode_id, "episode id")?;
        let server = server.map(str::trim).filter(|s| !s.is_empty());

        for adapter in self.candidates(source, "get_streaming_links").await? {
            if source.is_none() && !adapter.profile().supports_streaming {
                continue;
            }
            let bundle = self
                .resolver
                .resolve(adapter, &episode_id, server, category)
                .await;
            if bundle.is_playable() {
                return Ok(bundle);
            }
        }

        warn!("No playable sources found for episode {}", episode_id);
        Ok(StreamingBundle::empty())
    }

    // =============================================================================
    // REGISTRY AND HEALTH
    // =============================================================================

    pub async fn get_available_sources(&self) -> Vec<SourceInfo> {
        let statuses = self.health.statuses(&self.names()).await;
        self.adapters
            .iter()
            .zip(statuses)
            .map(|(adapter, status)| {
                let profile = adapter.profile();
                SourceInfo {
                    name: profile.name.clone(),
                    display_name: profile.display_name.clone(),
                    max_quality: profile.max_quality,
                    has_adult_content: profile.has_adult_content,
                    supports_dub: profile.supports_dub,
                    supports_streaming: profile.supports_streaming,
                    status,
                }
            })
            .collect()
    }

    /// Health table snapshot, in priority order
    pub async fn get_health_status(&self) -> Vec<SourceHealth> {
        self.health.snapshots(&self.names()).await
    }

    /// Probe every source concurrently and return the updated table
    pub async fn check_all_health(&self) -> Vec<SourceHealth> {
        let timer = TimedOperation::new("check_all_health");
        let results = join_all(self.adapters.iter().map(SourceAdapter::health_check)).await;

        let offline = results
            .iter()
            .filter(|health| health.status.is_offline())
            .count();
        timer.finish_with_info(&format!("{} of {} sources offline", offline, results.len()));
        results
    }

    /// Prefer `name` within its health group; false for unknown sources
    pub async fn set_preferred_source(&self, name: &str) -> bool {
        let Some(adapter) = self.find(name) else {
            warn!("Cannot prefer unknown source '{}'", name);
            return false;
        };

        *self.preferred.write().await = Some(adapter.name().to_string());
        info!("Preferred source set to {}", adapter.name());
        true
    }

    pub async fn preferred_source(&self) -> Option<String> {
        self.preferred.read().await.clone()
    }

    /// Advisory pick from the health table; makes no network calls
    pub async fn get_best_source(&self, requirements: &SourceRequirements) -> Option<String> {
        let health = self.get_health_status().await;
        let candidates: Vec<SelectionCandidate<'_>> = self
            .adapters
            .iter()
            .zip(health.iter())
            .map(|(adapter, health)| SelectionCandidate {
                profile: adapter.profile(),
                health,
            })
            .collect();

        ProviderSelectionService::best_source(&candidates, requirements)
    }

    // =============================================================================
    // CACHES AND MAINTENANCE
    // =============================================================================

    pub fn cache_stats(&self) -> Vec<CacheStats> {
        self.adapters.iter().map(SourceAdapter::cache_stats).collect()
    }

    pub fn clear_caches(&self) {
        for adapter in &self.adapters {
            adapter.clear_cache();
        }
        info!("Cleared caches of {} sources", self.adapters.len());
    }

    /// Drop expired entries everywhere; returns how many were removed
    pub fn purge_expired_caches(&self) -> usize {
        self.adapters.iter().map(SourceAdapter::purge_expired).sum()
    }

    /// Background cache sweeps and health probes until `token` is cancelled
    pub fn spawn_maintenance(self: &Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let sweep_every = manager.config.sweep_interval.max(Duration::from_secs(1));
        let probe_every = manager
            .config
            .health_probe_interval
            .max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut sweep = interval(sweep_every);
            let mut probe = interval(probe_every);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
            probe.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // Both intervals fire immediately; skip that first tick
            sweep.tick().await;
            probe.tick().await;

            info!(
                "Maintenance running (sweep every {:?}, probe every {:?})",
                sweep_every, probe_every
            );

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Maintenance stopped");
                        break;
                    }
                    _ = sweep.tick() => {
                        let removed = manager.purge_expired_caches();
                        if removed > 0 {
                            debug!("Cache sweep removed {} expired entries", removed);
                        }
                    }
                    _ = probe.tick() => {
                        manager.check_all_health().await;
                    }
                }
            }
        })
    }

    // =============================================================================
    // HELPERS
    // =============================================================================

    fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(SourceAdapter::name).collect()
    }

    fn find(&self, name: &str) -> Option<&SourceAdapter> {
        let name = name.trim();
        self.adapters
            .iter()
            .find(|adapter| adapter.name().eq_ignore_ascii_case(name))
    }

    /// Source whose name prefixes a qualified id (longest name wins)
    fn owner_of(&self, id: &str) -> Option<&str> {
        self.adapters
            .iter()
            .map(SourceAdapter::name)
            .filter(|name| strip_source_prefix(name, id).is_some())
            .max_by_key(|name| name.len())
    }

    /// Adapters to try, in order
    ///
    /// A named source yields just that adapter, even when it is unhealthy.
    /// Otherwise every adapter is returned in health-adjusted priority order.
    async fn candidates(
        &self,
        source: Option<&str>,
        operation: &str,
    ) -> AppResult<Vec<&SourceAdapter>> {
        if let Some(name) = source {
            let adapter = self.find(name).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown source: '{}'", name.trim()))
            })?;

            let status = self.health.status(adapter.name()).await;
            if matches!(status, HealthStatus::Offline | HealthStatus::Degraded) {
                warn!(
                    "{} requested directly from {} while it is {}",
                    operation,
                    adapter.name(),
                    status
                );
            }
            return Ok(vec![adapter]);
        }

        let names = self.names();
        let statuses = self.health.statuses(&names).await;
        let labelled: Vec<(&str, HealthStatus)> = names.into_iter().zip(statuses).collect();
        let preferred = self.preferred.read().await.clone();

        let order = ProviderSelectionService::order_candidates(&labelled, preferred.as_deref());
        Ok(order.into_iter().map(|index| &self.adapters[index]).collect())
    }
}
