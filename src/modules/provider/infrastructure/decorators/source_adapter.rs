use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::modules::anime::domain::{
    entities::{
        AnimeRecord, EmptyResult, EpisodeRecord, SearchPage, StreamServer, StreamingBundle,
    },
    value_objects::StreamCategory,
};
use crate::modules::provider::{
    domain::value_objects::{ProviderHealth, SearchFilters, SourceHealth},
    infrastructure::{
        cache::{AdapterCache, CacheStats, CacheTtlConfig},
        monitoring::HealthMonitor,
    },
    traits::{AnimeSource, SourceProfile},
};
use crate::shared::{errors::AppError, utils::logger::LogContext};

/// How one upstream call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Answered,
    Empty,
    /// Error or timeout
    Failed,
    /// The source does not implement the operation
    Unsupported,
    /// Served from the cache without touching the upstream
    Cached,
}

impl CallOutcome {
    /// Whether the upstream was actually asked and could have answered
    pub fn reached_upstream(self) -> bool {
        matches!(
            self,
            CallOutcome::Answered | CallOutcome::Empty | CallOutcome::Failed
        )
    }
}

/// Result of [`SourceAdapter::stream_attempt`]
#[derive(Debug, Clone)]
pub struct StreamAttempt {
    pub bundle: StreamingBundle,
    pub outcome: CallOutcome,
    pub elapsed: Duration,
}

/// Contract guard around one `AnimeSource`
///
/// Wraps the implementation with a per-call timeout, error absorption into
/// the operation's empty value, health reporting and the source's own TTL
/// cache. Nothing here ever returns an error. Cache hits are not reported
/// to the health monitor; neither are unsupported operations.
pub struct SourceAdapter {
    inner: Arc<dyn AnimeSource>,
    profile: SourceProfile,
    cache: AdapterCache,
    health: Arc<HealthMonitor>,
    call_timeout: Duration,
    health_check_timeout: Duration,
}

impl SourceAdapter {
    pub fn new(
        inner: Arc<dyn AnimeSource>,
        health: Arc<HealthMonitor>,
        ttl: &CacheTtlConfig,
        call_timeout: Duration,
        health_check_timeout: Duration,
    ) -> Self {
        let profile = inner.profile();
        Self {
            inner,
            profile,
            cache: AdapterCache::new(ttl),
            health,
            call_timeout,
            health_check_timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(self.name())
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Probe the upstream and fold the outcome into the health table
    pub async fn health_check(&self) -> SourceHealth {
        let started = Instant::now();
        let healthy = match timeout(self.health_check_timeout, self.inner.health_check()).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!("Health check failed for {}: {}", self.name(), err);
                false
            }
            Err(_) => {
                warn!(
                    "Health check for {} timed out after {:?}",
                    self.name(),
                    self.health_check_timeout
                );
                false
            }
        };

        self.health
            .record_probe(self.name(), healthy, started.elapsed())
            .await;

        self.health
            .get_source_health(self.name())
            .await
            .unwrap_or_else(|| ProviderHealth::new(self.name()).to_snapshot())
    }

    pub async fn search(&self, query: &str, page: u32, filters: &SearchFilters) -> SearchPage {
        let key = AdapterCache::search_key(query, page, filters);
        self.cache
            .search
            .get_or_fetch(key, || async {
                let result = self
                    .guarded(
                        "search",
                        SearchPage::empty(page),
                        self.inner.search(query, page, filters),
                    )
                    .await;
                self.stamp_page(result)
            })
            .await
    }

    pub async fn get_details(&self, id: &str) -> Option<AnimeRecord> {
        self.cache
            .details
            .get_or_fetch(id.to_string(), || async {
                let result = self
                    .guarded("get_details", None, self.inner.get_details(id))
                    .await;
                result.map(|mut record| {
                    record.enforce_invariants(self.name());
                    record
                })
            })
            .await
    }

    pub async fn get_episodes(&self, anime_id: &str) -> Vec<EpisodeRecord> {
        self.cache
            .episodes
            .get_or_fetch(anime_id.to_string(), || {
                self.guarded("get_episodes", Vec::new(), self.inner.get_episodes(anime_id))
            })
            .await
    }

    pub async fn get_servers(&self, episode_id: &str) -> Vec<StreamServer> {
        self.cache
            .servers
            .get_or_fetch(episode_id.to_string(), || {
                self.guarded("get_servers", Vec::new(), self.inner.get_servers(episode_id))
            })
            .await
    }

    /// One streaming attempt against one server
    ///
    /// Unlike the other operations this leaves the health table alone: the
    /// resolver walks many (server, retry) pairs and reports once for the
    /// whole walk through [`SourceAdapter::report`].
    pub async fn stream_attempt(
        &self,
        episode_id: &str,
        server: Option<&str>,
        category: StreamCategory,
    ) -> StreamAttempt {
        let key = AdapterCache::streaming_key(episode_id, server, category);
        let mut observed = (CallOutcome::Cached, Duration::ZERO);
        let slot = &mut observed;

        let bundle = self
            .cache
            .streaming
            .get_or_fetch(key, move || async move {
                let (mut bundle, outcome, elapsed) = self
                    .attempt(
                        "get_streaming_links",
                        StreamingBundle::empty(),
                        self.inner.get_streaming_links(
                            episode_id,
                            server.map(str::to_string),
                            category,
                        ),
                    )
                    .await;
                *slot = (outcome, elapsed);

                if bundle.is_playable() {
                    bundle.source = self.name().to_string();
                    if bundle.server.is_none() {
                        bundle.server = server.map(str::to_string);
                    }
                    bundle.sort_variants();
                }
                bundle
            })
            .await;

        let (outcome, elapsed) = observed;
        StreamAttempt {
            bundle,
            outcome,
            elapsed,
        }
    }

    pub async fn get_by_genre(&self, genre: &str, page: u32) -> SearchPage {
        let key = AdapterCache::genre_key(genre, page);
        self.cache
            .genre
            .get_or_fetch(key, || async {
                let result = self
                    .guarded(
                        "get_by_genre",
                        SearchPage::empty(page),
                        self.inner.get_by_genre(genre, page),
                    )
                    .await;
                self.stamp_page(result)
            })
            .await
    }

    pub async fn get_trending(&self, page: u32) -> SearchPage {
        self.cache
            .trending
            .get_or_fetch(page.to_string(), || async {
                let result = self
                    .guarded(
                        "get_trending",
                        SearchPage::empty(page),
                        self.inner.get_trending(page),
                    )
                    .await;
                self.stamp_page(result)
            })
            .await
    }

    /// Run one upstream call under the contract rules
    async fn guarded<T, Fut>(&self, operation: &'static str, empty: T, call: Fut) -> T
    where
        T: EmptyResult,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let (value, outcome, elapsed) = self.attempt(operation, empty, call).await;
        self.report(outcome, elapsed).await;
        value
    }

    /// Fold one outcome into the health table
    pub async fn report(&self, outcome: CallOutcome, latency: Duration) {
        match outcome {
            CallOutcome::Answered => self.health.record_success(self.name(), latency).await,
            CallOutcome::Empty | CallOutcome::Failed => {
                self.health.record_failure(self.name(), latency).await
            }
            CallOutcome::Unsupported | CallOutcome::Cached => {}
        }
    }

    /// Timeout, error absorption and logging, without health bookkeeping
    async fn attempt<T, Fut>(
        &self,
        operation: &'static str,
        empty: T,
        call: Fut,
    ) -> (T, CallOutcome, Duration)
    where
        T: EmptyResult,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let started = Instant::now();
        let result = timeout(self.call_timeout, call).await;
        let elapsed = started.elapsed();

        let (value, outcome) = match result {
            Ok(Ok(value)) if !value.is_empty_result() => (value, CallOutcome::Answered),
            Ok(Ok(_)) => {
                debug!("{} returned nothing for {}", self.name(), operation);
                (empty, CallOutcome::Empty)
            }
            Ok(Err(AppError::NotImplemented(reason))) => {
                debug!("{} skipped {}: {}", self.name(), operation, reason);
                (empty, CallOutcome::Unsupported)
            }
            Ok(Err(err)) => {
                if err.is_transient() {
                    warn!("{} failed {} (transient): {}", self.name(), operation, err);
                } else {
                    LogContext::source_error(self.name(), operation, &err);
                }
                (empty, CallOutcome::Failed)
            }
            Err(_) => {
                warn!(
                    "{} {} timed out after {:?}",
                    self.name(),
                    operation,
                    self.call_timeout
                );
                (empty, CallOutcome::Failed)
            }
        };
        (value, outcome, elapsed)
    }

    /// Tag a listing with this source and fix up record ids
    fn stamp_page(&self, mut page: SearchPage) -> SearchPage {
        if page.results.is_empty() {
            return page;
        }
        page.source = self.name().to_string();
        for record in &mut page.results {
            record.enforce_invariants(self.name());
        }
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::anime::domain::value_objects::VideoQuality;
    use crate::modules::anime::domain::entities::VideoVariant;
    use crate::modules::provider::domain::value_objects::HealthStatus;
    use crate::modules::provider::traits::MockAnimeSource;

    fn adapter_for(mock: MockAnimeSource) -> (SourceAdapter, Arc<HealthMonitor>) {
        let health = Arc::new(HealthMonitor::default());
        let adapter = SourceAdapter::new(
            Arc::new(mock),
            health.clone(),
            &CacheTtlConfig::default(),
            Duration::from_secs(10),
            Duration::from_secs(5),
        );
        (adapter, health)
    }

    fn mock_named(name: &str) -> MockAnimeSource {
        let mut mock = MockAnimeSource::new();
        mock.expect_profile().return_const(SourceProfile::new(name));
        mock
    }

    #[tokio::test]
    async fn upstream_error_becomes_empty_page_and_failure() {
        let mut mock = mock_named("alpha");
        mock.expect_search()
            .returning(|_, _, _| Err(AppError::ApiError("HTTP 500".to_string())));
        let (adapter, health) = adapter_for(mock);

        let page = adapter.search("naruto", 2, &SearchFilters::default()).await;

        assert!(page.results.is_empty());
        assert_eq!(page.current_page, 2);
        assert_eq!(page.source, "none");
        let snapshot = health.get_source_health("alpha").await.unwrap();
        assert_eq!(snapshot.total_calls, 1);
        assert_eq!(snapshot.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn results_are_stamped_and_cached() {
        let mut mock = mock_named("alpha");
        mock.expect_search().times(1).returning(|_, page, _| {
            // Forgot the prefix on purpose
            let mut record = AnimeRecord::new("alpha", "1", "Naruto");
            record.id = "1".to_string();
            Ok(SearchPage::new(vec![record], page, 1))
        });
        let (adapter, health) = adapter_for(mock);

        let first = adapter.search("Naruto", 1, &SearchFilters::default()).await;
        let second = adapter.search("  naruto", 1, &SearchFilters::default()).await;

        assert_eq!(first, second);
        assert_eq!(first.source, "alpha");
        assert_eq!(first.results[0].id, "alpha-1");
        assert_eq!(health.status("alpha").await, HealthStatus::Online);
        assert_eq!(adapter.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn unsupported_operation_is_not_a_failure() {
        let mut mock = mock_named("alpha");
        mock.expect_get_trending()
            .returning(|_| Err(AppError::NotImplemented("no trending".to_string())));
        let (adapter, health) = adapter_for(mock);

        let page = adapter.get_trending(1).await;

        assert!(page.results.is_empty());
        let snapshot = health.get_source_health("alpha").await;
        assert!(snapshot.map_or(true, |s| s.total_calls == 0));
    }

    #[tokio::test]
    async fn empty_details_are_not_cached() {
        let mut mock = mock_named("alpha");
        mock.expect_get_details().times(2).returning(|_| Ok(None));
        let (adapter, _) = adapter_for(mock);

        assert!(adapter.get_details("alpha-9").await.is_none());
        assert!(adapter.get_details("alpha-9").await.is_none());
    }

    #[tokio::test]
    async fn streaming_bundle_is_tagged_and_sorted() {
        let mut mock = mock_named("alpha");
        mock.expect_get_streaming_links().returning(|_, _, _| {
            Ok(StreamingBundle {
                sources: vec![
                    VideoVariant::new("low.m3u8", VideoQuality::P360),
                    VideoVariant::new("high.m3u8", VideoQuality::P1080),
                ],
                ..StreamingBundle::default()
            })
        });
        let (adapter, _) = adapter_for(mock);

        let attempt = adapter
            .stream_attempt("ep-1", Some("vidcloud"), StreamCategory::Sub)
            .await;
        assert_eq!(attempt.outcome, CallOutcome::Answered);
        let bundle = attempt.bundle;

        assert_eq!(bundle.source, "alpha");
        assert_eq!(bundle.server.as_deref(), Some("vidcloud"));
        assert_eq!(bundle.sources[0].quality, VideoQuality::P1080);
    }

    #[tokio::test]
    async fn failed_probe_marks_source_offline() {
        let mut mock = mock_named("alpha");
        mock.expect_health_check()
            .returning(|| Err(AppError::ExternalServiceError("refused".to_string())));
        let (adapter, _) = adapter_for(mock);

        let snapshot = adapter.health_check().await;
        assert_eq!(snapshot.status, HealthStatus::Offline);
    }
}
