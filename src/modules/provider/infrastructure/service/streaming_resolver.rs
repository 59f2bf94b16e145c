use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::modules::anime::domain::{entities::StreamingBundle, value_objects::StreamCategory};
use crate::modules::provider::infrastructure::decorators::{CallOutcome, SourceAdapter};

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Attempts made against one server before moving to the next
    pub attempts_per_server: u32,
    /// Backoff before retry `n` is `backoff_step * n`
    pub backoff_step: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            attempts_per_server: 2,
            backoff_step: Duration::from_secs(1),
        }
    }
}

/// Walks (server x retry) combinations of one source until something plays
#[derive(Debug, Clone, Default)]
pub struct StreamingResolver {
    config: ResolverConfig,
}

impl StreamingResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a playable bundle from `adapter`, or the empty bundle
    ///
    /// The whole walk counts as one health sample for the source: one
    /// success when something plays, one failure when every attempt that
    /// reached the upstream came back empty. Backoff sleeps are not part
    /// of the reported latency.
    pub async fn resolve(
        &self,
        adapter: &SourceAdapter,
        episode_id: &str,
        requested: Option<&str>,
        category: StreamCategory,
    ) -> StreamingBundle {
        let servers = self
            .trial_order(adapter, episode_id, requested, category)
            .await;

        let trials: Vec<Option<&str>> = if servers.is_empty() {
            vec![None]
        } else {
            servers.iter().map(|s| Some(s.as_str())).collect()
        };

        let mut upstream_time = Duration::ZERO;
        let mut reached_upstream = false;

        for server in trials {
            for attempt in 0..self.config.attempts_per_server {
                if attempt > 0 {
                    let delay = self.config.backoff_step * attempt;
                    debug!(
                        "Retrying {} server {:?} in {:?} (attempt {}/{})",
                        adapter.name(),
                        server,
                        delay,
                        attempt + 1,
                        self.config.attempts_per_server
                    );
                    sleep(delay).await;
                }

                let tried = adapter.stream_attempt(episode_id, server, category).await;
                upstream_time += tried.elapsed;
                reached_upstream |= tried.outcome.reached_upstream();

                if tried.bundle.is_playable() {
                    let mut bundle = tried.bundle;
                    if let Some(name) = server {
                        bundle.server = Some(name.to_string());
                    }
                    if tried.outcome != CallOutcome::Cached {
                        adapter.report(CallOutcome::Answered, upstream_time).await;
                    }
                    info!(
                        "Resolved {} via {} server {:?} ({} variants)",
                        episode_id,
                        adapter.name(),
                        bundle.server,
                        bundle.sources.len()
                    );
                    return bundle;
                }
            }
            warn!(
                "{} server {:?} gave nothing for {}",
                adapter.name(),
                server,
                episode_id
            );
        }

        if reached_upstream {
            adapter.report(CallOutcome::Failed, upstream_time).await;
        }
        StreamingBundle::empty()
    }

    /// Requested server first, then the profile's priority list, then the
    /// source's own server listing when neither names anything
    async fn trial_order(
        &self,
        adapter: &SourceAdapter,
        episode_id: &str,
        requested: Option<&str>,
        category: StreamCategory,
    ) -> Vec<String> {
        let named = dedup_servers(
            requested
                .into_iter()
                .chain(adapter.profile().server_priority.iter().map(String::as_str)),
        );
        if !named.is_empty() {
            return named;
        }

        let listed = adapter.get_servers(episode_id).await;
        dedup_servers(
            listed
                .iter()
                .filter(|server| server.category == category)
                .map(|server| server.name.as_str()),
        )
    }
}

/// Trimmed, non-empty names with case-insensitive duplicates removed
fn dedup_servers<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut ordered = Vec::new();
    for name in names.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
        let key = name.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            ordered.push(name.to_string());
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::anime::domain::entities::{StreamServer, VideoVariant};
    use crate::modules::anime::domain::value_objects::VideoQuality;
    use crate::modules::provider::domain::value_objects::HealthStatus;
    use crate::modules::provider::infrastructure::{
        cache::CacheTtlConfig, monitoring::HealthMonitor,
    };
    use crate::modules::provider::traits::{MockAnimeSource, SourceProfile};
    use crate::shared::errors::AppError;
    use std::sync::Arc;

    fn adapter(source: MockAnimeSource) -> SourceAdapter {
        adapter_with(source, Arc::new(HealthMonitor::default()))
    }

    fn adapter_with(source: MockAnimeSource, health: Arc<HealthMonitor>) -> SourceAdapter {
        SourceAdapter::new(
            Arc::new(source),
            health,
            &CacheTtlConfig::default(),
            Duration::from_secs(10),
            Duration::from_secs(5),
        )
    }

    fn playable() -> StreamingBundle {
        StreamingBundle {
            sources: vec![
                VideoVariant::new("https://cdn.test/360.mp4", VideoQuality::P360),
                VideoVariant::new("https://cdn.test/1080.m3u8", VideoQuality::P1080),
            ],
            ..StreamingBundle::default()
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_case_insensitively() {
        let names = dedup_servers(["HD-1", " hd-1", "", "Vidstream", "vidSTREAM", "HD-2"]);
        assert_eq!(names, vec!["HD-1", "Vidstream", "HD-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn falls_back_to_next_server_after_retries() {
        let mut source = MockAnimeSource::new();
        source.expect_profile().return_const(
            SourceProfile::new("stream").streaming(VideoQuality::P1080, ["alpha", "beta"]),
        );
        source
            .expect_get_streaming_links()
            .withf(|_, server, _| server.as_deref() == Some("alpha"))
            .times(2)
            .returning(|_, _, _| Err(AppError::UpstreamUnavailable("down".to_string())));
        source
            .expect_get_streaming_links()
            .withf(|_, server, _| server.as_deref() == Some("beta"))
            .times(1)
            .returning(|_, _, _| Ok(playable()));

        let resolver = StreamingResolver::default();
        let bundle = resolver
            .resolve(&adapter(source), "ep-1", None, StreamCategory::Sub)
            .await;

        assert_eq!(bundle.server.as_deref(), Some("beta"));
        assert_eq!(bundle.source, "stream");
        assert_eq!(bundle.sources[0].quality, VideoQuality::P1080);
    }

    #[tokio::test(start_paused = true)]
    async fn uses_server_listing_when_nothing_is_named() {
        let mut source = MockAnimeSource::new();
        source
            .expect_profile()
            .return_const(SourceProfile::new("listed"));
        source
            .expect_get_servers()
            .withf(|id| id == "ep-2")
            .returning(|_| {
                Ok(vec![
                    StreamServer {
                        id: "1".to_string(),
                        name: "dub-only".to_string(),
                        category: StreamCategory::Dub,
                    },
                    StreamServer {
                        id: "2".to_string(),
                        name: "main".to_string(),
                        category: StreamCategory::Sub,
                    },
                ])
            });
        source
            .expect_get_streaming_links()
            .withf(|_, server, _| server.as_deref() == Some("main"))
            .times(1)
            .returning(|_, _, _| Ok(playable()));

        let bundle = StreamingResolver::default()
            .resolve(&adapter(source), "ep-2", None, StreamCategory::Sub)
            .await;

        assert_eq!(bundle.server.as_deref(), Some("main"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_empty_bundle() {
        let mut source = MockAnimeSource::new();
        source.expect_profile().return_const(
            SourceProfile::new("dead").streaming(VideoQuality::P720, ["only"]),
        );
        source
            .expect_get_streaming_links()
            .times(3)
            .returning(|_, _, _| Ok(StreamingBundle::default()));

        let resolver = StreamingResolver::new(ResolverConfig {
            attempts_per_server: 3,
            backoff_step: Duration::from_millis(100),
        });
        let bundle = resolver
            .resolve(&adapter(source), "ep-3", None, StreamCategory::Dub)
            .await;

        assert!(!bundle.is_playable());
        assert_eq!(bundle.source, "none");
    }

    #[tokio::test(start_paused = true)]
    async fn one_unplayable_episode_counts_as_one_failure() {
        let mut source = MockAnimeSource::new();
        source.expect_profile().return_const(
            SourceProfile::new("flaky").streaming(VideoQuality::P720, ["a", "b", "c"]),
        );
        source
            .expect_get_streaming_links()
            .times(6)
            .returning(|_, _, _| Err(AppError::UpstreamUnavailable("down".to_string())));
        let health = Arc::new(HealthMonitor::default());

        let bundle = StreamingResolver::default()
            .resolve(
                &adapter_with(source, health.clone()),
                "ep-4",
                None,
                StreamCategory::Sub,
            )
            .await;

        assert!(!bundle.is_playable());
        let entry = health.get_source_health("flaky").await.unwrap();
        assert_eq!(entry.consecutive_failures, 1);
        assert_eq!(entry.total_calls, 1);
        assert_ne!(entry.status, HealthStatus::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn late_success_is_reported_once() {
        let mut source = MockAnimeSource::new();
        source.expect_profile().return_const(
            SourceProfile::new("late").streaming(VideoQuality::P720, ["a", "b"]),
        );
        source
            .expect_get_streaming_links()
            .withf(|_, server, _| server.as_deref() == Some("a"))
            .times(2)
            .returning(|_, _, _| Ok(StreamingBundle::default()));
        source
            .expect_get_streaming_links()
            .withf(|_, server, _| server.as_deref() == Some("b"))
            .times(1)
            .returning(|_, _, _| Ok(playable()));
        let health = Arc::new(HealthMonitor::default());

        let bundle = StreamingResolver::default()
            .resolve(
                &adapter_with(source, health.clone()),
                "ep-5",
                None,
                StreamCategory::Sub,
            )
            .await;

        assert!(bundle.is_playable());
        let entry = health.get_source_health("late").await.unwrap();
        assert_eq!(entry.consecutive_failures, 0);
        assert_eq!(entry.total_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_source_leaves_health_untouched() {
        let mut source = MockAnimeSource::new();
        source
            .expect_profile()
            .return_const(SourceProfile::new("meta"));
        source
            .expect_get_servers()
            .returning(|_| Err(AppError::NotImplemented("metadata only".to_string())));
        source
            .expect_get_streaming_links()
            .returning(|_, _, _| Err(AppError::NotImplemented("metadata only".to_string())));
        let health = Arc::new(HealthMonitor::default());

        let bundle = StreamingResolver::default()
            .resolve(
                &adapter_with(source, health.clone()),
                "ep-6",
                None,
                StreamCategory::Sub,
            )
            .await;

        assert!(!bundle.is_playable());
        assert!(health.get_source_health("meta").await.is_none());
        assert_eq!(health.status("meta").await, HealthStatus::Unknown);
    }
}
