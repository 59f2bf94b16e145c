#![allow(dead_code)]

use anisource_lib::{
    modules::anime::domain::{
        entities::{strip_source_prefix, VideoVariant},
        value_objects::VideoQuality,
    },
    AggregatorConfig, AnimeRecord, AnimeSource, AppError, AppResult, EpisodeRecord, SearchFilters,
    SearchPage, SourceManager, SourceProfile, StreamCategory, StreamServer, StreamingBundle,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scriptable in-memory source with call counters
pub struct FakeSource {
    profile: SourceProfile,
    titles: Vec<String>,
    episodes: u32,
    failing: bool,
    healthy: bool,
    delay: Duration,
    playable_server: Option<String>,
    variants: Vec<VideoQuality>,
    pub search_calls: AtomicUsize,
    pub details_calls: AtomicUsize,
    pub episode_calls: AtomicUsize,
    pub streaming_calls: AtomicUsize,
    pub servers_tried: Mutex<Vec<Option<String>>>,
}

impl FakeSource {
    pub fn new(name: &str) -> Self {
        Self {
            profile: SourceProfile::new(name),
            titles: Vec::new(),
            episodes: 0,
            failing: false,
            healthy: true,
            delay: Duration::ZERO,
            playable_server: None,
            variants: Vec::new(),
            search_calls: AtomicUsize::new(0),
            details_calls: AtomicUsize::new(0),
            episode_calls: AtomicUsize::new(0),
            streaming_calls: AtomicUsize::new(0),
            servers_tried: Mutex::new(Vec::new()),
        }
    }

    pub fn with_titles(mut self, titles: &[&str]) -> Self {
        self.titles = titles.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_episodes(mut self, count: u32) -> Self {
        self.episodes = count;
        self
    }

    /// Every data call fails with an upstream error
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Health probes fail
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_profile(mut self, profile: SourceProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Streaming works on `server` only, yielding the given qualities
    pub fn playable_on(mut self, server: &str, variants: &[VideoQuality]) -> Self {
        self.playable_server = Some(server.to_string());
        self.variants = variants.to_vec();
        self
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn details(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    pub fn streams(&self) -> usize {
        self.streaming_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn fail<T>(&self) -> AppResult<T> {
        Err(AppError::UpstreamUnavailable(format!(
            "{} is down",
            self.profile.name
        )))
    }

    fn page(&self, page: u32) -> SearchPage {
        let results = self
            .titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                AnimeRecord::new(&self.profile.name, &(i + 1).to_string(), title.as_str())
            })
            .collect();
        SearchPage::new(results, page, 1)
    }
}

#[async_trait]
impl AnimeSource for FakeSource {
    fn profile(&self) -> SourceProfile {
        self.profile.clone()
    }

    async fn health_check(&self) -> AppResult<()> {
        if self.healthy {
            Ok(())
        } else {
            self.fail()
        }
    }

    async fn search(
        &self,
        _query: &str,
        page: u32,
        _filters: &SearchFilters,
    ) -> AppResult<SearchPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failing {
            return self.fail();
        }
        Ok(self.page(page))
    }

    async fn get_details(&self, id: &str) -> AppResult<Option<AnimeRecord>> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.failing {
            return self.fail();
        }
        let native = strip_source_prefix(&self.profile.name, id).unwrap_or(id);
        Ok(self
            .titles
            .first()
            .map(|title| AnimeRecord::new(&self.profile.name, native, title.as_str())))
    }

    async fn get_episodes(&self, anime_id: &str) -> AppResult<Vec<EpisodeRecord>> {
        self.episode_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return self.fail();
        }
        Ok((1..=self.episodes)
            .map(|n| EpisodeRecord::new(format!("{}-{}", anime_id, n), n))
            .collect())
    }

    async fn get_servers(&self, _episode_id: &str) -> AppResult<Vec<StreamServer>> {
        if self.failing {
            return self.fail();
        }
        Ok(self
            .profile
            .server_priority
            .iter()
            .map(|name| StreamServer {
                id: name.clone(),
                name: name.clone(),
                category: StreamCategory::Sub,
            })
            .collect())
    }

    async fn get_streaming_links(
        &self,
        episode_id: &str,
        server: Option<String>,
        _category: StreamCategory,
    ) -> AppResult<StreamingBundle> {
        self.streaming_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut tried) = self.servers_tried.lock() {
            tried.push(server.clone());
        }
        self.pause().await;

        match (&self.playable_server, server.as_deref()) {
            (Some(playable), Some(requested))
                if playable.eq_ignore_ascii_case(requested) && !self.failing =>
            {
                Ok(StreamingBundle {
                    sources: self
                        .variants
                        .iter()
                        .enumerate()
                        .map(|(i, quality)| {
                            let url = format!("https://cdn.test/{}/{}.m3u8", episode_id, i);
                            VideoVariant::new(url, *quality)
                        })
                        .collect(),
                    ..StreamingBundle::default()
                })
            }
            _ => self.fail(),
        }
    }

    async fn get_trending(&self, page: u32) -> AppResult<SearchPage> {
        if self.failing {
            return self.fail();
        }
        Ok(self.page(page))
    }
}

/// Config with short timeouts and instant stream retries
pub fn fast_config() -> AggregatorConfig {
    let mut config = AggregatorConfig::default();
    config.manager.call_timeout = Duration::from_secs(2);
    config.manager.fanout_deadline = Duration::from_secs(3);
    config.manager.health_check_timeout = Duration::from_secs(1);
    config.resolver.backoff_step = Duration::from_millis(10);
    config
}

/// Manager over the given sources, in priority order
pub fn manager_with(sources: &[Arc<FakeSource>]) -> SourceManager {
    manager_with_config(sources, fast_config())
}

pub fn manager_with_config(
    sources: &[Arc<FakeSource>],
    config: AggregatorConfig,
) -> SourceManager {
    sources
        .iter()
        .fold(SourceManager::builder().with_config(config), |builder, source| {
            builder.register(Arc::clone(source) as Arc<dyn AnimeSource>)
        })
        .build()
        .expect("manager should build")
}
