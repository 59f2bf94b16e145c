use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::modules::provider::domain::value_objects::{
    HealthMonitorConfig, HealthStatus, ProviderHealth, SourceHealth,
};

/// Health table shared by the manager and every source adapter
pub struct HealthMonitor {
    source_health: Arc<RwLock<HashMap<String, ProviderHealth>>>,
    config: HealthMonitorConfig,
}

impl HealthMonitor {
    pub fn new(config: HealthMonitorConfig) -> Self {
        Self {
            source_health: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Record successful (non-empty) call
    pub async fn record_success(&self, source: &str, latency: Duration) {
        self.update(source, |health, config| health.record_success(latency, config))
            .await;
        debug!("Recorded success for source {}, latency: {:?}", source, latency);
    }

    /// Record failed, empty or timed-out call
    pub async fn record_failure(&self, source: &str, latency: Duration) {
        self.update(source, |health, config| health.record_failure(latency, config))
            .await;
        debug!("Recorded failure for source {}", source);
    }

    /// Record the outcome of an explicit health check
    pub async fn record_probe(&self, source: &str, healthy: bool, latency: Duration) {
        self.update(source, |health, config| {
            health.record_probe(healthy, latency, config)
        })
        .await;
    }

    /// Current status; untracked sources are Unknown
    pub async fn status(&self, source: &str) -> HealthStatus {
        let health_map = self.source_health.read().await;
        health_map
            .get(source)
            .map(|health| health.status)
            .unwrap_or(HealthStatus::Unknown)
    }

    /// Statuses for `sources`, in the given order
    pub async fn statuses(&self, sources: &[&str]) -> Vec<HealthStatus> {
        let health_map = self.source_health.read().await;
        sources
            .iter()
            .map(|source| {
                health_map
                    .get(*source)
                    .map(|health| health.status)
                    .unwrap_or(HealthStatus::Unknown)
            })
            .collect()
    }

    pub async fn get_source_health(&self, source: &str) -> Option<SourceHealth> {
        let health_map = self.source_health.read().await;
        health_map.get(source).map(ProviderHealth::to_snapshot)
    }

    /// Snapshots for `sources`, in the given order
    pub async fn snapshots(&self, sources: &[&str]) -> Vec<SourceHealth> {
        let health_map = self.source_health.read().await;
        sources
            .iter()
            .map(|source| {
                health_map
                    .get(*source)
                    .map(ProviderHealth::to_snapshot)
                    .unwrap_or_else(|| ProviderHealth::new(*source).to_snapshot())
            })
            .collect()
    }

    async fn update<F>(&self, source: &str, apply: F)
    where
        F: FnOnce(&mut ProviderHealth, &HealthMonitorConfig),
    {
        let mut health_map = self.source_health.write().await;
        let health = health_map
            .entry(source.to_string())
            .or_insert_with(|| ProviderHealth::new(source));

        let before = health.status;
        apply(health, &self.config);
        let after = health.status;

        if before != after {
            match after {
                HealthStatus::Offline => warn!(
                    "Source {} is now offline ({} consecutive failures)",
                    source, health.consecutive_failures
                ),
                HealthStatus::Degraded => warn!(
                    "Source {} degraded (success rate {:.2})",
                    source,
                    health.success_rate()
                ),
                _ => info!("Source {} is now {}", source, after),
            }
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(HealthMonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn untracked_sources_are_unknown() {
        let monitor = HealthMonitor::default();

        assert_eq!(monitor.status("alpha").await, HealthStatus::Unknown);
        assert!(monitor.get_source_health("alpha").await.is_none());
        let snapshot = &monitor.snapshots(&["alpha"]).await[0];
        assert_eq!(snapshot.total_calls, 0);
        assert!(snapshot.last_checked.is_none());
    }

    #[tokio::test]
    async fn first_success_brings_source_online() {
        let monitor = HealthMonitor::default();
        monitor
            .record_success("alpha", Duration::from_millis(20))
            .await;

        assert_eq!(monitor.status("alpha").await, HealthStatus::Online);
        let health = monitor.get_source_health("alpha").await.unwrap();
        assert_eq!(health.total_calls, 1);
    }

    #[tokio::test]
    async fn probe_failure_takes_source_offline() {
        let monitor = HealthMonitor::default();
        monitor
            .record_probe("beta", false, Duration::from_millis(5))
            .await;

        assert_eq!(
            monitor.statuses(&["alpha", "beta", "gamma"]).await,
            vec![
                HealthStatus::Unknown,
                HealthStatus::Offline,
                HealthStatus::Unknown
            ]
        );
    }

    #[tokio::test]
    async fn snapshots_follow_requested_order() {
        let monitor = HealthMonitor::default();
        monitor.record_success("b", Duration::from_millis(1)).await;
        monitor.record_success("a", Duration::from_millis(1)).await;

        let names: Vec<String> = monitor
            .snapshots(&["a", "b"])
            .await
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn repeated_failures_open_the_circuit() {
        let monitor = HealthMonitor::default();
        for _ in 0..5 {
            monitor
                .record_failure("alpha", Duration::from_millis(1))
                .await;
        }
        assert_eq!(monitor.status("alpha").await, HealthStatus::Offline);

        monitor.record_success("alpha", Duration::from_millis(1)).await;
        assert_eq!(monitor.status("alpha").await, HealthStatus::Degraded);
    }
}
