use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// Circuit status of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Online,
    Degraded,
    Offline,
    /// No observation yet
    Unknown,
}

impl HealthStatus {
    /// Ordering group for fallback chains: lower is tried first
    pub fn group(&self) -> u8 {
        match self {
            HealthStatus::Online | HealthStatus::Unknown => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Offline => 2,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, HealthStatus::Offline)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Online => "online",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Offline => "offline",
            HealthStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Thresholds of the soft circuit
#[derive(Debug, Clone)]
pub struct HealthMonitorConfig {
    /// Outcomes kept in the rolling success window
    pub window_size: usize,
    /// Observations needed before the ratio may degrade a source
    pub min_samples: usize,
    pub degraded_ratio: f32,
    pub offline_after_failures: u32,
    /// Consecutive successes for Degraded -> Online
    pub recovery_successes: u32,
    /// EWMA weight of the newest latency sample (0.0-1.0)
    pub latency_weight: f32,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            window_size: 20,
            min_samples: 4,
            degraded_ratio: 0.5,
            offline_after_failures: 5,
            recovery_successes: 3,
            latency_weight: 0.3,
        }
    }
}

/// Health snapshot for external consumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHealth {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub success_rate: f32,
    pub last_checked: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub total_calls: u64,
}

/// Internal health tracking (runtime only)
#[derive(Debug, Clone)]
pub struct ProviderHealth {
    pub name: String,
    pub status: HealthStatus,
    window: VecDeque<bool>,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    average_latency_ms: Option<f64>,
    pub total_calls: u64,
    pub last_checked: Option<DateTime<Utc>>,
}

impl ProviderHealth {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unknown,
            window: VecDeque::new(),
            consecutive_failures: 0,
            consecutive_successes: 0,
            average_latency_ms: None,
            total_calls: 0,
            last_checked: None,
        }
    }

    /// Record a successful (non-empty) call
    pub fn record_success(&mut self, latency: Duration, config: &HealthMonitorConfig) {
        self.observe(true, latency, config);

        self.status = match self.status {
            HealthStatus::Unknown => HealthStatus::Online,
            // Probation: one good answer is not enough to trust it again
            HealthStatus::Offline => HealthStatus::Degraded,
            HealthStatus::Degraded
                if self.consecutive_successes >= config.recovery_successes
                    && !self.ratio_is_unhealthy(config) =>
            {
                HealthStatus::Online
            }
            status => status,
        };
    }

    /// Record a failed, empty or timed-out call
    pub fn record_failure(&mut self, latency: Duration, config: &HealthMonitorConfig) {
        self.observe(false, latency, config);

        if self.consecutive_failures >= config.offline_after_failures {
            self.status = HealthStatus::Offline;
        } else if self.status == HealthStatus::Offline {
            // Stays offline until a success moves it to probation
        } else if self.ratio_is_unhealthy(config) {
            self.status = HealthStatus::Degraded;
        }
    }

    /// Record the outcome of an explicit health probe
    pub fn record_probe(&mut self, healthy: bool, latency: Duration, config: &HealthMonitorConfig) {
        self.observe(healthy, latency, config);

        self.status = match (healthy, self.status) {
            (false, _) => HealthStatus::Offline,
            (true, HealthStatus::Offline) => HealthStatus::Degraded,
            (true, HealthStatus::Unknown) => HealthStatus::Online,
            (true, status) => status,
        };
    }

    /// Success ratio over the rolling window (1.0 with no evidence)
    pub fn success_rate(&self) -> f32 {
        if self.window.is_empty() {
            return 1.0;
        }
        let successes = self.window.iter().filter(|ok| **ok).count();
        successes as f32 / self.window.len() as f32
    }

    pub fn latency_ms(&self) -> u64 {
        self.average_latency_ms.unwrap_or(0.0).round() as u64
    }

    pub fn to_snapshot(&self) -> SourceHealth {
        SourceHealth {
            name: self.name.clone(),
            status: self.status,
            latency_ms: self.latency_ms(),
            success_rate: self.success_rate(),
            last_checked: self.last_checked,
            consecutive_failures: self.consecutive_failures,
            total_calls: self.total_calls,
        }
    }

    fn observe(&mut self, ok: bool, latency: Duration, config: &HealthMonitorConfig) {
        self.window.push_back(ok);
        while self.window.len() > config.window_size.max(1) {
            self.window.pop_front();
        }

        if ok {
            self.consecutive_failures = 0;
            self.consecutive_successes += 1;
        } else {
            self.consecutive_successes = 0;
            self.consecutive_failures += 1;
        }

        let sample = latency.as_secs_f64() * 1000.0;
        let weight = f64::from(config.latency_weight.clamp(0.0, 1.0));
        self.average_latency_ms = Some(match self.average_latency_ms {
            None => sample,
            Some(previous) => previous * (1.0 - weight) + sample * weight,
        });

        self.total_calls += 1;
        self.last_checked = Some(Utc::now());
    }

    fn ratio_is_unhealthy(&self, config: &HealthMonitorConfig) -> bool {
        self.window.len() >= config.min_samples && self.success_rate() < config.degraded_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn starts_unknown_and_goes_online_on_success() {
        let config = HealthMonitorConfig::default();
        let mut health = ProviderHealth::new("alpha");
        assert_eq!(health.status, HealthStatus::Unknown);

        health.record_success(ms(100), &config);
        assert_eq!(health.status, HealthStatus::Online);
        assert_eq!(health.total_calls, 1);
        assert!(health.last_checked.is_some());
    }

    #[test]
    fn single_failure_keeps_unknown_source_unknown() {
        let config = HealthMonitorConfig::default();
        let mut health = ProviderHealth::new("alpha");

        health.record_failure(ms(1), &config);
        assert_eq!(health.status, HealthStatus::Unknown);
        assert_eq!(health.consecutive_failures, 1);

        // 0/4 once min_samples is reached
        for _ in 0..3 {
            health.record_failure(ms(1), &config);
        }
        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[test]
    fn consecutive_failures_force_offline() {
        let config = HealthMonitorConfig::default();
        let mut health = ProviderHealth::new("alpha");
        health.record_success(ms(100), &config);

        for _ in 0..4 {
            health.record_failure(ms(100), &config);
            assert_ne!(health.status, HealthStatus::Offline);
        }
        health.record_failure(ms(100), &config);
        assert_eq!(health.status, HealthStatus::Offline);
    }

    #[test]
    fn low_ratio_degrades_only_with_enough_samples() {
        let config = HealthMonitorConfig::default();
        let mut health = ProviderHealth::new("alpha");
        health.record_success(ms(10), &config);
        health.record_failure(ms(10), &config);
        // 1/2 with two samples: not enough evidence
        assert_eq!(health.status, HealthStatus::Online);

        health.record_failure(ms(10), &config);
        health.record_success(ms(10), &config);
        health.record_failure(ms(10), &config);
        // 2/5 below 0.5
        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[test]
    fn offline_recovers_through_probation() {
        let config = HealthMonitorConfig::default();
        let mut health = ProviderHealth::new("alpha");
        for _ in 0..5 {
            health.record_failure(ms(10), &config);
        }
        assert_eq!(health.status, HealthStatus::Offline);

        health.record_success(ms(10), &config);
        assert_eq!(health.status, HealthStatus::Degraded);

        // Needs three in a row and a healthy ratio (5 of 10)
        for _ in 0..3 {
            health.record_success(ms(10), &config);
        }
        assert_eq!(health.status, HealthStatus::Degraded);
        health.record_success(ms(10), &config);
        assert_eq!(health.status, HealthStatus::Online);
    }

    #[test]
    fn probe_failure_is_immediately_offline() {
        let config = HealthMonitorConfig::default();
        let mut health = ProviderHealth::new("alpha");
        health.record_success(ms(10), &config);

        health.record_probe(false, ms(10), &config);
        assert_eq!(health.status, HealthStatus::Offline);

        health.record_probe(true, ms(10), &config);
        assert_eq!(health.status, HealthStatus::Degraded);

        // A healthy probe never promotes Degraded on its own
        health.record_probe(true, ms(10), &config);
        assert_eq!(health.status, HealthStatus::Degraded);
    }

    #[test]
    fn latency_is_weighted_average() {
        let config = HealthMonitorConfig::default();
        let mut health = ProviderHealth::new("alpha");
        health.record_success(ms(100), &config);
        health.record_success(ms(200), &config);
        // 100 * 0.7 + 200 * 0.3
        assert_eq!(health.latency_ms(), 130);
    }

    #[test]
    fn window_is_bounded() {
        let config = HealthMonitorConfig {
            window_size: 3,
            ..HealthMonitorConfig::default()
        };
        let mut health = ProviderHealth::new("alpha");
        health.record_failure(ms(1), &config);
        for _ in 0..3 {
            health.record_success(ms(1), &config);
        }
        assert_eq!(health.success_rate(), 1.0);
    }
}
