//! Runtime configuration for the aggregation engine
//!
//! Every knob has a documented default. `AggregatorConfig::from_env` loads a
//! `.env` file when present and overrides defaults from `ANISOURCE_*`
//! variables.

use std::str::FromStr;
use std::time::Duration;

use crate::modules::provider::infrastructure::{
    cache::CacheTtlConfig, manager::ManagerConfig, monitoring::HealthMonitorConfig,
    service::ResolverConfig,
};
use crate::shared::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    pub manager: ManagerConfig,
    pub cache: CacheTtlConfig,
    pub health: HealthMonitorConfig,
    pub resolver: ResolverConfig,
}

impl AggregatorConfig {
    /// Load configuration from the process environment (and `.env`)
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let env = EnvReader { lookup: &lookup };

        let manager = &mut config.manager;
        env.secs("ANISOURCE_CALL_TIMEOUT_SECS", &mut manager.call_timeout)?;
        env.secs("ANISOURCE_FANOUT_DEADLINE_SECS", &mut manager.fanout_deadline)?;
        env.secs(
            "ANISOURCE_HEALTH_CHECK_TIMEOUT_SECS",
            &mut manager.health_check_timeout,
        )?;
        env.secs("ANISOURCE_CACHE_SWEEP_SECS", &mut manager.sweep_interval)?;
        env.secs("ANISOURCE_HEALTH_PROBE_SECS", &mut manager.health_probe_interval)?;

        let cache = &mut config.cache;
        env.secs("ANISOURCE_TTL_TRENDING_SECS", &mut cache.trending)?;
        env.secs("ANISOURCE_TTL_SEARCH_SECS", &mut cache.search)?;
        env.secs("ANISOURCE_TTL_DETAILS_SECS", &mut cache.details)?;
        env.secs("ANISOURCE_TTL_EPISODES_SECS", &mut cache.episodes)?;
        env.secs("ANISOURCE_TTL_SERVERS_SECS", &mut cache.servers)?;
        env.secs("ANISOURCE_TTL_STREAMING_SECS", &mut cache.streaming)?;
        env.secs("ANISOURCE_TTL_GENRE_SECS", &mut cache.genre)?;
        env.value("ANISOURCE_CACHE_MAX_ENTRIES", &mut cache.max_entries)?;

        let health = &mut config.health;
        env.value("ANISOURCE_HEALTH_WINDOW", &mut health.window_size)?;
        env.value("ANISOURCE_HEALTH_MIN_SAMPLES", &mut health.min_samples)?;
        env.value("ANISOURCE_HEALTH_DEGRADED_RATIO", &mut health.degraded_ratio)?;
        env.value(
            "ANISOURCE_HEALTH_OFFLINE_AFTER",
            &mut health.offline_after_failures,
        )?;
        env.value(
            "ANISOURCE_HEALTH_RECOVERY_SUCCESSES",
            &mut health.recovery_successes,
        )?;

        let resolver = &mut config.resolver;
        env.value("ANISOURCE_STREAM_ATTEMPTS", &mut resolver.attempts_per_server)?;
        if let Some(ms) = env.parse::<u64>("ANISOURCE_STREAM_BACKOFF_MS")? {
            resolver.backoff_step = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if self.health.window_size == 0 {
            return Err(AppError::ConfigError(
                "ANISOURCE_HEALTH_WINDOW must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.health.degraded_ratio) {
            return Err(AppError::ConfigError(
                "ANISOURCE_HEALTH_DEGRADED_RATIO must be between 0 and 1".to_string(),
            ));
        }
        if self.resolver.attempts_per_server == 0 {
            return Err(AppError::ConfigError(
                "ANISOURCE_STREAM_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.manager.call_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "ANISOURCE_CALL_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

struct EnvReader<'a, F> {
    lookup: &'a F,
}

impl<F> EnvReader<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn parse<T: FromStr>(&self, key: &str) -> AppResult<Option<T>> {
        match (self.lookup)(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                AppError::ConfigError(format!("{} has an invalid value: '{}'", key, raw))
            }),
        }
    }

    fn value<T: FromStr>(&self, key: &str, target: &mut T) -> AppResult<()> {
        if let Some(parsed) = self.parse::<T>(key)? {
            *target = parsed;
        }
        Ok(())
    }

    fn secs(&self, key: &str, target: &mut Duration) -> AppResult<()> {
        if let Some(secs) = self.parse::<u64>(key)? {
            *target = Duration::from_secs(secs);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_ttls() {
        let config = AggregatorConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.cache.search, Duration::from_secs(180));
        assert_eq!(config.cache.details, Duration::from_secs(900));
        assert_eq!(config.cache.streaming, Duration::from_secs(7200));
        assert_eq!(config.manager.sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn overrides_are_applied() {
        let config = AggregatorConfig::from_lookup(lookup(&[
            ("ANISOURCE_TTL_SEARCH_SECS", "60"),
            ("ANISOURCE_HEALTH_DEGRADED_RATIO", "0.25"),
            ("ANISOURCE_STREAM_BACKOFF_MS", "50"),
        ]))
        .unwrap();

        assert_eq!(config.cache.search, Duration::from_secs(60));
        assert_eq!(config.health.degraded_ratio, 0.25);
        assert_eq!(config.resolver.backoff_step, Duration::from_millis(50));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let result =
            AggregatorConfig::from_lookup(lookup(&[("ANISOURCE_TTL_SEARCH_SECS", "soon")]));
        assert!(matches!(result, Err(AppError::ConfigError(_))));

        let result =
            AggregatorConfig::from_lookup(lookup(&[("ANISOURCE_HEALTH_DEGRADED_RATIO", "1.5")]));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
