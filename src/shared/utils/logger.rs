use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, Level};

static INIT: Once = Once::new();

/// Install the global subscriber, filtered by `ANISOURCE_LOG` (default info)
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_logger() {
    INIT.call_once(|| {
        let level = std::env::var("ANISOURCE_LOG")
            .ok()
            .and_then(|value| parse_level(&value))
            .unwrap_or(Level::INFO);

        let installed = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .try_init();

        match installed {
            Ok(()) => info!("Logging system initialized at {}", level),
            Err(e) => eprintln!("Logger already installed: {}", e),
        }
    });
}

fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Log lines shared by the manager, the adapters and the HTTP clients
pub struct LogContext;

impl LogContext {
    /// One upstream HTTP exchange
    pub fn upstream_call(source: &str, method: &str, url: &str, status: u16, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        if status >= 400 {
            info!("Upstream: {} {} {} -> {} in {}ms", source, method, url, status, elapsed_ms);
        } else {
            debug!("Upstream: {} {} {} -> {} in {}ms", source, method, url, status, elapsed_ms);
        }
    }

    /// Search outcome; `source` is None for merged or exhausted searches
    pub fn search_operation(query: &str, source: Option<&str>, results: usize) {
        match source {
            Some(s) => info!("Search: '{}' answered by {} with {} results", query, s, results),
            None if results == 0 => info!("Search: no source had results for '{}'", query),
            None => info!("Search: '{}' merged into {} results", query, results),
        }
    }

    /// A source failed in a way retrying will not fix
    pub fn source_error(source: &str, operation: &str, error: &dyn std::error::Error) {
        error!("{} failed {}: {}", source, operation, error);
    }
}

/// Elapsed-time logging for manager operations
pub struct TimedOperation {
    started: Instant,
    operation: &'static str,
}

impl TimedOperation {
    pub fn new(operation: &'static str) -> Self {
        debug!("{} started", operation);
        Self {
            started: Instant::now(),
            operation,
        }
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.started.elapsed();
        debug!("{} took {}ms", self.operation, elapsed.as_millis());
        elapsed
    }

    pub fn finish_with_info(self, info: &str) -> Duration {
        let elapsed = self.started.elapsed();
        debug!("{} took {}ms ({})", self.operation, elapsed.as_millis(), info);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_reports_elapsed_time() {
        let timer = TimedOperation::new("unit");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.finish() >= Duration::from_millis(5));
    }

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level(" warning "), Some(Level::WARN));
        assert_eq!(parse_level("verbose"), None);
    }
}
