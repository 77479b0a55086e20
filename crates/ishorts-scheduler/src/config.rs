//! Scheduler configuration.

use std::time::Duration;

/// Longest accepted batch interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between two batches of the same series
    pub interval: Duration,
    /// Wait before resubscribing after the notification stream drops
    pub resubscribe_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            resubscribe_backoff: Duration::from_secs(1),
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("SCHEDULER_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(|secs| Duration::from_secs(secs).min(MAX_INTERVAL))
                .unwrap_or(defaults.interval),
            resubscribe_backoff: std::env::var("SCHEDULER_RESUBSCRIBE_BACKOFF_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| Duration::from_secs(secs.clamp(1, 300)))
                .unwrap_or(defaults.resubscribe_backoff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_clamps_interval() {
        std::env::set_var("SCHEDULER_INTERVAL_SECS", u64::MAX.to_string());
        let config = SchedulerConfig::from_env();
        std::env::remove_var("SCHEDULER_INTERVAL_SECS");

        assert_eq!(config.interval, MAX_INTERVAL);
    }
}
