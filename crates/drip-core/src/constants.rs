//! Scheduler constants. All timestamps and durations are in Unix seconds.

pub const SECONDS_PER_HOUR: u64 = 3_600;

pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Default minimum time between two settlements of the same stream by the
/// permissionless trigger.
///
/// Throttles call frequency only. Time skipped by the throttle accumulates
/// into the next settlement's elapsed window, so no value is lost.
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = SECONDS_PER_HOUR;

/// Environment variable prefix for scheduler configuration overrides.
pub const CONFIG_ENV_PREFIX: &str = "DRIP";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_is_24_hours() {
        assert_eq!(SECONDS_PER_DAY, 86_400);
    }

    #[test]
    fn default_interval_is_one_hour() {
        assert_eq!(DEFAULT_MIN_INTERVAL_SECS, 3_600);
    }
}
