//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the monitor runtime.
//! Every timeout and interval is an independent knob; nothing in the runtime
//! hardcodes one.
//!
//! ## Sentinel values
//! - `probe_concurrency = 0` → clamped to 1 (a zero-permit semaphore would never probe)
//! - `max_runtime = 0s` → no maximum process age
//! - `stall_timeout = 0s` → no stall detection
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Global configuration for the monitor runtime.
///
/// ## Field semantics
/// - probing: `probe_concurrency`, `probe_timeout`
/// - connection supervision: `connect_timeout`, `idle_reconnect`, `idle_recheck`, `backoff`
/// - scanning: `scan_entity_delay`, `scan_pass_interval`, `roster_refresh`, `roster_timeout`
/// - dispatch: `alert_threshold`, `sink_timeout`, `image_timeout`
/// - process health: `max_runtime`, `stall_timeout`, `watchdog_interval`, `grace`
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over sprinkling sentinel
/// checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of liveness probes in flight across all creators.
    pub probe_concurrency: usize,

    /// Budget for one liveness probe; exceeding it counts as "not live".
    pub probe_timeout: Duration,

    /// Budget for opening one session.
    pub connect_timeout: Duration,

    /// A streaming session with no gift for this long is closed and retried.
    pub idle_reconnect: Duration,

    /// Wait between probes while a supervised creator is offline.
    pub idle_recheck: Duration,

    /// Reconnect backoff (base, multiplier, cap, jitter).
    pub backoff: BackoffPolicy,

    /// Pause between consecutive roster entries within one scan pass.
    pub scan_entity_delay: Duration,

    /// Pause between full scan passes.
    pub scan_pass_interval: Duration,

    /// How often the roster is reloaded from the store.
    pub roster_refresh: Duration,

    /// Budget for one roster read; exceeding it counts as a failed read.
    pub roster_timeout: Duration,

    /// Minimum total diamond value that triggers an alert.
    pub alert_threshold: u64,

    /// Budget for one persistence write or alert delivery.
    pub sink_timeout: Duration,

    /// Budget for one artwork lookup; exceeding it sends the alert without an image.
    pub image_timeout: Duration,

    /// Maximum process age before the watchdog forces a restart (`0s` = unlimited).
    pub max_runtime: Duration,

    /// Maximum time without any global activity (`0s` = never stalls).
    pub stall_timeout: Duration,

    /// How often the watchdog checks process health.
    pub watchdog_interval: Duration,

    /// Maximum time to wait for supervisors to drain on shutdown.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the number of probe permits, never less than 1.
    #[inline]
    pub fn probe_permits(&self) -> usize {
        self.probe_concurrency.max(1)
    }

    /// Returns the maximum process age as an `Option`.
    ///
    /// - `None` → the process may run forever
    /// - `Some(d)` → the watchdog trips once the process is older than `d`
    #[inline]
    pub fn max_runtime_limit(&self) -> Option<Duration> {
        if self.max_runtime == Duration::ZERO {
            None
        } else {
            Some(self.max_runtime)
        }
    }

    /// Returns the stall threshold as an `Option`.
    #[inline]
    pub fn stall_limit(&self) -> Option<Duration> {
        if self.stall_timeout == Duration::ZERO {
            None
        } else {
            Some(self.stall_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `probe_concurrency = 20`, `probe_timeout = 5s`
    /// - `connect_timeout = 20s`, `idle_reconnect = 900s`, `idle_recheck = 15s`
    /// - `backoff = BackoffPolicy::default()` (2s × 1.8, capped at 60s)
    /// - `scan_entity_delay = 300ms`, `scan_pass_interval = 10s`, `roster_refresh = 600s`,
    ///   `roster_timeout = 30s`
    /// - `alert_threshold = 5000`, `sink_timeout = 10s`, `image_timeout = 5s`
    /// - `max_runtime = 3h`, `stall_timeout = 8min`, `watchdog_interval = 30s`
    /// - `grace = 10s`, `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            probe_concurrency: 20,
            probe_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(20),
            idle_reconnect: Duration::from_secs(900),
            idle_recheck: Duration::from_secs(15),
            backoff: BackoffPolicy::default(),
            scan_entity_delay: Duration::from_millis(300),
            scan_pass_interval: Duration::from_secs(10),
            roster_refresh: Duration::from_secs(600),
            roster_timeout: Duration::from_secs(30),
            alert_threshold: 5000,
            sink_timeout: Duration::from_secs(10),
            image_timeout: Duration::from_secs(5),
            max_runtime: Duration::from_secs(3 * 60 * 60),
            stall_timeout: Duration::from_secs(8 * 60),
            watchdog_interval: Duration::from_secs(30),
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_disable_limits() {
        let cfg = Config {
            max_runtime: Duration::ZERO,
            stall_timeout: Duration::ZERO,
            probe_concurrency: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.max_runtime_limit(), None);
        assert_eq!(cfg.stall_limit(), None);
        assert_eq!(cfg.probe_permits(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn defaults_are_enabled() {
        let cfg = Config::default();
        assert_eq!(cfg.max_runtime_limit(), Some(Duration::from_secs(10_800)));
        assert_eq!(cfg.stall_limit(), Some(Duration::from_secs(480)));
        assert_eq!(cfg.probe_permits(), 20);
    }
}
