//! # ProcessWatchdog: whole-process health check.
//!
//! Ticks every `watchdog_interval` and trips when either limit is exceeded:
//! - **stall**: no gift and no probe-driven launch anywhere for `stall_timeout`;
//! - **max age**: the process has been up for `max_runtime`.
//!
//! A zero limit disables that check. On trip the watchdog publishes
//! `WatchdogTripped` and returns the reason; the monitor then stops
//! everything and exits with an error so an external supervisor restarts it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::activity::ActivityTracker;
use crate::events::{Bus, Event, EventKind};

/// Why the watchdog tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripReason {
    /// No global activity for `idle`.
    Stalled {
        /// Time since the last activity.
        idle: Duration,
    },
    /// Process age reached the configured maximum.
    MaxAge {
        /// Process age at trip time.
        age: Duration,
    },
}

impl TripReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TripReason::Stalled { .. } => "stalled",
            TripReason::MaxAge { .. } => "max_age",
        }
    }
}

impl fmt::Display for TripReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripReason::Stalled { idle } => write!(f, "no activity for {idle:?}"),
            TripReason::MaxAge { age } => write!(f, "process age {age:?} reached the limit"),
        }
    }
}

pub(crate) struct ProcessWatchdog {
    activity: Arc<ActivityTracker>,
    stall: Option<Duration>,
    max_age: Option<Duration>,
    interval: Duration,
    bus: Bus,
}

impl ProcessWatchdog {
    pub fn new(
        activity: Arc<ActivityTracker>,
        stall: Option<Duration>,
        max_age: Option<Duration>,
        interval: Duration,
        bus: Bus,
    ) -> Self {
        Self {
            activity,
            stall,
            max_age,
            interval: interval.max(Duration::from_millis(1)),
            bus,
        }
    }

    /// Evaluates both limits once.
    pub fn check(&self) -> Option<TripReason> {
        if let Some(limit) = self.stall {
            let idle = self.activity.idle_for();
            if idle >= limit {
                return Some(TripReason::Stalled { idle });
            }
        }
        if let Some(limit) = self.max_age {
            let age = self.activity.age();
            if age >= limit {
                return Some(TripReason::MaxAge { age });
            }
        }
        None
    }

    /// Ticks until a limit is exceeded (`Some`) or `token` is cancelled (`None`).
    pub async fn run(self, token: CancellationToken) -> Option<TripReason> {
        if self.stall.is_none() && self.max_age.is_none() {
            token.cancelled().await;
            return None;
        }

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return None,
                _ = ticker.tick() => {}
            }
            if let Some(reason) = self.check() {
                self.bus.publish(
                    Event::new(EventKind::WatchdogTripped).with_reason(reason.to_string()),
                );
                return Some(reason);
            }
        }
    }
}
