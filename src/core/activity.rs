//! # Global activity tracking for the process watchdog.
//!
//! Two signals:
//! - **last activity**: touched whenever a gift arrives on any creator or a
//!   probe transitions a creator to live;
//! - **start time**: fixed at construction.
//!
//! ## Rules
//! - Writers are many (every supervisor, the scheduler); the reader is the watchdog.
//! - Touching never blocks for longer than a timestamp store.

use std::sync::Mutex;

use tokio::time::{Duration, Instant};

/// Process-wide liveness timestamps.
#[derive(Debug)]
pub struct ActivityTracker {
    started: Instant,
    last: Mutex<Instant>,
}

impl ActivityTracker {
    /// Creates a tracker whose start and last activity are "now".
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: Mutex::new(now),
        }
    }

    /// Records activity at the current instant.
    pub fn touch(&self) {
        let now = Instant::now();
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        if now > *last {
            *last = now;
        }
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        let last = *self.last.lock().unwrap_or_else(|p| p.into_inner());
        Instant::now().saturating_duration_since(last)
    }

    /// Time since the tracker was created.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started)
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn touch_resets_idle_but_not_age() {
        let t = ActivityTracker::new();
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(t.idle_for(), Duration::from_secs(90));

        t.touch();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(t.idle_for(), Duration::from_secs(5));
        assert_eq!(t.age(), Duration::from_secs(95));
    }
}
