//! # Runtime events emitted by the monitor, scheduler, supervisors and sinks.
//!
//! The [`EventKind`] enum classifies event types across five categories:
//! - **Roster/scan events**: roster loads, refresh failures, scan passes
//! - **Supervision events**: per-creator state machine progress
//! - **Gift events**: persistence and alert dispatch outcomes
//! - **Process events**: watchdog trips, shutdown and drain
//! - **Subscriber events**: overflow and panics in the fan-out layer
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use giftwatch::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_creator("some_creator")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(6));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.creator.as_deref(), Some("some_creator"));
//! assert_eq!(ev.delay_ms, Some(6000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Roster / scan ===
    /// Roster loaded (startup) or refreshed.
    ///
    /// Sets: `count` (roster size).
    RosterLoaded,

    /// Roster refresh failed; the previous roster stays in use.
    ///
    /// Sets: `reason`, `count` (size of the roster kept).
    RosterRefreshFailed,

    /// One full pass over the roster finished.
    ///
    /// Sets: `count` (number of supervisors launched during the pass).
    ScanPassCompleted,

    // === Supervision ===
    /// A probe confirmed the creator live and a supervisor was launched.
    ///
    /// Sets: `creator`.
    SupervisorStarted,

    /// The supervisor exited and released its slot.
    ///
    /// Sets: `creator`, `reason`.
    SupervisorStopped,

    /// A stop was requested for a creator's supervisor.
    ///
    /// Sets: `creator`.
    StopRequested,

    /// The supervisor re-probed a creator and found it offline.
    ///
    /// Sets: `creator`, `delay_ms` (wait before the next probe).
    CreatorOffline,

    /// A session was opened.
    ///
    /// Sets: `creator`, `attempt` (reconnect attempts so far).
    SessionOpened,

    /// Opening a session failed or timed out.
    ///
    /// Sets: `creator`, `reason`.
    ConnectFailed,

    /// The session ended (remote close or stream error).
    ///
    /// Sets: `creator`, `reason`.
    StreamEnded,

    /// No gift arrived within the idle threshold; the session was closed.
    ///
    /// Sets: `creator`, `delay_ms` (the idle threshold).
    IdleTimeout,

    /// The supervisor entered backoff.
    ///
    /// Sets: `creator`, `attempt`, `delay_ms`.
    BackoffScheduled,

    // === Gifts ===
    /// A gift record was persisted.
    ///
    /// Sets: `creator`, `count` (total value).
    GiftStored,

    /// Persisting a gift record failed.
    ///
    /// Sets: `creator`, `reason`, `count` (total value).
    StorageFailed,

    /// An alert was delivered.
    ///
    /// Sets: `creator`, `count` (total value).
    AlertSent,

    /// Delivering an alert failed.
    ///
    /// Sets: `creator`, `reason`, `count` (total value).
    AlertFailed,

    // === Process ===
    /// The watchdog decided to terminate the process.
    ///
    /// Sets: `reason`.
    WatchdogTripped,

    /// Shutdown requested (OS signal or programmatic).
    ShutdownRequested,

    /// All supervisors stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some supervisors did not stop in time.
    ///
    /// Sets: `reason` (stuck creators).
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `creator` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `creator` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Creator the event concerns (or subscriber name for subscriber events).
    pub creator: Option<Arc<str>>,
    /// Attempt count.
    pub attempt: Option<u32>,
    /// A delay or threshold in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// A size or value (roster size, gift total).
    pub count: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            creator: None,
            attempt: None,
            delay_ms: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches a creator id.
    #[inline]
    pub fn with_creator(mut self, creator: impl Into<Arc<str>>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a size or value.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_creator(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_creator(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::RosterLoaded);
        let b = Event::new(EventKind::RosterLoaded);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn delay_saturates() {
        let ev = Event::new(EventKind::IdleTimeout).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
