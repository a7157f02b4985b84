//! # LogWriter: structured `tracing` output for runtime events.
//!
//! Installed by default by [`GiftMonitorBuilder`](crate::GiftMonitorBuilder).
//! Runs on its own subscriber worker, so a slow log sink never stalls a
//! supervisor; at worst this subscriber's queue overflows.
//!
//! ## Severities
//! - `error`: watchdog trips, grace exceeded, subscriber panics
//! - `warn`: backoff entry, connect failures, idle timeouts, roster refresh
//!   failures, storage/alert failures, subscriber overflow
//! - `info`: roster size, supervisor start/stop, sessions, alerts sent, shutdown
//! - `debug`: per-gift persistence, offline re-probes, scan passes

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let creator = e.creator.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::RosterLoaded => {
                info!(size = e.count, "roster loaded");
            }
            EventKind::RosterRefreshFailed => {
                warn!(kept = e.count, reason, "roster refresh failed; keeping previous roster");
            }
            EventKind::ScanPassCompleted => {
                debug!(launched = e.count, "scan pass completed");
            }
            EventKind::SupervisorStarted => {
                info!(creator, "supervisor started");
            }
            EventKind::SupervisorStopped => {
                info!(creator, reason, "supervisor stopped");
            }
            EventKind::StopRequested => {
                info!(creator, "stop requested");
            }
            EventKind::CreatorOffline => {
                debug!(creator, recheck_ms = e.delay_ms, "creator offline");
            }
            EventKind::SessionOpened => {
                info!(creator, attempts = e.attempt, "session opened");
            }
            EventKind::ConnectFailed => {
                warn!(creator, reason, "connect failed");
            }
            EventKind::StreamEnded => {
                info!(creator, reason, "stream ended");
            }
            EventKind::IdleTimeout => {
                warn!(creator, idle_ms = e.delay_ms, "no gifts within idle threshold; closing session");
            }
            EventKind::BackoffScheduled => {
                warn!(creator, attempt = e.attempt, delay_ms = e.delay_ms, "backoff");
            }
            EventKind::GiftStored => {
                debug!(creator, total = e.count, "gift stored");
            }
            EventKind::StorageFailed => {
                warn!(creator, total = e.count, reason, "gift persistence failed");
            }
            EventKind::AlertSent => {
                info!(creator, total = e.count, "gift alert sent");
            }
            EventKind::AlertFailed => {
                warn!(creator, total = e.count, reason, "gift alert failed");
            }
            EventKind::WatchdogTripped => {
                error!(reason, "watchdog tripped; terminating process");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!("all supervisors stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(stuck = reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = creator, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = creator, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
