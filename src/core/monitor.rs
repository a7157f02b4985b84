//! # GiftMonitor: owns the runtime and drives it from startup to shutdown.
//!
//! ```text
//! run()
//!   ├─► subscriber_listener(): Bus ─► SubscriberSet::emit (LogWriter, user subscribers)
//!   ├─► initial roster load            (failure → RuntimeError::Startup)
//!   ├─► spawn ScanScheduler::run       ──┐
//!   ├─► spawn RosterRefresher::run     ──┤ all observe runtime_token
//!   ├─► spawn ProcessWatchdog::run     ──┘
//!   │
//!   ├─► wait for the first of:
//!   │     OS signal          → ShutdownRequested(signal)
//!   │     shutdown() called  → ShutdownRequested("requested")
//!   │     watchdog trip      → WatchdogTripped (error result)
//!   │
//!   └─► runtime_token.cancel()
//!         join scheduler + refresher     (bounded by grace, then aborted)
//!         registry.drain(grace):
//!           ├─ Ok          → AllStoppedWithin
//!           └─ Err(stuck)  → GraceExceeded
//!         flush subscribers
//! ```
//!
//! ## Rules
//! - `run()` is one-shot: once the runtime token is cancelled it stays cancelled.
//! - Per-creator supervisors are children of the runtime token; cancelling it
//!   stops every one of them.
//! - A watchdog trip takes precedence over a drain timeout in the returned error.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::client::{AlertSink, GiftStore, LiveClient, RosterStore};
use crate::config::Config;
use crate::core::actor::ActorEnv;
use crate::core::builder::GiftMonitorBuilder;
use crate::core::registry::CreatorRegistry;
use crate::core::roster::{Roster, RosterRefresher};
use crate::core::scheduler::ScanScheduler;
use crate::core::shutdown;
use crate::core::state::CreatorSnapshot;
use crate::core::watchdog::ProcessWatchdog;
use crate::error::RuntimeError;
use crate::events::{Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Live gift monitoring runtime.
pub struct GiftMonitor {
    pub(crate) env: Arc<ActorEnv>,
    pub(crate) registry: Arc<CreatorRegistry>,
    pub(crate) roster: Arc<Roster>,
    pub(crate) roster_store: Arc<dyn RosterStore>,
    pub(crate) subscribers: Vec<Arc<dyn Subscribe>>,
}

impl GiftMonitor {
    /// Starts building a monitor from its collaborators.
    pub fn builder(
        cfg: Config,
        client: Arc<dyn LiveClient>,
        roster_store: Arc<dyn RosterStore>,
        gift_store: Arc<dyn GiftStore>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> GiftMonitorBuilder {
        GiftMonitorBuilder::new(cfg, client, roster_store, gift_store, alert_sink)
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.env.cfg
    }

    /// Receiver for every runtime event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.env.bus.subscribe()
    }

    /// Runs until an OS signal, [`shutdown`](Self::shutdown), or a watchdog trip.
    ///
    /// Returns `Err(WatchdogTripped)` on a trip so the host can exit non-zero
    /// and let its process supervisor restart it.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let token = self.env.shutdown.clone();
        let listener_stop = CancellationToken::new();
        let listener = self.subscriber_listener(listener_stop.clone());

        let refresher = RosterRefresher::new(
            Arc::clone(&self.roster_store),
            Arc::clone(&self.roster),
            self.env.cfg.roster_refresh,
            self.env.cfg.roster_timeout,
            self.env.bus.clone(),
        );
        if let Err(source) = refresher.refresh().await {
            token.cancel();
            Self::stop_listener(listener_stop, listener).await;
            return Err(RuntimeError::Startup { source });
        }

        let mut loops = JoinSet::new();
        loops.spawn(
            ScanScheduler::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.roster),
                Arc::clone(&self.env),
            )
            .run(token.clone()),
        );
        loops.spawn(refresher.run(token.clone()));

        let watchdog = ProcessWatchdog::new(
            Arc::clone(&self.env.activity),
            self.env.cfg.stall_limit(),
            self.env.cfg.max_runtime_limit(),
            self.env.cfg.watchdog_interval,
            self.env.bus.clone(),
        );
        let mut watchdog = tokio::spawn(watchdog.run(token.clone()));

        let outcome = tokio::select! {
            signal = shutdown::wait_for_shutdown_signal() => match signal {
                Ok(name) => {
                    self.publish_shutdown(name);
                    Ok(())
                }
                Err(e) => Err(RuntimeError::Signal(e)),
            },
            _ = token.cancelled() => {
                self.publish_shutdown("requested");
                Ok(())
            }
            trip = &mut watchdog => match trip {
                Ok(Some(reason)) => Err(RuntimeError::WatchdogTripped { reason }),
                _ => Ok(()),
            },
        };

        token.cancel();
        watchdog.abort();
        let grace = self.env.cfg.grace;
        let joined = time::timeout(grace, async {
            while loops.join_next().await.is_some() {}
        })
        .await;
        if joined.is_err() {
            tracing::warn!(?grace, "scan loops did not stop in time; aborting");
            loops.shutdown().await;
        }

        let drained = self.registry.drain(grace).await;
        match &drained {
            Ok(()) => self.env.bus.publish(Event::new(EventKind::AllStoppedWithin)),
            Err(stuck) => self.env.bus.publish(
                Event::new(EventKind::GraceExceeded)
                    .with_reason(stuck.join(","))
                    .with_delay(grace),
            ),
        }

        Self::stop_listener(listener_stop, listener).await;

        match (outcome, drained) {
            (Err(e), _) => Err(e),
            (Ok(()), Err(stuck)) => Err(RuntimeError::GraceExceeded { grace, stuck }),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Requests a graceful shutdown of a running [`run`](Self::run).
    pub fn shutdown(&self) {
        self.env.shutdown.cancel();
    }

    /// Asks the supervisor of `creator` to stop.
    ///
    /// Returns false if no supervisor is running for it. The creator is
    /// picked up again by a later scan pass if still on the roster and live.
    pub async fn request_stop(&self, creator: &str) -> bool {
        let stopped = self.registry.request_stop(creator).await;
        if stopped {
            self.env
                .bus
                .publish(Event::new(EventKind::StopRequested).with_creator(creator));
        }
        stopped
    }

    /// Snapshot of every creator seen so far, sorted by id.
    pub async fn snapshot(&self) -> Vec<CreatorSnapshot> {
        self.registry.snapshot().await
    }

    /// Ids of creators with a running supervisor, sorted.
    pub async fn supervised(&self) -> Vec<String> {
        self.registry.supervised().await
    }

    /// Current roster.
    pub async fn roster(&self) -> Arc<[String]> {
        self.roster.snapshot().await
    }

    fn publish_shutdown(&self, reason: &'static str) {
        self.env
            .bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
    }

    /// Forwards bus events to the subscriber set until `stop`, then flushes it.
    fn subscriber_listener(&self, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.env.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.env.bus.clone());

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        })
    }

    async fn stop_listener(stop: CancellationToken, listener: JoinHandle<()>) {
        stop.cancel();
        let _ = listener.await;
    }
}

impl std::fmt::Debug for GiftMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiftMonitor")
            .field("cfg", &self.env.cfg)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
