//! # Roster: the list of creators to scan, and its periodic refresher.
//!
//! ```text
//! RosterRefresher::run()
//!   loop {
//!     sleep(roster_refresh) | cancelled → exit
//!     store.list_entities() within roster_timeout | cancelled → exit
//!       ├─ Ok(ids)         → normalize → replace snapshot → RosterLoaded
//!       └─ Err(e)/timeout  → keep previous snapshot     → RosterRefreshFailed
//!   }
//! ```
//!
//! ## Rules
//! - Readers take an `Arc` snapshot; a refresh never mutates a list mid-pass.
//! - A failed read keeps the last good roster. An empty successful read replaces it.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::client::RosterStore;
use crate::error::RosterError;
use crate::events::{Bus, Event, EventKind};

/// Trims ids, drops empty ones and duplicates (first occurrence wins).
pub fn normalize_roster(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter()
        .filter_map(|id| {
            let trimmed = id.trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_string()) {
                return None;
            }
            Some(trimmed.to_string())
        })
        .collect()
}

/// Current roster, swapped atomically on refresh.
#[derive(Debug, Default)]
pub struct Roster {
    ids: RwLock<Arc<[String]>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current list; stays valid while a refresh swaps in a new one.
    pub async fn snapshot(&self) -> Arc<[String]> {
        Arc::clone(&*self.ids.read().await)
    }

    /// Replaces the list with the normalized `ids`; returns the new size.
    pub async fn replace(&self, ids: Vec<String>) -> usize {
        let ids: Arc<[String]> = normalize_roster(ids).into();
        let len = ids.len();
        *self.ids.write().await = ids;
        len
    }

    pub async fn len(&self) -> usize {
        self.ids.read().await.len()
    }
}

/// Periodically reloads the roster from its store.
pub(crate) struct RosterRefresher {
    store: Arc<dyn RosterStore>,
    roster: Arc<Roster>,
    interval: Duration,
    timeout: Duration,
    bus: Bus,
}

impl RosterRefresher {
    pub fn new(
        store: Arc<dyn RosterStore>,
        roster: Arc<Roster>,
        interval: Duration,
        timeout: Duration,
        bus: Bus,
    ) -> Self {
        Self {
            store,
            roster,
            interval,
            timeout,
            bus,
        }
    }

    /// Refreshes every `interval` until cancelled.
    pub async fn run(self, token: CancellationToken) {
        loop {
            select! {
                biased;
                _ = token.cancelled() => return,
                _ = time::sleep(self.interval) => {}
            }
            select! {
                biased;
                _ = token.cancelled() => return,
                _ = self.refresh() => {}
            }
        }
    }

    /// Reads the store once; on failure or timeout the previous roster stays in place.
    pub async fn refresh(&self) -> Result<usize, RosterError> {
        let read = time::timeout(self.timeout, self.store.list_entities())
            .await
            .unwrap_or(Err(RosterError::Timeout {
                timeout: self.timeout,
            }));
        match read {
            Ok(ids) => {
                let len = self.roster.replace(ids).await;
                self.bus
                    .publish(Event::new(EventKind::RosterLoaded).with_count(len as u64));
                Ok(len)
            }
            Err(e) => {
                let kept = self.roster.len().await;
                self.bus.publish(
                    Event::new(EventKind::RosterRefreshFailed)
                        .with_reason(e.to_string())
                        .with_count(kept as u64),
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticRoster;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalization_trims_and_dedups() {
        let out = normalize_roster(ids(&[" alice", "bob", "", "alice ", "  ", "carol", "bob"]));
        assert_eq!(out, ids(&["alice", "bob", "carol"]));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn failed_refresh_keeps_previous_roster() {
        let store = Arc::new(StaticRoster::new(&["a", "b"]));
        let roster = Arc::new(Roster::new());
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let refresher = RosterRefresher::new(
            store.clone(),
            roster.clone(),
            Duration::from_secs(600),
            Duration::from_secs(30),
            bus,
        );

        assert_eq!(refresher.refresh().await.ok(), Some(2));
        store.set_failing(true);
        assert!(refresher.refresh().await.is_err());
        assert_eq!(&*roster.snapshot().await, &ids(&["a", "b"])[..]);

        assert_eq!(rx.recv().await.ok().map(|e| e.kind), Some(EventKind::RosterLoaded));
        let failed = rx.recv().await.ok();
        assert_eq!(failed.as_ref().map(|e| e.kind), Some(EventKind::RosterRefreshFailed));
        assert_eq!(failed.and_then(|e| e.count), Some(2));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn snapshots_survive_a_swap() {
        let roster = Roster::new();
        roster.replace(ids(&["a", "b"])).await;
        let before = roster.snapshot().await;
        roster.replace(ids(&["c"])).await;
        assert_eq!(before.len(), 2);
        assert_eq!(&*roster.snapshot().await, &ids(&["c"])[..]);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn refreshes_on_interval_until_cancelled() {
        let store = Arc::new(StaticRoster::new(&["a"]));
        let roster = Arc::new(Roster::new());
        let refresher = RosterRefresher::new(
            store.clone(),
            roster.clone(),
            Duration::from_secs(600),
            Duration::from_secs(30),
            Bus::new(16),
        );
        let token = CancellationToken::new();
        let task = tokio::spawn(refresher.run(token.clone()));

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.reads(), 0);

        store.set(&["a", "b", "c"]);
        time::sleep(Duration::from_secs(1200)).await;
        assert_eq!(store.reads(), 2);
        assert_eq!(roster.len().await, 3);

        token.cancel();
        assert!(task.await.is_ok());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn hung_store_times_out_and_keeps_roster() {
        let store = Arc::new(StaticRoster::new(&["a"]));
        let roster = Arc::new(Roster::new());
        let refresher = RosterRefresher::new(
            store.clone(),
            roster.clone(),
            Duration::from_secs(600),
            Duration::from_secs(30),
            Bus::new(16),
        );
        assert_eq!(refresher.refresh().await.ok(), Some(1));

        store.set_hanging(true);
        let err = refresher.refresh().await.err();
        assert!(matches!(err, Some(RosterError::Timeout { .. })));
        assert_eq!(roster.len().await, 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_interrupts_a_hung_read() {
        let store = Arc::new(StaticRoster::new(&["a"]));
        store.set_hanging(true);
        let refresher = RosterRefresher::new(
            store.clone(),
            Arc::new(Roster::new()),
            Duration::from_secs(60),
            Duration::from_secs(3600),
            Bus::new(16),
        );
        let token = CancellationToken::new();
        let task = tokio::spawn(refresher.run(token.clone()));

        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(store.reads(), 1);
        token.cancel();
        time::sleep(Duration::from_millis(1)).await;
        assert!(task.is_finished());
    }
}
