//! # ScanScheduler: walks the roster and launches supervisors.
//!
//! ```text
//! loop {
//!   roster = snapshot()
//!   for id in roster (sleep scan_entity_delay between entries) {
//!     state = registry.get_or_insert(id)
//!     supervised?        → skip (no probe)
//!     probe.is_active()? → launch supervisor, touch activity
//!   }
//!   publish ScanPassCompleted
//!   sleep(scan_pass_interval)
//! }
//! ```
//!
//! ## Rules
//! - A supervised creator is never probed by the scheduler; its supervisor owns it.
//! - Probe failures read as offline and are retried on the next pass.
//! - Cancellation is observed between entries and during every sleep.

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::actor::ActorEnv;
use crate::core::registry::CreatorRegistry;
use crate::core::roster::Roster;
use crate::events::{Event, EventKind};

pub(crate) struct ScanScheduler {
    registry: Arc<CreatorRegistry>,
    roster: Arc<Roster>,
    env: Arc<ActorEnv>,
}

impl ScanScheduler {
    pub fn new(registry: Arc<CreatorRegistry>, roster: Arc<Roster>, env: Arc<ActorEnv>) -> Self {
        Self {
            registry,
            roster,
            env,
        }
    }

    /// Runs scan passes until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) {
        loop {
            let Some(launched) = self.pass(&token).await else {
                return;
            };
            self.env
                .bus
                .publish(Event::new(EventKind::ScanPassCompleted).with_count(launched));

            select! {
                biased;
                _ = token.cancelled() => return,
                _ = time::sleep(self.env.cfg.scan_pass_interval) => {}
            }
        }
    }

    /// One pass over the current roster. Returns `None` if cancelled midway.
    pub async fn pass(&self, token: &CancellationToken) -> Option<u64> {
        let roster = self.roster.snapshot().await;
        let mut launched = 0u64;

        for (i, id) in roster.iter().enumerate() {
            if i > 0 {
                select! {
                    biased;
                    _ = token.cancelled() => return None,
                    _ = time::sleep(self.env.cfg.scan_entity_delay) => {}
                }
            }
            let started = select! {
                biased;
                _ = token.cancelled() => return None,
                started = self.scan_one(id) => started,
            };
            if started {
                launched += 1;
            }
        }
        Some(launched)
    }

    async fn scan_one(&self, id: &str) -> bool {
        let state = self.registry.get_or_insert(id).await;
        if state.is_supervised() {
            return false;
        }
        if !self.env.probe.is_active(id).await {
            return false;
        }
        if !self.registry.launch(&state, &self.env) {
            return false;
        }
        self.env.activity.touch();
        self.env
            .bus
            .publish(Event::new(EventKind::SupervisorStarted).with_creator(state.id_arc()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::state::SupervisorState;
    use crate::testing::Harness;
    use std::time::Duration;

    async fn setup(h: &Harness, ids: &[&str]) -> (ScanScheduler, Arc<CreatorRegistry>) {
        let roster = Arc::new(Roster::new());
        roster.replace(ids.iter().map(|s| s.to_string()).collect()).await;
        let registry = CreatorRegistry::new();
        let scheduler = ScanScheduler::new(registry.clone(), roster, h.env.clone());
        (scheduler, registry)
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn offline_creators_get_no_supervisor() {
        let h = Harness::new(Config::default());
        h.client.set_live("on", true);
        h.client.fail_probe("broken");
        let (scheduler, registry) = setup(&h, &["off", "on", "broken"]).await;

        let launched = scheduler.pass(&CancellationToken::new()).await;

        assert_eq!(launched, Some(1));
        assert_eq!(registry.supervised().await, vec!["on".to_string()]);
        assert_eq!(h.client.opens("off"), 0);
        assert_eq!(h.client.opens("broken"), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn supervised_creators_are_not_probed_again() {
        let h = Harness::new(Config::default());
        h.client.set_live("a", true);
        let (scheduler, registry) = setup(&h, &["a"]).await;
        let token = CancellationToken::new();

        assert_eq!(scheduler.pass(&token).await, Some(1));
        time::sleep(Duration::from_secs(1)).await;
        let probes = h.client.probes("a");

        for _ in 0..5 {
            assert_eq!(scheduler.pass(&token).await, Some(0));
        }
        assert_eq!(h.client.probes("a"), probes);
        assert_eq!(h.client.opens("a"), 1);
        assert_eq!(h.client.sessions_per_creator_max(), 1);
        assert_eq!(registry.supervised().await.len(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn entries_are_spaced_by_the_entity_delay() {
        let h = Harness::new(Config::default());
        let (scheduler, _registry) = setup(&h, &["a", "b", "c", "d"]).await;

        let start = time::Instant::now();
        assert_eq!(scheduler.pass(&CancellationToken::new()).await, Some(0));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(900) && waited < Duration::from_millis(910));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stuck_probes_do_not_stall_the_pass() {
        let h = Harness::new(Config::default());
        h.client.hang_probe("slow");
        h.client.set_live("fast", true);
        let (scheduler, registry) = setup(&h, &["slow", "fast"]).await;

        let start = time::Instant::now();
        assert_eq!(scheduler.pass(&CancellationToken::new()).await, Some(1));
        assert!(start.elapsed() < Duration::from_secs(6));
        assert_eq!(registry.supervised().await, vec!["fast".to_string()]);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn creator_going_live_is_picked_up_on_a_later_pass() {
        let h = Harness::new(Config::default());
        let (scheduler, registry) = setup(&h, &["a"]).await;
        let token = CancellationToken::new();
        let task = tokio::spawn(scheduler.run(token.clone()));

        time::sleep(Duration::from_secs(25)).await;
        assert!(registry.supervised().await.is_empty());

        h.client.set_live("a", true);
        time::sleep(Duration::from_secs(11)).await;
        assert_eq!(registry.supervised().await, vec!["a".to_string()]);
        let state = registry.get("a").await;
        assert_eq!(state.map(|s| s.state()), Some(SupervisorState::Streaming));

        token.cancel();
        assert!(task.await.is_ok());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancellation_stops_a_pass_between_entries() {
        let h = Harness::new(Config::default());
        let (scheduler, _registry) = setup(&h, &["a", "b", "c"]).await;
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(scheduler.pass(&token).await, None);
        assert_eq!(h.client.probes("a"), 0);
    }
}
