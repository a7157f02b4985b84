//! # Creator registry: long-lived per-creator state and supervisor launches.
//!
//! ```text
//! scheduler ─► get_or_insert(id) ─► Arc<CreatorState> (created once, never removed)
//!          └─► launch(state)     ─► state.claim(generation, child token, spawn actor)
//!
//! monitor   ─► request_stop(id)  ─► cancel slot token (actor exits, releases slot)
//!          └─► drain(grace)      ─► cancel + join every slot, report the stuck ones
//! ```
//!
//! ## Rules
//! - The map lock is never held while a supervisor runs or is joined.
//! - Every launch gets a fresh generation; a finished actor can only release
//!   the slot it was launched into.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time;

use crate::core::actor::{ActorEnv, CreatorActor};
use crate::core::state::{CreatorSnapshot, CreatorState};

/// Registry of every creator the scheduler has seen.
pub(crate) struct CreatorRegistry {
    creators: RwLock<HashMap<String, Arc<CreatorState>>>,
    next_generation: AtomicU64,
}

impl CreatorRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            creators: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        })
    }

    /// Returns the state for `id`, creating it on first sight.
    pub async fn get_or_insert(&self, id: &str) -> Arc<CreatorState> {
        if let Some(state) = self.creators.read().await.get(id) {
            return Arc::clone(state);
        }
        let mut creators = self.creators.write().await;
        Arc::clone(
            creators
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(CreatorState::new(id))),
        )
    }

    pub async fn get(&self, id: &str) -> Option<Arc<CreatorState>> {
        self.creators.read().await.get(id).cloned()
    }

    /// Launches a supervisor for `state` unless one already owns it.
    pub fn launch(&self, state: &Arc<CreatorState>, env: &Arc<ActorEnv>) -> bool {
        if env.shutdown.is_cancelled() {
            return false;
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let stop = env.shutdown.child_token();
        state.claim(generation, stop, |stop| {
            let actor = CreatorActor::new(Arc::clone(state), Arc::clone(env), generation);
            tokio::spawn(actor.run(stop))
        })
    }

    /// Asks the supervisor of `id` to stop. Returns false if none is running.
    pub async fn request_stop(&self, id: &str) -> bool {
        match self.get(id).await {
            Some(state) => state.request_stop(),
            None => false,
        }
    }

    /// Snapshots of every known creator, sorted by id.
    pub async fn snapshot(&self) -> Vec<CreatorSnapshot> {
        let mut out: Vec<CreatorSnapshot> = self
            .creators
            .read()
            .await
            .values()
            .map(|s| s.snapshot())
            .collect();
        out.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Ids of creators with a running supervisor, sorted.
    pub async fn supervised(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .creators
            .read()
            .await
            .values()
            .filter(|s| s.is_supervised())
            .map(|s| s.id().to_string())
            .collect();
        out.sort_unstable();
        out
    }

    /// Cancels every supervisor and waits up to `grace` for them to finish.
    ///
    /// Returns the ids still running when the grace period ran out.
    pub async fn drain(&self, grace: Duration) -> Result<(), Vec<String>> {
        let states: Vec<Arc<CreatorState>> =
            self.creators.read().await.values().cloned().collect();

        let mut joins = Vec::new();
        for state in states {
            let Some(slot) = state.take_slot() else {
                continue;
            };
            slot.stop.cancel();
            joins.push((state.id().to_string(), slot.join));
        }

        let all = futures::future::join_all(joins.iter_mut().map(|(_, join)| join));
        if time::timeout(grace, all).await.is_ok() {
            return Ok(());
        }

        let mut stuck: Vec<String> = joins
            .into_iter()
            .filter(|(_, join)| !join.is_finished())
            .map(|(id, join)| {
                join.abort();
                id
            })
            .collect();
        stuck.sort_unstable();
        Err(stuck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::state::SupervisorState;
    use crate::testing::Harness;

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn state_is_created_once() {
        let registry = CreatorRegistry::new();
        let a = registry.get_or_insert("a").await;
        let again = registry.get_or_insert("a").await;
        assert!(Arc::ptr_eq(&a, &again));
        assert!(registry.get("b").await.is_none());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn second_launch_is_refused_while_supervised() {
        let h = Harness::new(Config::default());
        h.client.set_live("a", true);
        let registry = CreatorRegistry::new();
        let state = registry.get_or_insert("a").await;

        assert!(registry.launch(&state, &h.env));
        assert!(!registry.launch(&state, &h.env));
        time::sleep(Duration::from_secs(1)).await;
        assert!(!registry.launch(&state, &h.env));

        assert_eq!(h.client.opens("a"), 1);
        assert_eq!(registry.supervised().await, vec!["a".to_string()]);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stopped_creator_can_be_launched_again() {
        let h = Harness::new(Config::default());
        h.client.set_live("a", true);
        let registry = CreatorRegistry::new();
        let state = registry.get_or_insert("a").await;

        assert!(registry.launch(&state, &h.env));
        time::sleep(Duration::from_secs(1)).await;
        assert!(registry.request_stop("a").await);
        time::sleep(Duration::from_millis(10)).await;
        assert!(registry.supervised().await.is_empty());
        assert_eq!(state.state(), SupervisorState::Stopped);

        assert!(registry.launch(&state, &h.env));
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(state.state(), SupervisorState::Streaming);
        assert_eq!(h.client.opens("a"), 2);
        assert_eq!(h.client.sessions_per_creator_max(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn drain_stops_every_supervisor() {
        let h = Harness::new(Config::default());
        let registry = CreatorRegistry::new();
        for id in ["a", "b", "c"] {
            h.client.set_live(id, true);
            let state = registry.get_or_insert(id).await;
            assert!(registry.launch(&state, &h.env));
        }
        time::sleep(Duration::from_secs(1)).await;

        assert_eq!(registry.drain(Duration::from_secs(10)).await, Ok(()));
        assert!(registry.supervised().await.is_empty());
        for id in ["a", "b", "c"] {
            assert_eq!(h.client.closes(id), 1);
        }
        assert!(!registry.request_stop("a").await);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn launch_is_refused_after_shutdown() {
        let h = Harness::new(Config::default());
        let registry = CreatorRegistry::new();
        let state = registry.get_or_insert("a").await;
        h.env.shutdown.cancel();
        assert!(!registry.launch(&state, &h.env));
    }
}
