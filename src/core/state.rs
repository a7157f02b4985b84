//! # Per-creator state and the supervision slot.
//!
//! One [`CreatorState`] exists per creator ever seen by the scheduler. It is
//! created lazily and never removed; only its transient fields change.
//!
//! ## Supervision slot
//! ```text
//! scheduler: lock(slot) ─► running? ─yes─► refuse
//!                             └─no──► spawn actor, store {generation, stop, join} ─► unlock
//! actor exit: lock(slot) ─► generation matches? ─► take()
//! ```
//! The check and the claim happen under one lock with no `.await` in between,
//! so two claims can never both see an empty slot.
//!
//! ## Rules
//! - Only the owning actor writes `state`, timestamps and `reconnect_attempts`.
//! - The scheduler and watchdog only read them.
//! - `stopping` is the slot's cancellation token: fresh per claim, so a
//!   stopped creator can be supervised again later.

use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::actor::ActorExit;

/// Connection state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Not connected; probing for liveness.
    Idle,
    /// Opening a session.
    Connecting,
    /// Consuming the gift stream.
    Streaming,
    /// Waiting before the next probe.
    Backoff,
    /// Supervisor exited on a stop request.
    Stopped,
}

impl SupervisorState {
    fn as_u8(self) -> u8 {
        match self {
            SupervisorState::Idle => 0,
            SupervisorState::Connecting => 1,
            SupervisorState::Streaming => 2,
            SupervisorState::Backoff => 3,
            SupervisorState::Stopped => 4,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => SupervisorState::Connecting,
            2 => SupervisorState::Streaming,
            3 => SupervisorState::Backoff,
            4 => SupervisorState::Stopped,
            _ => SupervisorState::Idle,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Connecting => "connecting",
            SupervisorState::Streaming => "streaming",
            SupervisorState::Backoff => "backoff",
            SupervisorState::Stopped => "stopped",
        }
    }
}

/// Ownership record of the running supervisor.
pub(crate) struct SupervisionSlot {
    pub generation: u64,
    pub stop: CancellationToken,
    pub join: JoinHandle<ActorExit>,
}

impl SupervisionSlot {
    fn is_running(&self) -> bool {
        !self.join.is_finished()
    }
}

/// Point-in-time view of one creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorSnapshot {
    /// Creator id.
    pub id: String,
    /// Last state the supervisor reported.
    pub state: SupervisorState,
    /// Whether a supervisor currently owns the slot.
    pub supervised: bool,
    /// Whether a stop was requested for the current supervisor.
    pub stopping: bool,
    /// Reconnect attempts in the current live cycle.
    pub reconnect_attempts: u32,
    /// Time since the last gift (or session open).
    pub last_event_age: Duration,
    /// Time since the last session open, if any.
    pub last_connect_age: Option<Duration>,
}

/// Long-lived state of one monitored creator.
pub struct CreatorState {
    id: Arc<str>,
    state: AtomicU8,
    reconnect_attempts: AtomicU32,
    last_event: Mutex<Instant>,
    last_connect: Mutex<Option<Instant>>,
    slot: Mutex<Option<SupervisionSlot>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

impl CreatorState {
    /// Creates an idle, unsupervised creator.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            state: AtomicU8::new(SupervisorState::Idle.as_u8()),
            reconnect_attempts: AtomicU32::new(0),
            last_event: Mutex::new(Instant::now()),
            last_connect: Mutex::new(None),
            slot: Mutex::new(None),
        }
    }

    /// Creator id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn id_arc(&self) -> Arc<str> {
        Arc::clone(&self.id)
    }

    /// Last state reported by the supervisor.
    pub fn state(&self) -> SupervisorState {
        SupervisorState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, s: SupervisorState) {
        self.state.store(s.as_u8(), Ordering::Release);
    }

    /// Reconnect attempts in the current live cycle.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Acquire)
    }

    /// Increments and returns the attempt counter.
    pub(crate) fn bump_attempts(&self) -> u32 {
        self.reconnect_attempts
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1)
    }

    pub(crate) fn reset_attempts(&self) {
        self.reconnect_attempts.store(0, Ordering::Release);
    }

    /// Instant of the last gift, or of the last session open if later.
    pub fn last_event(&self) -> Instant {
        *lock(&self.last_event)
    }

    pub(crate) fn touch_event(&self) {
        *lock(&self.last_event) = Instant::now();
    }

    /// Instant the most recent session was opened.
    pub fn last_connect(&self) -> Option<Instant> {
        *lock(&self.last_connect)
    }

    /// Records a session open: sets the connect time and resets the idle clock.
    pub(crate) fn mark_connected(&self) {
        let now = Instant::now();
        *lock(&self.last_connect) = Some(now);
        *lock(&self.last_event) = now;
    }

    /// Whether a supervisor currently owns this creator.
    pub fn is_supervised(&self) -> bool {
        lock(&self.slot).as_ref().is_some_and(SupervisionSlot::is_running)
    }

    /// Whether the running supervisor has been asked to stop.
    pub fn is_stopping(&self) -> bool {
        lock(&self.slot)
            .as_ref()
            .is_some_and(|s| s.is_running() && s.stop.is_cancelled())
    }

    /// Asks the running supervisor to stop. Returns false if none is running.
    pub fn request_stop(&self) -> bool {
        match lock(&self.slot).as_ref() {
            Some(slot) if slot.is_running() => {
                slot.stop.cancel();
                true
            }
            _ => false,
        }
    }

    /// Claims the slot and launches a supervisor via `spawn`, atomically.
    ///
    /// Returns false, without calling `spawn`, if a supervisor is running.
    pub(crate) fn claim<F>(&self, generation: u64, stop: CancellationToken, spawn: F) -> bool
    where
        F: FnOnce(CancellationToken) -> JoinHandle<ActorExit>,
    {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(SupervisionSlot::is_running) {
            return false;
        }
        let join = spawn(stop.clone());
        *slot = Some(SupervisionSlot {
            generation,
            stop,
            join,
        });
        true
    }

    /// Releases the slot if it still belongs to `generation`.
    pub(crate) fn release(&self, generation: u64) {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|s| s.generation == generation) {
            slot.take();
        }
    }

    /// Removes the slot regardless of owner (shutdown drain).
    pub(crate) fn take_slot(&self) -> Option<SupervisionSlot> {
        lock(&self.slot).take()
    }

    /// Point-in-time view.
    pub fn snapshot(&self) -> CreatorSnapshot {
        let now = Instant::now();
        let (supervised, stopping) = match lock(&self.slot).as_ref() {
            Some(s) if s.is_running() => (true, s.stop.is_cancelled()),
            _ => (false, false),
        };
        CreatorSnapshot {
            id: self.id.to_string(),
            state: self.state(),
            supervised,
            stopping,
            reconnect_attempts: self.reconnect_attempts(),
            last_event_age: now.saturating_duration_since(self.last_event()),
            last_connect_age: self
                .last_connect()
                .map(|at| now.saturating_duration_since(at)),
        }
    }
}

impl std::fmt::Debug for CreatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatorState")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parked(token: CancellationToken) -> JoinHandle<ActorExit> {
        tokio::spawn(async move {
            token.cancelled().await;
            ActorExit::Stopped
        })
    }

    #[tokio::test(flavor = "current_thread")]
    async fn second_claim_is_refused_while_running() {
        let state = CreatorState::new("a");
        assert!(state.claim(1, CancellationToken::new(), parked));
        assert!(!state.claim(2, CancellationToken::new(), |_| unreachable!()));
        assert!(state.is_supervised());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn finished_slot_can_be_reclaimed() {
        let state = CreatorState::new("a");
        assert!(state.claim(1, CancellationToken::new(), parked));
        assert!(state.request_stop());
        assert!(state.is_stopping());

        // let the parked task observe cancellation
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!state.is_supervised());
        assert!(state.claim(2, CancellationToken::new(), parked));
        assert!(!state.is_stopping());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn release_ignores_stale_generation() {
        let state = CreatorState::new("a");
        assert!(state.claim(5, CancellationToken::new(), parked));
        state.release(4);
        assert!(state.is_supervised());
        state.release(5);
        assert!(!state.is_supervised());
    }

    #[test]
    fn attempts_count_up_and_reset() {
        let state = CreatorState::new("a");
        assert_eq!(state.bump_attempts(), 1);
        assert_eq!(state.bump_attempts(), 2);
        state.reset_attempts();
        assert_eq!(state.reconnect_attempts(), 0);
    }
}
