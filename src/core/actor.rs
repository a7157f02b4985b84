//! # CreatorActor: per-creator connection supervisor.
//!
//! Drives one creator through the connection state machine until its slot's
//! stop token is cancelled.
//!
//! ## State machine
//! ```text
//!                    launched by scheduler (probe said live)
//!                                   │
//!        ┌──────── offline, wait ───┤
//!        ▼                          ▼
//!     ┌──────┐   probe live   ┌────────────┐  open ok   ┌───────────┐
//!     │ IDLE │ ─────────────► │ CONNECTING │ ─────────► │ STREAMING │
//!     └──────┘                └────────────┘            └───────────┘
//!        ▲                          │ open failed /           │ remote close / error /
//!        │                          │ timed out               │ idle threshold hit
//!        │      sleep(delay)        ▼                         │
//!        └─────────────────── ┌─────────┐ ◄───────────────────┘
//!                             │ BACKOFF │   attempts += 1
//!                             └─────────┘
//!
//!   any state ── stop token cancelled ──► STOPPED (close session, release slot)
//! ```
//!
//! ## Rules
//! - Every suspension point is a `biased` select with the stop token first.
//! - Backoff always returns to IDLE: the creator is re-probed before every reconnect.
//! - `reconnect_attempts` counts failures since the last successful open. It
//!   also resets when a probe finds the creator live after having found it
//!   offline (and at launch, which follows an offline period).
//! - Gift dispatch is raced against the stop token; the sinks bound their own calls.
//! - Connect/stream errors are published and end in BACKOFF; nothing propagates.
//! - The session is closed exactly once on every path out of STREAMING.

use std::sync::Arc;

use tokio::select;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::client::{LiveClient, Session};
use crate::config::Config;
use crate::core::activity::ActivityTracker;
use crate::core::idle;
use crate::core::probe::LiveProbe;
use crate::core::state::{CreatorState, SupervisorState};
use crate::error::ConnectError;
use crate::events::{Bus, Event, EventKind};
use crate::gift::GiftEventSink;

/// Collaborators shared by every supervisor and the scheduler.
pub(crate) struct ActorEnv {
    pub cfg: Config,
    pub client: Arc<dyn LiveClient>,
    pub probe: LiveProbe,
    pub sink: GiftEventSink,
    pub bus: Bus,
    pub activity: Arc<ActivityTracker>,
    /// Runtime-wide cancellation; parent of every slot's stop token.
    pub shutdown: CancellationToken,
}

/// Why a supervisor exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    /// Stop requested for this creator only.
    Stopped,
    /// The whole runtime is shutting down.
    Shutdown,
}

impl ActorExit {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            ActorExit::Stopped => "stop_requested",
            ActorExit::Shutdown => "runtime_shutdown",
        }
    }
}

enum Step {
    Idle,
    Connecting,
    Streaming(Box<dyn Session>),
    Backoff,
    Stopped,
}

impl Step {
    fn state(&self) -> SupervisorState {
        match self {
            Step::Idle => SupervisorState::Idle,
            Step::Connecting => SupervisorState::Connecting,
            Step::Streaming(_) => SupervisorState::Streaming,
            Step::Backoff => SupervisorState::Backoff,
            Step::Stopped => SupervisorState::Stopped,
        }
    }
}

/// Supervises the live session of a single creator.
pub(crate) struct CreatorActor {
    state: Arc<CreatorState>,
    env: Arc<ActorEnv>,
    generation: u64,
    /// Last probe found the creator offline.
    cold: bool,
}

impl CreatorActor {
    pub fn new(state: Arc<CreatorState>, env: Arc<ActorEnv>, generation: u64) -> Self {
        Self {
            state,
            env,
            generation,
            cold: false,
        }
    }

    /// Runs the state machine until `stop` is cancelled, then releases the slot.
    pub async fn run(mut self, stop: CancellationToken) -> ActorExit {
        self.state.reset_attempts();
        let mut step = Step::Connecting;

        loop {
            self.state.set_state(step.state());
            step = match step {
                Step::Idle => self.idle(&stop).await,
                Step::Connecting => self.connect(&stop).await,
                Step::Streaming(session) => self.stream(session, &stop).await,
                Step::Backoff => self.backoff(&stop).await,
                Step::Stopped => break,
            };
        }

        let exit = if self.env.shutdown.is_cancelled() {
            ActorExit::Shutdown
        } else {
            ActorExit::Stopped
        };
        self.state.release(self.generation);
        self.publish(EventKind::SupervisorStopped, |e| e.with_reason(exit.as_label()));
        exit
    }

    async fn idle(&mut self, stop: &CancellationToken) -> Step {
        let live = select! {
            biased;
            _ = stop.cancelled() => return Step::Stopped,
            live = self.env.probe.is_active(self.state.id()) => live,
        };

        if live {
            if self.cold {
                self.cold = false;
                self.state.reset_attempts();
                self.env.activity.touch();
            }
            return Step::Connecting;
        }

        self.cold = true;
        let recheck = self.env.cfg.idle_recheck;
        self.publish(EventKind::CreatorOffline, |e| e.with_delay(recheck));
        select! {
            biased;
            _ = stop.cancelled() => Step::Stopped,
            _ = time::sleep(recheck) => Step::Idle,
        }
    }

    async fn connect(&mut self, stop: &CancellationToken) -> Step {
        let timeout = self.env.cfg.connect_timeout;
        let open = time::timeout(
            timeout,
            self.env.client.open_session(self.state.id(), timeout),
        );

        let res = select! {
            biased;
            _ = stop.cancelled() => return Step::Stopped,
            res = open => res,
        };

        let err = match res {
            Ok(Ok(session)) => {
                self.state.mark_connected();
                let attempts = self.state.reconnect_attempts();
                self.state.reset_attempts();
                self.publish(EventKind::SessionOpened, |e| e.with_attempt(attempts));
                return Step::Streaming(session);
            }
            Ok(Err(e)) => e,
            Err(_elapsed) => ConnectError::Timeout { timeout },
        };
        self.publish(EventKind::ConnectFailed, |e| e.with_reason(err.to_string()));
        Step::Backoff
    }

    async fn stream(&mut self, mut session: Box<dyn Session>, stop: &CancellationToken) -> Step {
        let threshold = self.env.cfg.idle_reconnect;
        let state = Arc::clone(&self.state);
        let idle = idle::expired(&state, threshold);
        tokio::pin!(idle);

        let next = loop {
            let res = select! {
                biased;
                _ = stop.cancelled() => break Step::Stopped,
                _ = &mut idle => {
                    self.publish(EventKind::IdleTimeout, |e| e.with_delay(threshold));
                    break Step::Backoff;
                }
                res = session.next_event() => res,
            };

            match res {
                Ok(Some(gift)) => {
                    self.state.touch_event();
                    self.env.activity.touch();
                    select! {
                        biased;
                        _ = stop.cancelled() => break Step::Stopped,
                        _ = self.env.sink.dispatch(self.state.id(), &gift) => {}
                    }
                }
                Ok(None) => {
                    self.publish(EventKind::StreamEnded, |e| e.with_reason("closed by remote"));
                    break Step::Backoff;
                }
                Err(err) => {
                    self.publish(EventKind::StreamEnded, |e| e.with_reason(err.to_string()));
                    break Step::Backoff;
                }
            }
        };

        session.close().await;
        next
    }

    async fn backoff(&mut self, stop: &CancellationToken) -> Step {
        let attempt = self.state.bump_attempts();
        let delay = self.env.cfg.backoff.next(attempt.saturating_sub(1));
        self.publish(EventKind::BackoffScheduled, |e| {
            e.with_attempt(attempt).with_delay(delay)
        });

        select! {
            biased;
            _ = stop.cancelled() => Step::Stopped,
            _ = time::sleep(delay) => Step::Idle,
        }
    }

    fn publish(&self, kind: EventKind, decorate: impl FnOnce(Event) -> Event) {
        let ev = Event::new(kind).with_creator(self.state.id_arc());
        self.env.bus.publish(decorate(ev));
    }
}
