//! Runtime core: discovery, supervision and process health.
//!
//! The public entry point is [`GiftMonitor`]; the rest is exposed for
//! inspection (snapshots, states) and for composing a custom runtime.
//!
//! Internal modules:
//! - [`probe`]: bounded, time-limited liveness checks;
//! - [`scheduler`]: roster scan passes that launch supervisors;
//! - [`actor`]: the per-creator connection state machine;
//! - [`idle`]: silence detection for a streaming session;
//! - [`registry`]: per-creator state and supervision slots;
//! - [`roster`]: roster snapshot and periodic refresh;
//! - [`watchdog`]: stall / max-age process check;
//! - [`shutdown`]: OS signal handling.

pub(crate) mod activity;
pub(crate) mod actor;
pub(crate) mod builder;
pub(crate) mod idle;
pub(crate) mod monitor;
pub(crate) mod probe;
pub(crate) mod registry;
pub(crate) mod roster;
pub(crate) mod scheduler;
pub(crate) mod shutdown;
pub(crate) mod state;
pub(crate) mod watchdog;

pub use activity::ActivityTracker;
pub use actor::ActorExit;
pub use builder::GiftMonitorBuilder;
pub use monitor::GiftMonitor;
pub use probe::LiveProbe;
pub use roster::{Roster, normalize_roster};
pub use state::{CreatorSnapshot, CreatorState, SupervisorState};
pub use watchdog::TripReason;
