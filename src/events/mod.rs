//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ScanScheduler`, `RosterRefresher`, `CreatorActor`,
//!   `GiftEventSink`, `ProcessWatchdog`, `GiftMonitor`, `SubscriberSet` workers.
//! - **Consumers**: `GiftMonitor`'s listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
