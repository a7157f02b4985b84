//! # giftwatch
//!
//! **giftwatch** is a discovery and supervision engine for live gift-event
//! streams. It watches a roster of creators, notices when they go live,
//! keeps one self-healing session per live creator, and hands every gift to
//! a persistence sink and (above a threshold) an alert sink.
//!
//! The platform client, the roster store and both sinks are traits; the
//! crate itself never touches a network.
//!
//! ## Architecture
//! ```text
//!   RosterStore ──► RosterRefresher ──► Roster (Arc snapshot)
//!                                           │
//!                                           ▼
//!                                     ScanScheduler ──► LiveProbe (semaphore + timeout)
//!                                           │ live & unsupervised
//!                                           ▼
//!       ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐
//!       │  CreatorActor   │   │  CreatorActor   │   │  CreatorActor   │
//!       │ IDLE/CONNECTING │   │    STREAMING    │   │     BACKOFF     │
//!       └────────┬────────┘   └────────┬────────┘   └────────┬────────┘
//!                │ gifts               │                     │
//!                ▼                     ▼                     │
//!          GiftEventSink ──► GiftStore + AlertSink           │
//!                │                                           │
//!                ▼                                           ▼
//!   ┌─────────────────────────────────────────────────────────────────┐
//!   │                    Bus (broadcast channel)                      │
//!   └───────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       GiftMonitor listener ──► SubscriberSet ──► LogWriter, ...
//!
//!   ActivityTracker ◄── gifts, launches
//!          └──► ProcessWatchdog ── stall / max age ──► GiftMonitor::run() returns Err
//! ```
//!
//! ## Guarantees
//! - At most one supervisor per creator at any time.
//! - Offline creators never get a session; failed probes read as offline.
//! - A silent session is closed once per idle period and retried after backoff.
//! - Reconnect delays never decrease within one live cycle and are capped.
//! - A stagnant or too-old process fails its run so it can be restarted.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use giftwatch::{
//!     AlertPayload, AlertSink, Config, ConnectError, DeliveryError, GiftMonitor, GiftRecord,
//!     GiftStore, LiveClient, ProbeError, RosterError, RosterStore, Session, StorageError,
//! };
//!
//! struct Platform;
//!
//! #[async_trait]
//! impl LiveClient for Platform {
//!     async fn probe_is_active(&self, _creator: &str, _timeout: Duration) -> Result<bool, ProbeError> {
//!         Ok(false)
//!     }
//!     async fn open_session(&self, creator: &str, _t: Duration) -> Result<Box<dyn Session>, ConnectError> {
//!         Err(ConnectError::Refused { error: format!("{creator} is offline") })
//!     }
//! }
//!
//! struct Stores;
//!
//! #[async_trait]
//! impl RosterStore for Stores {
//!     async fn list_entities(&self) -> Result<Vec<String>, RosterError> {
//!         Ok(vec!["some_creator".into()])
//!     }
//! }
//!
//! #[async_trait]
//! impl GiftStore for Stores {
//!     async fn insert_gift(&self, _record: &GiftRecord) -> Result<(), StorageError> {
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl AlertSink for Stores {
//!     async fn send_alert(&self, _payload: &AlertPayload) -> Result<(), DeliveryError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stores = Arc::new(Stores);
//!     let monitor = GiftMonitor::builder(
//!         Config::default(),
//!         Arc::new(Platform),
//!         stores.clone(),
//!         stores.clone(),
//!         stores,
//!     )
//!     .build();
//!
//!     monitor.run().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod core;
mod error;
mod events;
mod gift;
mod policies;
mod subscribers;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use client::{AlertSink, GiftStore, ImageResolver, LiveClient, NoImages, RosterStore, Session};
pub use config::Config;
pub use crate::core::{
    ActivityTracker, ActorExit, CreatorSnapshot, CreatorState, GiftMonitor, GiftMonitorBuilder,
    LiveProbe, Roster, SupervisorState, TripReason, normalize_roster,
};
pub use error::{
    ConnectError, DeliveryError, ProbeError, RosterError, RuntimeError, StorageError, StreamError,
};
pub use events::{Bus, Event, EventKind};
pub use gift::{
    AlertOutcome, AlertPayload, CachedImageResolver, DIAMOND_VALUE, DispatchReport, Extractor,
    GiftDetails, GiftEvent, GiftEventSink, GiftInfo, GiftRecord, GiftSender, SENDER_ID,
    SENDER_NAME, first_match, normalize_gift_name,
};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
