//! # Event subscribers for the giftwatch runtime.
//!
//! ```text
//!   CreatorActor ── publish(Event) ──► Bus ──► GiftMonitor listener ──► SubscriberSet
//!                                                                          │
//!                                                               ┌──────────┼──────────┐
//!                                                               ▼          ▼          ▼
//!                                                           LogWriter   Metrics    Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use giftwatch::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct AlertCounter;
//!
//! #[async_trait]
//! impl Subscribe for AlertCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::AlertSent {
//!             // increment a counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alert_counter" }
//! }
//! ```

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
