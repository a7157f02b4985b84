//! # Live platform client.
//!
//! The runtime needs three capabilities from the platform:
//! - [`LiveClient::probe_is_active`] best-effort liveness check,
//! - [`LiveClient::open_session`] open a gift-event stream,
//! - [`Session::close`] release it (idempotent).
//!
//! Wire decoding is entirely the implementor's business; sessions yield
//! already-decoded [`GiftEvent`]s.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use giftwatch::{ConnectError, GiftEvent, LiveClient, ProbeError, Session, StreamError};
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl LiveClient for Offline {
//!     async fn probe_is_active(&self, _creator: &str, _timeout: Duration) -> Result<bool, ProbeError> {
//!         Ok(false)
//!     }
//!
//!     async fn open_session(
//!         &self,
//!         creator: &str,
//!         _connect_timeout: Duration,
//!     ) -> Result<Box<dyn Session>, ConnectError> {
//!         Err(ConnectError::Refused { error: format!("{creator} is offline") })
//!     }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ConnectError, ProbeError, StreamError};
use crate::gift::GiftEvent;

/// Connection factory for one live platform.
#[async_trait]
pub trait LiveClient: Send + Sync + 'static {
    /// Returns whether `creator` is currently live.
    ///
    /// Any resource opened to answer must be released before returning, on
    /// every path. The runtime additionally enforces `timeout` and drops the
    /// future when it elapses, so implementations must release on drop too.
    async fn probe_is_active(&self, creator: &str, timeout: Duration) -> Result<bool, ProbeError>;

    /// Opens a live event session for `creator`.
    async fn open_session(
        &self,
        creator: &str,
        connect_timeout: Duration,
    ) -> Result<Box<dyn Session>, ConnectError>;
}

/// An open gift-event stream for one creator.
#[async_trait]
pub trait Session: Send {
    /// Waits for the next gift.
    ///
    /// - `Ok(Some(event))` a gift arrived
    /// - `Ok(None)` the remote closed the session
    /// - `Err(_)` the session broke
    ///
    /// May be dropped mid-wait when the session is being torn down.
    async fn next_event(&mut self) -> Result<Option<GiftEvent>, StreamError>;

    /// Closes the session. Calling it more than once is a no-op.
    async fn close(&mut self);
}
