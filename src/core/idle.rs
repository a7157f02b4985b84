//! # Idle watch: deadline timer for a streaming session.
//!
//! Cooperates with the connection state machine through the creator's
//! `last_event` timestamp only. The actor owns session closure; the watch
//! just completes when the session has been silent for `threshold`.
//!
//! ```text
//! loop {
//!   deadline = last_event + threshold
//!   now >= deadline ? ─► return (fires once)
//!   sleep_until(deadline)        // a gift in the meantime moves last_event forward
//! }
//! ```

use tokio::time::{self, Duration, Instant};

use crate::core::state::CreatorState;

/// Completes once the creator has been silent for `threshold`.
pub(crate) async fn expired(state: &CreatorState, threshold: Duration) {
    loop {
        let deadline = state.last_event() + threshold;
        if Instant::now() >= deadline {
            return;
        }
        time::sleep_until(deadline).await;
    }
}
