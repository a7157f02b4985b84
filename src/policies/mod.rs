//! Reconnect policies.
//!
//! ## Contents
//! - [`BackoffPolicy`] how reconnect delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to spread reconnect waves
//!
//! ## Quick wiring
//! ```text
//! Config { backoff: BackoffPolicy, .. }
//!      └─► core::actor::CreatorActor on entering BACKOFF:
//!           - reconnect_attempts += 1
//!           - sleep(backoff.next(reconnect_attempts - 1))
//! ```

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
