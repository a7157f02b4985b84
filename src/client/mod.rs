//! Collaborator interfaces the runtime depends on.
//!
//! Nothing in this module talks to a network; implementors plug in the
//! platform client, the roster store and the two sinks.

mod live;
mod store;

pub use live::{LiveClient, Session};
pub use store::{AlertSink, GiftStore, ImageResolver, NoImages, RosterStore};
