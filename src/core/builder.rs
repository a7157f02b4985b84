//! # GiftMonitorBuilder: wires collaborators into a [`GiftMonitor`].
//!
//! ```text
//! Config ─┬─► Bus (bus_capacity)
//!         ├─► LiveProbe (probe_concurrency, probe_timeout)
//!         ├─► GiftEventSink (threshold, sink/image timeouts)
//!         └─► ActorEnv ─► GiftMonitor { registry, roster, subscribers }
//! ```
//!
//! An image resolver passed to the builder is wrapped in a
//! [`CachedImageResolver`]; without one, alerts carry no artwork.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::{AlertSink, GiftStore, ImageResolver, LiveClient, NoImages, RosterStore};
use crate::config::Config;
use crate::core::activity::ActivityTracker;
use crate::core::actor::ActorEnv;
use crate::core::monitor::GiftMonitor;
use crate::core::probe::LiveProbe;
use crate::core::registry::CreatorRegistry;
use crate::core::roster::Roster;
use crate::events::Bus;
use crate::gift::{CachedImageResolver, GiftEventSink};
use crate::subscribers::{LogWriter, Subscribe};

/// Builder for a [`GiftMonitor`].
///
/// The platform client, roster store and both sinks are required; image
/// lookup and extra subscribers are optional. A [`LogWriter`] is installed
/// unless [`without_log_writer`](Self::without_log_writer) is called.
pub struct GiftMonitorBuilder {
    cfg: Config,
    client: Arc<dyn LiveClient>,
    roster_store: Arc<dyn RosterStore>,
    gift_store: Arc<dyn GiftStore>,
    alert_sink: Arc<dyn AlertSink>,
    images: Arc<dyn ImageResolver>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    log_writer: bool,
}

impl GiftMonitorBuilder {
    /// Creates a builder with the required collaborators.
    pub fn new(
        cfg: Config,
        client: Arc<dyn LiveClient>,
        roster_store: Arc<dyn RosterStore>,
        gift_store: Arc<dyn GiftStore>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            cfg,
            client,
            roster_store,
            gift_store,
            alert_sink,
            images: Arc::new(NoImages),
            subscribers: Vec::new(),
            log_writer: true,
        }
    }

    /// Sets the gift artwork resolver. Successful lookups are cached.
    pub fn with_image_resolver(mut self, resolver: Arc<dyn ImageResolver>) -> Self {
        self.images = Arc::new(CachedImageResolver::new(resolver));
        self
    }

    /// Adds event subscribers.
    ///
    /// Each one gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Skips the default [`LogWriter`] subscriber.
    pub fn without_log_writer(mut self) -> Self {
        self.log_writer = false;
        self
    }

    /// Wires everything together. Nothing runs until [`GiftMonitor::run`].
    pub fn build(self) -> Arc<GiftMonitor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let probe = LiveProbe::new(
            Arc::clone(&self.client),
            self.cfg.probe_permits(),
            self.cfg.probe_timeout,
        );
        let sink = GiftEventSink::new(
            self.gift_store,
            self.alert_sink,
            self.images,
            self.cfg.alert_threshold,
            self.cfg.sink_timeout,
            self.cfg.image_timeout,
            bus.clone(),
        );

        let mut subscribers = self.subscribers;
        if self.log_writer {
            subscribers.insert(0, Arc::new(LogWriter::new()));
        }

        let env = Arc::new(ActorEnv {
            cfg: self.cfg,
            client: self.client,
            probe,
            sink,
            bus,
            activity: Arc::new(ActivityTracker::new()),
            shutdown: CancellationToken::new(),
        });

        Arc::new(GiftMonitor {
            env,
            registry: CreatorRegistry::new(),
            roster: Arc::new(Roster::new()),
            roster_store: self.roster_store,
            subscribers,
        })
    }
}
