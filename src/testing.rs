//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::client::{AlertSink, GiftStore, ImageResolver, LiveClient, NoImages, RosterStore, Session};
use crate::config::Config;
use crate::core::activity::ActivityTracker;
use crate::core::actor::{ActorEnv, CreatorActor};
use crate::core::probe::LiveProbe;
use crate::core::state::CreatorState;
use crate::error::{ConnectError, DeliveryError, ProbeError, RosterError, StorageError, StreamError};
use crate::events::{Bus, Event};
use crate::gift::{AlertPayload, GiftDetails, GiftEvent, GiftEventSink, GiftRecord, GiftSender};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// A gift worth `per_item * repeat` diamonds.
pub(crate) fn gift(per_item: i64, repeat: i64) -> GiftEvent {
    GiftEvent {
        user: Some(GiftSender {
            id: Some("42".into()),
            unique_id: Some("fan".into()),
            nickname: Some("Fan".into()),
        }),
        gift: Some(GiftDetails {
            name: Some("Lion".into()),
            diamond_count: Some(per_item),
            ..GiftDetails::default()
        }),
        repeat_count: Some(repeat),
    }
}

type Feed = mpsc::UnboundedSender<Result<GiftEvent, StreamError>>;

#[derive(Default)]
struct Script {
    live: HashMap<String, bool>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    refused: HashSet<String>,
    hang_connect: HashSet<String>,
    feeds: HashMap<String, Feed>,
    probes: HashMap<String, usize>,
    opens: HashMap<String, usize>,
    closes: HashMap<String, usize>,
    open_now: HashMap<String, usize>,
    open_max: usize,
}

#[derive(Default)]
struct Shared {
    script: Mutex<Script>,
    in_flight: AtomicUsize,
    in_flight_max: AtomicUsize,
}

struct InFlight<'a>(&'a Shared);

impl<'a> InFlight<'a> {
    fn enter(shared: &'a Shared) -> Self {
        let now = shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        shared.in_flight_max.fetch_max(now, Ordering::SeqCst);
        Self(shared)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Live client whose answers are scripted per creator.
///
/// Sessions stay silent until the test pushes into them.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    shared: Arc<Shared>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        lock(&self.shared.script)
    }

    pub fn set_live(&self, id: &str, live: bool) {
        self.script().live.insert(id.to_string(), live);
    }

    pub fn fail_probe(&self, id: &str) {
        self.script().failing.insert(id.to_string());
    }

    pub fn hang_probe(&self, id: &str) {
        self.script().hanging.insert(id.to_string());
    }

    pub fn refuse_connect(&self, id: &str) {
        self.script().refused.insert(id.to_string());
    }

    pub fn hang_connect(&self, id: &str) {
        self.script().hang_connect.insert(id.to_string());
    }

    /// Delivers one item to the creator's current session.
    pub fn push(&self, id: &str, item: Result<GiftEvent, StreamError>) -> bool {
        self.script()
            .feeds
            .get(id)
            .is_some_and(|tx| tx.send(item).is_ok())
    }

    /// Makes the creator's current session report a remote close.
    pub fn end_session(&self, id: &str) {
        self.script().feeds.remove(id);
    }

    pub fn probes(&self, id: &str) -> usize {
        self.script().probes.get(id).copied().unwrap_or(0)
    }

    pub fn opens(&self, id: &str) -> usize {
        self.script().opens.get(id).copied().unwrap_or(0)
    }

    pub fn closes(&self, id: &str) -> usize {
        self.script().closes.get(id).copied().unwrap_or(0)
    }

    /// Most sessions ever open at once for a single creator.
    pub fn sessions_per_creator_max(&self) -> usize {
        self.script().open_max
    }

    pub fn probes_in_flight_max(&self) -> usize {
        self.shared.in_flight_max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveClient for ScriptedClient {
    async fn probe_is_active(&self, creator: &str, _timeout: Duration) -> Result<bool, ProbeError> {
        let _guard = InFlight::enter(&self.shared);
        let (hang, fail, live) = {
            let mut s = self.script();
            *s.probes.entry(creator.to_string()).or_default() += 1;
            (
                s.hanging.contains(creator),
                s.failing.contains(creator),
                s.live.get(creator).copied().unwrap_or(false),
            )
        };
        if hang {
            future::pending::<()>().await;
        }
        if fail {
            return Err(ProbeError::Transport {
                error: "scripted failure".into(),
            });
        }
        Ok(live)
    }

    async fn open_session(
        &self,
        creator: &str,
        _connect_timeout: Duration,
    ) -> Result<Box<dyn Session>, ConnectError> {
        let (hang, refused) = {
            let s = self.script();
            (s.hang_connect.contains(creator), s.refused.contains(creator))
        };
        if hang {
            future::pending::<()>().await;
        }
        if refused {
            return Err(ConnectError::Refused {
                error: "scripted refusal".into(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut s = self.script();
            s.feeds.insert(creator.to_string(), tx);
            *s.opens.entry(creator.to_string()).or_default() += 1;
            let now = s.open_now.entry(creator.to_string()).or_default();
            *now += 1;
            let now = *now;
            s.open_max = s.open_max.max(now);
        }
        Ok(Box::new(MockSession {
            creator: creator.to_string(),
            rx,
            shared: Arc::clone(&self.shared),
            closed: false,
        }))
    }
}

struct MockSession {
    creator: String,
    rx: mpsc::UnboundedReceiver<Result<GiftEvent, StreamError>>,
    shared: Arc<Shared>,
    closed: bool,
}

#[async_trait]
impl Session for MockSession {
    async fn next_event(&mut self) -> Result<Option<GiftEvent>, StreamError> {
        match self.rx.recv().await {
            Some(Ok(ev)) => Ok(Some(ev)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut s = lock(&self.shared.script);
        *s.closes.entry(self.creator.clone()).or_default() += 1;
        if let Some(now) = s.open_now.get_mut(&self.creator) {
            *now = now.saturating_sub(1);
        }
    }
}

/// Gift store that keeps records in memory.
#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<Vec<GiftRecord>>,
    fail: bool,
    hang: Mutex<bool>,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// While set, writes never complete.
    pub fn set_hanging(&self, hang: bool) {
        *lock(&self.hang) = hang;
    }

    pub fn records(&self) -> Vec<GiftRecord> {
        lock(&self.records).clone()
    }
}

#[async_trait]
impl GiftStore for MemoryStore {
    async fn insert_gift(&self, record: &GiftRecord) -> Result<(), StorageError> {
        if *lock(&self.hang) {
            return future::pending().await;
        }
        if self.fail {
            return Err(StorageError::new("disk full"));
        }
        lock(&self.records).push(record.clone());
        Ok(())
    }
}

/// Alert sink that keeps payloads in memory.
#[derive(Default)]
pub(crate) struct MemoryAlerts {
    sent: Mutex<Vec<AlertPayload>>,
    fail: bool,
    hang: bool,
}

impl MemoryAlerts {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<AlertPayload> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl AlertSink for MemoryAlerts {
    async fn send_alert(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
        if self.hang {
            return future::pending().await;
        }
        if self.fail {
            return Err(DeliveryError::new("webhook 503"));
        }
        lock(&self.sent).push(payload.clone());
        Ok(())
    }
}

/// Resolver with a fixed table.
pub(crate) struct StaticImages {
    table: HashMap<String, String>,
}

impl StaticImages {
    pub fn with(key: &str, url: &str) -> Self {
        Self {
            table: HashMap::from([(key.to_string(), url.to_string())]),
        }
    }
}

#[async_trait]
impl ImageResolver for StaticImages {
    async fn resolve_image(&self, normalized_gift_name: &str) -> Option<String> {
        self.table.get(normalized_gift_name).cloned()
    }
}

/// Resolver that never answers.
pub(crate) struct SlowImages;

#[async_trait]
impl ImageResolver for SlowImages {
    async fn resolve_image(&self, _normalized_gift_name: &str) -> Option<String> {
        future::pending().await
    }
}

/// Roster store returning a settable list, or failing.
#[derive(Default)]
pub(crate) struct StaticRoster {
    ids: Mutex<Vec<String>>,
    fail: Mutex<bool>,
    hang: Mutex<bool>,
    reads: AtomicUsize,
}

impl StaticRoster {
    pub fn new(ids: &[&str]) -> Self {
        let roster = Self::default();
        roster.set(ids);
        roster
    }

    pub fn set(&self, ids: &[&str]) {
        *lock(&self.ids) = ids.iter().map(|s| s.to_string()).collect();
    }

    pub fn set_failing(&self, fail: bool) {
        *lock(&self.fail) = fail;
    }

    /// While set, reads never complete.
    pub fn set_hanging(&self, hang: bool) {
        *lock(&self.hang) = hang;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RosterStore for StaticRoster {
    async fn list_entities(&self) -> Result<Vec<String>, RosterError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if *lock(&self.hang) {
            return future::pending().await;
        }
        if *lock(&self.fail) {
            return Err(RosterError::Unavailable {
                error: "connection refused".into(),
            });
        }
        Ok(lock(&self.ids).clone())
    }
}

/// Wires scripted collaborators into an [`ActorEnv`] and records bus traffic.
pub(crate) struct Harness {
    pub client: Arc<ScriptedClient>,
    pub store: Arc<MemoryStore>,
    pub alerts: Arc<MemoryAlerts>,
    pub activity: Arc<ActivityTracker>,
    pub env: Arc<ActorEnv>,
    events: Mutex<broadcast::Receiver<Event>>,
}

impl Harness {
    pub fn new(cfg: Config) -> Self {
        let client = Arc::new(ScriptedClient::new());
        let store = Arc::new(MemoryStore::default());
        let alerts = Arc::new(MemoryAlerts::default());
        let activity = Arc::new(ActivityTracker::new());
        let bus = Bus::new(4096);
        let events = Mutex::new(bus.subscribe());

        let probe = LiveProbe::new(client.clone(), cfg.probe_permits(), cfg.probe_timeout);
        let sink = GiftEventSink::new(
            store.clone(),
            alerts.clone(),
            Arc::new(NoImages),
            cfg.alert_threshold,
            cfg.sink_timeout,
            cfg.image_timeout,
            bus.clone(),
        );
        let env = Arc::new(ActorEnv {
            cfg,
            client: client.clone(),
            probe,
            sink,
            bus,
            activity: activity.clone(),
            shutdown: CancellationToken::new(),
        });

        Self {
            client,
            store,
            alerts,
            activity,
            env,
            events,
        }
    }

    /// Starts a supervisor for `id` directly, bypassing the scheduler.
    pub fn launch(&self, id: &str) -> Arc<CreatorState> {
        let state = Arc::new(CreatorState::new(id));
        let actor = CreatorActor::new(state.clone(), self.env.clone(), 1);
        let stop = self.env.shutdown.child_token();
        assert!(state.claim(1, stop, move |stop| tokio::spawn(actor.run(stop))));
        state
    }

    /// Everything published since the last call.
    pub fn drain_events(&self) -> Vec<Event> {
        let mut rx = lock(&self.events);
        let mut out = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(ev) => out.push(ev),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        out
    }
}
