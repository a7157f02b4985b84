//! # Demo: simulated
//!
//! Runs the monitor against an in-process platform where creators flip
//! between offline and live and sessions emit random gifts.
//!
//! Shows how to:
//! - implement [`LiveClient`] / [`Session`] and the storage traits;
//! - build a [`GiftMonitor`] with a custom subscriber next to the default `LogWriter`;
//! - shut it down programmatically.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example simulated
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use giftwatch::{
    AlertPayload, AlertSink, Config, ConnectError, DeliveryError, Event, EventKind, GiftEvent,
    GiftMonitor, GiftRecord, GiftStore, ImageResolver, LiveClient, ProbeError, RosterError,
    RosterStore, Session, StorageError, StreamError, Subscribe,
};
use rand::Rng;
use tracing_subscriber::EnvFilter;

const GIFTS: &[(&str, i64)] = &[("Rose", 1), ("Finger Heart", 5), ("Lion", 29_999), ("Galaxy", 1_000)];

struct Platform;

#[async_trait]
impl LiveClient for Platform {
    async fn probe_is_active(&self, _creator: &str, _timeout: Duration) -> Result<bool, ProbeError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let roll: f64 = rand::rng().random();
        if roll < 0.05 {
            return Err(ProbeError::Transport {
                error: "rate limited".into(),
            });
        }
        Ok(roll < 0.6)
    }

    async fn open_session(
        &self,
        creator: &str,
        _connect_timeout: Duration,
    ) -> Result<Box<dyn Session>, ConnectError> {
        if rand::rng().random_bool(0.2) {
            return Err(ConnectError::Refused {
                error: format!("{creator}: room closed"),
            });
        }
        Ok(Box::new(FakeSession { remaining: rand::rng().random_range(3..12) }))
    }
}

struct FakeSession {
    remaining: u32,
}

#[async_trait]
impl Session for FakeSession {
    async fn next_event(&mut self) -> Result<Option<GiftEvent>, StreamError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let (wait, idx, repeat) = {
            let mut rng = rand::rng();
            (
                rng.random_range(200..1500),
                rng.random_range(0..GIFTS.len()),
                rng.random_range(1..5),
            )
        };
        tokio::time::sleep(Duration::from_millis(wait)).await;

        let (name, value) = GIFTS[idx];
        let raw = format!(
            r#"{{"user":{{"unique_id":"viewer_{idx}","nickname":"Viewer {idx}"}},"gift":{{"name":"{name}","diamond_count":{value}}},"repeat_count":{repeat}}}"#
        );
        GiftEvent::from_json(&raw).map(Some)
    }

    async fn close(&mut self) {
        self.remaining = 0;
    }
}

#[derive(Default)]
struct Stores {
    stored: AtomicU64,
}

#[async_trait]
impl RosterStore for Stores {
    async fn list_entities(&self) -> Result<Vec<String>, RosterError> {
        Ok(["ana", "bo", "cy", "dee", " ana ", ""]
            .iter()
            .map(|s| s.to_string())
            .collect())
    }
}

#[async_trait]
impl GiftStore for Stores {
    async fn insert_gift(&self, record: &GiftRecord) -> Result<(), StorageError> {
        self.stored.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(creator = %record.creator, total = record.total_value, "stored");
        Ok(())
    }
}

#[async_trait]
impl AlertSink for Stores {
    async fn send_alert(&self, payload: &AlertPayload) -> Result<(), DeliveryError> {
        println!(
            "ALERT {} sent {} to {} ({} diamonds)",
            payload.sender_name, payload.gift_name, payload.creator, payload.total_value
        );
        Ok(())
    }
}

struct Artwork;

#[async_trait]
impl ImageResolver for Artwork {
    async fn resolve_image(&self, key: &str) -> Option<String> {
        (key == "lion").then(|| "https://img.example/lion.png".to_string())
    }
}

/// Counts alerts as they are published.
#[derive(Default)]
struct AlertCounter {
    sent: AtomicU64,
}

#[async_trait]
impl Subscribe for AlertCounter {
    async fn on_event(&self, ev: &Event) {
        if ev.kind == EventKind::AlertSent {
            self.sent.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn name(&self) -> &'static str {
        "alert_counter"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut cfg = Config::default();
    cfg.idle_reconnect = Duration::from_secs(5);
    cfg.idle_recheck = Duration::from_secs(2);
    cfg.scan_pass_interval = Duration::from_secs(3);
    cfg.alert_threshold = 20_000;
    cfg.stall_timeout = Duration::from_secs(60);

    let stores = Arc::new(Stores::default());
    let counter = Arc::new(AlertCounter::default());
    let monitor = GiftMonitor::builder(
        cfg,
        Arc::new(Platform),
        stores.clone(),
        stores.clone(),
        stores.clone(),
    )
    .with_image_resolver(Arc::new(Artwork))
    .with_subscribers(vec![counter.clone() as Arc<dyn Subscribe>])
    .build();

    let stopper = monitor.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        for snap in stopper.snapshot().await {
            println!(
                "{:>4} {:<10} attempts={} last_gift={:?} ago",
                snap.id,
                snap.state.as_label(),
                snap.reconnect_attempts,
                snap.last_event_age
            );
        }
        stopper.shutdown();
    });

    monitor.run().await?;
    println!(
        "stored {} gifts, sent {} alerts",
        stores.stored.load(Ordering::Relaxed),
        counter.sent.load(Ordering::Relaxed)
    );
    Ok(())
}
