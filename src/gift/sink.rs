//! # GiftEventSink: gift event → persistence + threshold alert.
//!
//! ```text
//! GiftEvent ──► GiftRecord::from_event
//!                   │
//!                   ├─► GiftStore::insert_gift      (always; failure/timeout → StorageFailed)
//!                   │
//!                   └─► total >= threshold ?
//!                          ├─ no  → AlertOutcome::BelowThreshold
//!                          └─ yes → ImageResolver (best-effort, timeout → no image)
//!                                   └─► AlertSink::send_alert (failure/timeout → AlertFailed)
//! ```
//!
//! ## Rules
//! - Persistence is attempted before the threshold is evaluated.
//! - The two dispatches are independent: neither outcome affects the other.
//! - Every collaborator call is bounded by a timeout, so a dispatch always finishes.
//! - Nothing is raised; outcomes come back in a [`DispatchReport`] and are
//!   published on the bus for logging.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::client::{AlertSink, GiftStore, ImageResolver};
use crate::error::{DeliveryError, StorageError};
use crate::events::{Bus, Event, EventKind};
use crate::gift::event::GiftEvent;
use crate::gift::record::{AlertPayload, GiftRecord, normalize_gift_name};

/// Result of the alert half of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// The total did not reach the threshold; nothing was sent.
    BelowThreshold,
    /// The alert was delivered.
    Sent(AlertPayload),
    /// Delivery was attempted and failed.
    Failed(DeliveryError),
}

/// Everything one dispatch did.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// The flattened record.
    pub record: GiftRecord,
    /// Persistence outcome.
    pub stored: Result<(), StorageError>,
    /// Alert outcome.
    pub alert: AlertOutcome,
}

/// Shapes gift events into records and alerts and hands them to the sinks.
#[derive(Clone)]
pub struct GiftEventSink {
    store: Arc<dyn GiftStore>,
    alerts: Arc<dyn AlertSink>,
    images: Arc<dyn ImageResolver>,
    threshold: u64,
    sink_timeout: Duration,
    image_timeout: Duration,
    bus: Bus,
}

impl GiftEventSink {
    /// Creates a sink that alerts on totals `>= threshold`.
    ///
    /// Writes and deliveries are limited to `sink_timeout`, artwork lookups
    /// to `image_timeout`.
    pub fn new(
        store: Arc<dyn GiftStore>,
        alerts: Arc<dyn AlertSink>,
        images: Arc<dyn ImageResolver>,
        threshold: u64,
        sink_timeout: Duration,
        image_timeout: Duration,
        bus: Bus,
    ) -> Self {
        Self {
            store,
            alerts,
            images,
            threshold,
            sink_timeout,
            image_timeout,
            bus,
        }
    }

    /// Persists `event` and, if it is valuable enough, alerts on it.
    pub async fn dispatch(&self, creator: &str, event: &GiftEvent) -> DispatchReport {
        let record = GiftRecord::from_event(creator, event);

        let stored = time::timeout(self.sink_timeout, self.store.insert_gift(&record))
            .await
            .unwrap_or_else(|_| {
                Err(StorageError::new(format!(
                    "insert timed out after {:?}",
                    self.sink_timeout
                )))
            });
        match &stored {
            Ok(()) => self.publish(EventKind::GiftStored, &record, None),
            Err(e) => self.publish(EventKind::StorageFailed, &record, Some(e.to_string())),
        }

        let alert = self.alert(&record).await;
        DispatchReport {
            record,
            stored,
            alert,
        }
    }

    async fn alert(&self, record: &GiftRecord) -> AlertOutcome {
        if record.total_value < self.threshold {
            return AlertOutcome::BelowThreshold;
        }

        let key = normalize_gift_name(&record.gift_name);
        let image = if key.is_empty() {
            None
        } else {
            time::timeout(self.image_timeout, self.images.resolve_image(&key))
                .await
                .unwrap_or(None)
        };

        let payload = AlertPayload::from_record(record, image);
        let sent = time::timeout(self.sink_timeout, self.alerts.send_alert(&payload))
            .await
            .unwrap_or_else(|_| {
                Err(DeliveryError::new(format!(
                    "delivery timed out after {:?}",
                    self.sink_timeout
                )))
            });
        match sent {
            Ok(()) => {
                self.publish(EventKind::AlertSent, record, None);
                AlertOutcome::Sent(payload)
            }
            Err(e) => {
                self.publish(EventKind::AlertFailed, record, Some(e.to_string()));
                AlertOutcome::Failed(e)
            }
        }
    }

    fn publish(&self, kind: EventKind, record: &GiftRecord, reason: Option<String>) {
        let mut ev = Event::new(kind)
            .with_creator(record.creator.as_str())
            .with_count(record.total_value);
        if let Some(reason) = reason {
            ev = ev.with_reason(reason);
        }
        self.bus.publish(ev);
    }
}
