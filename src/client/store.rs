//! # Storage-side collaborators.
//!
//! - [`RosterStore`] the list of creators to monitor
//! - [`GiftStore`] persistence of gift records
//! - [`AlertSink`] delivery of high-value gift alerts
//! - [`ImageResolver`] gift artwork lookup
//!
//! Implementations own their connection pools and must acquire/release per
//! call on every path, including errors. The runtime treats gift persistence
//! and alert delivery as fire-and-forget: failures are logged, never retried.

use async_trait::async_trait;

use crate::error::{DeliveryError, RosterError, StorageError};
use crate::gift::{AlertPayload, GiftRecord};

/// Source of the creator roster.
#[async_trait]
pub trait RosterStore: Send + Sync + 'static {
    /// Returns the creators to monitor, in store order.
    async fn list_entities(&self) -> Result<Vec<String>, RosterError>;
}

/// Persistence sink for gift records.
#[async_trait]
pub trait GiftStore: Send + Sync + 'static {
    /// Persists one gift record.
    async fn insert_gift(&self, record: &GiftRecord) -> Result<(), StorageError>;
}

/// Delivery sink for high-value gift alerts.
#[async_trait]
pub trait AlertSink: Send + Sync + 'static {
    /// Delivers one alert.
    async fn send_alert(&self, payload: &AlertPayload) -> Result<(), DeliveryError>;
}

/// Best-effort gift artwork lookup, keyed by normalised gift name.
#[async_trait]
pub trait ImageResolver: Send + Sync + 'static {
    /// Returns an image URL for the gift, if one is known.
    async fn resolve_image(&self, normalized_gift_name: &str) -> Option<String>;
}

/// Resolver that never finds an image.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

#[async_trait]
impl ImageResolver for NoImages {
    async fn resolve_image(&self, _normalized_gift_name: &str) -> Option<String> {
        None
    }
}
