//! Flat gift records and alert payloads.

use serde::Serialize;

use crate::gift::event::GiftEvent;

/// One gift, flattened for persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GiftRecord {
    /// Creator whose live room received the gift.
    pub creator: String,
    /// Sender id (may be empty when upstream omits it).
    pub sender_id: String,
    /// Sender display name.
    pub sender_name: String,
    /// Gift name.
    pub gift_name: String,
    /// Per-item diamond value.
    pub diamond_value: u64,
    /// Combo repeat count (>= 1).
    pub repeat_count: u64,
    /// `diamond_value × repeat_count`.
    pub total_value: u64,
}

impl GiftRecord {
    /// Flattens `event` for `creator`.
    ///
    /// The total saturates at `u64::MAX` instead of wrapping.
    pub fn from_event(creator: &str, event: &GiftEvent) -> Self {
        let diamond_value = event.diamond_value();
        let repeat_count = event.repeat_count();
        Self {
            creator: creator.to_string(),
            sender_id: event.sender_id(),
            sender_name: event.sender_name(),
            gift_name: event.gift_name(),
            diamond_value,
            repeat_count,
            total_value: diamond_value.saturating_mul(repeat_count),
        }
    }
}

/// A high-value gift alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertPayload {
    /// Creator whose live room received the gift.
    pub creator: String,
    /// Sender id.
    pub sender_id: String,
    /// Sender display name.
    pub sender_name: String,
    /// Gift name.
    pub gift_name: String,
    /// Total diamond value of the combo.
    pub total_value: u64,
    /// Gift artwork, when the resolver found one.
    pub image_url: Option<String>,
}

impl AlertPayload {
    /// Builds an alert from a record.
    pub fn from_record(record: &GiftRecord, image_url: Option<String>) -> Self {
        Self {
            creator: record.creator.clone(),
            sender_id: record.sender_id.clone(),
            sender_name: record.sender_name.clone(),
            gift_name: record.gift_name.clone(),
            total_value: record.total_value,
            image_url,
        }
    }
}

/// Normalises a gift name into an image lookup key.
///
/// Lower-cases, then collapses every run of whitespace and punctuation into a
/// single `_`, trimming it from both ends: `"Rose  Garden!!"` → `"rose_garden"`.
pub fn normalize_gift_name(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.push(ch);
        } else {
            pending_sep = true;
        }
    }
    key
}
