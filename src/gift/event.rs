//! # Raw gift events and field extraction.
//!
//! Upstream event schemas drift: the per-item diamond value has lived in
//! `gift.diamond_count`, in the legacy `gift.diamond_value`, and in a nested
//! `gift.info.diamond_count`. Rather than probing attributes ad hoc, each
//! fallback chain is an ordered list of named [`Extractor`]s; the first one
//! that yields a value wins.
//!
//! ```text
//! DIAMOND_VALUE: gift.diamond_count → gift.diamond_value → gift.info.diamond_count → 0
//! SENDER_ID:     user.id → user.unique_id → ""
//! SENDER_NAME:   user.nickname → user.unique_id → "unknown"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// One gift-giving action as decoded by the platform client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiftEvent {
    /// Who sent the gift.
    pub user: Option<GiftSender>,
    /// What was sent.
    pub gift: Option<GiftDetails>,
    /// How many times the gift was repeated in this combo.
    pub repeat_count: Option<i64>,
}

/// Sender fields as they appear upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiftSender {
    /// Numeric platform id, when present.
    pub id: Option<String>,
    /// Handle (`@name`).
    pub unique_id: Option<String>,
    /// Display name.
    pub nickname: Option<String>,
}

/// Gift fields as they appear upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiftDetails {
    /// Gift name as shown in the live room.
    pub name: Option<String>,
    /// Per-item diamond value (current schema).
    pub diamond_count: Option<i64>,
    /// Per-item diamond value (legacy schema).
    pub diamond_value: Option<i64>,
    /// Nested metadata block (oldest schema).
    pub info: Option<GiftInfo>,
}

/// Nested gift metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiftInfo {
    /// Per-item diamond value.
    pub diamond_count: Option<i64>,
}

/// A named field-extraction strategy.
#[derive(Clone, Copy)]
pub struct Extractor<T> {
    /// Dotted path of the field read, for diagnostics.
    pub name: &'static str,
    /// Returns the value if the field is present and usable.
    pub extract: fn(&GiftEvent) -> Option<T>,
}

impl<T> std::fmt::Debug for Extractor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Extractor").field(&self.name).finish()
    }
}

/// Runs `chain` in order and returns the first hit with the name of the strategy that produced it.
pub fn first_match<T>(chain: &[Extractor<T>], event: &GiftEvent) -> Option<(&'static str, T)> {
    chain
        .iter()
        .find_map(|s| (s.extract)(event).map(|v| (s.name, v)))
}

fn non_negative(v: i64) -> Option<u64> {
    u64::try_from(v).ok()
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn gift_diamond_count(ev: &GiftEvent) -> Option<u64> {
    ev.gift.as_ref()?.diamond_count.and_then(non_negative)
}

fn gift_diamond_value(ev: &GiftEvent) -> Option<u64> {
    ev.gift.as_ref()?.diamond_value.and_then(non_negative)
}

fn gift_info_diamond_count(ev: &GiftEvent) -> Option<u64> {
    ev.gift.as_ref()?.info.as_ref()?.diamond_count.and_then(non_negative)
}

fn user_id(ev: &GiftEvent) -> Option<String> {
    non_empty(&ev.user.as_ref()?.id)
}

fn user_unique_id(ev: &GiftEvent) -> Option<String> {
    non_empty(&ev.user.as_ref()?.unique_id)
}

fn user_nickname(ev: &GiftEvent) -> Option<String> {
    non_empty(&ev.user.as_ref()?.nickname)
}

/// Per-item diamond value. Negative values are treated as absent.
pub const DIAMOND_VALUE: &[Extractor<u64>] = &[
    Extractor {
        name: "gift.diamond_count",
        extract: gift_diamond_count,
    },
    Extractor {
        name: "gift.diamond_value",
        extract: gift_diamond_value,
    },
    Extractor {
        name: "gift.info.diamond_count",
        extract: gift_info_diamond_count,
    },
];

/// Stable sender identifier.
pub const SENDER_ID: &[Extractor<String>] = &[
    Extractor {
        name: "user.id",
        extract: user_id,
    },
    Extractor {
        name: "user.unique_id",
        extract: user_unique_id,
    },
];

/// Human-readable sender name.
pub const SENDER_NAME: &[Extractor<String>] = &[
    Extractor {
        name: "user.nickname",
        extract: user_nickname,
    },
    Extractor {
        name: "user.unique_id",
        extract: user_unique_id,
    },
];

impl GiftEvent {
    /// Decodes a JSON gift payload; unknown fields are ignored, missing ones default.
    pub fn from_json(raw: &str) -> Result<Self, StreamError> {
        serde_json::from_str(raw).map_err(|e| StreamError::Decode {
            error: e.to_string(),
        })
    }

    /// Per-item value via [`DIAMOND_VALUE`], `0` when no strategy matches.
    pub fn diamond_value(&self) -> u64 {
        first_match(DIAMOND_VALUE, self).map_or(0, |(_, v)| v)
    }

    /// Repeat count, `1` when absent or non-positive.
    pub fn repeat_count(&self) -> u64 {
        self.repeat_count
            .and_then(|n| u64::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(1)
    }

    /// Sender id via [`SENDER_ID`], empty when unknown.
    pub fn sender_id(&self) -> String {
        first_match(SENDER_ID, self).map_or_else(String::new, |(_, v)| v)
    }

    /// Sender display name via [`SENDER_NAME`].
    pub fn sender_name(&self) -> String {
        first_match(SENDER_NAME, self).map_or_else(|| "unknown".to_string(), |(_, v)| v)
    }

    /// Gift name, `"unknown"` when absent.
    pub fn gift_name(&self) -> String {
        self.gift
            .as_ref()
            .and_then(|g| non_empty(&g.name))
            .unwrap_or_else(|| "unknown".to_string())
    }
}
