//! Gift events: decoding tolerance, flattening, and dispatch to the sinks.
//!
//! - [`GiftEvent`] raw event with ordered fallback [`Extractor`] chains
//! - [`GiftRecord`], [`AlertPayload`] flat shapes handed to the sinks
//! - [`GiftEventSink`] persistence + threshold alert, each best-effort
//! - [`CachedImageResolver`] memoising artwork lookups

mod event;
mod images;
mod record;
mod sink;

pub use event::{
    DIAMOND_VALUE, Extractor, GiftDetails, GiftEvent, GiftInfo, GiftSender, SENDER_ID,
    SENDER_NAME, first_match,
};
pub use images::CachedImageResolver;
pub use record::{AlertPayload, GiftRecord, normalize_gift_name};
pub use sink::{AlertOutcome, DispatchReport, GiftEventSink};
