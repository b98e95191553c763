//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256, legacy SHA-1)
//! - The inbound delivery type and merge event parsing

pub mod events;
pub mod signature;

pub use events::{
    DELIVERY_HEADER, EVENT_HEADER, EventParseError, InboundEvent, PULL_REQUEST_EVENT,
    ParsedMergeEvent, parse_merge_event,
};
pub use signature::{
    LEGACY_SIGNATURE_HEADER, SIGNATURE_HEADER, SignatureAlgorithm, SignatureCheck, SignatureHeader,
    check_signature, compute_sha1_signature, compute_signature, format_sha1_signature_header,
    format_signature_header, parse_signature_header, select_signature_header, verify_signature,
};
