//! The inbound webhook delivery and the merge event read from it.
//!
//! Only `pull_request` deliveries are meaningful, and of those only the
//! fields needed to decide "was this merged, and what does it reference".
//! Everything else in the payload is ignored.

use axum::body::Bytes;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::correlation::correlation_text;

/// Header naming the event type of a delivery.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying GitHub's unique id for a delivery.
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// The only event type that can produce a transition.
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// The raw delivery as received, before verification.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub body: Bytes,
    pub headers: HeaderMap,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(body: Bytes, headers: HeaderMap) -> Self {
        Self {
            body,
            headers,
            received_at: Utc::now(),
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn event_type(&self) -> Option<&str> {
        self.header(EVENT_HEADER)
    }

    pub fn delivery_id(&self) -> Option<&str> {
        self.header(DELIVERY_HEADER)
    }

    /// Whether the event-type header rules this delivery out.
    ///
    /// An absent header does not: the body alone decides.
    pub fn is_foreign_event_type(&self) -> bool {
        self.event_type()
            .is_some_and(|event| event != PULL_REQUEST_EVENT)
    }
}

/// Error type for bodies that are not a JSON object.
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not a JSON object")]
    NotAnObject,
}

/// The fields of a `pull_request` event the bridge acts on.
///
/// Missing fields take their empty defaults, so a valid object that is not
/// a pull request event parses into something that does not qualify.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMergeEvent {
    pub action: String,
    pub merged: bool,
    pub title: String,
    pub head_ref: String,
}

impl ParsedMergeEvent {
    /// A closed pull request that was actually merged.
    pub fn is_qualifying_merge(&self) -> bool {
        self.action == "closed" && self.merged
    }

    /// The text issue identifiers are searched in.
    pub fn correlation_text(&self) -> String {
        correlation_text(&self.title, &self.head_ref)
    }
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    pull_request: Option<RawPullRequest>,
}

#[derive(Deserialize)]
struct RawPullRequest {
    #[serde(default)]
    merged: Option<bool>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    head: Option<RawHead>,
}

#[derive(Deserialize)]
struct RawHead {
    #[serde(rename = "ref", default)]
    ref_field: Option<String>,
}

/// Reads the merge-relevant fields from a webhook body.
///
/// Fails only when the body is not a JSON object, or when a field that is
/// present has the wrong type.
pub fn parse_merge_event(payload: &[u8]) -> Result<ParsedMergeEvent, EventParseError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    if !value.is_object() {
        return Err(EventParseError::NotAnObject);
    }

    let raw: RawEvent = serde_json::from_value(value)?;
    let pull_request = raw.pull_request;

    Ok(ParsedMergeEvent {
        action: raw.action.unwrap_or_default(),
        merged: pull_request
            .as_ref()
            .and_then(|pr| pr.merged)
            .unwrap_or(false),
        title: pull_request
            .as_ref()
            .and_then(|pr| pr.title.clone())
            .unwrap_or_default(),
        head_ref: pull_request
            .and_then(|pr| pr.head)
            .and_then(|head| head.ref_field)
            .unwrap_or_default(),
    })
}
