//! Webhook endpoint handler.
//!
//! Every delivery runs the same pipeline inline and ends in exactly one
//! [`WebhookOutcome`]: verify the signature, filter out anything that is not
//! a merged pull request, extract the issue key, move the issue to done.
//! There is no queue and no retry; GitHub redelivers on any non-2xx answer.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use super::AppState;
use crate::correlation::IssueKeyExtractor;
use crate::credentials::{CredentialKey, Secret};
use crate::github::CodeHostConnector;
use crate::tracker::{IssueTracker, TransitionError, TransitionOutcome, transition_to_done};
use crate::types::IssueKey;
use crate::webhooks::{InboundEvent, check_signature, parse_merge_event, select_signature_header};

/// The terminal state of one delivery.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// Signature absent, malformed, or wrong (or no secret provisioned).
    Rejected,

    /// Verified, but the body is not a JSON object.
    Malformed,

    /// Verified, but not a merged pull request.
    Filtered,

    /// A merged pull request that mentions no issue key.
    Uncorrelated,

    /// The issue was moved to done, or already was.
    Transitioned {
        issue: IssueKey,
        outcome: TransitionOutcome,
    },

    TransitionFailed(TransitionError),
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Rejected => "rejected",
            WebhookOutcome::Malformed => "malformed",
            WebhookOutcome::Filtered => "filtered",
            WebhookOutcome::Uncorrelated => "uncorrelated",
            WebhookOutcome::Transitioned { .. } => "transitioned",
            WebhookOutcome::TransitionFailed(_) => "transition_failed",
        }
    }
}

impl IntoResponse for WebhookOutcome {
    fn into_response(self) -> Response {
        match self {
            WebhookOutcome::Rejected => (StatusCode::UNAUTHORIZED, "invalid signature").into_response(),
            WebhookOutcome::Malformed => (StatusCode::BAD_REQUEST, "malformed event").into_response(),
            WebhookOutcome::Filtered
            | WebhookOutcome::Uncorrelated
            | WebhookOutcome::Transitioned { .. } => (StatusCode::OK, "ok").into_response(),
            WebhookOutcome::TransitionFailed(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("transition error: {}", e),
            )
                .into_response(),
        }
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 200 OK, body `ok`: filtered, uncorrelated, or transitioned
/// - 400 Bad Request: verified body that is not a JSON object
/// - 401 Unauthorized: signature verification failed
/// - 500 Internal Server Error: the tracker transition failed
///
/// # Example
///
/// ```ignore
/// POST /webhook HTTP/1.1
/// X-GitHub-Event: pull_request
/// X-GitHub-Delivery: 550e8400-e29b-41d4-a716-446655440000
/// X-Hub-Signature-256: sha256=...
/// Content-Type: application/json
///
/// {"action": "closed", "pull_request": {"merged": true, ...}, ...}
///
/// HTTP/1.1 200 OK
/// ```
pub async fn webhook_handler<T, C>(
    State(app_state): State<AppState<T, C>>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookOutcome
where
    T: IssueTracker + 'static,
    C: CodeHostConnector + 'static,
{
    process_event(&app_state, InboundEvent::new(body, headers)).await
}

/// Runs one delivery through the pipeline.
pub async fn process_event<T, C>(app_state: &AppState<T, C>, event: InboundEvent) -> WebhookOutcome
where
    T: IssueTracker,
    C: CodeHostConnector,
{
    let delivery_id = event.delivery_id().unwrap_or("-").to_string();

    // Read on every delivery so a rotated secret applies immediately.
    let secret = load_webhook_secret(app_state);
    let check = check_signature(
        &event.body,
        select_signature_header(&event.headers),
        secret.as_ref().map(Secret::expose),
    );

    debug!(
        delivery_id = %delivery_id,
        received_at = %event.received_at,
        secret_present = secret.is_some(),
        secret_len = secret.as_ref().map_or(0, Secret::len),
        signature = check.as_str(),
        "Received webhook"
    );

    if !check.is_match() {
        warn!(
            delivery_id = %delivery_id,
            signature = check.as_str(),
            secret_present = secret.is_some(),
            "Invalid webhook signature"
        );
        return WebhookOutcome::Rejected;
    }

    if event.is_foreign_event_type() {
        debug!(
            delivery_id = %delivery_id,
            event_type = event.event_type().unwrap_or_default(),
            "Ignoring event type"
        );
        return WebhookOutcome::Filtered;
    }

    let merge = match parse_merge_event(&event.body) {
        Ok(merge) => merge,
        Err(e) => {
            warn!(delivery_id = %delivery_id, error = %e, "Malformed webhook body");
            return WebhookOutcome::Malformed;
        }
    };

    if !merge.is_qualifying_merge() {
        debug!(
            delivery_id = %delivery_id,
            action = %merge.action,
            merged = merge.merged,
            "Not a merged pull request"
        );
        return WebhookOutcome::Filtered;
    }

    let Some(issue) = app_state.extractor().first(&merge.correlation_text()) else {
        info!(
            delivery_id = %delivery_id,
            head_ref = %merge.head_ref,
            "Merged pull request references no issue"
        );
        return WebhookOutcome::Uncorrelated;
    };

    debug!(delivery_id = %delivery_id, issue = %issue, "Correlated merge with issue");

    match transition_to_done(app_state.tracker(), &issue, app_state.policy()).await {
        Ok(outcome) => {
            info!(
                delivery_id = %delivery_id,
                issue = %issue,
                applied = matches!(outcome, TransitionOutcome::Applied(_)),
                "Webhook processed"
            );
            WebhookOutcome::Transitioned { issue, outcome }
        }
        Err(e) => {
            warn!(delivery_id = %delivery_id, issue = %issue, error = %e, "Transition failed");
            WebhookOutcome::TransitionFailed(e)
        }
    }
}

fn load_webhook_secret<T, C>(app_state: &AppState<T, C>) -> Option<Secret>
where
    T: IssueTracker,
    C: CodeHostConnector,
{
    match app_state.credentials().get(CredentialKey::WebhookSecret) {
        Ok(secret) => secret,
        Err(e) => {
            warn!(error = %e, "Failed to read webhook secret");
            None
        }
    }
}
