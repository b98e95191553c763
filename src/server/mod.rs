//! HTTP server for the merge bridge.
//!
//! # Endpoints
//!
//! - `POST /webhook` - GitHub `pull_request` deliveries; a verified merge
//!   moves the referenced issue to done
//! - `GET /api/v1/repos/{owner}/{repo}/issues/{key}/pull-request` - the open
//!   pull request mentioning an issue, looked up as the acting user
//! - `POST /api/v1/repos/{owner}/{repo}/pulls/{number}/approve`
//! - `POST /api/v1/repos/{owner}/{repo}/pulls/{number}/merge`
//! - `GET /api/v1/credentials` - which credentials are provisioned
//! - `GET /health` - Returns 200 if server is running
//!
//! Every `/api/v1` route requires an `Authorization` header the issue
//! tracker accepts.

use std::sync::Arc;

use crate::correlation::PatternExtractor;
use crate::credentials::CredentialStore;
use crate::github::CodeHostConnector;
use crate::tracker::{IssueTracker, NoTransitionPolicy};

pub mod credentials;
pub mod health;
pub mod pulls;
pub mod webhook;

pub use credentials::credentials_handler;
pub use health::health_handler;
pub use pulls::{ApiError, approve_handler, lookup_handler, merge_handler};
pub use webhook::{WebhookOutcome, process_event, webhook_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It holds no
/// secrets: those are read from the credential store on every request.
pub struct AppState<T, C> {
    inner: Arc<AppStateInner<T, C>>,
}

struct AppStateInner<T, C> {
    tracker: T,
    connector: C,
    credentials: Arc<dyn CredentialStore>,
    extractor: PatternExtractor,
    policy: NoTransitionPolicy,
}

impl<T, C> Clone for AppState<T, C> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, C> AppState<T, C>
where
    T: IssueTracker,
    C: CodeHostConnector,
{
    pub fn new(
        tracker: T,
        connector: C,
        credentials: Arc<dyn CredentialStore>,
        extractor: PatternExtractor,
        policy: NoTransitionPolicy,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                tracker,
                connector,
                credentials,
                extractor,
                policy,
            }),
        }
    }

    pub fn tracker(&self) -> &T {
        &self.inner.tracker
    }

    pub fn connector(&self) -> &C {
        &self.inner.connector
    }

    pub fn credentials(&self) -> &dyn CredentialStore {
        self.inner.credentials.as_ref()
    }

    pub fn extractor(&self) -> &PatternExtractor {
        &self.inner.extractor
    }

    pub fn policy(&self) -> NoTransitionPolicy {
        self.inner.policy
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<T, C>(app_state: AppState<T, C>) -> axum::Router
where
    T: IssueTracker + 'static,
    C: CodeHostConnector + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<T, C>))
        .route(
            "/api/v1/repos/{owner}/{repo}/issues/{key}/pull-request",
            get(lookup_handler::<T, C>),
        )
        .route(
            "/api/v1/repos/{owner}/{repo}/pulls/{number}/approve",
            post(approve_handler::<T, C>),
        )
        .route(
            "/api/v1/repos/{owner}/{repo}/pulls/{number}/merge",
            post(merge_handler::<T, C>),
        )
        .route("/api/v1/credentials", get(credentials_handler::<T, C>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
