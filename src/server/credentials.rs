//! Credential status endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;
use tracing::warn;

use super::AppState;
use super::pulls::{ApiError, authenticate};
use crate::credentials::{CredentialKey, CredentialStore};
use crate::github::CodeHostConnector;
use crate::tracker::IssueTracker;

/// Which credentials are provisioned. Never carries a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub has_webhook_secret: bool,
    pub has_jira_service_token: bool,
    pub has_github_token: bool,
}

impl CredentialStatus {
    /// A credential that cannot be read counts as not provisioned.
    pub fn read(store: &dyn CredentialStore) -> Self {
        let present = |key: CredentialKey| {
            store.is_provisioned(key).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Failed to read credential");
                false
            })
        };

        CredentialStatus {
            has_webhook_secret: present(CredentialKey::WebhookSecret),
            has_jira_service_token: present(CredentialKey::JiraServiceToken),
            has_github_token: present(CredentialKey::GitHubToken),
        }
    }
}

/// `GET /api/v1/credentials`
pub async fn credentials_handler<T, C>(
    State(app_state): State<AppState<T, C>>,
    headers: HeaderMap,
) -> Result<Json<CredentialStatus>, ApiError>
where
    T: IssueTracker + 'static,
    C: CodeHostConnector + 'static,
{
    authenticate(&app_state, &headers).await?;
    Ok(Json(CredentialStatus::read(app_state.credentials())))
}
