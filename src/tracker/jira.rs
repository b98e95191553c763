//! Jira Cloud REST v3 client.
//!
//! Only the calls the bridge needs are wrapped. The service token is
//! read from the credential store on every request so rotation needs no
//! restart.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::JiraConfig;
use crate::credentials::{CredentialError, CredentialKey, CredentialStore};
use crate::types::{Issue, IssueKey, TrackerUser, Transition};

use super::{IssueTracker, TrackerError, UserAuthorization};

/// Fields requested when validating an issue.
const ISSUE_FIELDS: &str = "summary,status,assignee";

/// HTTP client for the Jira REST API.
#[derive(Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    /// Account used with basic auth for the service token. Bearer auth when unset.
    service_account: Option<String>,
    credentials: Arc<dyn CredentialStore>,
}

impl JiraClient {
    pub fn new(
        config: &JiraConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TrackerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("merge-bridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(JiraClient {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_account: config.service_account.clone(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transitions_url(&self, issue: &IssueKey) -> String {
        format!("{}/rest/api/3/issue/{}/transitions", self.base_url, issue)
    }

    fn issue_url(&self, issue: &IssueKey) -> String {
        format!("{}/rest/api/3/issue/{}", self.base_url, issue)
    }

    fn myself_url(&self) -> String {
        format!("{}/rest/api/3/myself", self.base_url)
    }

    /// Authenticates a request as the service principal.
    fn as_service(&self, request: RequestBuilder) -> Result<RequestBuilder, TrackerError> {
        let key = CredentialKey::JiraServiceToken;
        let token = self
            .credentials
            .get(key)?
            .ok_or(TrackerError::MissingCredential(key))?;
        let token = token.expose_str().ok_or(CredentialError::NotUnicode(key))?;

        Ok(match &self.service_account {
            Some(account) => request.basic_auth(account, Some(token)),
            None => request.bearer_auth(token),
        })
    }

    /// Authenticates a request as the acting user.
    fn as_user(
        &self,
        request: RequestBuilder,
        user: &UserAuthorization,
    ) -> Result<RequestBuilder, TrackerError> {
        let mut value = HeaderValue::from_bytes(user.header_value())
            .map_err(|_| TrackerError::InvalidUserAuthorization)?;
        value.set_sensitive(true);
        Ok(request.header(AUTHORIZATION, value))
    }
}

impl std::fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraClient")
            .field("base_url", &self.base_url)
            .field("service_account", &self.service_account)
            .finish_non_exhaustive()
    }
}

/// Turns a non-success response into [`TrackerError::Status`].
async fn ensure_success(response: Response) -> Result<Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TrackerError::status(status.as_u16(), body))
}

// ─── Response payloads ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawTransitions {
    #[serde(default)]
    transitions: Vec<RawTransition>,
}

#[derive(Debug, Deserialize)]
struct RawTransition {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawIssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct RawIssueFields {
    summary: Option<String>,
    status: Option<RawNamed>,
    assignee: Option<RawAssignee>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssignee {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMyself {
    account_id: String,
    display_name: Option<String>,
}

impl IssueTracker for JiraClient {
    async fn list_transitions(&self, issue: &IssueKey) -> Result<Vec<Transition>, TrackerError> {
        debug!(issue = %issue, "Listing transitions");

        let request = self.as_service(self.http.get(self.transitions_url(issue)))?;
        let response = ensure_success(request.send().await?).await?;
        let raw: RawTransitions = response
            .json()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))?;

        Ok(raw
            .transitions
            .into_iter()
            .map(|t| Transition::new(t.id, t.name))
            .collect())
    }

    async fn execute_transition(
        &self,
        issue: &IssueKey,
        transition_id: &str,
    ) -> Result<(), TrackerError> {
        debug!(issue = %issue, transition_id, "Executing transition");

        let body = serde_json::json!({ "transition": { "id": transition_id } });
        let request = self.as_service(self.http.post(self.transitions_url(issue)))?;
        ensure_success(request.json(&body).send().await?).await?;
        Ok(())
    }

    async fn get_issue(
        &self,
        user: &UserAuthorization,
        issue: &IssueKey,
    ) -> Result<Option<Issue>, TrackerError> {
        debug!(issue = %issue, "Fetching issue as acting user");

        let request = self
            .http
            .get(self.issue_url(issue))
            .query(&[("fields", ISSUE_FIELDS)]);
        let response = self.as_user(request, user)?.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let raw: RawIssue = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))?;
        let key = IssueKey::parse(&raw.key).map_err(|e| TrackerError::Decode(e.to_string()))?;

        Ok(Some(Issue {
            key,
            summary: raw.fields.summary.unwrap_or_default(),
            status: raw.fields.status.map(|s| s.name).unwrap_or_default(),
            assignee: raw.fields.assignee.and_then(|a| a.display_name),
        }))
    }

    async fn current_user(
        &self,
        user: &UserAuthorization,
    ) -> Result<Option<TrackerUser>, TrackerError> {
        let request = self.as_user(self.http.get(self.myself_url()), user)?;
        let response = request.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("Tracker rejected user authorization");
            return Ok(None);
        }

        let raw: RawMyself = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))?;

        Ok(Some(TrackerUser {
            account_id: raw.account_id,
            display_name: raw.display_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentials;
    use crate::tracker::NoTransitionPolicy;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config(base_url: String, service_account: Option<&str>) -> JiraConfig {
        JiraConfig {
            base_url,
            service_account: service_account.map(str::to_string),
            timeout_secs: 5,
            no_transition_policy: NoTransitionPolicy::Succeed,
        }
    }

    fn client_with(server: &Server, credentials: Arc<MemoryCredentials>) -> JiraClient {
        JiraClient::new(&config(server.url(), None), credentials).unwrap()
    }

    fn service_credentials(token: &str) -> Arc<MemoryCredentials> {
        Arc::new(MemoryCredentials::new().with(CredentialKey::JiraServiceToken, token))
    }

    fn key(s: &str) -> IssueKey {
        IssueKey::parse(s).unwrap()
    }

    #[tokio::test]
    async fn list_transitions_uses_service_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/issue/SAMPLEPROJ-9/transitions")
            .match_header("authorization", "Bearer svc-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "expand": "transitions",
                    "transitions": [
                        { "id": "11", "name": "To Do", "to": { "name": "To Do" } },
                        { "id": "31", "name": "Done", "to": { "name": "Done" } }
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        let transitions = client.list_transitions(&key("SAMPLEPROJ-9")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            transitions,
            vec![Transition::new("11", "To Do"), Transition::new("31", "Done")]
        );
    }

    #[tokio::test]
    async fn list_transitions_tolerates_missing_array() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/issue/AB-1/transitions")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        assert!(client.list_transitions(&key("AB-1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn service_account_uses_basic_auth() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/issue/AB-1/transitions")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .with_status(200)
            .with_body(r#"{"transitions":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = JiraClient::new(
            &config(server.url(), Some("bot@example.com")),
            service_credentials("svc-token"),
        )
        .unwrap();
        client.list_transitions(&key("AB-1")).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_service_token_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_with(&server, Arc::new(MemoryCredentials::new()));
        let result = client.list_transitions(&key("AB-1")).await;

        assert!(matches!(
            result,
            Err(TrackerError::MissingCredential(CredentialKey::JiraServiceToken))
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rotated_service_token_is_used_on_next_call() {
        let mut server = Server::new_async().await;
        let old = server
            .mock("GET", "/rest/api/3/issue/AB-1/transitions")
            .match_header("authorization", "Bearer old-token")
            .with_status(200)
            .with_body(r#"{"transitions":[]}"#)
            .expect(1)
            .create_async()
            .await;
        let new = server
            .mock("GET", "/rest/api/3/issue/AB-1/transitions")
            .match_header("authorization", "Bearer new-token")
            .with_status(200)
            .with_body(r#"{"transitions":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let credentials = service_credentials("old-token");
        let client = client_with(&server, credentials.clone());
        client.list_transitions(&key("AB-1")).await.unwrap();
        credentials.set(CredentialKey::JiraServiceToken, "new-token");
        client.list_transitions(&key("AB-1")).await.unwrap();

        old.assert_async().await;
        new.assert_async().await;
    }

    #[tokio::test]
    async fn execute_transition_posts_transition_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/3/issue/SAMPLEPROJ-9/transitions")
            .match_header("authorization", "Bearer svc-token")
            .match_body(Matcher::Json(json!({ "transition": { "id": "31" } })))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        client
            .execute_transition(&key("SAMPLEPROJ-9"), "31")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn execute_transition_failure_carries_status_and_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/rest/api/3/issue/AB-1/transitions")
            .with_status(400)
            .with_body(r#"{"errorMessages":["Transition id '31' is not valid for this issue."]}"#)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        let err = client
            .execute_transition(&key("AB-1"), "31")
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(400));
        assert!(err.to_string().contains("not valid for this issue"));
        assert!(!err.to_string().contains("svc-token"));
    }

    #[tokio::test]
    async fn get_issue_forwards_user_authorization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/issue/SAMPLEPROJ-9")
            .match_query(Matcher::UrlEncoded(
                "fields".to_string(),
                ISSUE_FIELDS.to_string(),
            ))
            .match_header("authorization", "Bearer user-token")
            .with_status(200)
            .with_body(
                json!({
                    "key": "SAMPLEPROJ-9",
                    "fields": {
                        "summary": "Login fails",
                        "status": { "name": "In Progress" },
                        "assignee": { "displayName": "Sam Doe" }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        let user = UserAuthorization::new("Bearer user-token").unwrap();
        let issue = client
            .get_issue(&user, &key("SAMPLEPROJ-9"))
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(issue.key, key("SAMPLEPROJ-9"));
        assert_eq!(issue.summary, "Login fails");
        assert_eq!(issue.status, "In Progress");
        assert_eq!(issue.assignee.as_deref(), Some("Sam Doe"));
    }

    #[tokio::test]
    async fn get_issue_does_not_need_service_token() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/issue/AB-1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"key":"AB-1","fields":{"assignee":null}}"#)
            .create_async()
            .await;

        let client = client_with(&server, Arc::new(MemoryCredentials::new()));
        let user = UserAuthorization::new("Bearer user-token").unwrap();
        let issue = client.get_issue(&user, &key("AB-1")).await.unwrap().unwrap();
        assert_eq!(issue.assignee, None);
        assert_eq!(issue.summary, "");
    }

    #[tokio::test]
    async fn get_issue_not_found_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/issue/AB-404")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"errorMessages":["Issue does not exist"]}"#)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        let user = UserAuthorization::new("Bearer user-token").unwrap();
        assert!(client.get_issue(&user, &key("AB-404")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_issue_unauthorized_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/issue/AB-1")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        let user = UserAuthorization::new("Bearer expired").unwrap();
        let err = client.get_issue(&user, &key("AB-1")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[tokio::test]
    async fn current_user_forwards_user_authorization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/3/myself")
            .match_header("authorization", "Bearer user-token")
            .with_status(200)
            .with_body(
                json!({
                    "accountId": "5b10ac8d82e05b22cc7d4ef5",
                    "displayName": "Sam Doe",
                    "active": true
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = client_with(&server, Arc::new(MemoryCredentials::new()));
        let user = UserAuthorization::new("Bearer user-token").unwrap();
        let account = client.current_user(&user).await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(account.account_id, "5b10ac8d82e05b22cc7d4ef5");
        assert_eq!(account.display_name.as_deref(), Some("Sam Doe"));
    }

    #[tokio::test]
    async fn current_user_rejected_authorization_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/myself")
            .with_status(401)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        let user = UserAuthorization::new("Bearer forged").unwrap();
        assert!(client.current_user(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn current_user_server_error_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/api/3/myself")
            .with_status(503)
            .create_async()
            .await;

        let client = client_with(&server, service_credentials("svc-token"));
        let user = UserAuthorization::new("Bearer user-token").unwrap();
        let err = client.current_user(&user).await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let client = JiraClient::new(
            &config("https://example.atlassian.net/".to_string(), None),
            Arc::new(MemoryCredentials::new()),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://example.atlassian.net");
        assert_eq!(
            client.transitions_url(&key("AB-1")),
            "https://example.atlassian.net/rest/api/3/issue/AB-1/transitions"
        );
    }
}
