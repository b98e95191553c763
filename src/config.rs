//! Service configuration.
//!
//! Layered with figment, lowest to highest precedence: built-in defaults, an
//! optional YAML file, then `MERGE_BRIDGE_*` environment variables with `__`
//! separating nested keys (`MERGE_BRIDGE_JIRA__BASE_URL`).
//!
//! Secrets are not configuration. They live in a credential store and are
//! read on every use; see [`crate::credentials`].

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::{CredentialStore, ENV_PREFIX, EnvCredentials, FileCredentials};
use crate::tracker::NoTransitionPolicy;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "merge-bridge.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("jira.base_url must be set")]
    MissingJiraBaseUrl,

    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("server.bind is not a socket address: {0:?}")]
    InvalidBind(String),

    #[error("credentials.dir must be set when credentials.source is \"file\"")]
    MissingCredentialsDir,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub jira: JiraConfig,
    pub github: GitHubConfig,
    pub correlation: CorrelationConfig,
    pub credentials: CredentialsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Site root, e.g. `https://example.atlassian.net`.
    pub base_url: String,

    /// Account the service token belongs to. When set the token is sent with
    /// basic auth (Jira Cloud API tokens); otherwise as a bearer token.
    pub service_account: Option<String>,

    /// Per-request timeout for every tracker call.
    pub timeout_secs: u64,

    pub no_transition_policy: NoTransitionPolicy,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            service_account: None,
            timeout_secs: 5,
            no_transition_policy: NoTransitionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API root for GitHub Enterprise. Unset means github.com.
    pub api_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Also accept lower- and mixed-case keys in merged pull requests.
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    #[default]
    Env,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub source: CredentialSource,
    pub dir: Option<PathBuf>,
}

impl CredentialsConfig {
    /// Builds the configured store. Nothing is read until first use.
    pub fn build_store(&self) -> Result<Arc<dyn CredentialStore>, ConfigError> {
        match self.source {
            CredentialSource::Env => Ok(Arc::new(EnvCredentials::new())),
            CredentialSource::File => {
                let dir = self.dir.as_ref().ok_or(ConfigError::MissingCredentialsDir)?;
                Ok(Arc::new(FileCredentials::new(dir)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "merge_bridge=info".to_string(),
        }
    }
}

impl Config {
    /// The provider stack, without extraction or validation.
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates configuration. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path).extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidBind(self.server.bind.clone()));
        }

        if self.jira.base_url.trim().is_empty() {
            return Err(ConfigError::MissingJiraBaseUrl);
        }
        check_http_url("jira.base_url", &self.jira.base_url)?;
        if let Some(api_url) = &self.github.api_url {
            check_http_url("github.api_url", api_url)?;
        }

        if self.jira.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("jira.timeout_secs"));
        }
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("github.timeout_secs"));
        }

        if self.credentials.source == CredentialSource::File && self.credentials.dir.is_none() {
            return Err(ConfigError::MissingCredentialsDir);
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }
}

fn check_http_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            key,
            value: value.to_string(),
        })
    }
}
