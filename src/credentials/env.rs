//! Credentials from environment variables.

use std::env;

use super::{CredentialError, CredentialKey, CredentialStore, Secret};

/// Prefix shared with the configuration layer's environment overrides.
pub const ENV_PREFIX: &str = "MERGE_BRIDGE_";

/// Reads each credential from `MERGE_BRIDGE_<NAME>` on every call, for
/// example `MERGE_BRIDGE_WEBHOOK_SECRET`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    prefix: String,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        EnvCredentials {
            prefix: prefix.into(),
        }
    }

    /// The environment variable holding `key`.
    pub fn var_name(&self, key: CredentialKey) -> String {
        format!("{}{}", self.prefix, key.name().to_ascii_uppercase())
    }
}

impl CredentialStore for EnvCredentials {
    fn get(&self, key: CredentialKey) -> Result<Option<Secret>, CredentialError> {
        match env::var_os(self.var_name(key)) {
            None => Ok(None),
            Some(value) => {
                let value = value
                    .into_string()
                    .map_err(|_| CredentialError::NotUnicode(key))?;
                Ok(Secret::from_raw(value))
            }
        }
    }
}
