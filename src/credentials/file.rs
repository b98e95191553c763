//! Credentials from files, one per secret.
//!
//! This matches how secret managers usually mount values into a container:
//! `<dir>/webhook_secret`, `<dir>/jira_service_token`, `<dir>/github_token`.
//!
//! Reads are synchronous because [`CredentialStore`] is. Inside a
//! multi-threaded tokio runtime they run under
//! [`tokio::task::block_in_place`], so the request's worker hands its other
//! tasks off while the file is read.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tokio::runtime::{Handle, RuntimeFlavor};

use super::{CredentialError, CredentialKey, CredentialStore, Secret};

#[derive(Debug, Clone)]
pub struct FileCredentials {
    dir: PathBuf,
}

impl FileCredentials {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCredentials { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: CredentialKey) -> PathBuf {
        self.dir.join(key.name())
    }
}

impl CredentialStore for FileCredentials {
    fn get(&self, key: CredentialKey) -> Result<Option<Secret>, CredentialError> {
        match read_blocking(&self.path_for(key)) {
            Ok(bytes) => Ok(Secret::from_raw(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CredentialError::Io { key, source }),
        }
    }
}

fn read_blocking(path: &Path) -> io::Result<Vec<u8>> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| fs::read(path))
        }
        // block_in_place panics on a current-thread runtime.
        _ => fs::read(path),
    }
}
