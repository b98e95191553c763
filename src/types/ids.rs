//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., passing a
//! branch name where an issue key is expected) and make the code more
//! self-documenting.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        PrNumber(n)
    }
}

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Error returned when a string is not a valid issue key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid issue key: {0:?} (expected PROJECT-123)")]
pub struct InvalidIssueKey(pub String);

/// An issue tracker key such as `SAMPLEPROJ-9`.
///
/// A key is a project prefix (an upper-case letter followed by at least one
/// upper-case letter, digit or underscore), a hyphen, and a sequence number.
/// Keys are always stored upper-cased, so equality is case-insensitive with
/// respect to the text they were parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueKey(String);

impl IssueKey {
    /// Parses and upper-cases an issue key.
    ///
    /// Surrounding whitespace is ignored. The whole input must be a key;
    /// use [`crate::correlation::extract_issue_key`] to find one inside
    /// free text.
    pub fn parse(s: impl AsRef<str>) -> Result<Self, InvalidIssueKey> {
        let raw = s.as_ref().trim();
        let upper = raw.to_ascii_uppercase();
        if is_issue_key(&upper) {
            Ok(IssueKey(upper))
        } else {
            Err(InvalidIssueKey(raw.to_string()))
        }
    }

    /// Builds a key from text already known to match the key pattern.
    pub(crate) fn from_match(s: &str) -> Self {
        IssueKey(s.to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the project prefix (the part before the hyphen).
    pub fn project(&self) -> &str {
        self.0.rsplit_once('-').map_or(&self.0, |(project, _)| project)
    }
}

/// The issue key grammar, unanchored. Extraction searches text with it.
pub(crate) const ISSUE_KEY_PATTERN: &str = "[A-Z][A-Z0-9_]+-[0-9]+";

static WHOLE_ISSUE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{ISSUE_KEY_PATTERN}$")).expect("issue key pattern is valid")
});

fn is_issue_key(s: &str) -> bool {
    WHOLE_ISSUE_KEY.is_match(s)
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IssueKey {
    type Err = InvalidIssueKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueKey::parse(s)
    }
}

impl TryFrom<String> for IssueKey {
    type Error = InvalidIssueKey;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        IssueKey::parse(s)
    }
}

impl From<IssueKey> for String {
    fn from(key: IssueKey) -> Self {
        key.0
    }
}
