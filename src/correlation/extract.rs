//! Finding issue keys in free text.
//!
//! Pull requests reference issues only through human-written text: the title
//! and the source branch name. Extraction is a plain pattern scan over that
//! text, kept behind [`IssueKeyExtractor`] so the webhook pipeline does not
//! depend on how keys are found.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::IssueKey;
use crate::types::ids::ISSUE_KEY_PATTERN;

/// Issue keys as the tracker writes them: upper-case project prefix.
static ISSUE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ISSUE_KEY_PATTERN).expect("issue key pattern is valid"));

/// The same pattern with ASCII case folding, for human-typed branch names.
static ISSUE_KEY_ANY_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i-u){ISSUE_KEY_PATTERN}")).expect("issue key pattern is valid")
});

/// Finds issue keys in text.
pub trait IssueKeyExtractor {
    /// Returns the leftmost key in `text`, if any.
    fn first(&self, text: &str) -> Option<IssueKey>;

    /// Returns every key in `text`, left to right.
    fn all(&self, text: &str) -> Vec<IssueKey>;
}

/// Regex-based extractor for `[A-Z][A-Z0-9_]+-[0-9]+`.
///
/// Matches are upper-cased. By default only upper-case keys are recognised;
/// [`PatternExtractor::case_insensitive`] also accepts keys typed in lower or
/// mixed case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternExtractor {
    case_insensitive: bool,
}

impl PatternExtractor {
    /// Extractor that only recognises upper-case keys.
    pub const fn strict() -> Self {
        PatternExtractor {
            case_insensitive: false,
        }
    }

    /// Extractor that recognises keys in any ASCII case.
    pub const fn case_insensitive() -> Self {
        PatternExtractor {
            case_insensitive: true,
        }
    }

    pub const fn with_case_insensitive(case_insensitive: bool) -> Self {
        PatternExtractor { case_insensitive }
    }

    fn pattern(&self) -> &'static Regex {
        if self.case_insensitive {
            &ISSUE_KEY_ANY_CASE
        } else {
            &ISSUE_KEY
        }
    }
}

impl IssueKeyExtractor for PatternExtractor {
    fn first(&self, text: &str) -> Option<IssueKey> {
        self.pattern()
            .find(text)
            .map(|m| IssueKey::from_match(m.as_str()))
    }

    fn all(&self, text: &str) -> Vec<IssueKey> {
        self.pattern()
            .find_iter(text)
            .map(|m| IssueKey::from_match(m.as_str()))
            .collect()
    }
}

/// Builds the text searched for a pull request: title and branch, space-joined.
pub fn correlation_text(title: &str, head_ref: &str) -> String {
    format!("{} {}", title, head_ref)
}

/// Returns the leftmost upper-case issue key in `text`.
///
/// # Examples
///
/// ```
/// use merge_bridge::correlation::extract_issue_key;
///
/// let key = extract_issue_key("Fix SAMPLEPROJ-9 login bug").unwrap();
/// assert_eq!(key.as_str(), "SAMPLEPROJ-9");
///
/// assert!(extract_issue_key("no ticket here").is_none());
/// ```
pub fn extract_issue_key(text: &str) -> Option<IssueKey> {
    PatternExtractor::strict().first(text)
}
