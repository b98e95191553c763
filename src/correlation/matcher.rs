//! Deciding whether a pull request refers to a given issue.

use crate::types::IssueKey;

use super::extract::{IssueKeyExtractor, PatternExtractor, correlation_text};

/// Returns true if the pull request's title or branch mentions `issue`.
///
/// Unlike webhook correlation, every key in the text is considered, since a
/// pull request may mention several issues and the caller is checking for
/// one in particular. Matching ignores case because branch names are typed
/// by hand.
///
/// # Examples
///
/// ```
/// use merge_bridge::correlation::pr_matches_issue;
/// use merge_bridge::types::IssueKey;
///
/// let target = IssueKey::parse("SAMPLEPROJ-9").unwrap();
/// assert!(pr_matches_issue("Merge SAMPLEPROJ-9", "feature/x", &target));
///
/// let other = IssueKey::parse("samplediff-1").unwrap();
/// assert!(!pr_matches_issue("Merge SAMPLEPROJ-9", "feature/x", &other));
/// ```
pub fn pr_matches_issue(title: &str, head_ref: &str, issue: &IssueKey) -> bool {
    PatternExtractor::case_insensitive()
        .all(&correlation_text(title, head_ref))
        .iter()
        .any(|found| found == issue)
}
