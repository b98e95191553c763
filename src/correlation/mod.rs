//! Correlating pull requests with issues.
//!
//! There are two directions. The webhook path goes from a merged pull
//! request to one issue key ([`extract`]). The interactive path goes from an
//! issue key to the pull request that mentions it ([`matcher`], [`lookup`]).

pub mod extract;
pub mod lookup;
pub mod matcher;

pub use extract::{IssueKeyExtractor, PatternExtractor, correlation_text, extract_issue_key};
pub use lookup::{LookupError, fetch_issue, find_pull_request};
pub use matcher::pr_matches_issue;
