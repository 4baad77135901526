//! Deterministic narratives built from already-computed facts.
//!
//! Used when no narrator is configured or the narrator fails. Nothing here
//! issues queries or parses new text.

use once_cell::sync::Lazy;
use regex::Regex;
use strata_core::{CommitRecord, FileTimePoint};
use strata_score::policy;

static FIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)fix|bug|hotfix").expect("invalid fix regex"));

/// Rule-based summary lines for a file.
///
/// Flags legacy age, inactivity, and high bug activity. An unknown last
/// modification counts as inactive. When nothing is flagged a single
/// neutral line is returned.
///
/// # Examples
///
/// ```
/// use strata_narrative::fallback::file_summary;
///
/// let lines = file_summary(&[], None, None);
/// assert_eq!(lines, vec!["Inactive (no changes in 1+ year)"]);
/// ```
pub fn file_summary(
    history: &[CommitRecord],
    created: Option<&FileTimePoint>,
    last_modified: Option<&FileTimePoint>,
) -> Vec<String> {
    let mut lines = Vec::new();

    if created.is_some_and(|c| c.days_ago > policy::LEGACY_AGE_DAYS) {
        lines.push("Legacy code (2+ years old)".to_string());
    }

    if last_modified.map_or(true, |m| m.days_ago > policy::STALE_FILE_DAYS) {
        lines.push("Inactive (no changes in 1+ year)".to_string());
    }

    let fixes = history
        .iter()
        .filter(|c| FIX_RE.is_match(&c.message))
        .count();
    if fixes > policy::BUG_ACTIVITY_LIMIT {
        lines.push(format!("High bug activity ({fixes} fixes found)"));
    }

    if lines.is_empty() {
        lines.push("No warning signs in recent history".to_string());
    }
    lines
}

/// Rule-based summary for a function, from its related commits
/// (newest first).
///
/// # Examples
///
/// ```
/// use strata_narrative::fallback::function_summary;
///
/// assert_eq!(
///     function_summary("parseDate", &[]),
///     "Function \"parseDate\" has no git history available."
/// );
/// ```
pub fn function_summary(name: &str, related: &[CommitRecord]) -> String {
    let (Some(last), Some(first)) = (related.first(), related.last()) else {
        return format!("Function \"{name}\" has no git history available.");
    };
    format!(
        "{name} was introduced on {} ({}).\nLast modified {} ({}).\nTotal commits: {}.",
        first.date.format("%Y-%m-%d"),
        first.message,
        last.date.format("%Y-%m-%d"),
        last.message,
        related.len()
    )
}
