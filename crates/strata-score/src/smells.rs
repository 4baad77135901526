//! Commit-message smells: rushed fixes and acknowledged debt.

use once_cell::sync::Lazy;
use regex::Regex;
use strata_core::{CommitRecord, Evidence, Insight, Severity};

use crate::policy;

static PANIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)fix|bug|hotfix|urgent|patch|critical").expect("invalid panic regex")
});

static DEBT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)todo|temp|temporary|hack|workaround").expect("invalid debt regex")
});

/// Flag panic-driven and technical-debt commit patterns.
///
/// Emits at most two insights, `panic_driven` (high) before
/// `technical_debt` (medium), each backed by up to three matching commits.
/// Only subject lines are inspected.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use strata_core::{CommitRecord, Severity};
/// use strata_score::smells::detect_code_smells;
///
/// let commit = |message: &str| CommitRecord {
///     hash: "a".repeat(40),
///     date: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
///     author: "dev".into(),
///     message: message.into(),
///     body: String::new(),
///     changes: None,
/// };
/// let smells = detect_code_smells(&[commit("URGENT patch"), commit("hack around race")]);
/// assert_eq!(smells.len(), 2);
/// assert_eq!(smells[0].kind, "panic_driven");
/// assert_eq!(smells[1].severity, Severity::Medium);
/// ```
pub fn detect_code_smells(commits: &[CommitRecord]) -> Vec<Insight> {
    let mut smells = Vec::new();

    let urgent: Vec<&CommitRecord> = commits
        .iter()
        .filter(|c| PANIC_RE.is_match(&c.message))
        .collect();
    if !urgent.is_empty() {
        smells.push(
            Insight::new(
                "panic_driven",
                Severity::High,
                format!("Found {} urgent/hotfix commits", urgent.len()),
            )
            .with_evidence(evidence(&urgent))
            .with_suggestion("This code may contain rushed fixes that need review"),
        );
    }

    let temporary: Vec<&CommitRecord> = commits
        .iter()
        .filter(|c| DEBT_RE.is_match(&c.message))
        .collect();
    if !temporary.is_empty() {
        smells.push(
            Insight::new(
                "technical_debt",
                Severity::Medium,
                format!("Found {} temporary/hack commits", temporary.len()),
            )
            .with_evidence(evidence(&temporary))
            .with_suggestion("Contains acknowledged technical debt"),
        );
    }

    smells
}

fn evidence(commits: &[&CommitRecord]) -> Vec<Evidence> {
    commits
        .iter()
        .take(policy::SMELL_EVIDENCE)
        .map(|c| Evidence::Commit((*c).clone()))
        .collect()
}
