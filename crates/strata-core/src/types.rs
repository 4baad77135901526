use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::days_between;

/// Length of the abbreviated commit hash shown to users.
const SHORT_HASH_LEN: usize = 7;

/// One commit touching a file (or the repository), as returned by `git log`.
///
/// Records are ordered newest-first as the history source returns them.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use strata_core::{ChangeStat, CommitRecord};
///
/// let commit = CommitRecord {
///     hash: "3f9a2c1d0e8b7a6f5e4d3c2b1a0f9e8d7c6b5a49".into(),
///     date: DateTime::parse_from_rfc3339("2024-03-05T10:00:00+01:00").unwrap(),
///     author: "alice".into(),
///     message: "fix: null check in login".into(),
///     body: String::new(),
///     changes: Some(ChangeStat { added: 4, removed: 1 }),
/// };
/// assert_eq!(commit.short_hash(), "3f9a2c1");
/// assert_eq!(commit.month_key(), "2024-03");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Full commit hash.
    pub hash: String,
    /// Author date, in the author's own offset.
    pub date: DateTime<FixedOffset>,
    /// Author name.
    pub author: String,
    /// Subject line.
    pub message: String,
    /// Remaining message body (may be empty).
    pub body: String,
    /// Line stats for the queried path, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeStat>,
}

impl CommitRecord {
    /// Abbreviated hash (first 7 characters).
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(SHORT_HASH_LEN)]
    }

    /// Calendar month of the author date, formatted `YYYY-MM`.
    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }

    /// Subject and body joined for keyword matching.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.message, self.body)
    }

    /// Total changed lines, or zero when stats were not collected.
    pub fn churn(&self) -> u64 {
        self.changes.map_or(0, |c| c.total())
    }
}

/// Added/removed line counts for one path in one commit.
///
/// # Examples
///
/// ```
/// use strata_core::ChangeStat;
///
/// let stat = ChangeStat { added: 10, removed: 3 };
/// assert_eq!(stat.total(), 13);
/// assert_eq!(ChangeStat::default().total(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStat {
    /// Content lines added.
    pub added: u64,
    /// Content lines removed.
    pub removed: u64,
}

impl ChangeStat {
    /// `added + removed`.
    pub fn total(self) -> u64 {
        self.added + self.removed
    }
}

/// A commit attributed by `git blame` to part of a line range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlameEntry {
    /// Full commit hash.
    pub hash: String,
    /// Author name, if the porcelain block carried one.
    pub author: Option<String>,
    /// Commit summary, if the porcelain block carried one.
    pub message: Option<String>,
}

impl BlameEntry {
    /// First seven characters of the hash, for display.
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(SHORT_HASH_LEN)]
    }
}

/// When a path was touched by a particular commit, and how long ago that was.
///
/// Used for creation info, last modification, and dead-code scan entries.
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, TimeZone, Utc};
/// use strata_core::{CommitRecord, FileTimePoint};
///
/// let commit = CommitRecord {
///     hash: "abcdef0123456789abcdef0123456789abcdef01".into(),
///     date: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
///     author: "bob".into(),
///     message: "add parser".into(),
///     body: String::new(),
///     changes: None,
/// };
/// let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
/// let point = FileTimePoint::from_commit("src/parser.rs", &commit, now);
/// assert_eq!(point.days_ago, 30);
/// assert_eq!(point.hash, "abcdef0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTimePoint {
    /// Path the fact is about.
    pub path: String,
    /// Abbreviated hash of the commit.
    pub hash: String,
    /// Author date of the commit.
    pub date: DateTime<FixedOffset>,
    /// Whole days between the commit and "now".
    pub days_ago: u64,
    /// Commit author.
    pub author: String,
    /// Commit subject line.
    pub message: String,
}

impl FileTimePoint {
    /// Build a time point for `path` from the commit that touched it.
    pub fn from_commit(path: &str, commit: &CommitRecord, now: DateTime<Utc>) -> Self {
        Self {
            path: path.to_string(),
            hash: commit.short_hash().to_string(),
            date: commit.date,
            days_ago: days_between(now, commit.date),
            author: commit.author.clone(),
            message: commit.message.clone(),
        }
    }
}

/// Severity of an insight.
///
/// # Examples
///
/// ```
/// use strata_core::Severity;
///
/// let s: Severity = serde_json::from_str("\"high\"").unwrap();
/// assert_eq!(s, Severity::High);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational observation.
    Info,
    /// Worth a look.
    Medium,
    /// Needs attention.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Priority of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Supporting data attached to an insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evidence {
    /// A commit that triggered the insight.
    Commit(CommitRecord),
    /// A file that triggered the insight.
    File(FileTimePoint),
}

/// A typed, rule-generated observation about a file or repository.
///
/// # Examples
///
/// ```
/// use strata_core::{Insight, Severity};
///
/// let insight = Insight::new("hotspot", Severity::Medium, "62.5% of changes in top 10 files");
/// let json = serde_json::to_value(&insight).unwrap();
/// assert_eq!(json["type"], "hotspot");
/// assert_eq!(json["severity"], "medium");
/// assert!(json.get("evidence").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Rule tag, e.g. `"health"` or `"panic_driven"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// How much attention the insight deserves.
    pub severity: Severity,
    /// Human-readable statement.
    pub message: String,
    /// Commits or files backing the statement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
    /// Suggested follow-up, if the rule has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Insight {
    /// Create an insight with no evidence or suggestion.
    pub fn new(kind: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            severity,
            message: message.into(),
            evidence: Vec::new(),
            suggestion: None,
        }
    }

    /// Attach evidence.
    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    /// Attach a suggested follow-up.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// An actionable suggestion derived from file or function metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Rule tag, e.g. `"refactor"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Urgency.
    pub priority: Priority,
    /// Human-readable advice.
    pub message: String,
}

impl Recommendation {
    pub fn new(kind: &str, priority: Priority, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            priority,
            message: message.into(),
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use strata_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
