//! Group-by-count folding of commit streams.
//!
//! [`CountBucket`] keeps keys in first-seen order so that top-N extraction can
//! break count ties deterministically. [`aggregate_repository`] walks a whole
//! repository log and fills the author, file, and month buckets at once.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use strata_core::{CommitRecord, StrataError};
use tracing::debug;

use crate::parser::parse_name_only;
use crate::source::{DiffQuery, HistorySource, LogQuery};

static URGENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)fix|bug|hotfix|urgent|critical").expect("invalid urgent regex"));

/// Whether a commit subject marks urgent or corrective work.
///
/// Only the subject line is inspected, not the body.
///
/// # Examples
///
/// ```
/// use strata_history::aggregate::is_urgent;
///
/// assert!(is_urgent("HOTFIX: login loop"));
/// assert!(is_urgent("Critical path cleanup"));
/// assert!(!is_urgent("add dark mode"));
/// ```
pub fn is_urgent(message: &str) -> bool {
    URGENT_RE.is_match(message)
}

/// A mapping from group key to count that remembers first-seen key order.
///
/// # Examples
///
/// ```
/// use strata_history::aggregate::CountBucket;
///
/// let mut bucket = CountBucket::new();
/// bucket.increment("alice");
/// bucket.increment("bob");
/// bucket.increment("bob");
/// bucket.increment("carol");
///
/// let top = bucket.top_n(2);
/// assert_eq!(top, vec![("bob".to_string(), 2), ("alice".to_string(), 1)]);
/// assert_eq!(bucket.total(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountBucket {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl CountBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to `key`.
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Add `amount` to `key`, inserting it at the end if unseen.
    pub fn add(&mut self, key: &str, amount: usize) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), amount));
            }
        }
    }

    /// Count for `key`, zero if unseen.
    pub fn get(&self, key: &str) -> usize {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// The `n` largest entries, count descending, ties in first-seen order.
    pub fn top_n(&self, n: usize) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        // `sort_by` is stable, so equal counts keep insertion order.
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    /// All entries sorted ascending by key.
    pub fn sorted_by_key(&self) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
    }
}

/// Line-change totals over one file's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTotals {
    pub total_added: u64,
    pub total_removed: u64,
    /// `round((added + removed) / commits)`, zero for an empty history.
    pub average_change_size: u64,
    pub unique_authors: usize,
}

impl ChangeTotals {
    /// Sum the stats attached to `history`. Commits without stats count as zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::DateTime;
    /// use strata_core::{ChangeStat, CommitRecord};
    /// use strata_history::aggregate::ChangeTotals;
    ///
    /// let commit = |author: &str, added, removed| CommitRecord {
    ///     hash: "0".repeat(40),
    ///     date: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
    ///     author: author.into(),
    ///     message: "m".into(),
    ///     body: String::new(),
    ///     changes: Some(ChangeStat { added, removed }),
    /// };
    /// let totals = ChangeTotals::from_history(&[commit("a", 10, 2), commit("b", 3, 0)]);
    /// assert_eq!(totals.total_added, 13);
    /// assert_eq!(totals.average_change_size, 8);
    /// assert_eq!(totals.unique_authors, 2);
    /// ```
    pub fn from_history(history: &[CommitRecord]) -> Self {
        let mut totals = Self::default();
        let mut authors = HashSet::new();
        for commit in history {
            let stat = commit.changes.unwrap_or_default();
            totals.total_added += stat.added;
            totals.total_removed += stat.removed;
            authors.insert(commit.author.as_str());
        }
        totals.unique_authors = authors.len();
        if !history.is_empty() {
            let churn = (totals.total_added + totals.total_removed) as f64;
            totals.average_change_size = (churn / history.len() as f64).round() as u64;
        }
        totals
    }
}

/// Grouped statistics over a repository's commit stream.
#[derive(Debug, Clone, Default)]
pub struct RepoAggregate {
    pub total_commits: usize,
    pub by_author: CountBucket,
    pub by_file: CountBucket,
    pub by_month: CountBucket,
    /// Commits whose subject matches [`is_urgent`], in stream order.
    pub urgent_commits: Vec<CommitRecord>,
    /// Author date of the newest commit seen.
    pub newest: Option<DateTime<FixedOffset>>,
    /// Author date of the oldest commit seen.
    pub oldest: Option<DateTime<FixedOffset>>,
}

/// Incremental builder for a [`RepoAggregate`].
///
/// Author, month, and urgency are recorded per commit; per-file counts are
/// recorded separately because they need an extra query that may fail.
#[derive(Debug, Default)]
pub struct Aggregator {
    aggregate: RepoAggregate,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the author, month, and urgency of one commit.
    pub fn record_commit(&mut self, commit: &CommitRecord) {
        let agg = &mut self.aggregate;
        agg.total_commits += 1;
        agg.by_author.increment(&commit.author);
        agg.by_month.increment(&commit.month_key());
        if is_urgent(&commit.message) {
            agg.urgent_commits.push(commit.clone());
        }
        if agg.newest.map_or(true, |d| commit.date > d) {
            agg.newest = Some(commit.date);
        }
        if agg.oldest.map_or(true, |d| commit.date < d) {
            agg.oldest = Some(commit.date);
        }
    }

    /// Record the files one commit touched.
    pub fn record_files<S: AsRef<str>>(&mut self, files: &[S]) {
        for file in files {
            self.aggregate.by_file.increment(file.as_ref());
        }
    }

    pub fn finish(self) -> RepoAggregate {
        self.aggregate
    }
}

/// Aggregate every commit in the repository, optionally since a date.
///
/// Per-file counts come from a name-only diff of each commit against its
/// parent, at most `concurrency` in flight. A commit whose diff query fails
/// (the root commit has no parent) is left out of the file bucket only.
///
/// # Errors
///
/// Propagates any failure of the repository log query, and any fatal error
/// from a per-commit diff.
pub async fn aggregate_repository<S: HistorySource + ?Sized>(
    source: &S,
    since: Option<&str>,
    concurrency: usize,
) -> Result<RepoAggregate, StrataError> {
    let commits = source.log(&LogQuery::repository().since(since)).await?;
    debug!(commits = commits.len(), "aggregating repository history");

    let file_lists: Vec<Result<Option<Vec<String>>, StrataError>> = stream::iter(commits.iter())
        .map(|commit| async move {
            match source.diff(&DiffQuery::names(&commit.hash)).await {
                Ok(text) => Ok(Some(parse_name_only(&text))),
                Err(e) if !e.is_fatal() => {
                    debug!(commit = %commit.short_hash(), error = %e, "no file list for commit");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut aggregator = Aggregator::new();
    for (commit, files) in commits.iter().zip(file_lists) {
        aggregator.record_commit(commit);
        if let Some(files) = files? {
            aggregator.record_files(&files);
        }
    }
    Ok(aggregator.finish())
}
