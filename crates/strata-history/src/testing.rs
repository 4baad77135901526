//! In-memory [`HistorySource`] for unit tests.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use strata_core::{CommitRecord, StrataError};

use crate::source::{DiffFilter, DiffQuery, HistorySource, LogQuery};

/// Build a commit with a deterministic 40-hex hash.
pub(crate) fn commit(author: &str, message: &str, date: &str) -> CommitRecord {
    let mut hasher = DefaultHasher::new();
    (author, message, date).hash(&mut hasher);
    let h = hasher.finish();
    let hash = format!("{h:016x}{h:016x}{:08x}", h as u32);
    CommitRecord {
        hash,
        date: DateTime::parse_from_rfc3339(date).unwrap(),
        author: author.into(),
        message: message.into(),
        body: String::new(),
        changes: None,
    }
}

struct FakeCommit {
    record: CommitRecord,
    files: Vec<String>,
    root: bool,
}

/// Commits are registered newest first, mirroring `git log` order.
#[derive(Default)]
pub(crate) struct FakeSource {
    commits: Vec<FakeCommit>,
    diffs: HashMap<(String, String), String>,
    blames: HashMap<String, String>,
    failing_diffs: HashSet<String>,
    diff_delays: HashMap<String, Duration>,
    fail_log: bool,
    fail_blame: bool,
    unavailable: bool,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_commit(mut self, record: CommitRecord, files: &[&str]) -> Self {
        self.commits.push(FakeCommit {
            record,
            files: files.iter().map(|f| f.to_string()).collect(),
            root: false,
        });
        self
    }

    /// A commit without a parent: every diff against it fails.
    pub(crate) fn with_root_commit(mut self, record: CommitRecord, files: &[&str]) -> Self {
        self.commits.push(FakeCommit {
            record,
            files: files.iter().map(|f| f.to_string()).collect(),
            root: true,
        });
        self
    }

    pub(crate) fn with_diff(mut self, hash: &str, path: &str, text: &str) -> Self {
        self.diffs
            .insert((hash.to_string(), path.to_string()), text.to_string());
        self
    }

    pub(crate) fn with_blame(mut self, path: &str, text: &str) -> Self {
        self.blames.insert(path.to_string(), text.to_string());
        self
    }

    /// Hold back every diff of `hash` by `millis` before answering.
    pub(crate) fn slow_diff(mut self, hash: &str, millis: u64) -> Self {
        self.diff_delays
            .insert(hash.to_string(), Duration::from_millis(millis));
        self
    }

    pub(crate) fn failing_diff(mut self, hash: &str) -> Self {
        self.failing_diffs.insert(hash.to_string());
        self
    }

    pub(crate) fn failing_log(mut self) -> Self {
        self.fail_log = true;
        self
    }

    pub(crate) fn failing_blame(mut self) -> Self {
        self.fail_blame = true;
        self
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check_available(&self) -> Result<(), StrataError> {
        if self.unavailable {
            return Err(StrataError::SourceUnavailable("fake repository is gone".into()));
        }
        Ok(())
    }

    fn find(&self, hash: &str) -> Option<&FakeCommit> {
        self.commits.iter().find(|c| c.record.hash == hash)
    }
}

#[async_trait]
impl HistorySource for FakeSource {
    async fn log(&self, query: &LogQuery) -> Result<Vec<CommitRecord>, StrataError> {
        self.check_available()?;
        if self.fail_log {
            return Err(StrataError::QueryFailed("log failed".into()));
        }
        let mut matching: Vec<CommitRecord> = self
            .commits
            .iter()
            .filter(|c| match &query.path {
                Some(path) => c.files.iter().any(|f| f == path),
                None => true,
            })
            .map(|c| c.record.clone())
            .collect();
        if query.diff_filter == Some(DiffFilter::Added) {
            // The oldest commit touching the path is the one that added it.
            matching = matching.pop().into_iter().collect();
        }
        if let Some(max) = query.max_count {
            matching.truncate(max);
        }
        Ok(matching)
    }

    async fn diff(&self, query: &DiffQuery) -> Result<String, StrataError> {
        self.check_available()?;
        let Some(commit) = self.find(&query.commit) else {
            return Err(StrataError::QueryFailed(format!("bad revision {}", query.commit)));
        };
        if let Some(delay) = self.diff_delays.get(&query.commit) {
            tokio::time::sleep(*delay).await;
        }
        if commit.root || self.failing_diffs.contains(&query.commit) {
            return Err(StrataError::QueryFailed(format!(
                "ambiguous argument '{}~1'",
                query.commit
            )));
        }
        if query.name_only {
            return Ok(commit.files.join("\n"));
        }
        let path = query.path.clone().unwrap_or_default();
        Ok(self
            .diffs
            .get(&(query.commit.clone(), path))
            .cloned()
            .unwrap_or_default())
    }

    async fn blame(&self, path: &str, _start: u32, _end: u32) -> Result<String, StrataError> {
        self.check_available()?;
        if self.fail_blame {
            return Err(StrataError::QueryFailed("blame failed".into()));
        }
        Ok(self.blames.get(path).cloned().unwrap_or_default())
    }

    async fn is_tracked(&self, path: &str) -> Result<bool, StrataError> {
        self.check_available()?;
        Ok(self.commits.iter().any(|c| c.files.iter().any(|f| f == path)))
    }
}
