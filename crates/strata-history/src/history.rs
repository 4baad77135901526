//! Per-file commit timelines built on a [`HistorySource`].
//!
//! The builder pairs a source with an injected [`Clock`] so every age it
//! reports is measured from the same instant.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use strata_core::{
    BlameEntry, ChangeStat, Clock, CommitRecord, FileTimePoint, HistoryConfig, StrataError,
};
use tracing::{debug, warn};

use crate::aggregate::CountBucket;
use crate::parser::{parse_blame, parse_diff, parse_name_only};
use crate::source::{normalize_path, DiffFilter, DiffQuery, HistorySource, LogQuery};

/// A file changed in the same commit as the file under analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFile {
    /// Path of the co-changed file.
    pub file: String,
    /// Number of sampled commits that touched both files.
    pub commits: usize,
}

/// Everything the file analysis needs, gathered in one concurrent round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDossier {
    /// Newest-first history with per-commit change stats.
    pub history: Vec<CommitRecord>,
    /// Commit that added the file, if it could be found.
    pub created: Option<FileTimePoint>,
    /// Newest commit touching the file.
    pub last_modified: Option<FileTimePoint>,
    /// Files most often changed alongside this one.
    pub related_files: Vec<RelatedFile>,
    /// Recent commits whose message matches a configured keyword.
    pub keyword_commits: Vec<CommitRecord>,
}

/// Builds commit timelines for individual files.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use strata_core::{HistoryConfig, SystemClock};
/// use strata_history::history::HistoryBuilder;
/// use strata_history::source::GitSource;
///
/// # async fn run() -> strata_core::Result<()> {
/// let source = GitSource::open(Path::new("."))?;
/// let builder = HistoryBuilder::new(source, Arc::new(SystemClock), HistoryConfig::default());
/// let history = builder.file_history("src/main.rs", 10, true).await?;
/// for commit in &history {
///     println!("{} {}", commit.short_hash(), commit.message);
/// }
/// # Ok(())
/// # }
/// ```
pub struct HistoryBuilder<S> {
    source: S,
    clock: Arc<dyn Clock>,
    config: HistoryConfig,
}

impl<S: HistorySource> HistoryBuilder<S> {
    pub fn new(source: S, clock: Arc<dyn Clock>, config: HistoryConfig) -> Self {
        Self {
            source,
            clock,
            config,
        }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The instant ages are measured from.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Up to `depth` commits touching `path`, newest first.
    ///
    /// With `include_stats`, each commit also carries the line counts of its
    /// diff against its parent. A stat query that fails (the root commit has
    /// no parent) leaves that commit at zero rather than failing the history.
    ///
    /// # Errors
    ///
    /// Propagates a failed log query.
    pub async fn file_history(
        &self,
        path: &str,
        depth: usize,
        include_stats: bool,
    ) -> Result<Vec<CommitRecord>, StrataError> {
        let mut commits = self
            .source
            .log(&LogQuery::for_path(path).max_count(depth))
            .await?;
        if !include_stats || commits.is_empty() {
            return Ok(commits);
        }

        let stats: Vec<Result<ChangeStat, StrataError>> = stream::iter(commits.iter())
            .map(|commit| self.change_stat(&commit.hash, path))
            .buffered(self.config.stat_concurrency.max(1))
            .collect()
            .await;

        for (commit, stat) in commits.iter_mut().zip(stats) {
            commit.changes = Some(stat?);
        }
        Ok(commits)
    }

    async fn change_stat(&self, hash: &str, path: &str) -> Result<ChangeStat, StrataError> {
        match self.source.diff(&DiffQuery::content(hash, path)).await {
            Ok(text) => Ok(parse_diff(&text)),
            Err(e) if !e.is_fatal() => {
                debug!(commit = %short(hash), path, error = %e, "no change stat, using zero");
                Ok(ChangeStat::default())
            }
            Err(e) => Err(e),
        }
    }

    /// The commit that added `path`, or `None` if no add event is recorded.
    ///
    /// # Errors
    ///
    /// A failed query yields `Ok(None)`; only fatal errors propagate.
    pub async fn creation_info(&self, path: &str) -> Result<Option<FileTimePoint>, StrataError> {
        let query = LogQuery::for_path(path).diff_filter(DiffFilter::Added);
        let commits = match self.source.log(&query).await {
            Ok(commits) => commits,
            Err(e) if !e.is_fatal() => {
                warn!(path, error = %e, "creation lookup failed");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let now = self.now();
        Ok(commits
            .last()
            .map(|c| FileTimePoint::from_commit(path, c, now)))
    }

    /// The newest commit touching `path`.
    ///
    /// # Errors
    ///
    /// A failed query yields `Ok(None)`; only fatal errors propagate.
    pub async fn last_modification(
        &self,
        path: &str,
    ) -> Result<Option<FileTimePoint>, StrataError> {
        let commits = match self.source.log(&LogQuery::for_path(path).max_count(1)).await {
            Ok(commits) => commits,
            Err(e) if !e.is_fatal() => {
                warn!(path, error = %e, "last modification lookup failed");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let now = self.now();
        Ok(commits
            .first()
            .map(|c| FileTimePoint::from_commit(path, c, now)))
    }

    /// Recent commits to `path` whose message or body contains any keyword.
    ///
    /// Matching is a case-insensitive substring test over the last
    /// `search_depth` commits.
    ///
    /// # Errors
    ///
    /// Propagates a failed log query.
    pub async fn search_commits(
        &self,
        path: &str,
        keywords: &[String],
    ) -> Result<Vec<CommitRecord>, StrataError> {
        let commits = self
            .source
            .log(&LogQuery::for_path(path).max_count(self.config.search_depth))
            .await?;
        let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        Ok(commits
            .into_iter()
            .filter(|c| {
                let text = c.full_text().to_lowercase();
                keywords.iter().any(|k| text.contains(k.as_str()))
            })
            .collect())
    }

    /// Files changed together with `path`, most frequent first.
    ///
    /// Samples the last `related_depth` commits touching `path`. Ties keep
    /// the order in which files were first seen. Commits whose file list
    /// cannot be read are skipped. `path` itself is never listed, however
    /// it is spelled.
    ///
    /// # Errors
    ///
    /// A failed log query yields an empty list; only fatal errors propagate.
    pub async fn related_files(
        &self,
        path: &str,
        limit: usize,
    ) -> Result<Vec<RelatedFile>, StrataError> {
        let query = LogQuery::for_path(path).max_count(self.config.related_depth);
        let commits = match self.source.log(&query).await {
            Ok(commits) => commits,
            Err(e) if !e.is_fatal() => {
                warn!(path, error = %e, "related files lookup failed");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        if commits.is_empty() {
            return Ok(Vec::new());
        }
        let own_path = match self.source.repo_path(path).await {
            Ok(own) => own,
            Err(e) if !e.is_fatal() => {
                debug!(path, error = %e, "could not resolve repository path");
                normalize_path(path)
            }
            Err(e) => return Err(e),
        };

        let file_lists: Vec<Result<Option<Vec<String>>, StrataError>> =
            stream::iter(commits.iter())
                .map(|commit| async move {
                    match self.source.diff(&DiffQuery::names(&commit.hash)).await {
                        Ok(text) => Ok(Some(parse_name_only(&text))),
                        Err(e) if !e.is_fatal() => {
                            debug!(commit = %commit.short_hash(), error = %e, "skipping commit");
                            Ok(None)
                        }
                        Err(e) => Err(e),
                    }
                })
                .buffered(self.config.stat_concurrency.max(1))
                .collect()
                .await;

        let mut bucket = CountBucket::new();
        for files in file_lists {
            for file in files?.unwrap_or_default() {
                if file != own_path {
                    bucket.increment(&file);
                }
            }
        }
        Ok(bucket
            .top_n(limit)
            .into_iter()
            .map(|(file, commits)| RelatedFile { file, commits })
            .collect())
    }

    /// Commits attributed to lines `start..=end` of `path`, one per commit,
    /// in order of first appearance.
    ///
    /// # Errors
    ///
    /// A failed blame yields an empty list; only fatal errors propagate.
    pub async fn blame(
        &self,
        path: &str,
        start: u32,
        end: u32,
    ) -> Result<Vec<BlameEntry>, StrataError> {
        let text = match self.source.blame(path, start, end).await {
            Ok(text) => text,
            Err(e) if !e.is_fatal() => {
                warn!(path, start, end, error = %e, "blame failed");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let mut seen = HashSet::new();
        Ok(parse_blame(&text)
            .into_iter()
            .filter(|entry| seen.insert(entry.hash.clone()))
            .collect())
    }

    /// Whether `path` is tracked by version control.
    pub async fn is_tracked(&self, path: &str) -> Result<bool, StrataError> {
        self.source.is_tracked(path).await
    }

    /// Gather history, creation, last modification, related files, and
    /// keyword commits for `path` concurrently.
    ///
    /// # Errors
    ///
    /// The first propagated error from any of the five queries aborts the
    /// whole group.
    pub async fn dossier(&self, path: &str, depth: usize) -> Result<FileDossier, StrataError> {
        let (history, created, last_modified, related_files, keyword_commits) = tokio::try_join!(
            self.file_history(path, depth, true),
            self.creation_info(path),
            self.last_modification(path),
            self.related_files(path, self.config.related_limit),
            self.search_commits(path, &self.config.keywords),
        )?;
        Ok(FileDossier {
            history,
            created,
            last_modified,
            related_files,
            keyword_commits,
        })
    }
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(7)]
}
