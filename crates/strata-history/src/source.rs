//! Version-control query boundary.
//!
//! [`HistorySource`] names the four query shapes the rest of the crate needs
//! (log, diff, blame, tracked-file check). [`GitSource`] answers them by
//! running the `git` CLI; tests substitute in-memory sources.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use strata_core::{CommitRecord, StrataError};
use tokio::process::Command;
use tracing::debug;

use crate::parser::{parse_log, LOG_FORMAT};

/// Restricts a log query to commits with a given kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffFilter {
    /// Commits that added the path.
    Added,
}

impl DiffFilter {
    fn as_arg(self) -> &'static str {
        match self {
            DiffFilter::Added => "A",
        }
    }
}

/// Parameters for a `git log` query.
///
/// # Examples
///
/// ```
/// use strata_history::source::{DiffFilter, LogQuery};
///
/// let query = LogQuery::for_path("src/lib.rs").max_count(10);
/// assert_eq!(query.path.as_deref(), Some("src/lib.rs"));
/// assert_eq!(query.max_count, Some(10));
///
/// let created = LogQuery::for_path("src/lib.rs").diff_filter(DiffFilter::Added);
/// assert_eq!(created.diff_filter, Some(DiffFilter::Added));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// Only commits touching this path; `None` for the whole repository.
    pub path: Option<String>,
    /// Upper bound on returned commits.
    pub max_count: Option<usize>,
    /// Only commits after this date expression (anything `git --since` accepts).
    pub since: Option<String>,
    /// Only commits with this kind of change to `path`.
    pub diff_filter: Option<DiffFilter>,
}

impl LogQuery {
    /// Query the whole repository.
    pub fn repository() -> Self {
        Self::default()
    }

    /// Query commits touching `path`.
    pub fn for_path(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::default()
        }
    }

    pub fn max_count(mut self, count: usize) -> Self {
        self.max_count = Some(count);
        self
    }

    pub fn since(mut self, since: Option<&str>) -> Self {
        self.since = since.map(String::from);
        self
    }

    pub fn diff_filter(mut self, filter: DiffFilter) -> Self {
        self.diff_filter = Some(filter);
        self
    }
}

/// Parameters for a `git diff <commit>~1 <commit>` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffQuery {
    /// Commit compared against its first parent.
    pub commit: String,
    /// Restrict the diff to this path.
    pub path: Option<String>,
    /// List changed paths instead of content.
    pub name_only: bool,
}

impl DiffQuery {
    /// Content diff of `path` in `commit`.
    pub fn content(commit: &str, path: &str) -> Self {
        Self {
            commit: commit.to_string(),
            path: Some(path.to_string()),
            name_only: false,
        }
    }

    /// Every path changed in `commit`.
    pub fn names(commit: &str) -> Self {
        Self {
            commit: commit.to_string(),
            path: None,
            name_only: true,
        }
    }
}

/// Read-only access to a repository's history.
///
/// Implementations must not mutate repository state. An empty result is not
/// an error: a path with no matching commits yields `Ok(vec![])`.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Commits matching `query`, newest first.
    async fn log(&self, query: &LogQuery) -> Result<Vec<CommitRecord>, StrataError>;

    /// Raw diff text (or a name list) for one commit against its parent.
    async fn diff(&self, query: &DiffQuery) -> Result<String, StrataError>;

    /// Raw `--line-porcelain` blame text for an inclusive 1-based line range.
    async fn blame(&self, path: &str, start: u32, end: u32) -> Result<String, StrataError>;

    /// Whether `path` is tracked by version control.
    async fn is_tracked(&self, path: &str) -> Result<bool, StrataError>;

    /// `path` spelled the way name-only diffs print it: relative to the
    /// repository root, without `./` segments.
    async fn repo_path(&self, path: &str) -> Result<String, StrataError> {
        Ok(normalize_path(path))
    }
}

/// Drop `./` segments and repeated separators from a relative path.
///
/// # Examples
///
/// ```
/// use strata_history::source::normalize_path;
///
/// assert_eq!(normalize_path("./src//app.js"), "src/app.js");
/// assert_eq!(normalize_path("src/./lib.rs"), "src/lib.rs");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// [`HistorySource`] backed by the `git` command-line tool.
///
/// Paths are interpreted relative to the directory the source was opened at.
#[derive(Debug, Clone)]
pub struct GitSource {
    workdir: PathBuf,
}

impl GitSource {
    /// Open the repository containing `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::SourceUnavailable`] if `dir` is not inside a
    /// git repository.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use strata_history::source::GitSource;
    ///
    /// let source = GitSource::open(Path::new(".")).unwrap();
    /// assert_eq!(source.workdir(), Path::new("."));
    /// ```
    pub fn open(dir: &Path) -> Result<Self, StrataError> {
        git2::Repository::discover(dir).map_err(|e| {
            StrataError::SourceUnavailable(format!(
                "{} is not inside a git repository: {}",
                dir.display(),
                e.message()
            ))
        })?;
        Ok(Self {
            workdir: dir.to_path_buf(),
        })
    }

    /// Directory `git` is run from.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn git(&self, args: &[String]) -> Result<Output, StrataError> {
        debug!(workdir = %self.workdir.display(), ?args, "running git");
        Command::new("git")
            .arg("-c")
            .arg("core.quotepath=off")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| StrataError::SourceUnavailable(format!("failed to run git: {e}")))
    }

    async fn git_stdout(&self, args: Vec<String>) -> Result<String, StrataError> {
        let output = self.git(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StrataError::QueryFailed(format!(
                "git {} exited with {}: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl HistorySource for GitSource {
    async fn log(&self, query: &LogQuery) -> Result<Vec<CommitRecord>, StrataError> {
        let stdout = self.git_stdout(log_args(query)).await?;
        parse_log(&stdout)
    }

    async fn diff(&self, query: &DiffQuery) -> Result<String, StrataError> {
        self.git_stdout(diff_args(query)).await
    }

    async fn blame(&self, path: &str, start: u32, end: u32) -> Result<String, StrataError> {
        self.git_stdout(vec![
            "blame".into(),
            "-L".into(),
            format!("{start},{end}"),
            "--line-porcelain".into(),
            "--".into(),
            path.into(),
        ])
        .await
    }

    async fn is_tracked(&self, path: &str) -> Result<bool, StrataError> {
        let args: Vec<String> = vec![
            "ls-files".into(),
            "--error-unmatch".into(),
            "--".into(),
            path.into(),
        ];
        let output = self.git(&args).await?;
        Ok(output.status.success())
    }

    async fn repo_path(&self, path: &str) -> Result<String, StrataError> {
        let stdout = self
            .git_stdout(vec![
                "ls-files".into(),
                "--full-name".into(),
                "--".into(),
                path.into(),
            ])
            .await?;
        Ok(stdout
            .lines()
            .next()
            .map(String::from)
            .unwrap_or_else(|| normalize_path(path)))
    }
}

fn log_args(query: &LogQuery) -> Vec<String> {
    let mut args = vec!["log".to_string(), format!("--format={LOG_FORMAT}")];
    if let Some(count) = query.max_count {
        args.push(format!("--max-count={count}"));
    }
    if let Some(since) = &query.since {
        args.push(format!("--since={since}"));
    }
    if let Some(filter) = query.diff_filter {
        args.push(format!("--diff-filter={}", filter.as_arg()));
    }
    if let Some(path) = &query.path {
        args.push("--".into());
        args.push(path.clone());
    }
    args
}

fn diff_args(query: &DiffQuery) -> Vec<String> {
    let mut args = vec![
        "diff".to_string(),
        "--no-color".into(),
        "--no-ext-diff".into(),
    ];
    if query.name_only {
        args.push("--name-only".into());
    }
    args.push(format!("{}~1", query.commit));
    args.push(query.commit.clone());
    if let Some(path) = &query.path {
        args.push("--".into());
        args.push(path.clone());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_args_for_path_with_limits() {
        let query = LogQuery::for_path("src/a.rs").max_count(5).since(Some("2024-01-01"));
        let args = log_args(&query);
        assert_eq!(args[0], "log");
        assert!(args.contains(&"--max-count=5".to_string()));
        assert!(args.contains(&"--since=2024-01-01".to_string()));
        assert_eq!(&args[args.len() - 2..], ["--", "src/a.rs"]);
    }

    #[test]
    fn log_args_for_creation_use_added_filter() {
        let args = log_args(&LogQuery::for_path("x").diff_filter(DiffFilter::Added));
        assert!(args.contains(&"--diff-filter=A".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--max-count")));
    }

    #[test]
    fn repository_log_has_no_pathspec() {
        let args = log_args(&LogQuery::repository());
        assert!(!args.contains(&"--".to_string()));
    }

    #[test]
    fn diff_args_compare_against_first_parent() {
        let args = diff_args(&DiffQuery::content("abc123", "lib.rs"));
        assert!(args.contains(&"abc123~1".to_string()));
        assert!(args.contains(&"abc123".to_string()));
        assert!(!args.contains(&"--name-only".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("lib.rs"));

        let names = diff_args(&DiffQuery::names("abc123"));
        assert!(names.contains(&"--name-only".to_string()));
        assert!(!names.contains(&"--".to_string()));
    }

    #[test]
    fn open_outside_repository_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        match GitSource::open(dir.path()) {
            Err(StrataError::SourceUnavailable(msg)) => {
                assert!(msg.contains("not inside a git repository"));
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }
    }
}
