use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::Serialize;
use strata_core::{BlameEntry, CommitRecord, Recommendation, StrataError};
use strata_history::source::HistorySource;
use strata_narrative::{explain_function, FunctionNarrative};
use strata_score::heuristics::{estimate_complexity, Complexity, Stability};
use strata_score::insights::function_recommendations;
use tracing::info;

use crate::Excavator;

/// Lines changed above which a commit counts as related even when its
/// message does not name the function.
const RELATED_CHURN: u64 = 10;
const REPORT_BLAME: usize = 5;
const REPORT_RELATED: usize = 10;

/// An inclusive, 1-based line range such as `10-50`.
///
/// # Examples
///
/// ```
/// use strata_dig::function::LineRange;
///
/// let range: LineRange = "10-50".parse().unwrap();
/// assert_eq!((range.start, range.end), (10, 50));
/// assert!("50-10".parse::<LineRange>().is_err());
/// assert!("0-3".parse::<LineRange>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl FromStr for LineRange {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StrataError::Parse(format!("invalid line range '{s}', expected START-END"));
        let (start, end) = s.split_once('-').ok_or_else(invalid)?;
        let start: u32 = start.trim().parse().map_err(|_| invalid())?;
        let end: u32 = end.trim().parse().map_err(|_| invalid())?;
        if start == 0 || end < start {
            return Err(invalid());
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Where a function sits in its file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionLocation {
    pub start_line: u32,
    pub end_line: u32,
    pub code: String,
}

fn declaration_patterns(name: &str) -> Vec<Regex> {
    let name = regex::escape(name);
    [
        format!(r"function\s+{name}\s*\("),
        format!(r"const\s+{name}\s*="),
        format!(r"{name}\s*:\s*function"),
        format!(r"{name}\s*\([^)]*\)\s*\{{"),
        format!(r"def\s+{name}\s*\("),
        format!(r"public.*\s+{name}\s*\("),
        format!(r"fn\s+{name}\s*[<(]"),
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
}

/// Find a function in `content`.
///
/// With `range`, those lines are taken as the function. Otherwise the first
/// line matching a declaration of `name` (JavaScript, Python, Java/C#, or
/// Rust forms) starts the function, and it ends on the line where braces
/// opened from there balance again. A declaration whose braces never open
/// or never close is a single line.
///
/// # Examples
///
/// ```
/// use strata_dig::function::locate_function;
///
/// let src = "const a = 1;\nfunction add(x, y) {\n  return x + y;\n}\n";
/// let found = locate_function(src, "add", None).unwrap();
/// assert_eq!((found.start_line, found.end_line), (2, 4));
/// assert!(locate_function(src, "sub", None).is_none());
/// ```
pub fn locate_function(
    content: &str,
    name: &str,
    range: Option<LineRange>,
) -> Option<FunctionLocation> {
    let lines: Vec<&str> = content.lines().collect();

    if let Some(range) = range {
        let from = (range.start as usize - 1).min(lines.len());
        let to = (range.end as usize).min(lines.len());
        return Some(FunctionLocation {
            start_line: range.start,
            end_line: range.end,
            code: lines[from..to].join("\n"),
        });
    }

    let patterns = declaration_patterns(name);
    let start = lines
        .iter()
        .position(|line| patterns.iter().any(|p| p.is_match(line)))?;

    let mut end = start;
    let mut depth: i64 = 0;
    let mut opened = false;
    for (i, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth == 0 {
            end = i;
            break;
        }
    }

    Some(FunctionLocation {
        start_line: start as u32 + 1,
        end_line: end as u32 + 1,
        code: lines[start..=end].join("\n"),
    })
}

/// Heuristic measurements of a function.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMetrics {
    /// Approximate cyclomatic complexity of the body.
    pub complexity: Complexity,
    /// Banded from the number of related commits.
    pub stability: Stability,
    /// Distinct authors attributed by blame.
    pub contributors: usize,
    /// Date of the newest related commit.
    pub last_modified: Option<DateTime<FixedOffset>>,
}

/// The located function.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    pub name: String,
    pub line_range: String,
    pub line_count: u32,
    pub code: String,
}

/// Result of [`Excavator::analyze_function`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionReport {
    pub file: String,
    pub function: FunctionInfo,
    pub metrics: FunctionMetrics,
    pub blame: Vec<BlameEntry>,
    pub related_commits: Vec<CommitRecord>,
    pub narrative: FunctionNarrative,
    pub recommendations: Vec<Recommendation>,
}

/// Commits likely to have touched `name`: the message mentions it, or the
/// commit changed more than a handful of lines in the file.
fn related_commits(history: &[CommitRecord], name: &str) -> Vec<CommitRecord> {
    let needle = name.to_lowercase();
    history
        .iter()
        .filter(|c| c.message.to_lowercase().contains(&needle) || c.churn() > RELATED_CHURN)
        .cloned()
        .collect()
}

impl<S: HistorySource> Excavator<S> {
    /// Explain a single function in `path`, found by name or by `range`.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::FileNotFound`] if `path` does not exist,
    /// [`StrataError::SourceUnavailable`] if it is not tracked,
    /// [`StrataError::FunctionNotFound`] if no declaration matches, and
    /// propagates mandatory history query failures.
    pub async fn analyze_function(
        &self,
        path: &str,
        name: &str,
        range: Option<LineRange>,
    ) -> Result<FunctionReport, StrataError> {
        let full_path = self.root.join(path);
        if !full_path.is_file() {
            return Err(StrataError::FileNotFound(PathBuf::from(path)));
        }
        if !self.history.is_tracked(path).await? {
            return Err(StrataError::SourceUnavailable(format!(
                "{path} is not tracked by git"
            )));
        }
        let content = tokio::fs::read_to_string(&full_path).await?;
        let location =
            locate_function(&content, name, range).ok_or_else(|| StrataError::FunctionNotFound {
                name: name.to_string(),
                path: PathBuf::from(path),
            })?;

        info!(
            path,
            function = name,
            start = location.start_line,
            end = location.end_line,
            "analyzing function"
        );
        let (mut blame, history) = tokio::try_join!(
            self.history
                .blame(path, location.start_line, location.end_line),
            self.history
                .file_history(path, self.history.config().search_depth, true),
        )?;

        let mut related = related_commits(&history, name);
        let contributors = blame
            .iter()
            .filter_map(|b| b.author.as_deref())
            .collect::<HashSet<_>>()
            .len();
        let metrics = FunctionMetrics {
            complexity: estimate_complexity(&location.code),
            stability: Stability::from_commit_count(related.len()),
            contributors,
            last_modified: related.first().map(|c| c.date),
        };

        let narrative = explain_function(self.narrator(), name, &related).await;
        let recommendations = function_recommendations(&metrics.complexity, contributors, &related);

        blame.truncate(REPORT_BLAME);
        related.truncate(REPORT_RELATED);

        Ok(FunctionReport {
            file: path.to_string(),
            function: FunctionInfo {
                name: name.to_string(),
                line_range: format!("{}-{}", location.start_line, location.end_line),
                line_count: location.end_line.saturating_sub(location.start_line) + 1,
                code: location.code,
            },
            metrics,
            blame,
            related_commits: related,
            narrative,
            recommendations,
        })
    }
}
