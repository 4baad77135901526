use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use strata_core::{FixedClock, StrataConfig, StrataError};
use strata_dig::function::LineRange;
use strata_dig::Excavator;
use strata_history::source::GitSource;
use strata_narrative::llm::ChatMessage;
use strata_narrative::{NarrativeSource, Narrator};
use strata_score::heuristics::{ActivityTrend, HealthBand, Stability};

fn git(dir: &Path, args: &[&str], author: &str, date: &str) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_AUTHOR_NAME", author)
        .env("GIT_AUTHOR_EMAIL", format!("{author}@example.com"))
        .env("GIT_COMMITTER_NAME", author)
        .env("GIT_COMMITTER_EMAIL", format!("{author}@example.com"))
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn commit_all(dir: &Path, author: &str, date: &str, message: &str) {
    git(dir, &["add", "-A"], author, date);
    git(dir, &["commit", "-q", "-m", message], author, date);
}

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}

const APP_V1: &str = "// app entry\n\nexport function render() {\n  return 'now';\n}\n";

const APP_V2: &str = "\
// app entry

export function parseDate(input) {
  if (!input) {
    return null;
  }
  const d = new Date(input);
  return d;
}

export function render() {
  return parseDate('now');
}
";

const APP_V3: &str = "\
// app entry

export function parseDate(input) {
  if (!input) {
    return null;
  }
  const d = new Date(input);
  return input.endsWith('Z') && d ? d : null;
}

export function render() {
  return parseDate('now');
}
";

const APP_V4: &str = "\
// app entry

export function parseDate(input) {
  if (!input) {
    return null;
  }
  const d = new Date(input);
  return input.endsWith('Z') && d ? d : null;
}

export function render() {
  return parseDate('now') || 'n/a';
}
";

/// Five commits spread over three years. With the clock at 2024-06-01,
/// `src/legacy.js` is 1188 days old, `src/config.py` 300, `src/app.js` 12.
fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    git(root, &["init", "-q"], "alice", "2021-03-01T12:00:00Z");

    write(root, "src/legacy.js", "function old() {\n  return 1;\n}\n");
    write(root, "src/app.js", APP_V1);
    write(root, "README.md", "# demo\n");
    commit_all(root, "alice", "2021-03-01T12:00:00Z", "initial import");

    write(root, "src/config.py", "def load():\n    return {}\n");
    commit_all(root, "dana", "2023-08-06T12:00:00Z", "tweak config loader");

    write(root, "src/app.js", APP_V2);
    commit_all(root, "bob", "2024-01-10T12:00:00Z", "add parseDate helper");

    write(root, "src/app.js", APP_V3);
    commit_all(root, "carol", "2024-04-20T12:00:00Z", "hotfix: parseDate timezone bug");

    write(root, "src/app.js", APP_V4);
    write(root, "README.md", "# demo\n\nrelease notes\n");
    commit_all(root, "bob", "2024-05-20T12:00:00Z", "temporary hack for release");

    dir
}

fn excavator(dir: &Path) -> Excavator<GitSource> {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    Excavator::new(
        dir,
        GitSource::open(dir).unwrap(),
        Arc::new(clock),
        StrataConfig::default(),
    )
}

#[tokio::test]
async fn file_report_combines_history_smells_and_fallback_narrative() {
    let repo = fixture();
    let report = excavator(repo.path())
        .analyze_file("src/app.js", 10)
        .await
        .unwrap();

    assert_eq!(report.metadata.total_commits, 4);
    assert_eq!(report.metadata.unique_authors, 3);
    assert_eq!(report.metadata.created.as_ref().unwrap().days_ago, 1188);
    assert_eq!(report.metadata.last_modified.as_ref().unwrap().days_ago, 12);
    assert_eq!(report.history[0].message, "temporary hack for release");

    let related: Vec<_> = report.related_files.iter().map(|r| r.file.as_str()).collect();
    assert_eq!(related, vec!["README.md"]);

    let urgent: Vec<_> = report.urgent_commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
        urgent,
        vec!["temporary hack for release", "hotfix: parseDate timezone bug"]
    );

    let smells: Vec<_> = report.code_smells.iter().map(|i| i.kind.as_str()).collect();
    assert_eq!(smells, vec!["panic_driven", "technical_debt"]);
    let recs: Vec<_> = report.recommendations.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(recs, vec!["technical_debt"]);

    assert_eq!(report.narrative.source, NarrativeSource::Fallback);
    assert_eq!(report.narrative.summary, "Legacy code (2+ years old)");

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["metadata"]["totalCommits"], 4);
    assert!(json["stats"]["totalAdded"].is_number());
}

#[tokio::test]
async fn file_report_errors() {
    let repo = fixture();
    let dig = excavator(repo.path());

    let missing = dig.analyze_file("src/nope.js", 10).await.unwrap_err();
    assert!(matches!(missing, StrataError::FileNotFound(_)));

    write(repo.path(), "src/scratch.js", "let x;\n");
    let untracked = dig.analyze_file("src/scratch.js", 10).await.unwrap_err();
    assert!(matches!(untracked, StrataError::SourceUnavailable(_)));
}

#[tokio::test]
async fn function_report_from_blame_and_related_commits() {
    let repo = fixture();
    let report = excavator(repo.path())
        .analyze_function("src/app.js", "parseDate", None)
        .await
        .unwrap();

    assert_eq!(report.function.line_range, "3-9");
    assert_eq!(report.function.line_count, 7);
    assert_eq!(report.metrics.complexity.score, 4);
    assert_eq!(report.metrics.contributors, 2);
    assert_eq!(report.metrics.stability, Stability::FewChanges);

    let authors: Vec<_> = report
        .blame
        .iter()
        .filter_map(|b| b.author.as_deref())
        .collect();
    assert!(authors.contains(&"bob"));
    assert!(authors.contains(&"carol"));

    let related: Vec<_> = report.related_commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
        related,
        vec!["hotfix: parseDate timezone bug", "add parseDate helper"]
    );
    assert!(report.recommendations.is_empty());
    assert_eq!(
        report.narrative.summary,
        "parseDate was introduced on 2024-01-10 (add parseDate helper).\n\
         Last modified 2024-04-20 (hotfix: parseDate timezone bug).\n\
         Total commits: 2."
    );
}

#[tokio::test]
async fn function_by_line_range_and_missing_function() {
    let repo = fixture();
    let dig = excavator(repo.path());

    let report = dig
        .analyze_function("src/app.js", "render", Some(LineRange { start: 11, end: 13 }))
        .await
        .unwrap();
    assert!(report.function.code.contains("parseDate('now') || 'n/a'"));

    let err = dig
        .analyze_function("src/app.js", "missing", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::FunctionNotFound { .. }));
}

#[tokio::test]
async fn function_in_untracked_file_is_source_unavailable() {
    let repo = fixture();
    let dig = excavator(repo.path());
    write(repo.path(), "src/untracked.js", "function ghost() {\n  return 1;\n}\n");

    let err = dig
        .analyze_function("src/untracked.js", "ghost", None)
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::SourceUnavailable(_)), "{err:?}");
}

#[tokio::test]
async fn function_history_depth_follows_search_depth() {
    let repo = fixture();
    let mut config = StrataConfig::default();
    config.history.search_depth = 1;
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    let dig = Excavator::new(
        repo.path(),
        GitSource::open(repo.path()).unwrap(),
        Arc::new(clock),
        config,
    );

    let report = dig
        .analyze_function("src/app.js", "parseDate", None)
        .await
        .unwrap();
    // Only the newest commit is sampled, and it neither names parseDate
    // nor changes more than ten lines.
    assert!(report.related_commits.is_empty());
}

#[tokio::test]
async fn dead_code_scan_classifies_by_age() {
    let repo = fixture();
    let report = excavator(repo.path())
        .scan_dead_code(Path::new("src"), true, 365)
        .await
        .unwrap();

    assert_eq!(report.total_files, 3);
    let dead: Vec<_> = report.dead_code.iter().map(|f| f.path.as_str()).collect();
    let suspicious: Vec<_> = report.suspicious.iter().map(|f| f.path.as_str()).collect();
    let active: Vec<_> = report.active.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(dead, vec!["src/legacy.js"]);
    assert_eq!(suspicious, vec!["src/config.py"]);
    assert_eq!(active, vec!["src/app.js"]);
    assert_eq!(report.dead_code[0].days_ago, 1188);
    assert_eq!(report.suspicious[0].days_ago, 300);

    let kinds: Vec<_> = report.insights.iter().map(|i| i.kind.as_str()).collect();
    assert_eq!(kinds, vec!["summary", "oldest", "pattern"]);
    assert_eq!(
        report.insights[0].message,
        "Found 1 files (33.3%) untouched for 365+ days"
    );
    assert_eq!(report.insights[2].message, "Most dead code in .js files (1 files)");
}

#[tokio::test]
async fn dead_code_scan_skips_files_without_history() {
    let repo = fixture();
    write(repo.path(), "src/new.js", "let fresh;\n");
    let report = excavator(repo.path())
        .scan_dead_code(Path::new("src"), false, 1000)
        .await
        .unwrap();

    assert_eq!(report.total_files, 4);
    assert_eq!(report.dead_code.len(), 1);
    assert!(report.suspicious.is_empty());
    assert_eq!(report.active.len(), 2);
}

#[tokio::test]
async fn repository_report_scores_health() {
    let repo = fixture();
    let report = excavator(repo.path())
        .analyze_repository(None, 2)
        .await
        .unwrap();

    assert_eq!(report.summary.total_commits, 5);
    assert_eq!(report.summary.unique_authors, 4);
    assert_eq!(
        report.summary.date_range.from.unwrap().to_rfc3339(),
        "2021-03-01T12:00:00+00:00"
    );

    let files: Vec<_> = report
        .top_files
        .iter()
        .map(|f| (f.file.as_str(), f.commits))
        .collect();
    assert_eq!(files, vec![("src/app.js", 3), ("README.md", 1)]);
    assert_eq!(report.top_contributors[0].author, "bob");
    assert_eq!(report.top_contributors[0].commits, 2);

    let months: Vec<_> = report.timeline.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(
        months,
        vec!["2021-03", "2023-08", "2024-01", "2024-04", "2024-05"]
    );

    let health = &report.health_metrics;
    assert_eq!(health.bug_fix_ratio, 20.0);
    assert_eq!(health.change_concentration, 80.0);
    assert_eq!(health.activity_trend, ActivityTrend::Stable);
    assert_eq!(health.health_score, 70);
    assert_eq!(health.overall_health, HealthBand::Fair);

    let kinds: Vec<_> = report.insights.iter().map(|i| i.kind.as_str()).collect();
    assert_eq!(kinds, vec!["health", "hotspot"]);
    assert_eq!(report.urgent_commits.len(), 1);
}

#[tokio::test]
async fn repository_report_since_date() {
    let repo = fixture();
    let report = excavator(repo.path())
        .analyze_repository(Some("2024-01-01"), 10)
        .await
        .unwrap();
    assert_eq!(report.summary.total_commits, 3);
    assert_eq!(report.summary.unique_authors, 2);
}

struct Canned;

#[async_trait]
impl Narrator for Canned {
    async fn narrate(&self, _messages: &[ChatMessage]) -> Result<String, StrataError> {
        Ok("**Original Purpose**: entry point\n**Red Flags**: rushed hotfix".into())
    }
}

#[tokio::test]
async fn configured_narrator_replaces_fallback() {
    let repo = fixture();
    let dig = excavator(repo.path()).with_narrator(Box::new(Canned));
    let report = dig.analyze_file("src/app.js", 10).await.unwrap();

    assert_eq!(report.narrative.source, NarrativeSource::Llm);
    let sections = report.narrative.sections.unwrap();
    assert_eq!(sections.purpose, "entry point");
    assert_eq!(sections.red_flags, "rushed hotfix");
}

#[tokio::test]
async fn reports_render_as_text_markdown_and_json() {
    let repo = fixture();
    let dig = excavator(repo.path());

    let file = dig.analyze_file("src/app.js", 10).await.unwrap();
    let text = file.to_string();
    assert!(text.starts_with("File Analysis: src/app.js\n"));
    assert!(text.contains("Commits: 4 | Authors: 3"));
    assert!(text.contains("Frequently Changed Together\n  README.md (1 commits)"));
    assert!(file.to_markdown().contains("## Recent Commits"));

    let json = serde_json::to_value(&file).unwrap();
    assert_eq!(json["metadata"]["totalCommits"], 4);
    assert_eq!(json["narrative"]["source"], "fallback");
    assert!(json["stats"]["totalAdded"].is_u64());

    let repo_report = dig.analyze_repository(None, 2).await.unwrap();
    let text = repo_report.to_string();
    assert!(text.contains("Overall: fair (70/100)"));
    assert!(text.contains(" 1. src/app.js (3 commits)"));
    assert!(repo_report.to_markdown().contains("| `src/app.js` | 3 |"));
}
