//! Rule-ordered insights and recommendations.
//!
//! Every function here maps already-computed metrics to messages; none of
//! them derive new figures beyond simple counts of their inputs.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use strata_core::{
    CommitRecord, Evidence, FileTimePoint, Insight, Priority, Recommendation, Severity,
};

use crate::heuristics::{
    ActivityTrend, Complexity, ComplexityLevel, HealthBand, HealthMetrics, VelocityBand,
};
use crate::policy;

static FUNCTION_FIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)fix|bug|hotfix|urgent").expect("invalid function fix regex")
});

/// Repository insights in display order: health, bug-fix ratio, hotspots,
/// activity trend, urgent-commit volume.
///
/// The health statement is always present; the rest appear only when their
/// threshold is crossed.
///
/// # Examples
///
/// ```
/// use strata_score::heuristics::HealthMetrics;
/// use strata_score::insights::repository_insights;
///
/// let metrics = HealthMetrics::compute(100, 25, 45, &[10, 10, 10]);
/// let insights = repository_insights(&metrics, 25, 10);
/// let kinds: Vec<_> = insights.iter().map(|i| i.kind.as_str()).collect();
/// assert_eq!(kinds, vec!["health", "quality", "hotspot", "pattern"]);
/// ```
pub fn repository_insights(
    metrics: &HealthMetrics,
    urgent_commits: usize,
    top_file_count: usize,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let health_severity = if metrics.overall_health == HealthBand::Poor {
        Severity::High
    } else {
        Severity::Info
    };
    insights.push(Insight::new(
        "health",
        health_severity,
        format!(
            "Repository health: {} (score: {}/100)",
            metrics.overall_health, metrics.health_score
        ),
    ));

    if metrics.bug_fix_ratio > policy::INSIGHT_BUG_RATIO {
        insights.push(Insight::new(
            "quality",
            Severity::High,
            format!(
                "High bug fix ratio ({}%): quality issues detected",
                metrics.bug_fix_ratio
            ),
        ));
    }

    if metrics.change_concentration > policy::INSIGHT_CONCENTRATION {
        insights.push(Insight::new(
            "hotspot",
            Severity::Medium,
            format!(
                "{}% of changes in top {} files: potential hotspots",
                metrics.change_concentration, top_file_count
            ),
        ));
    }

    match metrics.activity_trend {
        ActivityTrend::Decreasing => insights.push(Insight::new(
            "activity",
            Severity::Medium,
            "Commit activity is decreasing: project may be in maintenance mode",
        )),
        ActivityTrend::Increasing => insights.push(Insight::new(
            "activity",
            Severity::Info,
            "Commit activity is increasing: active development detected",
        )),
        ActivityTrend::Stable => {}
    }

    if urgent_commits > policy::INSIGHT_URGENT_COMMITS {
        insights.push(Insight::new(
            "pattern",
            Severity::High,
            format!("{urgent_commits} urgent/fix commits found: review development process"),
        ));
    }

    insights
}

/// Dead-code scan insights in display order: summary, oldest file,
/// dominant extension.
///
/// `dead` must already be sorted oldest first. Nothing is emitted when it
/// is empty.
pub fn dead_code_insights(
    dead: &[FileTimePoint],
    total_files: usize,
    threshold_days: u64,
) -> Vec<Insight> {
    let Some(oldest) = dead.first() else {
        return Vec::new();
    };

    let percentage = if total_files == 0 {
        0.0
    } else {
        (dead.len() as f64 / total_files as f64 * 1000.0).round() / 10.0
    };

    let mut by_extension: Vec<(String, usize)> = Vec::new();
    for file in dead {
        let ext = extension_label(&file.path);
        match by_extension.iter_mut().find(|(e, _)| *e == ext) {
            Some((_, count)) => *count += 1,
            None => by_extension.push((ext, 1)),
        }
    }
    // First maximum wins, so ties go to the extension seen first.
    let (top_ext, top_count) = by_extension
        .iter()
        .fold(None::<&(String, usize)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
        .cloned()
        .unwrap_or_default();

    vec![
        Insight::new(
            "summary",
            Severity::Medium,
            format!(
                "Found {} files ({percentage:.1}%) untouched for {threshold_days}+ days",
                dead.len()
            ),
        ),
        Insight::new(
            "oldest",
            Severity::Info,
            format!(
                "Oldest untouched file: {} ({} days)",
                oldest.path, oldest.days_ago
            ),
        )
        .with_evidence(vec![Evidence::File(oldest.clone())]),
        Insight::new(
            "pattern",
            Severity::Info,
            format!("Most dead code in {top_ext} files ({top_count} files)"),
        ),
    ]
}

fn extension_label(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| "extensionless".to_string())
}

/// Facts a file recommendation is derived from.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSignals {
    /// Days since the last change, if known.
    pub last_modified_days: Option<u64>,
    /// Days since the file was added, if known.
    pub created_days: Option<u64>,
    pub velocity: Option<VelocityBand>,
    /// Number of code smells detected.
    pub smells: usize,
}

/// File recommendations in display order.
///
/// Unknown ages count as zero days.
///
/// # Examples
///
/// ```
/// use strata_score::heuristics::VelocityBand;
/// use strata_score::insights::{file_recommendations, FileSignals};
///
/// let recs = file_recommendations(&FileSignals {
///     last_modified_days: Some(400),
///     created_days: Some(900),
///     velocity: Some(VelocityBand::Low),
///     smells: 1,
/// });
/// let kinds: Vec<_> = recs.iter().map(|r| r.kind.as_str()).collect();
/// assert_eq!(kinds, vec!["potential_dead_code", "technical_debt"]);
/// ```
pub fn file_recommendations(signals: &FileSignals) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let since_change = signals.last_modified_days.unwrap_or(0);
    let age = signals.created_days.unwrap_or(0);

    if since_change > policy::STALE_FILE_DAYS {
        recs.push(Recommendation::new(
            "potential_dead_code",
            Priority::Medium,
            format!("No changes in {since_change} days: consider if this is still needed"),
        ));
    }

    if signals.velocity == Some(VelocityBand::High) {
        recs.push(Recommendation::new(
            "high_churn",
            Priority::High,
            "High change frequency detected: may indicate instability or unclear requirements",
        ));
    }

    if signals.smells > 0 {
        recs.push(Recommendation::new(
            "technical_debt",
            Priority::High,
            "Technical debt detected: review and refactor recommended",
        ));
    }

    if since_change > policy::MAINTENANCE_MIN_DAYS
        && since_change < policy::STALE_FILE_DAYS
        && age < policy::LEGACY_AGE_DAYS
    {
        recs.push(Recommendation::new(
            "maintenance_needed",
            Priority::Low,
            "File is stable but not actively maintained: ensure it still meets requirements",
        ));
    }

    recs
}

/// Function recommendations in display order.
pub fn function_recommendations(
    complexity: &Complexity,
    contributors: usize,
    related_commits: &[CommitRecord],
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if complexity.level == ComplexityLevel::High {
        recs.push(Recommendation::new(
            "refactor",
            Priority::High,
            format!(
                "High complexity ({}): consider breaking into smaller functions",
                complexity.score
            ),
        ));
    }

    if contributors > policy::CONTRIBUTOR_LIMIT {
        recs.push(Recommendation::new(
            "documentation",
            Priority::Medium,
            format!("{contributors} different contributors: ensure documentation is clear"),
        ));
    }

    if related_commits.len() > policy::FUNCTION_COMMIT_LIMIT {
        recs.push(Recommendation::new(
            "stability",
            Priority::Medium,
            format!(
                "{} commits found: function may have unclear requirements",
                related_commits.len()
            ),
        ));
    }

    let fixes = related_commits
        .iter()
        .filter(|c| FUNCTION_FIX_RE.is_match(&c.message))
        .count();
    if fixes > policy::FUNCTION_FIX_LIMIT {
        recs.push(Recommendation::new(
            "quality",
            Priority::High,
            format!("{fixes} urgent fixes detected: thorough testing recommended"),
        ));
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::estimate_complexity;
    use chrono::DateTime;

    fn metrics(ratio: f64, concentration: f64, trend: ActivityTrend) -> HealthMetrics {
        let score = crate::heuristics::health_score(ratio, concentration, trend);
        HealthMetrics {
            bug_fix_ratio: ratio,
            change_concentration: concentration,
            activity_trend: trend,
            health_score: score,
            overall_health: HealthBand::from_score(score),
        }
    }

    fn point(path: &str, days_ago: u64) -> FileTimePoint {
        FileTimePoint {
            path: path.into(),
            hash: "abcdef0".into(),
            date: DateTime::parse_from_rfc3339("2022-01-01T00:00:00Z").unwrap(),
            days_ago,
            author: "old-timer".into(),
            message: "last touch".into(),
        }
    }

    fn commit(message: &str) -> CommitRecord {
        CommitRecord {
            hash: "c".repeat(40),
            date: DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z").unwrap(),
            author: "dev".into(),
            message: message.into(),
            body: String::new(),
            changes: None,
        }
    }

    #[test]
    fn healthy_repository_only_reports_health() {
        let insights = repository_insights(&metrics(5.0, 20.0, ActivityTrend::Stable), 2, 10);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].message, "Repository health: good (score: 100/100)");
        assert_eq!(insights[0].severity, Severity::Info);
    }

    #[test]
    fn every_rule_fires_in_order() {
        let insights = repository_insights(&metrics(40.0, 80.0, ActivityTrend::Decreasing), 30, 10);
        let kinds: Vec<_> = insights.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(kinds, vec!["health", "quality", "hotspot", "activity", "pattern"]);
        assert_eq!(insights[0].severity, Severity::High);
        assert_eq!(insights[0].message, "Repository health: poor (score: 35/100)");
        assert_eq!(insights[2].message, "80% of changes in top 10 files: potential hotspots");
        assert_eq!(insights[3].severity, Severity::Medium);
    }

    #[test]
    fn insight_thresholds_are_strict() {
        let insights = repository_insights(&metrics(20.0, 40.0, ActivityTrend::Stable), 10, 10);
        assert_eq!(insights.len(), 1);
    }

    #[test]
    fn increasing_activity_is_informational() {
        let insights = repository_insights(&metrics(0.0, 0.0, ActivityTrend::Increasing), 0, 3);
        assert_eq!(insights[1].kind, "activity");
        assert_eq!(insights[1].severity, Severity::Info);
    }

    #[test]
    fn ratio_message_keeps_one_decimal() {
        let insights = repository_insights(&metrics(33.3, 0.0, ActivityTrend::Stable), 0, 0);
        assert_eq!(insights[1].message, "High bug fix ratio (33.3%): quality issues detected");
    }

    #[test]
    fn dead_code_insights_summarize_oldest_and_pattern() {
        let dead = vec![
            point("src/legacy/a.js", 900),
            point("src/legacy/b.py", 800),
            point("src/legacy/c.py", 500),
        ];
        let insights = dead_code_insights(&dead, 8, 365);
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].message, "Found 3 files (37.5%) untouched for 365+ days");
        assert_eq!(insights[1].message, "Oldest untouched file: src/legacy/a.js (900 days)");
        assert_eq!(insights[1].evidence.len(), 1);
        assert_eq!(insights[2].message, "Most dead code in .py files (2 files)");
    }

    #[test]
    fn extension_ties_go_to_first_seen() {
        let dead = vec![point("a.rs", 500), point("b.go", 450)];
        let insights = dead_code_insights(&dead, 2, 365);
        assert_eq!(insights[0].message, "Found 2 files (100.0%) untouched for 365+ days");
        assert_eq!(insights[2].message, "Most dead code in .rs files (1 files)");
    }

    #[test]
    fn no_dead_files_no_insights() {
        assert!(dead_code_insights(&[], 10, 365).is_empty());
    }

    #[test]
    fn fresh_file_has_no_recommendations() {
        let recs = file_recommendations(&FileSignals {
            last_modified_days: Some(3),
            created_days: Some(40),
            velocity: Some(VelocityBand::Medium),
            smells: 0,
        });
        assert!(recs.is_empty());
    }

    #[test]
    fn churning_file_with_smells() {
        let recs = file_recommendations(&FileSignals {
            last_modified_days: Some(1),
            created_days: Some(60),
            velocity: Some(VelocityBand::High),
            smells: 2,
        });
        let kinds: Vec<_> = recs.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["high_churn", "technical_debt"]);
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn maintenance_window_requires_young_file() {
        let young = file_recommendations(&FileSignals {
            last_modified_days: Some(200),
            created_days: Some(400),
            ..FileSignals::default()
        });
        assert_eq!(young.len(), 1);
        assert_eq!(young[0].kind, "maintenance_needed");
        assert_eq!(young[0].priority, Priority::Low);

        let old = file_recommendations(&FileSignals {
            last_modified_days: Some(200),
            created_days: Some(800),
            ..FileSignals::default()
        });
        assert!(old.is_empty());
    }

    #[test]
    fn unknown_ages_count_as_zero() {
        assert!(file_recommendations(&FileSignals::default()).is_empty());
    }

    #[test]
    fn stale_file_message_names_days() {
        let recs = file_recommendations(&FileSignals {
            last_modified_days: Some(366),
            ..FileSignals::default()
        });
        assert_eq!(
            recs[0].message,
            "No changes in 366 days: consider if this is still needed"
        );
    }

    #[test]
    fn function_recommendations_fire_in_order() {
        let complex = estimate_complexity(&"if x && y || z {}\n".repeat(4));
        assert_eq!(complex.level, ComplexityLevel::High);
        let mut related: Vec<_> = (0..8).map(|i| commit(&format!("tweak {i}"))).collect();
        related.extend(["fix a", "bug b", "hotfix c"].map(commit));

        let recs = function_recommendations(&complex, 4, &related);
        let kinds: Vec<_> = recs.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["refactor", "documentation", "stability", "quality"]);
        assert_eq!(recs[0].message, "High complexity (13): consider breaking into smaller functions");
        assert_eq!(recs[3].message, "3 urgent fixes detected: thorough testing recommended");
    }

    #[test]
    fn simple_stable_function_has_no_recommendations() {
        let simple = estimate_complexity("return x;");
        let related = vec![commit("fix typo"), commit("bug"), commit("add")];
        assert!(function_recommendations(&simple, 3, &related).is_empty());
    }
}
