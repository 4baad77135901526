//! Threshold and ratio rules over aggregated history.
//!
//! Everything here is a pure function of counts and dates; no queries are
//! issued. Cutoffs come from [`crate::policy`].

use std::fmt;

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strata_core::CommitRecord;

use crate::policy;

/// Age classification of a file in a dead-code scan.
///
/// # Examples
///
/// ```
/// use strata_score::heuristics::{classify_age, DeadCodeStatus};
///
/// assert_eq!(classify_age(400, 365), DeadCodeStatus::Dead);
/// assert_eq!(classify_age(300, 365), DeadCodeStatus::Suspicious);
/// assert_eq!(classify_age(100, 365), DeadCodeStatus::Active);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadCodeStatus {
    /// Untouched for longer than the threshold.
    Dead,
    /// Past [`policy::SUSPICIOUS_FACTOR`] of the threshold.
    Suspicious,
    Active,
}

/// Classify a file last touched `days_ago` days ago against `threshold_days`.
///
/// Monotonic in age: a larger `days_ago` never yields a "younger" status.
pub fn classify_age(days_ago: u64, threshold_days: u64) -> DeadCodeStatus {
    if days_ago > threshold_days {
        DeadCodeStatus::Dead
    } else if days_ago as f64 > threshold_days as f64 * policy::SUSPICIOUS_FACTOR {
        DeadCodeStatus::Suspicious
    } else {
        DeadCodeStatus::Active
    }
}

/// Months (of [`policy::DAYS_PER_MONTH`] days) from `oldest` to `newest`.
///
/// Negative when `newest` precedes `oldest`.
pub fn months_between(oldest: DateTime<FixedOffset>, newest: DateTime<FixedOffset>) -> f64 {
    let seconds = (newest.timestamp() - oldest.timestamp()) as f64;
    seconds / (86_400.0 * policy::DAYS_PER_MONTH)
}

/// Velocity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityBand {
    Low,
    Medium,
    High,
}

impl VelocityBand {
    pub fn from_value(commits_per_month: f64) -> Self {
        if commits_per_month > policy::VELOCITY_HIGH {
            VelocityBand::High
        } else if commits_per_month > policy::VELOCITY_MEDIUM {
            VelocityBand::Medium
        } else {
            VelocityBand::Low
        }
    }
}

impl fmt::Display for VelocityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VelocityBand::Low => write!(f, "low"),
            VelocityBand::Medium => write!(f, "medium"),
            VelocityBand::High => write!(f, "high"),
        }
    }
}

/// Commits per month over a sample, with its band.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use strata_score::heuristics::{ChangeVelocity, VelocityBand};
///
/// let oldest = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
/// let newest = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z").unwrap();
/// // 60 days is exactly two months.
/// let v = ChangeVelocity::compute(10, oldest, newest);
/// assert_eq!(v.commits_per_month, 5.0);
/// assert_eq!(v.band, VelocityBand::Medium);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeVelocity {
    pub commits_per_month: f64,
    pub band: VelocityBand,
}

impl ChangeVelocity {
    /// `commit_count / months_between(oldest, newest)`, or zero when the span
    /// is not positive.
    pub fn compute(
        commit_count: usize,
        oldest: DateTime<FixedOffset>,
        newest: DateTime<FixedOffset>,
    ) -> Self {
        let months = months_between(oldest, newest);
        let commits_per_month = if months > 0.0 {
            commit_count as f64 / months
        } else {
            0.0
        };
        Self {
            commits_per_month,
            band: VelocityBand::from_value(commits_per_month),
        }
    }

    /// Velocity over the span of dates present in `history`.
    pub fn from_history(history: &[CommitRecord]) -> Self {
        let oldest = history.iter().map(|c| c.date).min();
        let newest = history.iter().map(|c| c.date).max();
        match (oldest, newest) {
            (Some(oldest), Some(newest)) => Self::compute(history.len(), oldest, newest),
            _ => Self {
                commits_per_month: 0.0,
                band: VelocityBand::Low,
            },
        }
    }
}

/// Complexity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplexityLevel::Low => write!(f, "low"),
            ComplexityLevel::Medium => write!(f, "medium"),
            ComplexityLevel::High => write!(f, "high"),
        }
    }
}

/// Approximate cyclomatic complexity of a code body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Complexity {
    pub score: u32,
    pub level: ComplexityLevel,
}

static DECISION_POINTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bif\b",
        r"\bfor\b",
        r"\bwhile\b",
        r"\bcase\b",
        r"\bcatch\b",
        r"&&",
        r"\|\|",
        r"\?.*:",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid decision point regex"))
    .collect()
});

/// Estimate complexity by counting decision points in `code`.
///
/// This is a textual approximation, not a parse: each pattern (`if`, `for`,
/// `while`, `case`, `catch`, `&&`, `||`, ternary) is counted independently,
/// so keywords inside strings and comments count too.
///
/// # Examples
///
/// ```
/// use strata_score::heuristics::{estimate_complexity, ComplexityLevel};
///
/// let body = "if a {\n  for x in xs {\n    if b && c { go() }\n  }\n}";
/// let c = estimate_complexity(body);
/// assert_eq!(c.score, 5);
/// assert_eq!(c.level, ComplexityLevel::Medium);
/// ```
pub fn estimate_complexity(code: &str) -> Complexity {
    let matches: usize = DECISION_POINTS
        .iter()
        .map(|re| re.find_iter(code).count())
        .sum();
    let score = policy::COMPLEXITY_BASE + matches as u32;
    let level = if score > policy::COMPLEXITY_HIGH {
        ComplexityLevel::High
    } else if score > policy::COMPLEXITY_MEDIUM {
        ComplexityLevel::Medium
    } else {
        ComplexityLevel::Low
    };
    Complexity { score, level }
}

/// How often a function or file has changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Unknown,
    NeverModified,
    FewChanges,
    SomeChanges,
    ManyChanges,
}

impl Stability {
    /// Band a commit count.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_score::heuristics::Stability;
    ///
    /// assert_eq!(Stability::from_commit_count(0), Stability::Unknown);
    /// assert_eq!(Stability::from_commit_count(1), Stability::NeverModified);
    /// assert_eq!(Stability::from_commit_count(4), Stability::FewChanges);
    /// assert_eq!(Stability::from_commit_count(5), Stability::SomeChanges);
    /// assert_eq!(Stability::from_commit_count(15), Stability::ManyChanges);
    /// ```
    pub fn from_commit_count(count: usize) -> Self {
        match count {
            0 => Stability::Unknown,
            1 => Stability::NeverModified,
            n if n >= policy::STABILITY_MANY => Stability::ManyChanges,
            n if n >= policy::STABILITY_SOME => Stability::SomeChanges,
            _ => Stability::FewChanges,
        }
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stability::Unknown => write!(f, "Unknown"),
            Stability::NeverModified => write!(f, "Stable (never modified)"),
            Stability::FewChanges => write!(f, "Stable (few changes)"),
            Stability::SomeChanges => write!(f, "Moderate (some changes)"),
            Stability::ManyChanges => write!(f, "Unstable (many changes)"),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// Urgent commits as a percentage of all commits, one decimal place.
///
/// # Examples
///
/// ```
/// use strata_score::heuristics::bug_fix_ratio;
///
/// assert_eq!(bug_fix_ratio(3, 10), 30.0);
/// assert_eq!(bug_fix_ratio(1, 3), 33.3);
/// assert_eq!(bug_fix_ratio(0, 0), 0.0);
/// ```
pub fn bug_fix_ratio(urgent_commits: usize, total_commits: usize) -> f64 {
    percent(urgent_commits, total_commits)
}

/// Share of commits landing in the reported top files, one decimal place.
///
/// Sums per-file commit counts, so a commit touching several top files
/// counts once per file and the result can exceed 100.
pub fn change_concentration(top_file_commits: usize, total_commits: usize) -> f64 {
    percent(top_file_commits, total_commits)
}

/// Direction of recent commit activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for ActivityTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityTrend::Increasing => write!(f, "increasing"),
            ActivityTrend::Decreasing => write!(f, "decreasing"),
            ActivityTrend::Stable => write!(f, "stable"),
        }
    }
}

/// Compare the mean of the last three months to the three before them.
///
/// `monthly_commits` is ordered oldest month first. With fewer than two
/// months, or no older window to compare against, the trend is stable.
///
/// # Examples
///
/// ```
/// use strata_score::heuristics::{activity_trend, ActivityTrend};
///
/// assert_eq!(activity_trend(&[10, 10, 10, 2, 2, 2]), ActivityTrend::Decreasing);
/// assert_eq!(activity_trend(&[2, 2, 2, 10, 10, 10]), ActivityTrend::Increasing);
/// assert_eq!(activity_trend(&[5]), ActivityTrend::Stable);
/// ```
pub fn activity_trend(monthly_commits: &[usize]) -> ActivityTrend {
    if monthly_commits.len() < policy::TREND_MIN_MONTHS {
        return ActivityTrend::Stable;
    }
    let window = policy::TREND_WINDOW_MONTHS;
    let split = monthly_commits.len().saturating_sub(window);
    let recent = &monthly_commits[split..];
    let older = &monthly_commits[split.saturating_sub(window)..split];

    let mean = |xs: &[usize]| xs.iter().sum::<usize>() as f64 / xs.len() as f64;
    let recent_avg = mean(recent);
    let older_avg = if older.is_empty() {
        recent_avg
    } else {
        mean(older)
    };
    if older_avg == 0.0 {
        return ActivityTrend::Stable;
    }

    let change = (recent_avg - older_avg) / older_avg * 100.0;
    if change > policy::TREND_CHANGE_PERCENT {
        ActivityTrend::Increasing
    } else if change < -policy::TREND_CHANGE_PERCENT {
        ActivityTrend::Decreasing
    } else {
        ActivityTrend::Stable
    }
}

/// Repository health, 0 to 100.
///
/// Starts at [`policy::HEALTH_MAX`] and subtracts the single highest
/// matching bug-ratio penalty, the single highest matching concentration
/// penalty, and the declining-trend penalty. Floors at zero.
///
/// # Examples
///
/// ```
/// use strata_score::heuristics::{health_score, ActivityTrend};
///
/// assert_eq!(health_score(0.0, 0.0, ActivityTrend::Stable), 100);
/// assert_eq!(health_score(35.0, 10.0, ActivityTrend::Stable), 70);
/// assert_eq!(health_score(35.0, 60.0, ActivityTrend::Decreasing), 35);
/// ```
pub fn health_score(bug_fix_ratio: f64, change_concentration: f64, trend: ActivityTrend) -> u32 {
    let band_penalty = |value: f64, bands: &[(f64, u32)]| {
        bands
            .iter()
            .find(|(limit, _)| value > *limit)
            .map_or(0, |(_, points)| *points)
    };
    let mut penalty = band_penalty(bug_fix_ratio, &policy::BUG_RATIO_PENALTIES)
        + band_penalty(change_concentration, &policy::CONCENTRATION_PENALTIES);
    if trend == ActivityTrend::Decreasing {
        penalty += policy::DECREASING_TREND_PENALTY;
    }
    policy::HEALTH_MAX.saturating_sub(penalty)
}

/// Overall health band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Good,
    Fair,
    Poor,
}

impl HealthBand {
    pub fn from_score(score: u32) -> Self {
        if score > policy::HEALTH_GOOD {
            HealthBand::Good
        } else if score > policy::HEALTH_FAIR {
            HealthBand::Fair
        } else {
            HealthBand::Poor
        }
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthBand::Good => write!(f, "good"),
            HealthBand::Fair => write!(f, "fair"),
            HealthBand::Poor => write!(f, "poor"),
        }
    }
}

/// Derived repository health figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    /// Percent of commits that are urgent fixes.
    pub bug_fix_ratio: f64,
    /// Percent of commit activity in the top files.
    pub change_concentration: f64,
    pub activity_trend: ActivityTrend,
    pub health_score: u32,
    pub overall_health: HealthBand,
}

impl HealthMetrics {
    /// Compute health from repository counts.
    ///
    /// `monthly_commits` is ordered oldest month first.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_score::heuristics::{HealthBand, HealthMetrics};
    ///
    /// let m = HealthMetrics::compute(100, 25, 45, &[10, 10, 10, 10]);
    /// assert_eq!(m.bug_fix_ratio, 25.0);
    /// assert_eq!(m.change_concentration, 45.0);
    /// assert_eq!(m.health_score, 70);
    /// assert_eq!(m.overall_health, HealthBand::Fair);
    /// ```
    pub fn compute(
        total_commits: usize,
        urgent_commits: usize,
        top_file_commits: usize,
        monthly_commits: &[usize],
    ) -> Self {
        let bug_fix_ratio = bug_fix_ratio(urgent_commits, total_commits);
        let change_concentration = change_concentration(top_file_commits, total_commits);
        let activity_trend = activity_trend(monthly_commits);
        let health_score = health_score(bug_fix_ratio, change_concentration, activity_trend);
        Self {
            bug_fix_ratio,
            change_concentration,
            activity_trend,
            health_score,
            overall_health: HealthBand::from_score(health_score),
        }
    }
}
