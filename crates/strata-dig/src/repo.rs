use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use strata_core::{CommitRecord, Insight, StrataError};
use strata_history::aggregate::aggregate_repository;
use strata_history::source::HistorySource;
use strata_score::heuristics::HealthMetrics;
use strata_score::insights::repository_insights;
use tracing::info;

use crate::Excavator;

/// Months of timeline kept in a [`RepoReport`].
const REPORT_MONTHS: usize = 12;
const REPORT_URGENT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActivity {
    pub file: String,
    pub commits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub author: String,
    pub commits: usize,
}

/// Commits in one `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthActivity {
    pub month: String,
    pub commits: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<DateTime<FixedOffset>>,
    pub to: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub total_commits: usize,
    pub unique_authors: usize,
    pub date_range: DateRange,
}

/// Result of [`Excavator::analyze_repository`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoReport {
    pub summary: RepoSummary,
    pub top_files: Vec<FileActivity>,
    pub top_contributors: Vec<Contributor>,
    /// Commits whose message matches the urgent pattern, newest first.
    pub urgent_commits: Vec<CommitRecord>,
    /// Most recent months, oldest first.
    pub timeline: Vec<MonthActivity>,
    pub health_metrics: HealthMetrics,
    pub insights: Vec<Insight>,
}

impl<S: HistorySource> Excavator<S> {
    /// Aggregate the whole repository history, optionally from `since`
    /// (any date `git log --since` accepts), and score its health.
    ///
    /// The activity trend is computed over every month in range even
    /// though the report keeps only the most recent twelve.
    ///
    /// # Errors
    ///
    /// Propagates a failed repository log query.
    pub async fn analyze_repository(
        &self,
        since: Option<&str>,
        top: usize,
    ) -> Result<RepoReport, StrataError> {
        info!(since, top, "analyzing repository");
        let agg = aggregate_repository(
            self.history.source(),
            since,
            self.config.history.stat_concurrency.max(1),
        )
        .await?;

        let top_files: Vec<FileActivity> = agg
            .by_file
            .top_n(top)
            .into_iter()
            .map(|(file, commits)| FileActivity { file, commits })
            .collect();
        let top_contributors: Vec<Contributor> = agg
            .by_author
            .top_n(top)
            .into_iter()
            .map(|(author, commits)| Contributor { author, commits })
            .collect();
        let months = agg.by_month.sorted_by_key();
        let monthly: Vec<usize> = months.iter().map(|(_, count)| *count).collect();

        let top_file_commits: usize = top_files.iter().map(|f| f.commits).sum();
        let health_metrics = HealthMetrics::compute(
            agg.total_commits,
            agg.urgent_commits.len(),
            top_file_commits,
            &monthly,
        );
        let insights =
            repository_insights(&health_metrics, agg.urgent_commits.len(), top_files.len());

        let skip = months.len().saturating_sub(REPORT_MONTHS);
        let timeline = months
            .into_iter()
            .skip(skip)
            .map(|(month, commits)| MonthActivity { month, commits })
            .collect();

        let mut urgent_commits = agg.urgent_commits;
        urgent_commits.truncate(REPORT_URGENT);

        Ok(RepoReport {
            summary: RepoSummary {
                total_commits: agg.total_commits,
                unique_authors: agg.by_author.len(),
                date_range: DateRange {
                    from: agg.oldest,
                    to: agg.newest,
                },
            },
            top_files,
            top_contributors,
            urgent_commits,
            timeline,
            health_metrics,
            insights,
        })
    }
}
