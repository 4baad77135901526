use std::path::PathBuf;

use serde::Serialize;
use strata_core::{CommitRecord, FileTimePoint, Insight, Recommendation, StrataError};
use strata_history::aggregate::ChangeTotals;
use strata_history::history::RelatedFile;
use strata_history::source::HistorySource;
use strata_narrative::{explain_file, FileNarrative};
use strata_score::heuristics::ChangeVelocity;
use strata_score::insights::{file_recommendations, FileSignals};
use strata_score::smells::detect_code_smells;
use tracing::info;

use crate::Excavator;

/// History entries kept in a [`FileReport`].
const REPORT_HISTORY: usize = 10;
/// Keyword-matching commits kept in a [`FileReport`].
const REPORT_URGENT: usize = 5;

/// When a file appeared and was last touched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub created: Option<FileTimePoint>,
    pub last_modified: Option<FileTimePoint>,
    /// Commits in the sampled history.
    pub total_commits: usize,
    pub unique_authors: usize,
}

/// Line-change totals and change rate over the sampled history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    #[serde(flatten)]
    pub totals: ChangeTotals,
    pub velocity: ChangeVelocity,
}

/// Result of [`Excavator::analyze_file`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file: String,
    pub metadata: FileMetadata,
    pub stats: FileStats,
    /// Newest commits first.
    pub history: Vec<CommitRecord>,
    pub related_files: Vec<RelatedFile>,
    /// Commits matching the configured keywords.
    pub urgent_commits: Vec<CommitRecord>,
    pub narrative: FileNarrative,
    pub code_smells: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
}

impl<S: HistorySource> Excavator<S> {
    /// Explain why the file at `path` exists and how it has changed over its
    /// `depth` most recent commits.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::FileNotFound`] if `path` does not exist under
    /// the root, [`StrataError::SourceUnavailable`] if it is not tracked, and
    /// propagates mandatory history query failures.
    pub async fn analyze_file(&self, path: &str, depth: usize) -> Result<FileReport, StrataError> {
        if !self.root.join(path).exists() {
            return Err(StrataError::FileNotFound(PathBuf::from(path)));
        }
        if !self.history.is_tracked(path).await? {
            return Err(StrataError::SourceUnavailable(format!(
                "{path} is not tracked by git"
            )));
        }

        info!(path, depth, "analyzing file");
        let dossier = self.history.dossier(path, depth).await?;

        let totals = ChangeTotals::from_history(&dossier.history);
        let velocity = ChangeVelocity::from_history(&dossier.history);
        let narrative = explain_file(
            self.narrator(),
            path,
            &dossier.history,
            dossier.created.as_ref(),
            dossier.last_modified.as_ref(),
        )
        .await;
        let code_smells = detect_code_smells(&dossier.keyword_commits);

        let recommendations = file_recommendations(&FileSignals {
            last_modified_days: dossier.last_modified.as_ref().map(|m| m.days_ago),
            created_days: dossier.created.as_ref().map(|c| c.days_ago),
            velocity: Some(velocity.band),
            smells: code_smells.len(),
        });

        let mut history = dossier.history;
        let total_commits = history.len();
        history.truncate(REPORT_HISTORY);
        let mut urgent_commits = dossier.keyword_commits;
        urgent_commits.truncate(REPORT_URGENT);

        Ok(FileReport {
            file: path.to_string(),
            metadata: FileMetadata {
                created: dossier.created,
                last_modified: dossier.last_modified,
                total_commits,
                unique_authors: totals.unique_authors,
            },
            stats: FileStats { totals, velocity },
            history,
            related_files: dossier.related_files,
            urgent_commits,
            narrative,
            code_smells,
            recommendations,
        })
    }
}
