use std::path::Path;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use strata_core::{FileTimePoint, Insight, StrataError};
use strata_history::source::HistorySource;
use strata_score::heuristics::{classify_age, DeadCodeStatus};
use strata_score::insights::dead_code_insights;
use tracing::{debug, info};

use crate::walker::source_files;
use crate::Excavator;

/// Result of [`Excavator::scan_dead_code`].
///
/// `dead_code` and `suspicious` are ordered by age, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadCodeReport {
    pub directory: String,
    /// Source files found by the walker, with or without history.
    pub total_files: usize,
    pub threshold_days: u64,
    pub dead_code: Vec<FileTimePoint>,
    pub suspicious: Vec<FileTimePoint>,
    pub active: Vec<FileTimePoint>,
    pub insights: Vec<Insight>,
}

impl<S: HistorySource> Excavator<S> {
    /// Classify every source file under `dir` by how long ago it last
    /// changed. Files without any history are left out of all three lists.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::FileNotFound`] if `dir` is not a directory and
    /// propagates fatal history errors.
    pub async fn scan_dead_code(
        &self,
        dir: &Path,
        recursive: bool,
        threshold_days: u64,
    ) -> Result<DeadCodeReport, StrataError> {
        let files = source_files(&self.root, dir, recursive, &self.config.scan)?;
        info!(
            directory = %dir.display(),
            files = files.len(),
            threshold_days,
            "scanning for dead code"
        );

        let touches: Vec<Result<Option<FileTimePoint>, StrataError>> = stream::iter(files.iter())
            .map(|file| self.history.last_modification(file))
            .buffered(self.config.history.stat_concurrency.max(1))
            .collect()
            .await;

        let mut dead_code = Vec::new();
        let mut suspicious = Vec::new();
        let mut active = Vec::new();
        for (file, touch) in files.iter().zip(touches) {
            let Some(point) = touch? else {
                debug!(file = %file, "no history, skipping");
                continue;
            };
            match classify_age(point.days_ago, threshold_days) {
                DeadCodeStatus::Dead => dead_code.push(point),
                DeadCodeStatus::Suspicious => suspicious.push(point),
                DeadCodeStatus::Active => active.push(point),
            }
        }

        dead_code.sort_by(|a, b| b.days_ago.cmp(&a.days_ago));
        suspicious.sort_by(|a, b| b.days_ago.cmp(&a.days_ago));

        let insights = dead_code_insights(&dead_code, files.len(), threshold_days);
        Ok(DeadCodeReport {
            directory: dir.display().to_string(),
            total_files: files.len(),
            threshold_days,
            dead_code,
            suspicious,
            active,
            insights,
        })
    }
}
