//! The four analyses strata performs over a working tree.
//!
//! An [`Excavator`] ties a [`HistorySource`] to the checkout it describes
//! and produces serializable reports:
//! - [`file::FileReport`]: why a file exists and how it has changed
//! - [`function::FunctionReport`]: who shaped a function and how risky it is
//! - [`deadcode::DeadCodeReport`]: files untouched past a threshold
//! - [`repo::RepoReport`]: repository-wide activity and health

pub mod deadcode;
pub mod file;
pub mod function;
pub mod render;
pub mod repo;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_core::{Clock, StrataConfig};
use strata_history::history::HistoryBuilder;
use strata_history::source::HistorySource;
use strata_narrative::Narrator;

/// Runs analyses against one repository checkout.
///
/// Paths handed to the analyses are relative to `root`, which must be the
/// directory the history source resolves paths against.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use strata_core::{StrataConfig, SystemClock};
/// use strata_dig::Excavator;
/// use strata_history::source::GitSource;
///
/// # async fn run() -> Result<(), strata_core::StrataError> {
/// let source = GitSource::open(Path::new("."))?;
/// let dig = Excavator::new(".", source, Arc::new(SystemClock), StrataConfig::default());
/// let report = dig.analyze_repository(None, 10).await?;
/// println!("{} commits", report.summary.total_commits);
/// # Ok(())
/// # }
/// ```
pub struct Excavator<S> {
    root: PathBuf,
    history: HistoryBuilder<S>,
    config: StrataConfig,
    narrator: Option<Box<dyn Narrator>>,
}

impl<S: HistorySource> Excavator<S> {
    pub fn new(
        root: impl Into<PathBuf>,
        source: S,
        clock: Arc<dyn Clock>,
        config: StrataConfig,
    ) -> Self {
        Self {
            root: root.into(),
            history: HistoryBuilder::new(source, clock, config.history.clone()),
            config,
            narrator: None,
        }
    }

    /// Use `narrator` for file and function narratives instead of the
    /// rule-based fallback.
    pub fn with_narrator(mut self, narrator: Box<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryBuilder<S> {
        &self.history
    }

    fn narrator(&self) -> Option<&dyn Narrator> {
        self.narrator.as_deref()
    }
}
