//! Core types, configuration, and error handling for strata.
//!
//! This crate provides the shared foundation used by all other strata crates:
//! - [`StrataError`]: unified error type using `thiserror`
//! - [`StrataConfig`]: configuration loaded from `.strata.toml`
//! - [`Clock`]: injected notion of "now" for age computations
//! - Shared value types: [`CommitRecord`], [`ChangeStat`], [`BlameEntry`],
//!   [`FileTimePoint`], [`Insight`], [`Recommendation`], [`OutputFormat`]

mod clock;
mod config;
mod error;
mod types;

pub use clock::{days_between, Clock, FixedClock, SystemClock};
pub use config::{HistoryConfig, LlmConfig, ScanConfig, ScoringConfig, StrataConfig};
pub use error::StrataError;
pub use types::{
    BlameEntry, ChangeStat, CommitRecord, Evidence, FileTimePoint, Insight, OutputFormat, Priority,
    Recommendation, Severity,
};

/// A convenience `Result` type for strata operations.
pub type Result<T> = std::result::Result<T, StrataError>;
