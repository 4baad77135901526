//! Git history extraction: the source adapter, text parsers, per-file
//! history builder, and repository-wide aggregation.
//!
//! Data flows upward: [`source`] issues `git` queries, [`parser`] turns
//! their text into typed records, [`history`] composes both into per-file
//! timelines, and [`aggregate`] folds commit streams into grouped counts.

pub mod aggregate;
pub mod history;
pub mod parser;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;
