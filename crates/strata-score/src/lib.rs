//! Heuristic scoring and insight generation.
//!
//! Turns aggregated history into classifications and scores
//! ([`heuristics`]), flags commit-message patterns ([`smells`]), and maps
//! both into ordered insight and recommendation lists ([`insights`]). Every
//! cutoff lives in [`policy`].

pub mod heuristics;
pub mod insights;
pub mod policy;
pub mod smells;
