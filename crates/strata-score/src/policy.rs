//! Fixed scoring policy.
//!
//! These values are part of the scoring contract, not user configuration.
//! Comparisons against them are strict (`>`) unless noted.

/// Fraction of the dead-code threshold above which a file is suspicious.
pub const SUSPICIOUS_FACTOR: f64 = 0.7;

/// Month length used for velocity, in days.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Commits per month above which velocity is high.
pub const VELOCITY_HIGH: f64 = 5.0;
/// Commits per month above which velocity is medium.
pub const VELOCITY_MEDIUM: f64 = 2.0;

/// Starting point of the complexity estimate.
pub const COMPLEXITY_BASE: u32 = 1;
/// Complexity above which a body is high.
pub const COMPLEXITY_HIGH: u32 = 10;
/// Complexity above which a body is medium.
pub const COMPLEXITY_MEDIUM: u32 = 5;

/// Commit count at or above which a function has many changes.
pub const STABILITY_MANY: usize = 15;
/// Commit count at or above which a function has some changes.
pub const STABILITY_SOME: usize = 5;

/// Bug-fix ratio penalties as `(exceeds percent, points)`, highest first.
/// Only the first matching band applies.
pub const BUG_RATIO_PENALTIES: [(f64, u32); 3] = [(30.0, 30), (20.0, 20), (10.0, 10)];
/// Change concentration penalties as `(exceeds percent, points)`, highest
/// first. Only the first matching band applies.
pub const CONCENTRATION_PENALTIES: [(f64, u32); 2] = [(50.0, 20), (30.0, 10)];
/// Points lost when activity is decreasing.
pub const DECREASING_TREND_PENALTY: u32 = 15;
/// Maximum health score.
pub const HEALTH_MAX: u32 = 100;
/// Score above which health is good.
pub const HEALTH_GOOD: u32 = 70;
/// Score above which health is fair.
pub const HEALTH_FAIR: u32 = 40;

/// Months averaged on each side of the activity comparison.
pub const TREND_WINDOW_MONTHS: usize = 3;
/// Months of data required before a trend is reported.
pub const TREND_MIN_MONTHS: usize = 2;
/// Relative change in percent beyond which activity is trending.
pub const TREND_CHANGE_PERCENT: f64 = 20.0;

/// Bug-fix ratio in percent above which a quality insight is emitted.
pub const INSIGHT_BUG_RATIO: f64 = 20.0;
/// Change concentration in percent above which a hotspot insight is emitted.
pub const INSIGHT_CONCENTRATION: f64 = 40.0;
/// Urgent commit count above which a process insight is emitted.
pub const INSIGHT_URGENT_COMMITS: usize = 10;

/// Days without change after which a file may be dead.
pub const STALE_FILE_DAYS: u64 = 365;
/// Lower bound (exclusive) of the "stable but unmaintained" window.
pub const MAINTENANCE_MIN_DAYS: u64 = 180;
/// File age in days beyond which a file counts as legacy.
pub const LEGACY_AGE_DAYS: u64 = 730;

/// Distinct blame authors above which documentation is recommended.
pub const CONTRIBUTOR_LIMIT: usize = 3;
/// Related commits above which a function is called unstable.
pub const FUNCTION_COMMIT_LIMIT: usize = 10;
/// Related fix commits above which extra testing is recommended.
pub const FUNCTION_FIX_LIMIT: usize = 2;

/// Fix commits in a file's history above which bug activity is called out.
pub const BUG_ACTIVITY_LIMIT: usize = 3;

/// Evidence commits attached to each code smell.
pub const SMELL_EVIDENCE: usize = 3;
