use chrono::{DateTime, TimeZone, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Source of "now" for age computations.
///
/// Analyses take a clock instead of reading wall time so that tests can pin
/// `now` and assert exact ages.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use strata_core::{Clock, FixedClock};
///
/// let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
/// let clock = FixedClock(at);
/// assert_eq!(clock.now(), at);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Whole days between `now` and `date`, ignoring direction.
///
/// Computes `floor(|now - date| / 86400s)`, so a date in the future is
/// measured the same way as one in the past.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use strata_core::days_between;
///
/// let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
/// assert_eq!(days_between(now, now), 0);
/// assert_eq!(days_between(now, now - Duration::hours(47)), 1);
/// ```
pub fn days_between<Tz: TimeZone>(now: DateTime<Utc>, date: DateTime<Tz>) -> u64 {
    let seconds = (now.timestamp() - date.timestamp()).unsigned_abs();
    seconds / SECONDS_PER_DAY as u64
}
