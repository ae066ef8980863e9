//! Wall-clock access for the engine.
//!
//! Every operation that stamps a timestamp or derives something from the
//! calendar (daily word, predictions, metrics) reads the time through a
//! [`Clock`], so tests can pin "now" to an exact local date and hour.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, Timelike, Utc};

/// Timestamps carry the local UTC offset they were taken at.
pub type Timestamp = DateTime<FixedOffset>;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The host's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant. Advance it explicitly with [`FixedClock::advance`].
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: std::sync::Arc<std::sync::Mutex<Timestamp>>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: std::sync::Arc::new(std::sync::Mutex::new(now)),
        }
    }

    /// Parse an RFC 3339 instant, e.g. `2026-02-11T03:15:00+00:00`.
    pub fn at(rfc3339: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(rfc3339).ok().map(Self::new)
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn set(&self, to: Timestamp) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Calendar components the daily word is derived from: (day 1-31, month 1-12, hour 0-23).
pub fn day_month_hour(ts: &Timestamp) -> (u32, u32, u32) {
    (ts.day(), ts.month(), ts.hour())
}

/// Local calendar date of a timestamp.
pub fn local_date(ts: &Timestamp) -> NaiveDate {
    ts.date_naive()
}

/// UTC calendar date of a timestamp. Prediction dates are keyed on it.
pub fn utc_date(ts: &Timestamp) -> NaiveDate {
    ts.with_timezone(&Utc).date_naive()
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
