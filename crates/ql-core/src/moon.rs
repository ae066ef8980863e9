//! Approximate lunar phase for the dashboard.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::time::Timestamp;

pub const LUNAR_CYCLE_DAYS: f64 = 29.53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoonPhase {
    pub name: &'static str,
    pub emoji: &'static str,
}

const PHASES: [MoonPhase; 8] = [
    MoonPhase { name: "New Moon", emoji: "🌑" },
    MoonPhase { name: "Waxing Crescent", emoji: "🌒" },
    MoonPhase { name: "First Quarter", emoji: "🌓" },
    MoonPhase { name: "Waxing Gibbous", emoji: "🌔" },
    MoonPhase { name: "Full Moon", emoji: "🌕" },
    MoonPhase { name: "Waning Gibbous", emoji: "🌖" },
    MoonPhase { name: "Last Quarter", emoji: "🌗" },
    MoonPhase { name: "Waning Crescent", emoji: "🌘" },
];

/// Reference new moon, 2024-01-11 00:00 UTC.
fn known_new_moon() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 1, 11)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

pub fn moon_phase(now: Timestamp) -> MoonPhase {
    let elapsed = now.with_timezone(&Utc) - known_new_moon();
    let days = elapsed.num_milliseconds() as f64 / 86_400_000.0;
    let fraction = days.rem_euclid(LUNAR_CYCLE_DAYS) / LUNAR_CYCLE_DAYS;
    PHASES[((fraction * 8.0).floor() as usize) % PHASES.len()]
}
