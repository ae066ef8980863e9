//! Time-of-day driven metric fluctuation and the unlock bonus.

use std::f64::consts::PI;

use chrono::Timelike;

use crate::document::Metrics;
use crate::time::Timestamp;

pub const UNLOCK_ENTANGLEMENT_BONUS: f64 = 0.1;
pub const UNLOCK_COHERENCE_BONUS: f64 = 0.05;

impl Metrics {
    /// Recompute the oscillating metrics from the local hour and minute.
    pub fn fluctuate(&mut self, now: Timestamp) {
        let hour = f64::from(now.hour());
        let minute = f64::from(now.minute());
        self.love_amplitude = 0.9 + 0.1 * (hour * PI / 12.0).sin();
        self.entanglement = 0.7 + 0.1 * (minute * PI / 30.0).cos();
        self.coherence = 0.85 + 0.05 * ((hour * 60.0 + minute) * PI / 720.0).sin();
    }

    pub fn apply_unlock_bonus(&mut self) {
        self.entanglement = (self.entanglement + UNLOCK_ENTANGLEMENT_BONUS).min(1.0);
        self.coherence = (self.coherence + UNLOCK_COHERENCE_BONUS).min(1.0);
    }

    /// "Maximum" above 0.8 entanglement, otherwise "Active".
    pub fn entanglement_label(&self) -> &'static str {
        if self.entanglement > 0.8 { "Maximum" } else { "Active" }
    }

    /// Coherence read as a share of a 24h day, e.g. `21h 21m`.
    pub fn coherence_clock(&self) -> String {
        let hours = (self.coherence * 24.0).floor();
        let minutes = ((self.coherence * 24.0 * 60.0) % 60.0).floor();
        format!("{hours}h {minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{Clock, FixedClock};
    use approx::assert_relative_eq;

    fn at(rfc3339: &str) -> Timestamp {
        FixedClock::at(rfc3339).unwrap().now()
    }

    #[test]
    fn test_fluctuate_at_midnight() {
        let mut m = Metrics::default();
        m.fluctuate(at("2026-02-11T00:00:00+00:00"));
        assert_relative_eq!(m.love_amplitude, 0.9, epsilon = 1e-12);
        assert_relative_eq!(m.entanglement, 0.8, epsilon = 1e-12);
        assert_relative_eq!(m.coherence, 0.85, epsilon = 1e-12);
    }

    #[test]
    fn test_fluctuate_at_six_thirty() {
        let mut m = Metrics::default();
        m.fluctuate(at("2026-02-11T06:30:00+00:00"));
        assert_relative_eq!(m.love_amplitude, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.entanglement, 0.6, epsilon = 1e-12);
        let expected = 0.85 + 0.05 * (390.0 * PI / 720.0).sin();
        assert_relative_eq!(m.coherence, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_fluctuate_uses_local_hour() {
        let mut utc = Metrics::default();
        let mut shifted = Metrics::default();
        utc.fluctuate(at("2026-02-11T06:00:00+00:00"));
        shifted.fluctuate(at("2026-02-11T06:00:00+05:00"));
        assert_eq!(utc.love_amplitude, shifted.love_amplitude);
    }

    #[test]
    fn test_unlock_bonus_capped() {
        let mut m = Metrics {
            entanglement: 0.95,
            coherence: 0.97,
            ..Metrics::default()
        };
        m.apply_unlock_bonus();
        assert_eq!(m.entanglement, 1.0);
        assert_eq!(m.coherence, 1.0);
    }

    #[test]
    fn test_labels() {
        let m = Metrics {
            entanglement: 0.81,
            coherence: 0.89,
            ..Metrics::default()
        };
        assert_eq!(m.entanglement_label(), "Maximum");
        assert_eq!(m.coherence_clock(), "21h 21m");
        let calm = Metrics {
            entanglement: 0.8,
            ..Metrics::default()
        };
        assert_eq!(calm.entanglement_label(), "Active");
    }
}
