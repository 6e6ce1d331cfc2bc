use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::pet::PetStatus;

pub const DEFAULT_INTERVAL_SECS: u64 = 600;

/// Amount removed from each stat per decay tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayRates {
    pub health: i32,
    pub happiness: i32,
    pub hunger: i32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            health: 1,
            happiness: 1,
            hunger: 2,
        }
    }
}

/// Periodic stat decay, with backfill for time spent suspended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecayEngine {
    interval_secs: u64,
    rates: DecayRates,
    last_decay_at: NaiveDateTime,
}

impl DecayEngine {
    pub fn new(interval_secs: u64, last_decay_at: NaiveDateTime) -> Self {
        Self {
            interval_secs: interval_secs.max(1),
            rates: DecayRates::default(),
            last_decay_at,
        }
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn last_decay_at(&self) -> NaiveDateTime {
        self.last_decay_at
    }

    fn apply_once(&self, status: &mut PetStatus) -> bool {
        let before = *status;
        status.apply_delta(-self.rates.happiness, -self.rates.health, -self.rates.hunger);
        *status != before
    }

    /// One timer tick. Returns whether any stat actually moved.
    pub fn tick(&mut self, status: &mut PetStatus, now: NaiveDateTime) -> bool {
        self.last_decay_at = now;
        let changed = self.apply_once(status);
        debug!(changed, "decay tick");
        changed
    }

    /// Apply one tick per whole interval in `elapsed_secs`. Partial intervals
    /// and negative elapsed time apply nothing. Returns the ticks applied.
    pub fn catch_up(&mut self, status: &mut PetStatus, elapsed_secs: i64) -> u64 {
        if elapsed_secs <= 0 {
            return 0;
        }
        let ticks = elapsed_secs as u64 / self.interval_secs;
        for _ in 0..ticks {
            // Once every stat bottoms out the remaining ticks are no-ops.
            if !self.apply_once(status) {
                break;
            }
        }
        ticks
    }

    /// Backfill decay missed since the last recorded tick. The leftover
    /// partial interval is carried so no time is lost or double counted.
    pub fn resume(&mut self, status: &mut PetStatus, now: NaiveDateTime) -> u64 {
        let elapsed = (now - self.last_decay_at).num_seconds();
        let ticks = self.catch_up(status, elapsed);
        if ticks > 0 {
            let advanced = ticks.saturating_mul(self.interval_secs);
            self.last_decay_at += Duration::seconds(i64::try_from(advanced).unwrap_or(i64::MAX));
            debug!(ticks, "decay backfilled");
        }
        ticks
    }

    /// Restart the clock without applying decay, e.g. after a reset.
    pub fn restart(&mut self, now: NaiveDateTime) {
        self.last_decay_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_tick_applies_rates() {
        let mut engine = DecayEngine::new(DEFAULT_INTERVAL_SECS, at(8, 0, 0));
        let mut status = PetStatus::new(50, 50, 50);
        assert!(engine.tick(&mut status, at(8, 10, 0)));
        assert_eq!(status, PetStatus::new(49, 49, 48));
        assert_eq!(engine.last_decay_at(), at(8, 10, 0));
    }

    #[test]
    fn test_tick_at_zero_reports_no_change() {
        let mut engine = DecayEngine::new(DEFAULT_INTERVAL_SECS, at(8, 0, 0));
        let mut status = PetStatus::new(0, 0, 0);
        assert!(!engine.tick(&mut status, at(8, 10, 0)));
    }

    #[test]
    fn test_catch_up_three_intervals() {
        let mut engine = DecayEngine::new(600, at(8, 0, 0));
        let mut status = PetStatus::new(80, 80, 80);
        assert_eq!(engine.catch_up(&mut status, 3 * 600), 3);
        assert_eq!(status, PetStatus::new(77, 77, 74));
    }

    #[test]
    fn test_catch_up_floors_partial_intervals() {
        let mut engine = DecayEngine::new(600, at(8, 0, 0));
        let mut status = PetStatus::new(80, 80, 80);
        assert_eq!(engine.catch_up(&mut status, 3 * 600 + 599), 3);
        assert_eq!(engine.catch_up(&mut status, 599), 0);
        assert_eq!(engine.catch_up(&mut status, -1200), 0);
        assert_eq!(status, PetStatus::new(77, 77, 74));
    }

    #[test]
    fn test_catch_up_clamps() {
        let mut engine = DecayEngine::new(600, at(8, 0, 0));
        let mut status = PetStatus::new(5, 5, 5);
        engine.catch_up(&mut status, 100 * 600);
        assert_eq!(status, PetStatus::new(0, 0, 0));
    }

    #[test]
    fn test_catch_up_after_years_returns_quickly() {
        let mut engine = DecayEngine::new(1, at(8, 0, 0));
        let mut status = PetStatus::full();
        assert_eq!(engine.catch_up(&mut status, i64::MAX), i64::MAX as u64);
        assert_eq!(status, PetStatus::new(0, 0, 0));
    }

    #[test]
    fn test_resume_from_distant_past() {
        let long_ago = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut engine = DecayEngine::new(1, long_ago);
        let mut status = PetStatus::full();
        let ticks = engine.resume(&mut status, at(8, 0, 0));
        assert_eq!(ticks, (at(8, 0, 0) - long_ago).num_seconds() as u64);
        assert_eq!(engine.last_decay_at(), at(8, 0, 0));
        assert!(status.is_depleted());
    }

    #[test]
    fn test_resume_carries_remainder() {
        let mut engine = DecayEngine::new(600, at(8, 0, 0));
        let mut status = PetStatus::full();
        assert_eq!(engine.resume(&mut status, at(8, 25, 0)), 2);
        assert_eq!(engine.last_decay_at(), at(8, 20, 0));
        // The five leftover minutes count toward the next interval.
        assert_eq!(engine.resume(&mut status, at(8, 30, 0)), 1);
        assert_eq!(status, PetStatus::new(97, 97, 94));
    }
}
