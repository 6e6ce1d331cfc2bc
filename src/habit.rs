use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Real-world habits the pet reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Habit {
    Sleep,
    Exercise,
    Leetcode,
    Jobs,
    Shower,
    Water,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Steps,
    Sleep,
}

/// How completion of a habit's task is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationKind {
    Manual,
    Sensor(SensorKind),
    Photo,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewards {
    pub happiness: i32,
    pub health: i32,
    pub hunger: i32,
    pub coins: u32,
}

/// Half-open range of minutes since midnight. `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: u32,
    end: u32,
}

const fn hm(hour: u32, minute: u32) -> u32 {
    hour * 60 + minute
}

const fn span(start: u32, end: u32) -> Span {
    Span { start, end }
}

const SLEEP: [Span; 1] = [span(hm(21, 0), hm(6, 0))];
const EXERCISE: [Span; 1] = [span(hm(7, 0), hm(20, 0))];
const LEETCODE: [Span; 1] = [span(hm(12, 0), hm(18, 0))];
const JOBS: [Span; 1] = [span(hm(9, 0), hm(12, 0))];
const SHOWER: [Span; 2] = [span(hm(6, 0), hm(9, 0)), span(hm(18, 0), hm(21, 0))];
// Top of every even hour from 08:00 through 22:00, one minute wide.
const WATER: [Span; 8] = [
    span(hm(8, 0), hm(8, 1)),
    span(hm(10, 0), hm(10, 1)),
    span(hm(12, 0), hm(12, 1)),
    span(hm(14, 0), hm(14, 1)),
    span(hm(16, 0), hm(16, 1)),
    span(hm(18, 0), hm(18, 1)),
    span(hm(20, 0), hm(20, 1)),
    span(hm(22, 0), hm(22, 1)),
];
const OUTSIDE: [Span; 1] = [span(hm(10, 0), hm(16, 0))];

impl Span {
    fn wraps(&self) -> bool {
        self.start > self.end
    }

    fn contains(&self, minute: u32) -> bool {
        if self.wraps() {
            minute >= self.start || minute < self.end
        } else {
            minute >= self.start && minute < self.end
        }
    }
}

impl Habit {
    pub const ALL: [Habit; 7] = [
        Habit::Sleep,
        Habit::Exercise,
        Habit::Leetcode,
        Habit::Jobs,
        Habit::Shower,
        Habit::Water,
        Habit::Outside,
    ];

    pub fn rewards(self) -> Rewards {
        let (happiness, health, hunger, coins) = match self {
            Habit::Sleep => (5, 15, 0, 20),
            Habit::Exercise => (10, 10, 0, 20),
            Habit::Leetcode => (10, 0, 0, 25),
            Habit::Jobs => (5, 0, 0, 30),
            Habit::Shower => (5, 5, 0, 10),
            Habit::Water => (0, 5, 5, 5),
            Habit::Outside => (10, 5, 0, 15),
        };
        Rewards { happiness, health, hunger, coins }
    }

    pub fn verification(self) -> VerificationKind {
        match self {
            Habit::Sleep => VerificationKind::Sensor(SensorKind::Sleep),
            Habit::Exercise => VerificationKind::Sensor(SensorKind::Steps),
            Habit::Leetcode | Habit::Jobs => VerificationKind::Photo,
            Habit::Shower | Habit::Water => VerificationKind::Manual,
            Habit::Outside => VerificationKind::Location,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Habit::Sleep => "Get a full night of sleep",
            Habit::Exercise => "Go for a walk or workout",
            Habit::Leetcode => "Solve a coding problem",
            Habit::Jobs => "Send out a job application",
            Habit::Shower => "Take a shower",
            Habit::Water => "Drink a glass of water",
            Habit::Outside => "Spend some time outdoors",
        }
    }

    fn spans(self) -> &'static [Span] {
        match self {
            Habit::Sleep => &SLEEP,
            Habit::Exercise => &EXERCISE,
            Habit::Leetcode => &LEETCODE,
            Habit::Jobs => &JOBS,
            Habit::Shower => &SHOWER,
            Habit::Water => &WATER,
            Habit::Outside => &OUTSIDE,
        }
    }

    /// Whether the habit's window is open at the given wall-clock minute.
    pub fn is_active(self, hour: u32, minute: u32) -> bool {
        let at = hm(hour, minute);
        self.spans().iter().any(|s| s.contains(at))
    }

    pub fn is_active_at(self, at: NaiveDateTime) -> bool {
        self.is_active(at.hour(), at.minute())
    }

    /// Exclusive end of the window containing `at`, or `None` outside every window.
    pub fn window_end(self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let minute = hm(at.hour(), at.minute());
        let span = self.spans().iter().find(|s| s.contains(minute))?;
        let end_time = NaiveTime::from_hms_opt(span.end / 60, span.end % 60, 0)?;
        let mut end = at.date().and_time(end_time);
        if span.wraps() && minute >= span.start {
            end += Duration::days(1);
        }
        Some(end)
    }
}

impl std::fmt::Display for Habit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Habit::Sleep => write!(f, "sleep"),
            Habit::Exercise => write!(f, "exercise"),
            Habit::Leetcode => write!(f, "leetcode"),
            Habit::Jobs => write!(f, "jobs"),
            Habit::Shower => write!(f, "shower"),
            Habit::Water => write!(f, "water"),
            Habit::Outside => write!(f, "outside"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_sleep_window_wraps_midnight() {
        assert!(Habit::Sleep.is_active(21, 0));
        assert!(Habit::Sleep.is_active(23, 59));
        assert!(Habit::Sleep.is_active(0, 30));
        assert!(Habit::Sleep.is_active(5, 59));
        assert!(!Habit::Sleep.is_active(6, 0));
        assert!(!Habit::Sleep.is_active(20, 59));
    }

    #[test]
    fn test_water_only_on_even_hours() {
        assert!(Habit::Water.is_active(8, 0));
        assert!(Habit::Water.is_active(22, 0));
        assert!(!Habit::Water.is_active(8, 1));
        assert!(!Habit::Water.is_active(9, 0));
        assert!(!Habit::Water.is_active(6, 0));
        assert!(!Habit::Water.is_active(0, 0));
    }

    #[test]
    fn test_shower_has_two_windows() {
        assert!(Habit::Shower.is_active(7, 15));
        assert!(!Habit::Shower.is_active(12, 0));
        assert!(Habit::Shower.is_active(18, 30));
        assert_eq!(Habit::Shower.window_end(at(5, 7, 15, 0)), Some(at(5, 9, 0, 0)));
        assert_eq!(Habit::Shower.window_end(at(5, 19, 0, 0)), Some(at(5, 21, 0, 0)));
    }

    #[test]
    fn test_window_end_for_water_minute() {
        assert_eq!(Habit::Water.window_end(at(5, 8, 0, 0)), Some(at(5, 8, 1, 0)));
        assert_eq!(Habit::Water.window_end(at(5, 8, 0, 45)), Some(at(5, 8, 1, 0)));
        assert_eq!(Habit::Water.window_end(at(5, 8, 1, 0)), None);
    }

    #[test]
    fn test_window_end_crosses_day_for_sleep() {
        assert_eq!(Habit::Sleep.window_end(at(5, 22, 10, 0)), Some(at(6, 6, 0, 0)));
        assert_eq!(Habit::Sleep.window_end(at(6, 2, 0, 0)), Some(at(6, 6, 0, 0)));
        assert_eq!(Habit::Sleep.window_end(at(6, 12, 0, 0)), None);
    }

    #[test]
    fn test_rewards_are_non_negative() {
        for habit in Habit::ALL {
            let r = habit.rewards();
            assert!(r.happiness >= 0 && r.health >= 0 && r.hunger >= 0);
        }
    }
}
