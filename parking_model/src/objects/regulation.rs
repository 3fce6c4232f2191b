use std::collections::BTreeSet;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schedule::{at, day_of, time_of, Day, DaySet, TimeWindow};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegulationKind {
    PermitRequired,
    TimeLimit,
    Metered,
    StreetCleaning,
    TowAway,
    NoParking,
    LoadingZone,
}

impl RegulationKind {
    /// Regulations that forbid parking outright while they're in effect.
    pub fn is_restriction(self) -> bool {
        matches!(
            self,
            RegulationKind::StreetCleaning
                | RegulationKind::TowAway
                | RegulationKind::NoParking
                | RegulationKind::LoadingZone
        )
    }
}

impl fmt::Display for RegulationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RegulationKind::PermitRequired => "permit required",
            RegulationKind::TimeLimit => "time limit",
            RegulationKind::Metered => "metered",
            RegulationKind::StreetCleaning => "street cleaning",
            RegulationKind::TowAway => "tow-away",
            RegulationKind::NoParking => "no parking",
            RegulationKind::LoadingZone => "loading zone",
        };
        write!(f, "{}", name)
    }
}

/// One posted rule. Built once at ingestion and never modified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    pub kind: RegulationKind,
    /// Permit area codes exempt from (or required by) this rule
    #[serde(default)]
    pub permit_areas: BTreeSet<String>,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub meter_rate_per_hour: Option<f64>,
    #[serde(default)]
    pub days: DaySet,
    /// No window means in effect all day, on the matching days.
    #[serde(default)]
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub note: String,
}

impl Regulation {
    /// In effect every day, all day, with nothing else set.
    pub fn new(kind: RegulationKind) -> Regulation {
        Regulation {
            kind,
            permit_areas: BTreeSet::new(),
            time_limit_minutes: None,
            meter_rate_per_hour: None,
            days: DaySet::every_day(),
            window: None,
            note: String::new(),
        }
    }

    pub fn applies_on(&self, day: Day) -> bool {
        self.days.applies_on(day)
    }

    /// Both the day and the window have to match. An overnight window that started yesterday
    /// counts as yesterday's.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        let t = time_of(now);
        match self.window {
            None => self.applies_on(day_of(now)),
            Some(window) => {
                if !window.contains(t) {
                    return false;
                }
                if window.is_overnight() && t < window.end {
                    self.applies_on(day_of(now - Duration::days(1)))
                } else {
                    self.applies_on(day_of(now))
                }
            }
        }
    }

    /// When the current period of enforcement ends, if the rule is active right now. Rules
    /// without a window end at midnight.
    pub fn active_period_end(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if !self.is_active_at(now) {
            return None;
        }
        let today = now.date();
        match self.window {
            None => Some(today.and_time(chrono::NaiveTime::MIN) + Duration::days(1)),
            Some(window) => {
                let started = if window.is_overnight() && time_of(now) < window.end {
                    today - Duration::days(1)
                } else {
                    today
                };
                Some(window.on(started).1)
            }
        }
    }

    /// The first time at or after `now` that a period of enforcement begins, looking at most a
    /// week ahead. Rules without a window begin at midnight.
    pub fn next_start(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let start_time = self
            .window
            .map(|w| w.start)
            .unwrap_or(geom::Time::START_OF_DAY);
        (0..=7)
            .map(|offset| now.date() + Duration::days(offset))
            .filter(|date| self.applies_on(Day::of(*date)))
            .map(|date| at(date, start_time))
            .find(|start| *start >= now)
    }

    /// Like "Mon-Fri 8:00 AM - 6:00 PM" or "Daily"
    pub fn describe_schedule(&self) -> String {
        match self.window {
            Some(window) => format!("{} {}", self.days.describe(), window.describe()),
            None => self.days.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn time(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn empty_days_means_daily() {
        let reg = Regulation {
            window: Some(TimeWindow::parse("08:00", "18:00").unwrap()),
            ..Regulation::new(RegulationKind::TimeLimit)
        };
        // 2024-01-02 is a Tuesday; check a whole week
        for day in 2..=8 {
            assert!(reg.is_active_at(time(2024, 1, day, 10, 0)));
            assert!(!reg.is_active_at(time(2024, 1, day, 19, 0)));
        }
    }

    #[test]
    fn day_restricted() {
        let reg = Regulation {
            days: DaySet::only(Day::Tue.into()),
            window: Some(TimeWindow::parse("08:00", "10:00").unwrap()),
            ..Regulation::new(RegulationKind::StreetCleaning)
        };
        assert!(reg.is_active_at(time(2024, 1, 2, 9, 0)));
        assert!(!reg.is_active_at(time(2024, 1, 3, 9, 0)));
        assert_eq!(
            reg.active_period_end(time(2024, 1, 2, 9, 0)),
            Some(time(2024, 1, 2, 10, 0))
        );
    }

    #[test]
    fn overnight_belongs_to_the_starting_day() {
        let reg = Regulation {
            days: DaySet::only(Day::Fri.into()),
            window: Some(TimeWindow::parse("22:00", "06:00").unwrap()),
            ..Regulation::new(RegulationKind::TowAway)
        };
        // Friday 2024-01-05 at 23:00, and early Saturday morning
        assert!(reg.is_active_at(time(2024, 1, 5, 23, 0)));
        assert!(reg.is_active_at(time(2024, 1, 6, 2, 0)));
        assert_eq!(
            reg.active_period_end(time(2024, 1, 6, 2, 0)),
            Some(time(2024, 1, 6, 6, 0))
        );
        // But not early Friday morning
        assert!(!reg.is_active_at(time(2024, 1, 5, 2, 0)));
    }

    #[test]
    fn next_start_scans_forward() {
        let reg = Regulation {
            days: DaySet::only(Day::Tue.into()),
            window: Some(TimeWindow::parse("08:00", "10:00").unwrap()),
            ..Regulation::new(RegulationKind::StreetCleaning)
        };
        // Monday -> the next day
        assert_eq!(
            reg.next_start(time(2024, 1, 1, 12, 0)),
            Some(time(2024, 1, 2, 8, 0))
        );
        // Tuesday before the window -> today
        assert_eq!(
            reg.next_start(time(2024, 1, 2, 7, 0)),
            Some(time(2024, 1, 2, 8, 0))
        );
        // Tuesday after the window -> next week
        assert_eq!(
            reg.next_start(time(2024, 1, 2, 11, 0)),
            Some(time(2024, 1, 9, 8, 0))
        );
    }
}
