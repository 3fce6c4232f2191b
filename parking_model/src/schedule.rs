//! When regulations are in effect. Every weekday and clock computation in this crate goes through
//! `Day` and `geom::Time`, converted from a single `NaiveDateTime` in the city's local time, so
//! there's exactly one place a weekday comes from.

use std::fmt;

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};

use geom::Time;

#[derive(Debug, Hash, EnumSetType, Serialize, Deserialize)]
#[enumset(serialize_repr = "list")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub fn of(date: NaiveDate) -> Day {
        Day::from(date.weekday())
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Day {
        match weekday {
            Weekday::Mon => Day::Mon,
            Weekday::Tue => Day::Tue,
            Weekday::Wed => Day::Wed,
            Weekday::Thu => Day::Thu,
            Weekday::Fri => Day::Fri,
            Weekday::Sat => Day::Sat,
            Weekday::Sun => Day::Sun,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
            Day::Sun => "Sun",
        };
        write!(f, "{}", name)
    }
}

/// The weekdays a regulation applies. An empty set means every day, never "no days".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySet(EnumSet<Day>);

impl DaySet {
    pub fn every_day() -> DaySet {
        DaySet(EnumSet::empty())
    }

    pub fn only(days: EnumSet<Day>) -> DaySet {
        DaySet(days)
    }

    pub fn weekdays() -> DaySet {
        DaySet(Day::Mon | Day::Tue | Day::Wed | Day::Thu | Day::Fri)
    }

    pub fn is_every_day(&self) -> bool {
        self.0.is_empty() || self.0 == EnumSet::all()
    }

    pub fn applies_on(&self, day: Day) -> bool {
        self.0.is_empty() || self.0.contains(day)
    }

    pub fn days(&self) -> EnumSet<Day> {
        if self.0.is_empty() {
            EnumSet::all()
        } else {
            self.0
        }
    }

    /// Like "Daily", "Mon-Fri", or "Tue, Thu"
    pub fn describe(&self) -> String {
        if self.is_every_day() {
            return "Daily".to_string();
        }
        let days: Vec<Day> = self.0.iter().collect();
        let contiguous = days
            .windows(2)
            .all(|pair| pair[1] as u8 == pair[0] as u8 + 1);
        if contiguous && days.len() >= 3 {
            format!("{}-{}", days[0], days[days.len() - 1])
        } else {
            days.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

impl From<EnumSet<Day>> for DaySet {
    fn from(days: EnumSet<Day>) -> DaySet {
        DaySet(days)
    }
}

/// Daily enforcement hours. A time `t` is inside when `start <= t < end`. If `end` is at or before
/// `start`, the window runs overnight, past midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: Time,
    pub end: Time,
}

impl TimeWindow {
    pub fn new(start: Time, end: Time) -> Result<TimeWindow> {
        if start == end {
            bail!(
                "TimeWindow {} - {} is empty; omit the window for all-day rules",
                start,
                end
            );
        }
        Ok(TimeWindow { start, end })
    }

    /// Convenience for "08:00" - "18:00" style literals
    pub fn parse(start: &str, end: &str) -> Result<TimeWindow> {
        TimeWindow::new(Time::parse(start)?, Time::parse(end)?)
    }

    pub fn is_overnight(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, t: Time) -> bool {
        if self.is_overnight() {
            t >= self.start || t < self.end
        } else {
            t >= self.start && t < self.end
        }
    }

    /// The window that started on `date`, as absolute times.
    pub fn on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = at(date, self.start);
        let end = if self.is_overnight() {
            at(date + Duration::days(1), self.end)
        } else {
            at(date, self.end)
        };
        (start, end)
    }

    /// Like "8:00 AM - 6:00 PM"
    pub fn describe(&self) -> String {
        format!(
            "{} - {}",
            self.start.ampm_tostring(),
            self.end.ampm_tostring()
        )
    }
}

/// The clock time of a moment, truncated to the minute.
pub fn time_of(now: NaiveDateTime) -> Time {
    // Minutes since midnight from a valid NaiveTime are always in range
    Time::minutes_since_midnight((now.hour() * 60 + now.minute()) as u16)
        .unwrap_or(Time::START_OF_DAY)
}

pub fn day_of(now: NaiveDateTime) -> Day {
    Day::of(now.date())
}

/// A clock time on some date.
pub fn at(date: NaiveDate, time: Time) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::minutes(time.inner_minutes() as i64)
}
