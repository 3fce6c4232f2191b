use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A clock time of day, in whole minutes since midnight. Always in `[0, 1440)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Time(u16);

impl Time {
    pub const START_OF_DAY: Time = Time(0);

    pub fn minutes_since_midnight(value: u16) -> Result<Time> {
        if value >= MINUTES_PER_DAY {
            bail!("Bad Time {}, must be under {}", value, MINUTES_PER_DAY);
        }
        Ok(Time(value))
    }

    pub fn hm(hours: u16, minutes: u16) -> Result<Time> {
        if hours >= 24 || minutes >= 60 {
            bail!("Bad Time {}:{}", hours, minutes);
        }
        Time::minutes_since_midnight(hours * 60 + minutes)
    }

    pub fn inner_minutes(self) -> u16 {
        self.0
    }

    fn get_parts(self) -> (u16, u16) {
        (self.0 / 60, self.0 % 60)
    }

    /// Like "3:05 PM"
    pub fn ampm_tostring(self) -> String {
        let (mut hours, minutes) = self.get_parts();
        let suffix = if hours < 12 { "AM" } else { "PM" };
        if hours == 0 {
            hours = 12;
        } else if hours > 12 {
            hours -= 12;
        }
        format!("{}:{:02} {}", hours, minutes, suffix)
    }

    /// Understands "18:30", "6:30 PM", "6PM", and the compact "1830" / "900" forms municipal data
    /// uses. "2400" and "24:00" mean midnight.
    pub fn parse(string: &str) -> Result<Time> {
        let trimmed = string.trim().to_ascii_uppercase();
        if trimmed.is_empty() {
            bail!("Time is empty");
        }

        let (body, pm) = if let Some(rest) = trimmed.strip_suffix("PM") {
            (rest.trim(), Some(true))
        } else if let Some(rest) = trimmed.strip_suffix("AM") {
            (rest.trim(), Some(false))
        } else {
            (trimmed.as_str(), None)
        };

        let (hours, minutes): (u16, u16) = if let Some((h, m)) = body.split_once(':') {
            (h.trim().parse()?, m.trim().parse()?)
        } else if pm.is_some() || body.len() <= 2 {
            (body.parse()?, 0)
        } else {
            let value: u16 = body.parse()?;
            (value / 100, value % 100)
        };

        let hours = match pm {
            Some(is_pm) => {
                if hours == 0 || hours > 12 {
                    bail!("Time {}: bad 12-hour clock value", string);
                }
                match (hours, is_pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                }
            }
            None => hours,
        };
        if hours == 24 && minutes == 0 {
            return Ok(Time::START_OF_DAY);
        }
        if hours >= 24 {
            bail!("Time {}: hours out of range", string);
        }
        Time::hm(hours, minutes)
    }
}

impl TryFrom<u16> for Time {
    type Error = anyhow::Error;

    fn try_from(value: u16) -> Result<Time> {
        Time::minutes_since_midnight(value)
    }
}

impl From<Time> for u16 {
    fn from(time: Time) -> u16 {
        time.0
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (hours, minutes) = self.get_parts();
        write!(f, "{:02}:{:02}", hours, minutes)
    }
}
