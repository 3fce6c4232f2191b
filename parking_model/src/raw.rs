//! Municipal regulation records arrive with string-typed fields, like "Tu/Th" or "900". Everything
//! here converts them into `Regulation` and `RegulationArea` once, so nothing downstream branches
//! on raw strings.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use geom::{LonLat, Ring, Time};

use crate::{Day, DaySet, Regulation, RegulationArea, RegulationKind, TimeWindow};

/// Some fields show up as JSON numbers in one export and strings in another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    fn as_text(&self) -> String {
        match self {
            RawValue::Number(x) => x.to_string(),
            RawValue::Text(x) => x.trim().to_string(),
        }
    }

    fn as_number(&self) -> Result<f64> {
        match self {
            RawValue::Number(x) => Ok(*x),
            RawValue::Text(x) => x
                .trim()
                .parse()
                .with_context(|| format!("{} isn't a number", x)),
        }
    }
}

/// One row of a regulation dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRegulation {
    /// Like "Time limited" or "Pay or Permit"
    pub regulation: Option<String>,
    /// Like "M-F", "M-Sa", "Daily", or "Tu/Th"
    pub days: Option<String>,
    pub hrs_begin: Option<RawValue>,
    pub hrs_end: Option<RawValue>,
    /// In hours
    pub hrlimit: Option<RawValue>,
    pub rpparea1: Option<String>,
    pub rpparea2: Option<String>,
    pub rpparea3: Option<String>,
    pub exceptions: Option<String>,
}

impl RawRegulation {
    /// One raw row can turn into several regulations. "Pay or Permit" becomes a meter plus a
    /// permit regulation per area, and a time limit with permit areas becomes the limit plus a
    /// permit regulation per area. Unrecognized regulation types produce nothing.
    pub fn to_regulations(&self) -> Result<Vec<Regulation>> {
        let raw_type = self
            .regulation
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        let kind = match parse_kind(&raw_type) {
            Some(kind) => kind,
            None => {
                debug!("Skipping regulation type {:?}", raw_type);
                return Ok(Vec::new());
            }
        };

        let days = parse_days(self.days.as_deref())?;
        let window = self.parse_window()?;
        let time_limit_minutes = self.parse_time_limit()?;
        let zones = self.permit_zones();
        let note = self.exceptions.clone().unwrap_or_default().trim().to_string();

        let template = Regulation {
            days,
            window,
            note: note.clone(),
            ..Regulation::new(kind)
        };
        let permit_for = |zone: &String, note: String| Regulation {
            kind: RegulationKind::PermitRequired,
            permit_areas: std::iter::once(zone.clone()).collect(),
            note,
            ..template.clone()
        };

        let mut regulations = Vec::new();
        if raw_type == "pay or permit" {
            regulations.push(Regulation {
                time_limit_minutes,
                ..template.clone()
            });
            for zone in &zones {
                regulations.push(permit_for(zone, note.clone()));
            }
        } else if kind == RegulationKind::TimeLimit && !zones.is_empty() {
            regulations.push(Regulation {
                time_limit_minutes,
                ..template.clone()
            });
            let exempt = if note.is_empty() {
                "Exempt from time limits".to_string()
            } else {
                format!("Exempt from time limits. {}", note)
            };
            for zone in &zones {
                regulations.push(permit_for(zone, exempt.clone()));
            }
        } else {
            regulations.push(Regulation {
                time_limit_minutes,
                permit_areas: zones.iter().cloned().collect(),
                ..template.clone()
            });
        }
        Ok(regulations)
    }

    fn parse_window(&self) -> Result<Option<TimeWindow>> {
        let text = |x: &Option<RawValue>| x.as_ref().map(|x| x.as_text()).filter(|x| !x.is_empty());
        match (text(&self.hrs_begin), text(&self.hrs_end)) {
            (Some(begin), Some(end)) => {
                let start = Time::parse(&begin).with_context(|| format!("hrs_begin {}", begin))?;
                let end = Time::parse(&end).with_context(|| format!("hrs_end {}", end))?;
                // "0" to "2400" is all day
                if start == end {
                    Ok(None)
                } else {
                    Ok(Some(TimeWindow::new(start, end)?))
                }
            }
            (None, None) => Ok(None),
            (begin, end) => bail!(
                "Only one end of the enforcement hours: {:?} - {:?}",
                begin,
                end
            ),
        }
    }

    fn parse_time_limit(&self) -> Result<Option<u32>> {
        let hours = match self.hrlimit {
            Some(ref x) => x.as_number().context("hrlimit")?,
            None => return Ok(None),
        };
        if !hours.is_finite() || hours < 0.0 {
            bail!("Bad hrlimit {}", hours);
        }
        if hours == 0.0 {
            return Ok(None);
        }
        Ok(Some((hours * 60.0).round() as u32))
    }

    fn permit_zones(&self) -> Vec<String> {
        [&self.rpparea1, &self.rpparea2, &self.rpparea3]
            .into_iter()
            .flatten()
            .map(|zone| zone.trim().to_ascii_uppercase())
            .filter(|zone| !zone.is_empty())
            .collect()
    }
}

fn parse_kind(raw_type: &str) -> Option<RegulationKind> {
    match raw_type {
        "time limited" => Some(RegulationKind::TimeLimit),
        "residential permit" => Some(RegulationKind::PermitRequired),
        "no parking any time" | "no parking anytime" => Some(RegulationKind::NoParking),
        "street cleaning" => Some(RegulationKind::StreetCleaning),
        "metered parking" | "pay or permit" => Some(RegulationKind::Metered),
        "tow-away zone" | "tow away" => Some(RegulationKind::TowAway),
        "loading zone" => Some(RegulationKind::LoadingZone),
        _ => None,
    }
}

/// Missing days means every day.
pub fn parse_days(raw: Option<&str>) -> Result<DaySet> {
    let raw = match raw.map(|x| x.trim().to_ascii_uppercase()) {
        Some(x) if !x.is_empty() => x,
        _ => return Ok(DaySet::every_day()),
    };
    match raw.as_str() {
        "DAILY" | "M-SU" => return Ok(DaySet::every_day()),
        "M-F" => return Ok(DaySet::weekdays()),
        "M-SA" => return Ok(DaySet::only(DaySet::weekdays().days() | Day::Sat)),
        _ => {}
    }

    let mut days = EnumSet::new();
    for code in raw.split(|c: char| c == '/' || c == ',' || c.is_whitespace()) {
        if code.is_empty() {
            continue;
        }
        let day = match code {
            "M" => Day::Mon,
            "TU" => Day::Tue,
            "W" => Day::Wed,
            "TH" => Day::Thu,
            "F" => Day::Fri,
            "SA" => Day::Sat,
            "SU" => Day::Sun,
            _ => bail!("Unknown day {} in {}", code, raw),
        };
        days.insert(day);
    }
    if days.is_empty() {
        bail!("No days in {}", raw);
    }
    Ok(DaySet::only(days))
}

/// A boundary and its regulation rows, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawArea {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub boundary: Vec<LonLat>,
    pub regulations: Vec<RawRegulation>,
    /// Guessed from the regulations when missing
    #[serde(default)]
    pub restrictiveness: Option<u8>,
}

impl RawArea {
    pub fn to_area(&self) -> Result<RegulationArea> {
        let boundary = Ring::new(self.boundary.clone())
            .with_context(|| format!("boundary of {}", self.id))?;
        let mut regulations = Vec::new();
        for (idx, raw) in self.regulations.iter().enumerate() {
            regulations.extend(
                raw.to_regulations()
                    .with_context(|| format!("regulation {} of {}", idx, self.id))?,
            );
        }

        let valid_permit_areas: BTreeSet<String> = regulations
            .iter()
            .flat_map(|r| r.permit_areas.iter().cloned())
            .collect();
        let requires_permit = regulations
            .iter()
            .any(|r| r.kind == RegulationKind::PermitRequired);
        let restrictiveness = self
            .restrictiveness
            .unwrap_or_else(|| guess_restrictiveness(&regulations));

        RegulationArea::new(
            self.id.clone(),
            self.name.clone(),
            boundary,
            regulations,
            valid_permit_areas,
            requires_permit,
            restrictiveness,
        )
    }
}

/// The most restrictive regulation decides.
fn guess_restrictiveness(regulations: &[Regulation]) -> u8 {
    regulations
        .iter()
        .map(|r| match r.kind {
            RegulationKind::TowAway => 10,
            RegulationKind::NoParking => 9,
            RegulationKind::PermitRequired => 8,
            RegulationKind::LoadingZone => 7,
            RegulationKind::Metered => 6,
            RegulationKind::TimeLimit => 5,
            RegulationKind::StreetCleaning => 4,
        })
        .max()
        .unwrap_or(1)
}

/// Converts everything that's valid. Bad areas are logged and skipped, so one broken record
/// doesn't sink a whole dataset.
pub fn import_areas(raw: &[RawArea]) -> Vec<RegulationArea> {
    let mut areas = Vec::new();
    for area in raw {
        match area.to_area() {
            Ok(area) => areas.push(area),
            Err(err) => warn!("Skipping area {}: {:#}", area.id, err),
        }
    }
    info!(
        "Imported {} of {} regulation areas ({} regulations)",
        areas.len(),
        raw.len(),
        areas.iter().map(|a| a.regulations.len()).sum::<usize>()
    );
    areas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Permit;

    fn text(x: &str) -> Option<RawValue> {
        Some(RawValue::Text(x.to_string()))
    }

    #[test]
    fn days() {
        for (input, expected) in [
            (None, DaySet::every_day()),
            (Some(""), DaySet::every_day()),
            (Some("Daily"), DaySet::every_day()),
            (Some("M-Su"), DaySet::every_day()),
            (Some("M-F"), DaySet::weekdays()),
            (
                Some("M-Sa"),
                DaySet::only(Day::Mon | Day::Tue | Day::Wed | Day::Thu | Day::Fri | Day::Sat),
            ),
            (Some("Tu/Th"), DaySet::only(Day::Tue | Day::Thu)),
            (Some("M/W/F"), DaySet::only(Day::Mon | Day::Wed | Day::Fri)),
            (Some("sa su"), DaySet::only(Day::Sat | Day::Sun)),
        ] {
            assert_eq!(parse_days(input).unwrap(), expected, "{:?}", input);
        }
        assert!(parse_days(Some("Funday")).is_err());
    }

    #[test]
    fn time_limit_with_permit_areas() {
        let raw = RawRegulation {
            regulation: Some("Time limited".to_string()),
            days: Some("M-F".to_string()),
            hrs_begin: Some(RawValue::Number(800.0)),
            hrs_end: text("1800"),
            hrlimit: text("2"),
            rpparea1: Some("q".to_string()),
            rpparea2: Some("R ".to_string()),
            ..Default::default()
        };
        let regs = raw.to_regulations().unwrap();
        assert_eq!(regs.len(), 3);
        assert_eq!(regs[0].kind, RegulationKind::TimeLimit);
        assert_eq!(regs[0].time_limit_minutes, Some(120));
        assert!(regs[0].permit_areas.is_empty());
        assert_eq!(regs[0].window, Some(TimeWindow::parse("08:00", "18:00").unwrap()));
        assert_eq!(regs[0].days, DaySet::weekdays());
        for (reg, zone) in regs[1..].iter().zip(["Q", "R"]) {
            assert_eq!(reg.kind, RegulationKind::PermitRequired);
            assert!(reg.permit_areas.contains(zone));
            assert_eq!(reg.note, "Exempt from time limits");
            assert_eq!(reg.time_limit_minutes, None);
        }
    }

    #[test]
    fn pay_or_permit() {
        let raw = RawRegulation {
            regulation: Some("Pay or Permit".to_string()),
            days: Some("M-Sa".to_string()),
            hrs_begin: text("900"),
            hrs_end: text("1800"),
            hrlimit: Some(RawValue::Number(4.0)),
            rpparea1: Some("A".to_string()),
            exceptions: Some("Yes. RPP holders are exempt".to_string()),
            ..Default::default()
        };
        let regs = raw.to_regulations().unwrap();
        let kinds: Vec<RegulationKind> = regs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![RegulationKind::Metered, RegulationKind::PermitRequired]
        );
        assert_eq!(regs[0].time_limit_minutes, Some(240));
        assert_eq!(regs[1].note, "Yes. RPP holders are exempt");
    }

    #[test]
    fn overnight_and_all_day_hours() {
        let raw = RawRegulation {
            regulation: Some("Tow-away zone".to_string()),
            hrs_begin: text("2200"),
            hrs_end: text("2400"),
            ..Default::default()
        };
        let window = raw.to_regulations().unwrap()[0].window.unwrap();
        assert!(window.is_overnight());

        let raw = RawRegulation {
            regulation: Some("No parking any time".to_string()),
            hrs_begin: text("0"),
            hrs_end: text("2400"),
            ..Default::default()
        };
        assert_eq!(raw.to_regulations().unwrap()[0].window, None);
    }

    #[test]
    fn bad_rows() {
        let unknown = RawRegulation {
            regulation: Some("No oversized vehicles".to_string()),
            ..Default::default()
        };
        assert!(unknown.to_regulations().unwrap().is_empty());

        let half_window = RawRegulation {
            regulation: Some("Street cleaning".to_string()),
            hrs_begin: text("800"),
            ..Default::default()
        };
        assert!(half_window.to_regulations().is_err());

        let bad_limit = RawRegulation {
            regulation: Some("Time limited".to_string()),
            hrlimit: text("two"),
            ..Default::default()
        };
        assert!(bad_limit.to_regulations().is_err());
    }

    #[test]
    fn import_skips_bad_areas() {
        let square = vec![
            LonLat::new(-122.44, 37.76),
            LonLat::new(-122.43, 37.76),
            LonLat::new(-122.43, 37.77),
            LonLat::new(-122.44, 37.77),
        ];
        let good = RawArea {
            id: "good".to_string(),
            name: "Area Q".to_string(),
            boundary: square.clone(),
            regulations: vec![RawRegulation {
                regulation: Some("Residential permit".to_string()),
                rpparea1: Some("Q".to_string()),
                ..Default::default()
            }],
            restrictiveness: None,
        };
        let degenerate = RawArea {
            id: "degenerate".to_string(),
            boundary: square[..2].to_vec(),
            ..good.clone()
        };
        let areas = import_areas(&[good, degenerate]);
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].id, "good");
        assert!(areas[0].requires_permit);
        assert!(areas[0].accepts(&Permit::new("p1", "Q", "sf")));
        assert_eq!(areas[0].restrictiveness, 8);
    }
}
