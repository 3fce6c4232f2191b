//! Decides whether a driver's permits are good in an area right now, and describes the rules.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Permit, Regulation, RegulationArea, RegulationKind};

/// Time limits with this much time or less remaining produce a warning.
const TIME_LIMIT_WARNING_MINUTES: i64 = 120;
/// Street cleaning and tow-away starting this soon produce a warning.
const UPCOMING_RESTRICTION_MINUTES: i64 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidityStatus {
    /// Exactly one of the driver's permits covers this area.
    Valid,
    /// The driver has permits, but none for this area.
    Invalid,
    /// Valid only under conditions. Conditional flags never produce this today; they're surfaced
    /// alongside the status instead.
    Conditional,
    NoPermitRequired,
    /// More than one of the driver's permits covers this area.
    MultipleApply,
    /// The driver hasn't entered any permits.
    NoPermitSet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Caution,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    StreetCleaning,
    TowAway,
    TimeLimit,
    UpcomingRestriction,
    PermitExpired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub severity: Severity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionalKind {
    TimeRestricted,
    DayRestricted,
    MeterPayment,
}

/// Advisory only; never changes the status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalFlag {
    pub kind: ConditionalKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuleInterpretation<'p> {
    pub status: ValidityStatus,
    pub applicable_permits: Vec<&'p Permit>,
    pub summary: Vec<String>,
    pub warnings: Vec<Warning>,
    pub conditional_flags: Vec<ConditionalFlag>,
}

/// `now` is local time in the area's city.
pub fn interpret<'p>(
    area: &RegulationArea,
    permits: &'p [Permit],
    now: NaiveDateTime,
) -> RuleInterpretation<'p> {
    let mut warnings = Vec::new();
    let mut applicable_permits = Vec::new();

    let status = if !area.requires_permit {
        ValidityStatus::NoPermitRequired
    } else {
        for permit in permits {
            if !area.accepts(permit) {
                continue;
            }
            if permit.is_expired_at(now) {
                warnings.push(Warning {
                    kind: WarningKind::PermitExpired,
                    message: format!("Your Area {} permit has expired", permit.area_code),
                    severity: Severity::Caution,
                });
            } else {
                applicable_permits.push(permit);
            }
        }
        if permits.is_empty() {
            ValidityStatus::NoPermitSet
        } else {
            match applicable_permits.len() {
                0 => ValidityStatus::Invalid,
                1 => ValidityStatus::Valid,
                _ => ValidityStatus::MultipleApply,
            }
        }
    };
    debug!(
        "{} with {} permits at {}: {:?}",
        area.id,
        permits.len(),
        now,
        status
    );

    warnings.extend(restriction_warnings(area, now));

    RuleInterpretation {
        status,
        applicable_permits,
        summary: summarize(area),
        warnings,
        conditional_flags: conditional_flags(area),
    }
}

fn restriction_warnings(area: &RegulationArea, now: NaiveDateTime) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for reg in &area.regulations {
        match reg.kind {
            RegulationKind::StreetCleaning | RegulationKind::TowAway => {
                let (kind, label) = if reg.kind == RegulationKind::StreetCleaning {
                    (WarningKind::StreetCleaning, "Street cleaning")
                } else {
                    (WarningKind::TowAway, "Tow-away")
                };
                if let Some(end) = reg.active_period_end(now) {
                    warnings.push(Warning {
                        kind,
                        message: format!("{} in effect until {}", label, clock(end)),
                        severity: Severity::Critical,
                    });
                } else if let Some(start) = reg.next_start(now) {
                    if start - now <= Duration::minutes(UPCOMING_RESTRICTION_MINUTES) {
                        warnings.push(Warning {
                            kind: WarningKind::UpcomingRestriction,
                            message: format!("{} starts at {}", label, clock(start)),
                            severity: Severity::Caution,
                        });
                    }
                }
            }
            RegulationKind::TimeLimit => {
                let (limit, end) = match (reg.time_limit_minutes, reg.active_period_end(now)) {
                    (Some(limit), Some(end)) => (limit, end),
                    _ => continue,
                };
                let remaining = Duration::minutes(limit as i64).min(end - now);
                let minutes = remaining.num_minutes();
                if minutes > TIME_LIMIT_WARNING_MINUTES {
                    continue;
                }
                let severity = if minutes <= 30 {
                    Severity::Critical
                } else if minutes <= 60 {
                    Severity::Caution
                } else {
                    Severity::Info
                };
                warnings.push(Warning {
                    kind: WarningKind::TimeLimit,
                    message: format!(
                        "{} limit, {} remaining",
                        describe_minutes(limit),
                        describe_minutes(minutes.max(0) as u32)
                    ),
                    severity,
                });
            }
            _ => {}
        }
    }
    warnings
}

fn conditional_flags(area: &RegulationArea) -> Vec<ConditionalFlag> {
    let mut flags = Vec::new();
    let enforced = area.regulations.iter().filter(|r| {
        matches!(
            r.kind,
            RegulationKind::PermitRequired | RegulationKind::TimeLimit | RegulationKind::Metered
        )
    });
    let mut time_restricted = false;
    let mut day_restricted = false;
    for reg in enforced {
        if let Some(window) = reg.window.filter(|_| !time_restricted) {
            time_restricted = true;
            flags.push(ConditionalFlag {
                kind: ConditionalKind::TimeRestricted,
                message: format!("Enforced only {}", window.describe()),
            });
        }
        if !day_restricted && !reg.days.is_every_day() {
            day_restricted = true;
            flags.push(ConditionalFlag {
                kind: ConditionalKind::DayRestricted,
                message: format!("Enforced only {}", reg.days.describe()),
            });
        }
    }
    if let Some(meter) = area.regulations_of(RegulationKind::Metered).next() {
        let message = match meter.meter_rate_per_hour {
            Some(rate) => format!("Pay the meter (${:.2}/hr)", rate),
            None => "Pay the meter".to_string(),
        };
        flags.push(ConditionalFlag {
            kind: ConditionalKind::MeterPayment,
            message,
        });
    }
    flags
}

/// Always in the same order: the name, who needs a permit, the time limit, enforcement hours,
/// street cleaning, then everything else in the order the area lists it.
fn summarize(area: &RegulationArea) -> Vec<String> {
    let mut lines = vec![area.display_name().to_string()];

    if area.requires_permit {
        let codes: Vec<&str> = area.valid_permit_areas.iter().map(|c| c.as_str()).collect();
        lines.push(format!("Permit required: Area {}", codes.join(", ")));
    } else {
        lines.push("No permit required".to_string());
    }

    let time_limit = area
        .regulations_of(RegulationKind::TimeLimit)
        .find(|r| r.time_limit_minutes.is_some());
    if let Some(minutes) = time_limit.and_then(|r| r.time_limit_minutes) {
        if area.requires_permit {
            lines.push(format!("{} limit without permit", describe_minutes(minutes)));
        } else {
            lines.push(format!("{} limit", describe_minutes(minutes)));
        }
    }

    let enforcement = time_limit
        .filter(|r| r.window.is_some())
        .or_else(|| {
            area.regulations.iter().find(|r| {
                matches!(
                    r.kind,
                    RegulationKind::PermitRequired
                        | RegulationKind::TimeLimit
                        | RegulationKind::Metered
                ) && r.window.is_some()
            })
        });
    if let Some(reg) = enforcement {
        lines.push(format!("Enforced {}", reg.describe_schedule()));
    }

    for reg in area.regulations_of(RegulationKind::StreetCleaning) {
        lines.push(format!("Street cleaning {}", reg.describe_schedule()));
    }

    for reg in &area.regulations {
        if matches!(
            reg.kind,
            RegulationKind::PermitRequired
                | RegulationKind::TimeLimit
                | RegulationKind::StreetCleaning
        ) {
            continue;
        }
        lines.push(describe_regulation(reg));
    }
    lines
}

fn describe_regulation(reg: &Regulation) -> String {
    if !reg.note.is_empty() {
        return reg.note.clone();
    }
    let mut line = match reg.kind {
        RegulationKind::Metered => match reg.meter_rate_per_hour {
            Some(rate) => format!("Metered ${:.2}/hr", rate),
            None => "Metered".to_string(),
        },
        RegulationKind::TowAway => "Tow-away zone".to_string(),
        RegulationKind::NoParking => "No parking".to_string(),
        RegulationKind::LoadingZone => "Loading zone".to_string(),
        other => other.to_string(),
    };
    line.push(' ');
    line.push_str(&reg.describe_schedule());
    line
}

/// Like "2 hr", "90 min"
fn describe_minutes(minutes: u32) -> String {
    if minutes >= 60 && minutes % 60 == 0 {
        format!("{} hr", minutes / 60)
    } else {
        format!("{} min", minutes)
    }
}

fn clock(t: NaiveDateTime) -> String {
    crate::schedule::time_of(t).ampm_tostring()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use geom::{LonLat, Ring};

    use super::*;
    use crate::{Day, DaySet, TimeWindow};

    fn tuesday(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn area(codes: &[&str], requires_permit: bool, regulations: Vec<Regulation>) -> RegulationArea {
        let boundary = Ring::new(vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(0.001, 0.0),
            LonLat::new(0.001, 0.001),
            LonLat::new(0.0, 0.001),
        ])
        .unwrap();
        RegulationArea::new(
            "zone".to_string(),
            "Area Q".to_string(),
            boundary,
            regulations,
            codes.iter().map(|c| c.to_string()).collect::<BTreeSet<_>>(),
            requires_permit,
            8,
        )
        .unwrap()
    }

    fn time_limit(minutes: u32, start: &str, end: &str) -> Regulation {
        Regulation {
            time_limit_minutes: Some(minutes),
            days: DaySet::weekdays(),
            window: Some(TimeWindow::parse(start, end).unwrap()),
            ..Regulation::new(RegulationKind::TimeLimit)
        }
    }

    #[test]
    fn status_by_permits() {
        let zone = area(&["Q", "R"], true, Vec::new());
        for (codes, expected) in [
            (vec![], ValidityStatus::NoPermitSet),
            (vec!["Q"], ValidityStatus::Valid),
            (vec!["Q", "R"], ValidityStatus::MultipleApply),
            (vec!["S"], ValidityStatus::Invalid),
            (vec!["S", "r"], ValidityStatus::Valid),
        ] {
            let permits: Vec<Permit> = codes
                .iter()
                .enumerate()
                .map(|(i, code)| Permit::new(format!("p{}", i), code.to_string(), "sf".to_string()))
                .collect();
            let result = interpret(&zone, &permits, tuesday(10, 0));
            assert_eq!(result.status, expected, "permits {:?}", codes);
        }
    }

    #[test]
    fn no_permit_required_short_circuits() {
        let zone = area(&[], false, Vec::new());
        let permits = vec![Permit::new("p", "Q", "sf")];
        let result = interpret(&zone, &permits, tuesday(10, 0));
        assert_eq!(result.status, ValidityStatus::NoPermitRequired);
        assert!(result.applicable_permits.is_empty());
    }

    #[test]
    fn expired_permits_dont_count() {
        let zone = area(&["Q"], true, Vec::new());
        let mut permit = Permit::new("p", "Q", "sf");
        permit.expiration = Some(tuesday(9, 0));
        let permits = vec![permit];
        let result = interpret(&zone, &permits, tuesday(10, 0));
        assert_eq!(result.status, ValidityStatus::Invalid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::PermitExpired);
    }

    #[test]
    fn time_limit_severity() {
        let zone = area(&["Q"], true, vec![time_limit(120, "08:00", "18:00")]);
        for (now, expected) in [
            // The full 2 hours remain
            (tuesday(10, 0), Some(Severity::Info)),
            // Enforcement ends in 50 minutes
            (tuesday(17, 10), Some(Severity::Caution)),
            (tuesday(17, 45), Some(Severity::Critical)),
            // Not enforced
            (tuesday(19, 0), None),
        ] {
            let result = interpret(&zone, &[], now);
            let warning = result
                .warnings
                .iter()
                .find(|w| w.kind == WarningKind::TimeLimit);
            assert_eq!(warning.map(|w| w.severity), expected, "at {}", now);
        }

        // Longer limits don't warn until they're nearly up
        let zone = area(&[], false, vec![time_limit(240, "08:00", "18:00")]);
        assert!(interpret(&zone, &[], tuesday(10, 0)).warnings.is_empty());
    }

    #[test]
    fn street_cleaning_warnings() {
        let cleaning = Regulation {
            days: DaySet::only(Day::Tue.into()),
            window: Some(TimeWindow::parse("12:00", "14:00").unwrap()),
            ..Regulation::new(RegulationKind::StreetCleaning)
        };
        let zone = area(&[], false, vec![cleaning]);

        let active = interpret(&zone, &[], tuesday(12, 30));
        assert_eq!(active.warnings.len(), 1);
        assert_eq!(active.warnings[0].kind, WarningKind::StreetCleaning);
        assert_eq!(active.warnings[0].severity, Severity::Critical);
        assert_eq!(active.warnings[0].message, "Street cleaning in effect until 2:00 PM");

        let soon = interpret(&zone, &[], tuesday(11, 0));
        assert_eq!(soon.warnings[0].kind, WarningKind::UpcomingRestriction);
        assert_eq!(soon.warnings[0].severity, Severity::Caution);

        assert!(interpret(&zone, &[], tuesday(8, 0)).warnings.is_empty());
    }

    #[test]
    fn flags_never_change_status() {
        let metered = Regulation {
            meter_rate_per_hour: Some(3.5),
            days: DaySet::only(Day::Mon | Day::Tue | Day::Wed | Day::Thu | Day::Fri | Day::Sat),
            window: Some(TimeWindow::parse("09:00", "18:00").unwrap()),
            ..Regulation::new(RegulationKind::Metered)
        };
        let zone = area(&["Q"], true, vec![metered]);
        let permits = vec![Permit::new("p", "Q", "sf")];
        let result = interpret(&zone, &permits, tuesday(10, 0));
        assert_eq!(result.status, ValidityStatus::Valid);
        let kinds: Vec<ConditionalKind> = result.conditional_flags.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConditionalKind::TimeRestricted,
                ConditionalKind::DayRestricted,
                ConditionalKind::MeterPayment
            ]
        );
        assert_eq!(result.conditional_flags[2].message, "Pay the meter ($3.50/hr)");
    }

    #[test]
    fn summary_order() {
        let cleaning = Regulation {
            days: DaySet::only(Day::Tue.into()),
            window: Some(TimeWindow::parse("12:00", "14:00").unwrap()),
            ..Regulation::new(RegulationKind::StreetCleaning)
        };
        let tow = Regulation {
            note: "Tow-away for special events".to_string(),
            ..Regulation::new(RegulationKind::TowAway)
        };
        let zone = area(
            &["Q"],
            true,
            vec![tow, cleaning, time_limit(120, "08:00", "18:00")],
        );
        let result = interpret(&zone, &[], tuesday(8, 0));
        assert_eq!(
            result.summary,
            vec![
                "Area Q",
                "Permit required: Area Q",
                "2 hr limit without permit",
                "Enforced Mon-Fri 8:00 AM - 6:00 PM",
                "Street cleaning Tue 12:00 PM - 2:00 PM",
                "Tow-away for special events",
            ]
        );
    }
}
