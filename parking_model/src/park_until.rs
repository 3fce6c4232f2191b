//! The earliest upcoming moment that some regulation stops the driver from staying parked.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schedule::{day_of, time_of};
use crate::{Regulation, RegulationKind, ValidityStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadlineReason {
    /// The time limit runs out.
    TimeLimit,
    /// Time limit enforcement begins (or resumes).
    EnforcementStart,
    /// Street cleaning, tow-away, or some other ban on parking begins.
    RestrictionStart,
    /// Meter enforcement ends for the day.
    MeteredEnd,
}

impl fmt::Display for DeadlineReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DeadlineReason::TimeLimit => "time limit",
            DeadlineReason::EnforcementStart => "enforcement starts",
            DeadlineReason::RestrictionStart => "restriction starts",
            DeadlineReason::MeteredEnd => "meter ends",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParkUntil {
    Until {
        deadline: NaiveDateTime,
        reason: DeadlineReason,
        /// What produced this deadline
        kind: RegulationKind,
    },
    /// The data is too incomplete to say. Defer to posted signs.
    Unknown,
}

impl ParkUntil {
    pub fn deadline(&self) -> Option<NaiveDateTime> {
        match self {
            ParkUntil::Until { deadline, .. } => Some(*deadline),
            ParkUntil::Unknown => None,
        }
    }

    pub fn reason(&self) -> Option<DeadlineReason> {
        match self {
            ParkUntil::Until { reason, .. } => Some(*reason),
            ParkUntil::Unknown => None,
        }
    }
}

impl fmt::Display for ParkUntil {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParkUntil::Until {
                deadline,
                reason,
                kind,
            } => write!(
                f,
                "Park until {} {} ({}, {})",
                deadline.date(),
                time_of(*deadline).ampm_tostring(),
                kind,
                reason
            ),
            ParkUntil::Unknown => write!(f, "Check posted signs"),
        }
    }
}

struct Candidate {
    deadline: NaiveDateTime,
    reason: DeadlineReason,
    kind: RegulationKind,
}

/// Considers every regulation independently and returns the earliest deadline. `None` means
/// nothing limits how long the driver can stay. Time limits only bind drivers without a covering
/// permit.
pub fn calculate_deadline(
    regulations: &[Regulation],
    status: ValidityStatus,
    now: NaiveDateTime,
) -> Option<ParkUntil> {
    let time_limits_apply = !matches!(
        status,
        ValidityStatus::Valid | ValidityStatus::MultipleApply
    );
    let mut candidates = Vec::new();
    let mut incomplete = false;

    for reg in regulations {
        match reg.kind {
            kind if kind.is_restriction() => {
                let start = if reg.is_active_at(now) {
                    Some(now)
                } else {
                    reg.next_start(now)
                };
                if let Some(deadline) = start {
                    candidates.push(Candidate {
                        deadline,
                        reason: DeadlineReason::RestrictionStart,
                        kind,
                    });
                }
            }
            RegulationKind::TimeLimit => {
                if !time_limits_apply {
                    continue;
                }
                match time_limit_deadline(reg, now) {
                    Some(candidate) => candidates.push(candidate),
                    None => {
                        if reg.time_limit_minutes.is_none() {
                            warn!("Time limit regulation without a limit: {:?}", reg);
                            incomplete = true;
                        }
                    }
                }
            }
            RegulationKind::Metered => {
                if reg.window.is_none() {
                    incomplete = true;
                    continue;
                }
                candidates.extend(meter_deadlines(reg, now, time_limits_apply));
            }
            _ => {}
        }
    }

    let best = candidates.into_iter().min_by_key(|c| c.deadline);
    debug!("Deadline at {}: {:?}", now, best.as_ref().map(|c| c.deadline));
    match best {
        Some(c) => Some(ParkUntil::Until {
            deadline: c.deadline,
            reason: c.reason,
            kind: c.kind,
        }),
        None if incomplete => Some(ParkUntil::Unknown),
        None => None,
    }
}

fn time_limit_deadline(reg: &Regulation, now: NaiveDateTime) -> Option<Candidate> {
    let limit = Duration::minutes(reg.time_limit_minutes? as i64);
    let enforcement_start = |deadline: NaiveDateTime| Candidate {
        deadline,
        reason: DeadlineReason::EnforcementStart,
        kind: RegulationKind::TimeLimit,
    };

    if reg.window.is_none() && !reg.applies_on(day_of(now)) {
        return reg.next_start(now).map(enforcement_start);
    }
    match reg.active_period_end(now) {
        Some(end) => {
            let expires = now + limit;
            if expires > end {
                // Enforcement lapses before the limit runs out, so the clock restarts with the
                // next period. A limit without a window is always now plus the limit, even when
                // that crosses into a day the limit doesn't apply on.
                if reg.window.is_none() {
                    return Some(Candidate {
                        deadline: expires,
                        reason: DeadlineReason::TimeLimit,
                        kind: RegulationKind::TimeLimit,
                    });
                }
                reg.next_start(end).map(enforcement_start)
            } else {
                Some(Candidate {
                    deadline: expires,
                    reason: DeadlineReason::TimeLimit,
                    kind: RegulationKind::TimeLimit,
                })
            }
        }
        None => reg.next_start(now).map(enforcement_start),
    }
}

fn meter_deadlines(reg: &Regulation, now: NaiveDateTime, time_limits_apply: bool) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let window = match reg.window {
        Some(window) => window,
        None => return candidates,
    };

    let end = match reg.active_period_end(now) {
        Some(end) => Some(end),
        None if reg.applies_on(day_of(now)) => {
            let (_, end) = window.on(now.date());
            (end > now).then_some(end)
        }
        None => None,
    };
    let end = match end {
        Some(end) => end,
        None => return candidates,
    };
    candidates.push(Candidate {
        deadline: end,
        reason: DeadlineReason::MeteredEnd,
        kind: RegulationKind::Metered,
    });

    if !time_limits_apply || !reg.is_active_at(now) {
        return candidates;
    }
    if let Some(limit) = reg.time_limit_minutes {
        let expires = now + Duration::minutes(limit as i64);
        if expires < end {
            candidates.push(Candidate {
                deadline: expires,
                reason: DeadlineReason::TimeLimit,
                kind: RegulationKind::Metered,
            });
        }
    }
    candidates
}

/// When the next restriction after `now` starts, for "until" lines that don't care about time
/// limits.
pub fn next_restriction(regulations: &[Regulation], now: NaiveDateTime) -> Option<NaiveDateTime> {
    regulations
        .iter()
        .filter(|r| r.kind.is_restriction())
        .filter_map(|r| r.next_start(now))
        .min()
}
