//! The parking rules model: which regulation areas cover a point, whether a driver's permits are
//! good there, and how long they can stay.
//!
//! Everything takes the query time as a `NaiveDateTime` in the city's local time. Areas and
//! regulations are immutable once loaded, and every query is a pure function of its inputs.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod lookup;
mod objects;
mod park_until;
pub mod raw;
mod rules;
mod schedule;

pub use crate::lookup::{AreaLookup, Confidence, LookupConfig, LookupResult};
pub use crate::objects::area::RegulationArea;
pub use crate::objects::permit::Permit;
pub use crate::objects::regulation::{Regulation, RegulationKind};
pub use crate::park_until::{calculate_deadline, next_restriction, DeadlineReason, ParkUntil};
pub use crate::rules::{
    interpret, ConditionalFlag, ConditionalKind, RuleInterpretation, Severity, ValidityStatus,
    Warning, WarningKind,
};
pub use crate::schedule::{at, day_of, time_of, Day, DaySet, TimeWindow};
