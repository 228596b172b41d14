//! Time-off records, the per-day blocking index and request-time vacation checks.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::calendar::HolidayCalendar;
use crate::config::VacationPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOffKind {
    Vacation,
    DayoffGrant,
    Travel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOffStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

/// An absence over an inclusive date range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRecord {
    pub person_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: TimeOffKind,
    #[serde(default)]
    pub status: TimeOffStatus,
    /// Hours credited per travel day
    #[serde(default)]
    pub hours_per_day: f64,
}

impl TimeOffRecord {
    /// Day-off grants always block; everything else only once approved.
    pub fn is_effective(&self) -> bool {
        self.kind == TimeOffKind::DayoffGrant || self.status == TimeOffStatus::Approved
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// What blocks a person on a given day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeOffEntry {
    pub kind: TimeOffKind,
    pub hours_per_day: f64,
}

impl TimeOffEntry {
    pub fn travel_credit_minutes(&self) -> i64 {
        if self.kind == TimeOffKind::Travel {
            (self.hours_per_day * 60.0).round() as i64
        } else {
            0
        }
    }
}

/// Effective time-off indexed by person and date.
///
/// When effective records overlap, the later record in input order wins.
#[derive(Clone, Debug, Default)]
pub struct TimeOffIndex {
    by_person: FxHashMap<String, FxHashMap<NaiveDate, TimeOffEntry>>,
}

impl TimeOffIndex {
    pub fn build(records: &[TimeOffRecord]) -> Self {
        let mut by_person: FxHashMap<String, FxHashMap<NaiveDate, TimeOffEntry>> =
            FxHashMap::default();
        for record in records.iter().filter(|r| r.is_effective()) {
            let days = by_person.entry(record.person_id.clone()).or_default();
            for date in record.dates() {
                days.insert(
                    date,
                    TimeOffEntry {
                        kind: record.kind,
                        hours_per_day: record.hours_per_day,
                    },
                );
            }
        }
        Self { by_person }
    }

    #[inline]
    pub fn get(&self, person_id: &str, date: NaiveDate) -> Option<&TimeOffEntry> {
        self.by_person.get(person_id).and_then(|days| days.get(&date))
    }

    #[inline]
    pub fn has(&self, person_id: &str, date: NaiveDate) -> bool {
        self.get(person_id, date).is_some()
    }
}

/// Refusals raised when a vacation request is filed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VacationError {
    #[error("Vacation for {person_id} exceeds the balance ({used}+{adding} > {allowed})")]
    BalanceExceeded {
        person_id: String,
        used: u32,
        adding: u32,
        allowed: u32,
    },
    #[error("Vacation on {date} falls in a month the vacation policy does not permit")]
    MonthNotPermitted { date: NaiveDate },
}

/// Approved vacation days charged per person.
pub fn approved_vacation_days(
    records: &[TimeOffRecord],
    holidays: &HolidayCalendar,
    consume_on_holiday: bool,
) -> BTreeMap<String, u32> {
    let mut used: BTreeMap<String, u32> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.kind == TimeOffKind::Vacation && r.status == TimeOffStatus::Approved)
    {
        *used.entry(record.person_id.clone()).or_insert(0) +=
            holidays.vacation_days_charged(record.start, record.end, consume_on_holiday);
    }
    used
}

/// Validate a new time-off request against the vacation policy and balance.
///
/// Only vacation requests are checked: every date must fall in a permitted
/// month, and an approved request must fit in `allowance_days` together with
/// the person's already approved vacations. Returns the days the request
/// charges.
pub fn check_vacation_request(
    request: &TimeOffRecord,
    existing: &[TimeOffRecord],
    allowance_days: u32,
    holidays: &HolidayCalendar,
    consume_on_holiday: bool,
    policy: &VacationPolicy,
) -> Result<u32, VacationError> {
    if request.kind != TimeOffKind::Vacation {
        return Ok(0);
    }
    if let Some(date) = request.dates().find(|d| !policy.is_date_allowed(*d)) {
        return Err(VacationError::MonthNotPermitted { date });
    }

    let adding = holidays.vacation_days_charged(request.start, request.end, consume_on_holiday);
    if request.status != TimeOffStatus::Approved {
        return Ok(adding);
    }

    let used = approved_vacation_days(existing, holidays, consume_on_holiday)
        .get(&request.person_id)
        .copied()
        .unwrap_or(0);
    if used + adding > allowance_days {
        return Err(VacationError::BalanceExceeded {
            person_id: request.person_id.clone(),
            used,
            adding,
            allowed: allowance_days,
        });
    }
    Ok(adding)
}
