//! Reinforcement proposals that close contracted-hour shortfalls.
//!
//! Proposals only land on days with spare people, so applying them never
//! leaves a new slot unfilled.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::calendar::{off_person, CalendarResolver};
use crate::config::ReinforcementPolicy;
use crate::models::{EventSource, Person, ReinforcementEvent, Schedule, ShiftTemplate};
use crate::time_off::TimeOffIndex;
use crate::{log_changes, log_checks, log_debug};

pub const CONCILIATION_EVENT_LABEL: &str = "Conciliation reinforcement";

/// Minutes a person is still owed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub person_id: String,
    pub minutes: i64,
}

/// Shortfalls against a per-person target, in roster order.
pub fn shortfalls_from_target(
    people: &[Person],
    worked: &BTreeMap<String, i64>,
    target_minutes: i64,
) -> Vec<Shortfall> {
    people
        .iter()
        .map(|p| Shortfall {
            person_id: p.id.clone(),
            minutes: (target_minutes - worked.get(&p.id).copied().unwrap_or(0)).max(0),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedReinforcement {
    pub date: NaiveDate,
    pub person_id: String,
    pub shift: ShiftTemplate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeficitPlan {
    pub proposals: Vec<ProposedReinforcement>,
    /// One event per proposed date, ready to merge into the event list
    pub events: Vec<ReinforcementEvent>,
    /// Shortfall left per person after the proposals
    pub remaining: BTreeMap<String, i64>,
}

/// Everything the generator reads.
///
/// `week_count` may reach past the schedule; dates without a cell count as
/// having no occupied slots.
#[derive(Clone, Copy, Debug)]
pub struct DeficitRequest<'a> {
    pub schedule: &'a Schedule,
    pub people: &'a [Person],
    pub horizon_start: NaiveDate,
    pub week_count: u32,
    pub shortfalls: &'a [Shortfall],
    pub reinforcement: &'a ShiftTemplate,
    pub calendar: &'a CalendarResolver,
    pub time_off: &'a TimeOffIndex,
    pub policy: &'a ReinforcementPolicy,
    pub batch_id: Option<&'a str>,
    pub verbosity: u8,
}

/// People who could take a slot on `date`: everyone except the week's
/// off-person and those with time-off.
fn available_people(req: &DeficitRequest<'_>, week: u32, date: NaiveDate) -> i64 {
    let off_id = off_person(req.people, week).id.as_str();
    req.people
        .iter()
        .filter(|p| p.id != off_id && !req.time_off.has(&p.id, date))
        .count() as i64
}

/// Propose reinforcement shifts for the largest shortfalls first.
///
/// Each person walks the horizon week by week, Monday to Friday, and takes a
/// day when they are not already working it, the day is open, they have no
/// time-off, the month is allowed, their weekly and monthly caps are not
/// reached and the day still has a free person after assigned and proposed
/// slots. Each proposal reduces the shortfall by the shift's net minutes.
pub fn propose_reinforcements(req: &DeficitRequest<'_>) -> DeficitPlan {
    let verbosity = req.verbosity;
    let net = req.reinforcement.net_minutes();

    let mut order: Vec<&Shortfall> = req.shortfalls.iter().collect();
    order.sort_by(|a, b| b.minutes.cmp(&a.minutes));

    let mut proposals: Vec<ProposedReinforcement> = Vec::new();
    let mut proposed_per_day: FxHashMap<NaiveDate, i64> = FxHashMap::default();
    let mut week_counts: FxHashMap<(String, i32, u32), u32> = FxHashMap::default();
    let mut month_counts: FxHashMap<(String, i32, u32), u32> = FxHashMap::default();
    let mut remaining: BTreeMap<String, i64> = BTreeMap::new();

    log_changes!(
        verbosity,
        "Deficit proposals over {} weeks from {} ({} people short)",
        req.week_count,
        req.horizon_start,
        order.iter().filter(|s| s.minutes > 0).count()
    );

    for shortfall in order {
        let pid = shortfall.person_id.as_str();
        let mut need = shortfall.minutes.max(0);

        'weeks: for week in 0..req.week_count {
            for day in 0..5 {
                if need <= 0 || net <= 0 {
                    break 'weeks;
                }
                let date = req.horizon_start
                    + chrono::Duration::days(i64::from(week) * 7 + i64::from(day));

                if req.schedule.works_on(date, pid) {
                    continue;
                }
                if req.calendar.is_closed(date) {
                    log_checks!(verbosity, "  {} {}: closed", pid, date);
                    continue;
                }
                if req.time_off.has(pid, date) {
                    log_checks!(verbosity, "  {} {}: time-off", pid, date);
                    continue;
                }
                if !req.policy.is_month_allowed(date.month()) {
                    continue;
                }

                let iso = date.iso_week();
                let week_key = (pid.to_string(), iso.year(), iso.week());
                let month_key = (pid.to_string(), date.year(), date.month());
                let in_week = week_counts.get(&week_key).copied().unwrap_or(0);
                let in_month = month_counts.get(&month_key).copied().unwrap_or(0);
                if in_week >= req.policy.max_per_week_per_person {
                    log_checks!(verbosity, "  {} {}: weekly cap reached", pid, date);
                    continue;
                }
                if in_month >= req.policy.max_per_month_per_person {
                    log_checks!(verbosity, "  {} {}: monthly cap reached", pid, date);
                    continue;
                }

                let occupied = req.schedule.assignments(date).len() as i64
                    + proposed_per_day.get(&date).copied().unwrap_or(0);
                let capacity = available_people(req, week, date) - occupied;
                log_debug!(verbosity, "  {} {}: capacity {}", pid, date, capacity);
                if capacity <= 0 {
                    continue;
                }

                log_changes!(verbosity, "  Propose {} on {} ({} min short)", pid, date, need);
                proposals.push(ProposedReinforcement {
                    date,
                    person_id: pid.to_string(),
                    shift: req.reinforcement.clone(),
                });
                *proposed_per_day.entry(date).or_insert(0) += 1;
                week_counts.insert(week_key, in_week + 1);
                month_counts.insert(month_key, in_month + 1);
                need -= net;
            }
        }

        remaining.insert(pid.to_string(), need.max(0));
    }

    let events = aggregate_events(&proposals, req.batch_id);
    DeficitPlan {
        proposals,
        events,
        remaining,
    }
}

/// One conciliation event per proposed date.
fn aggregate_events(
    proposals: &[ProposedReinforcement],
    batch_id: Option<&str>,
) -> Vec<ReinforcementEvent> {
    let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for p in proposals {
        *per_day.entry(p.date).or_insert(0) += 1;
    }
    per_day
        .into_iter()
        .map(|(date, count)| ReinforcementEvent {
            source: EventSource::Conciliation {
                batch_id: batch_id.map(str::to_string),
            },
            ..ReinforcementEvent::new(CONCILIATION_EVENT_LABEL, date, date, count, 0)
        })
        .collect()
}

/// How a new batch of conciliation events joins the existing list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Drop earlier conciliation events first
    #[default]
    Replace,
    Append,
}

pub fn apply_batch(
    events: &[ReinforcementEvent],
    batch: &[ReinforcementEvent],
    mode: BatchMode,
) -> Vec<ReinforcementEvent> {
    events
        .iter()
        .filter(|e| mode == BatchMode::Append || !e.is_conciliation())
        .chain(batch.iter())
        .cloned()
        .collect()
}
