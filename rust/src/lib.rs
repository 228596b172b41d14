//! Rust implementation of the rota rostering engine.
//!
//! The engine builds a multi-week duty roster for a small team, scores it for
//! work-life balance and proposes reinforcements for contracted-hour
//! shortfalls. Python callers exchange JSON documents with it.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDate;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Display;

pub mod logging;

pub mod calendar;
pub mod conciliation;
mod config;
pub mod deficit;
mod models;
pub mod peaks;
pub mod rules;
pub mod scheduler;
pub mod slots;
pub mod summary;
pub mod swaps;
pub mod time_off;

pub use calendar::{known_provinces, off_person, CalendarResolver, CalendarSettings, HolidayCalendar};
pub use conciliation::{
    improve_conciliation, score_breakdown, score_conciliation, OptimizationResult,
    OptimizerContext, ScoreBreakdown, SwapRecord,
};
pub use config::{
    ConciliationWeights, OffPolicy, ReinforcementPolicy, RuleSet, VacationPolicy,
};
pub use deficit::{
    apply_batch, propose_reinforcements, shortfalls_from_target, BatchMode, DeficitPlan,
    DeficitRequest, ProposedReinforcement, Shortfall,
};
pub use models::{
    ClockTime, DayAssignment, EventSource, InputError, Overrides, Person, ReinforcementEvent,
    Schedule, ShiftTemplate, SlotKey,
};
pub use scheduler::{plan_roster, EngineInput, RosterPlan, RosterScheduler};
pub use summary::{build_summary, PersonSummary, RosterSummary};
pub use swaps::{approve_swap, SlotRef, SwapError, SwapRequest};
pub use time_off::{check_vacation_request, TimeOffIndex, TimeOffRecord, VacationError};

fn value_error(e: impl Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> PyResult<T> {
    serde_json::from_str(json).map_err(value_error)
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(value_error)
}

/// Generate, rebalance and optimize a roster.
///
/// # Arguments
/// * `input_json` - Engine input document (camelCase keys; policies may be partial)
///
/// # Returns
/// * JSON of the plan: schedule, scores before and after the optimizer,
///   accepted swaps, hours summary and score breakdown
///
/// # Raises
/// * ValueError if the document cannot be parsed or fails validation
#[pyfunction]
fn generate_roster(input_json: &str) -> PyResult<String> {
    let input = EngineInput::from_json(input_json).map_err(value_error)?;
    let plan = plan_roster(&input).map_err(value_error)?;
    to_json(&plan)
}

/// Conciliation score of a schedule for the roster and weights of an input.
#[pyfunction]
fn score_roster(input_json: &str, schedule_json: &str) -> PyResult<i64> {
    let input = EngineInput::from_json(input_json).map_err(value_error)?;
    let schedule: Schedule = from_json(schedule_json)?;
    Ok(score_conciliation(&schedule, &input.people, &input.conciliation_weights))
}

/// Propose reinforcement shifts for the hours each person is still owed.
///
/// The per-person target is the annual target prorated to the schedule's
/// horizon. Proposals may be searched over `horizon_weeks` (default: the
/// schedule's own horizon), e.g. up to year end.
///
/// # Returns
/// * JSON of the deficit plan: proposals, events and unmet minutes
#[pyfunction]
#[pyo3(name = "propose_reinforcements", signature = (input_json, schedule_json, policy=None, horizon_weeks=None, batch_id=None))]
fn py_propose_reinforcements(
    input_json: &str,
    schedule_json: &str,
    policy: Option<ReinforcementPolicy>,
    horizon_weeks: Option<u32>,
    batch_id: Option<String>,
) -> PyResult<String> {
    let input = EngineInput::from_json(input_json).map_err(value_error)?;
    input.validate().map_err(value_error)?;
    let schedule: Schedule = from_json(schedule_json)?;
    let policy = policy.unwrap_or_default();

    let target_minutes = (input.annual_target_hours * 60.0 * f64::from(schedule.week_count)
        / 52.0)
        .round() as i64;
    let worked = schedule.shift_minutes_by_person(&input.people);
    let shortfalls = shortfalls_from_target(&input.people, &worked, target_minutes);

    let calendar = CalendarResolver::new(&input.calendar_settings(), &input.time_off_records);
    let time_off = TimeOffIndex::build(&input.time_off_records);
    let plan = propose_reinforcements(&DeficitRequest {
        schedule: &schedule,
        people: &input.people,
        horizon_start: schedule.horizon_start,
        week_count: horizon_weeks.unwrap_or(schedule.week_count),
        shortfalls: &shortfalls,
        reinforcement: &input.reinforcement_template,
        calendar: &calendar,
        time_off: &time_off,
        policy: &policy,
        batch_id: batch_id.as_deref(),
        verbosity: input.verbosity,
    });
    to_json(&plan)
}

/// Merge a batch of conciliation events into an event list.
///
/// `mode` is "replace" (drop earlier conciliation events) or "append".
#[pyfunction]
#[pyo3(name = "apply_batch", signature = (events_json, batch_json, mode="replace"))]
fn py_apply_batch(events_json: &str, batch_json: &str, mode: &str) -> PyResult<String> {
    let events: Vec<ReinforcementEvent> = from_json(events_json)?;
    let batch: Vec<ReinforcementEvent> = from_json(batch_json)?;
    let mode: BatchMode = from_json(&format!("\"{}\"", mode))?;
    to_json(&apply_batch(&events, &batch, mode))
}

/// Vacation days a range consumes: weekdays, minus holidays unless those count.
#[pyfunction]
#[pyo3(signature = (start, end, province="Madrid", consume_on_holiday=false, custom_holidays_json=None))]
fn vacation_days_charged(
    start: NaiveDate,
    end: NaiveDate,
    province: &str,
    consume_on_holiday: bool,
    custom_holidays_json: Option<&str>,
) -> PyResult<u32> {
    let custom: BTreeMap<i32, Vec<NaiveDate>> = match custom_holidays_json {
        Some(json) => from_json(json)?,
        None => BTreeMap::new(),
    };
    let holidays = HolidayCalendar::new(province, &custom);
    Ok(holidays.vacation_days_charged(start, end, consume_on_holiday))
}

/// Check a vacation request against an engine input.
///
/// The input supplies the province, custom holidays, holiday consumption,
/// vacation policy, allowance and the time-off already on record.
///
/// # Returns
/// * Days the request charges
///
/// # Raises
/// * ValueError when the balance would be exceeded or a month is not permitted
#[pyfunction]
#[pyo3(name = "check_vacation_request")]
fn py_check_vacation_request(input_json: &str, request_json: &str) -> PyResult<u32> {
    let input = EngineInput::from_json(input_json).map_err(value_error)?;
    let request: TimeOffRecord = from_json(request_json)?;
    input.check_vacation_request(&request).map_err(value_error)
}

/// Turn an approved swap into overrides.
///
/// # Returns
/// * JSON of the updated overrides
#[pyfunction]
#[pyo3(name = "approve_swap")]
fn py_approve_swap(schedule_json: &str, request_json: &str, overrides_json: &str) -> PyResult<String> {
    let schedule: Schedule = from_json(schedule_json)?;
    let request: SwapRequest = from_json(request_json)?;
    let mut overrides: Overrides = from_json(overrides_json)?;
    approve_swap(&schedule, &request, &mut overrides).map_err(value_error)?;
    to_json(&overrides)
}

/// Reinforcement events for the seasonal retail peaks of a year, as JSON.
#[pyfunction]
#[pyo3(name = "seasonal_peaks")]
fn py_seasonal_peaks(year: i32) -> PyResult<String> {
    to_json(&peaks::seasonal_peaks(year))
}

/// Provinces with a built-in holiday catalog.
#[pyfunction]
#[pyo3(name = "known_provinces")]
fn py_known_provinces() -> Vec<&'static str> {
    known_provinces()
}

/// Python module definition
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Policy classes
    m.add_class::<RuleSet>()?;
    m.add_class::<OffPolicy>()?;
    m.add_class::<ConciliationWeights>()?;
    m.add_class::<VacationPolicy>()?;
    m.add_class::<ReinforcementPolicy>()?;

    // Functions
    m.add_function(wrap_pyfunction!(generate_roster, m)?)?;
    m.add_function(wrap_pyfunction!(score_roster, m)?)?;
    m.add_function(wrap_pyfunction!(py_propose_reinforcements, m)?)?;
    m.add_function(wrap_pyfunction!(py_apply_batch, m)?)?;
    m.add_function(wrap_pyfunction!(vacation_days_charged, m)?)?;
    m.add_function(wrap_pyfunction!(py_check_vacation_request, m)?)?;
    m.add_function(wrap_pyfunction!(py_approve_swap, m)?)?;
    m.add_function(wrap_pyfunction!(py_seasonal_peaks, m)?)?;
    m.add_function(wrap_pyfunction!(py_known_provinces, m)?)?;

    Ok(())
}
