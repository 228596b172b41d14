//! Engine input document and its up-front validation.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::{CalendarSettings, HolidayCalendar};
use crate::config::{ConciliationWeights, OffPolicy, RuleSet, VacationPolicy};
use crate::models::{
    ClockTime, InputError, Overrides, Person, ReinforcementEvent, ShiftTemplate,
};
use crate::slots::SlotTemplates;
use crate::time_off::{self, TimeOffRecord, VacationError};

fn default_province() -> String {
    "Madrid".to_string()
}

fn default_true() -> bool {
    true
}

fn default_annual_target_hours() -> f64 {
    1560.0
}

fn default_vacation_allowance() -> u32 {
    25
}

pub(crate) fn default_reinforcement_template() -> ShiftTemplate {
    ShiftTemplate::new(ClockTime::at_hour(12), ClockTime::at_hour(20), "")
}

/// Everything one generation depends on.
///
/// Optional sections are completed with their documented defaults, so a
/// caller only has to provide the roster, the horizon and the templates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInput {
    pub horizon_start: NaiveDate,
    pub week_count: u32,
    pub people: Vec<Person>,
    pub weekday_shift_templates: Vec<ShiftTemplate>,
    pub weekend_shift_template: ShiftTemplate,
    #[serde(default = "default_reinforcement_template")]
    pub reinforcement_template: ShiftTemplate,
    #[serde(default)]
    pub time_off_records: Vec<TimeOffRecord>,
    #[serde(default)]
    pub reinforcement_events: Vec<ReinforcementEvent>,
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(default)]
    pub rule_set: RuleSet,
    #[serde(default)]
    pub off_policy: OffPolicy,
    #[serde(default)]
    pub vacation_policy: VacationPolicy,
    #[serde(default)]
    pub conciliation_weights: ConciliationWeights,
    #[serde(default = "default_province")]
    pub province: String,
    #[serde(default)]
    pub close_on_holidays: bool,
    #[serde(default)]
    pub custom_closed_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub custom_holidays_by_year: BTreeMap<i32, Vec<NaiveDate>>,
    #[serde(default)]
    pub consume_vacation_on_holiday: bool,
    /// Regenerate with remaining-hours priorities after the base pass
    #[serde(default)]
    pub rebalance: bool,
    #[serde(default = "default_true")]
    pub apply_conciliation: bool,
    #[serde(default = "default_annual_target_hours")]
    pub annual_target_hours: f64,
    #[serde(default = "default_vacation_allowance")]
    pub vacation_days_allowance: u32,
    #[serde(default)]
    pub verbosity: u8,
}

impl EngineInput {
    /// Minimal input: roster, horizon and templates, defaults elsewhere.
    pub fn new(
        horizon_start: NaiveDate,
        week_count: u32,
        people: Vec<Person>,
        weekday_shift_templates: Vec<ShiftTemplate>,
        weekend_shift_template: ShiftTemplate,
    ) -> Self {
        Self {
            horizon_start,
            week_count,
            people,
            weekday_shift_templates,
            weekend_shift_template,
            reinforcement_template: default_reinforcement_template(),
            time_off_records: Vec::new(),
            reinforcement_events: Vec::new(),
            overrides: Overrides::new(),
            rule_set: RuleSet::default(),
            off_policy: OffPolicy::default(),
            vacation_policy: VacationPolicy::default(),
            conciliation_weights: ConciliationWeights::default(),
            province: default_province(),
            close_on_holidays: false,
            custom_closed_dates: Vec::new(),
            custom_holidays_by_year: BTreeMap::new(),
            consume_vacation_on_holiday: false,
            rebalance: false,
            apply_conciliation: true,
            annual_target_hours: default_annual_target_hours(),
            vacation_days_allowance: default_vacation_allowance(),
            verbosity: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reject structurally invalid input before any generation work.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.people.is_empty() {
            return Err(InputError::EmptyRoster);
        }
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for person in &self.people {
            if !seen.insert(person.id.as_str()) {
                return Err(InputError::DuplicatePerson(person.id.clone()));
            }
            if person.rotation_offset > 3 {
                return Err(InputError::InvalidRotationOffset {
                    person_id: person.id.clone(),
                    offset: person.rotation_offset,
                });
            }
        }
        if self.week_count == 0 {
            return Err(InputError::EmptyHorizon);
        }
        if self.weekday_shift_templates.is_empty() {
            return Err(InputError::NoWeekdayTemplates);
        }
        for record in &self.time_off_records {
            check_range(record.start, record.end, || {
                format!("time-off for {}", record.person_id)
            })?;
        }
        for event in &self.reinforcement_events {
            check_range(event.start, event.end, || {
                format!("reinforcement event {:?}", event.label)
            })?;
        }
        Ok(())
    }

    pub fn calendar_settings(&self) -> CalendarSettings<'_> {
        CalendarSettings {
            horizon_start: self.horizon_start,
            week_count: self.week_count,
            province: &self.province,
            close_on_holidays: self.close_on_holidays,
            custom_closed_dates: &self.custom_closed_dates,
            custom_holidays_by_year: &self.custom_holidays_by_year,
            consume_vacation_on_holiday: self.consume_vacation_on_holiday,
        }
    }

    /// Check a new time-off request against this input's holidays, vacation
    /// policy, allowance and recorded time-off. Returns the days it charges.
    pub fn check_vacation_request(&self, request: &TimeOffRecord) -> Result<u32, VacationError> {
        let holidays = HolidayCalendar::new(&self.province, &self.custom_holidays_by_year);
        time_off::check_vacation_request(
            request,
            &self.time_off_records,
            self.vacation_days_allowance,
            &holidays,
            self.consume_vacation_on_holiday,
            &self.vacation_policy,
        )
    }

    pub fn slot_templates(&self) -> SlotTemplates<'_> {
        SlotTemplates {
            weekday: &self.weekday_shift_templates,
            weekend: &self.weekend_shift_template,
            reinforcement: &self.reinforcement_template,
        }
    }
}

fn check_range(
    start: NaiveDate,
    end: NaiveDate,
    context: impl FnOnce() -> String,
) -> Result<(), InputError> {
    if end < start {
        return Err(InputError::InvertedRange {
            start,
            end,
            context: context(),
        });
    }
    Ok(())
}
