//! Policy and weight configuration for the roster engine.
//!
//! Every type here resolves to a fully populated value: `Default` carries the
//! documented defaults, `#[serde(default)]` completes partial JSON objects
//! field by field, and the Python constructors fall back per keyword.

use chrono::{Datelike, NaiveDate, Weekday};
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

/// ISO weekday number (Mon=1 .. Sun=7).
#[inline]
pub fn iso_weekday(weekday: Weekday) -> u32 {
    weekday.number_from_monday()
}

/// Hard constraints checked by the rule validator.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSet {
    /// When false the validator accepts every candidate
    #[pyo3(get, set)]
    pub enforce: bool,
    #[pyo3(get, set)]
    pub max_daily_minutes: i64,
    #[pyo3(get, set)]
    pub max_weekly_minutes: i64,
    /// Minimum rest between the end of yesterday's last shift and today's start
    #[pyo3(get, set)]
    pub min_rest_minutes: i64,
    #[pyo3(get, set)]
    pub max_days_per_week: u32,
    /// Longest run of consecutive weekends a person may work
    #[pyo3(get, set)]
    pub max_consecutive_weekends_worked: u32,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            enforce: true,
            max_daily_minutes: 9 * 60,
            max_weekly_minutes: 40 * 60,
            min_rest_minutes: 12 * 60,
            max_days_per_week: 6,
            max_consecutive_weekends_worked: 3,
        }
    }
}

#[pymethods]
impl RuleSet {
    #[new]
    #[pyo3(signature = (
        enforce=None,
        max_daily_minutes=None,
        max_weekly_minutes=None,
        min_rest_minutes=None,
        max_days_per_week=None,
        max_consecutive_weekends_worked=None
    ))]
    fn new(
        enforce: Option<bool>,
        max_daily_minutes: Option<i64>,
        max_weekly_minutes: Option<i64>,
        min_rest_minutes: Option<i64>,
        max_days_per_week: Option<u32>,
        max_consecutive_weekends_worked: Option<u32>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            enforce: enforce.unwrap_or(defaults.enforce),
            max_daily_minutes: max_daily_minutes.unwrap_or(defaults.max_daily_minutes),
            max_weekly_minutes: max_weekly_minutes.unwrap_or(defaults.max_weekly_minutes),
            min_rest_minutes: min_rest_minutes.unwrap_or(defaults.min_rest_minutes),
            max_days_per_week: max_days_per_week.unwrap_or(defaults.max_days_per_week),
            max_consecutive_weekends_worked: max_consecutive_weekends_worked
                .unwrap_or(defaults.max_consecutive_weekends_worked),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "RuleSet(enforce={}, max_daily_minutes={}, max_weekly_minutes={}, min_rest_minutes={})",
            self.enforce, self.max_daily_minutes, self.max_weekly_minutes, self.min_rest_minutes
        )
    }
}

/// Governs when the nominal off-person must still work.
///
/// Weekdays are ISO numbers (Mon=1 .. Sun=7).
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OffPolicy {
    /// Restrict the off-person's rest days in weeks overlapping a vacation
    #[pyo3(get, set)]
    pub limit_on_vacation_week: bool,
    /// Days the off-person may still rest in a limited week
    #[pyo3(get, set)]
    pub limit_days_of_week: Vec<u32>,
    /// Also limit weeks adjacent to a vacation week
    #[pyo3(get, set)]
    pub block_adjacent_weeks: bool,
    #[pyo3(get, set)]
    pub adjacency_window: u32,
    /// Off-person covers one slot on cover days when someone is on vacation
    #[pyo3(get, set)]
    pub cover_on_vacation_days: bool,
    /// Empty means the same days as `limit_days_of_week`
    #[pyo3(get, set)]
    pub cover_days: Vec<u32>,
}

const DEFAULT_LIMIT_DAYS: [u32; 3] = [3, 4, 5];

impl Default for OffPolicy {
    fn default() -> Self {
        Self {
            limit_on_vacation_week: true,
            limit_days_of_week: DEFAULT_LIMIT_DAYS.to_vec(),
            block_adjacent_weeks: true,
            adjacency_window: 1,
            cover_on_vacation_days: true,
            cover_days: Vec::new(),
        }
    }
}

impl OffPolicy {
    pub fn window(&self) -> u32 {
        self.adjacency_window.max(1)
    }

    pub fn rest_allowed_on(&self, weekday: Weekday) -> bool {
        let day = iso_weekday(weekday);
        if self.limit_days_of_week.is_empty() {
            DEFAULT_LIMIT_DAYS.contains(&day)
        } else {
            self.limit_days_of_week.contains(&day)
        }
    }

    pub fn is_cover_day(&self, weekday: Weekday) -> bool {
        if self.cover_days.is_empty() {
            self.rest_allowed_on(weekday)
        } else {
            self.cover_days.contains(&iso_weekday(weekday))
        }
    }
}

#[pymethods]
impl OffPolicy {
    #[new]
    #[pyo3(signature = (
        limit_on_vacation_week=None,
        limit_days_of_week=None,
        block_adjacent_weeks=None,
        adjacency_window=None,
        cover_on_vacation_days=None,
        cover_days=None
    ))]
    fn new(
        limit_on_vacation_week: Option<bool>,
        limit_days_of_week: Option<Vec<u32>>,
        block_adjacent_weeks: Option<bool>,
        adjacency_window: Option<u32>,
        cover_on_vacation_days: Option<bool>,
        cover_days: Option<Vec<u32>>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            limit_on_vacation_week: limit_on_vacation_week
                .unwrap_or(defaults.limit_on_vacation_week),
            limit_days_of_week: limit_days_of_week.unwrap_or(defaults.limit_days_of_week),
            block_adjacent_weeks: block_adjacent_weeks.unwrap_or(defaults.block_adjacent_weeks),
            adjacency_window: adjacency_window.unwrap_or(defaults.adjacency_window),
            cover_on_vacation_days: cover_on_vacation_days
                .unwrap_or(defaults.cover_on_vacation_days),
            cover_days: cover_days.unwrap_or(defaults.cover_days),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "OffPolicy(limit_days_of_week={:?}, block_adjacent_weeks={}, adjacency_window={})",
            self.limit_days_of_week, self.block_adjacent_weeks, self.adjacency_window
        )
    }
}

/// Penalty weights of the conciliation objective.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConciliationWeights {
    #[pyo3(get, set)]
    pub per_isolated_workday: i64,
    #[pyo3(get, set)]
    pub per_isolated_restday: i64,
    /// Per work/rest flip between adjacent days of a week
    #[pyo3(get, set)]
    pub per_weekly_transition: i64,
    /// Per weekend worked beyond the allowance
    #[pyo3(get, set)]
    pub per_extra_weekend: i64,
    #[pyo3(get, set)]
    pub per_consecutive_weekend_run: i64,
}

impl Default for ConciliationWeights {
    fn default() -> Self {
        Self {
            per_isolated_workday: 3,
            per_isolated_restday: 2,
            per_weekly_transition: 1,
            per_extra_weekend: 2,
            per_consecutive_weekend_run: 5,
        }
    }
}

#[pymethods]
impl ConciliationWeights {
    #[new]
    #[pyo3(signature = (
        per_isolated_workday=None,
        per_isolated_restday=None,
        per_weekly_transition=None,
        per_extra_weekend=None,
        per_consecutive_weekend_run=None
    ))]
    fn new(
        per_isolated_workday: Option<i64>,
        per_isolated_restday: Option<i64>,
        per_weekly_transition: Option<i64>,
        per_extra_weekend: Option<i64>,
        per_consecutive_weekend_run: Option<i64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            per_isolated_workday: per_isolated_workday.unwrap_or(defaults.per_isolated_workday),
            per_isolated_restday: per_isolated_restday.unwrap_or(defaults.per_isolated_restday),
            per_weekly_transition: per_weekly_transition
                .unwrap_or(defaults.per_weekly_transition),
            per_extra_weekend: per_extra_weekend.unwrap_or(defaults.per_extra_weekend),
            per_consecutive_weekend_run: per_consecutive_weekend_run
                .unwrap_or(defaults.per_consecutive_weekend_run),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ConciliationWeights(isolated_workday={}, isolated_restday={}, transition={}, extra_weekend={}, weekend_run={})",
            self.per_isolated_workday,
            self.per_isolated_restday,
            self.per_weekly_transition,
            self.per_extra_weekend,
            self.per_consecutive_weekend_run
        )
    }
}

/// Months in which vacation may (mode "allow") or may not (mode "block") be taken.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VacationPolicy {
    /// "allow" or "block"
    #[pyo3(get, set)]
    pub mode: String,
    /// Calendar months 1..=12; empty means no restriction
    #[pyo3(get, set)]
    pub months: Vec<u32>,
}

impl Default for VacationPolicy {
    fn default() -> Self {
        Self {
            mode: "allow".to_string(),
            months: Vec::new(),
        }
    }
}

impl VacationPolicy {
    fn blocks(&self) -> bool {
        self.mode.eq_ignore_ascii_case("block")
    }

    pub fn is_month_allowed(&self, month: u32) -> bool {
        if self.months.is_empty() {
            return true;
        }
        let listed = self.months.contains(&month);
        if self.blocks() {
            !listed
        } else {
            listed
        }
    }

    pub fn is_date_allowed(&self, date: NaiveDate) -> bool {
        self.is_month_allowed(date.month())
    }

    /// Move a date into the nearest permitted month of the same year,
    /// searching forward before backward at each distance and clamping the
    /// day of month. Dates already permitted are returned unchanged.
    pub fn snap_to_allowed_month(&self, date: NaiveDate) -> NaiveDate {
        if self.is_date_allowed(date) {
            return date;
        }
        let current = date.month();
        for delta in 1..=12u32 {
            let up = (current - 1 + delta) % 12 + 1;
            let down = (current + 12 * 10 - 1 - delta) % 12 + 1;
            for month in [up, down] {
                if self.is_month_allowed(month) {
                    if let Some(snapped) = clamp_to_month(date.year(), month, date.day()) {
                        return snapped;
                    }
                }
            }
        }
        date
    }
}

fn clamp_to_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

#[pymethods]
impl VacationPolicy {
    #[new]
    #[pyo3(signature = (mode=None, months=None))]
    fn new(mode: Option<String>, months: Option<Vec<u32>>) -> Self {
        let defaults = Self::default();
        Self {
            mode: mode.unwrap_or(defaults.mode),
            months: months.unwrap_or(defaults.months),
        }
    }

    fn __repr__(&self) -> String {
        format!("VacationPolicy(mode={:?}, months={:?})", self.mode, self.months)
    }
}

/// Limits for the deficit proposal generator.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReinforcementPolicy {
    /// Calendar months 1..=12 in which proposals may fall; empty means any
    #[pyo3(get, set)]
    pub allowed_months: Vec<u32>,
    #[pyo3(get, set)]
    pub max_per_week_per_person: u32,
    #[pyo3(get, set)]
    pub max_per_month_per_person: u32,
}

impl Default for ReinforcementPolicy {
    fn default() -> Self {
        Self {
            allowed_months: vec![1, 2, 3, 4, 5, 9, 10, 11, 12],
            max_per_week_per_person: 1,
            max_per_month_per_person: 4,
        }
    }
}

impl ReinforcementPolicy {
    pub fn is_month_allowed(&self, month: u32) -> bool {
        self.allowed_months.is_empty() || self.allowed_months.contains(&month)
    }
}

#[pymethods]
impl ReinforcementPolicy {
    #[new]
    #[pyo3(signature = (allowed_months=None, max_per_week_per_person=None, max_per_month_per_person=None))]
    fn new(
        allowed_months: Option<Vec<u32>>,
        max_per_week_per_person: Option<u32>,
        max_per_month_per_person: Option<u32>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            allowed_months: allowed_months.unwrap_or(defaults.allowed_months),
            max_per_week_per_person: max_per_week_per_person
                .unwrap_or(defaults.max_per_week_per_person),
            max_per_month_per_person: max_per_month_per_person
                .unwrap_or(defaults.max_per_month_per_person),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ReinforcementPolicy(allowed_months={:?}, max_per_week={}, max_per_month={})",
            self.allowed_months, self.max_per_week_per_person, self.max_per_month_per_person
        )
    }
}
