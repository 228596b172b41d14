//! Mutable state threaded through a single generation.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use crate::models::{DayAssignment, Person, ShiftTemplate};
use crate::rules::RuleContext;

/// Saturday's weekend holder, carried to the following Sunday.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekendCarry {
    pub sunday: NaiveDate,
    pub person_id: Option<String>,
}

/// Weekday and weekend slot counts per person, used by the tie-break.
#[derive(Clone, Debug, Default)]
pub struct SlotLoads {
    pub weekday: FxHashMap<String, u32>,
    pub weekend: FxHashMap<String, u32>,
}

impl SlotLoads {
    pub fn weekday_of(&self, person_id: &str) -> u32 {
        self.weekday.get(person_id).copied().unwrap_or(0)
    }

    pub fn weekend_of(&self, person_id: &str) -> u32 {
        self.weekend.get(person_id).copied().unwrap_or(0)
    }
}

/// State of one generation call. Created fresh per call and dropped with it.
#[derive(Clone, Debug)]
pub struct GenerationState {
    /// Completed days so far
    pub assignments: BTreeMap<NaiveDate, Vec<DayAssignment>>,
    pub loads: SlotLoads,
    /// Reset at the start of each week
    pub weekly_minutes: FxHashMap<String, i64>,
    pub weekly_days: FxHashMap<String, u32>,
    /// Weekends worked in a row up to the previous week
    pub weekend_streaks: FxHashMap<String, u32>,
    pub worked_last_weekend: FxHashSet<String>,
    worked_this_weekend: FxHashSet<String>,
    pub carry: Option<WeekendCarry>,
    pub worked_minutes: BTreeMap<String, i64>,
    pub vacation_days: BTreeMap<String, u32>,
}

impl GenerationState {
    pub fn new(people: &[Person]) -> Self {
        Self {
            assignments: BTreeMap::new(),
            loads: SlotLoads::default(),
            weekly_minutes: FxHashMap::default(),
            weekly_days: FxHashMap::default(),
            weekend_streaks: FxHashMap::default(),
            worked_last_weekend: FxHashSet::default(),
            worked_this_weekend: FxHashSet::default(),
            carry: None,
            worked_minutes: people.iter().map(|p| (p.id.clone(), 0)).collect(),
            vacation_days: people.iter().map(|p| (p.id.clone(), 0)).collect(),
        }
    }

    /// Roll the weekly counters over and fold last week's weekend into the streaks.
    pub fn begin_week(&mut self, people: &[Person], week: u32) {
        self.weekly_minutes.clear();
        self.weekly_days.clear();
        if week == 0 {
            return;
        }
        for person in people {
            let streak = self.weekend_streaks.entry(person.id.clone()).or_insert(0);
            if self.worked_this_weekend.contains(&person.id) {
                *streak += 1;
            } else {
                *streak = 0;
            }
        }
        self.worked_last_weekend = std::mem::take(&mut self.worked_this_weekend);
    }

    /// Rule context for the day being filled.
    pub fn rule_context<'a>(&'a self, today: &'a [DayAssignment]) -> RuleContext<'a> {
        RuleContext {
            schedule: &self.assignments,
            today,
            weekly_minutes: &self.weekly_minutes,
            weekly_days: &self.weekly_days,
            weekend_streaks: &self.weekend_streaks,
        }
    }

    /// Account one filled slot.
    pub fn record(&mut self, person_id: &str, shift: &ShiftTemplate, weekend: bool) {
        let minutes = shift.net_minutes();
        *self.weekly_minutes.entry(person_id.to_string()).or_insert(0) += minutes;
        *self.weekly_days.entry(person_id.to_string()).or_insert(0) += 1;
        *self.worked_minutes.entry(person_id.to_string()).or_insert(0) += minutes;
        let load = if weekend {
            self.worked_this_weekend.insert(person_id.to_string());
            &mut self.loads.weekend
        } else {
            &mut self.loads.weekday
        };
        *load.entry(person_id.to_string()).or_insert(0) += 1;
    }

    pub fn credit_minutes(&mut self, person_id: &str, minutes: i64) {
        *self.worked_minutes.entry(person_id.to_string()).or_insert(0) += minutes;
    }

    pub fn charge_vacation_day(&mut self, person_id: &str) {
        *self.vacation_days.entry(person_id.to_string()).or_insert(0) += 1;
    }
}
