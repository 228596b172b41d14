//! Hours-versus-target controls for a generated roster.

use chrono::{Duration, NaiveDate};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::calendar::HolidayCalendar;
use crate::models::{is_weekend, Person, Schedule};
use crate::time_off::{approved_vacation_days, TimeOffRecord};

const WEEKS_PER_YEAR: f64 = 52.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub person_id: String,
    pub display_name: String,
    pub weekday_shifts: u32,
    pub weekend_shifts: u32,
    /// Net shift minutes over the horizon
    pub minutes: i64,
    pub hours: f64,
    /// Hours scaled to a 52-week year
    pub annual_projection: f64,
    /// Projection minus the annual target
    pub delta: f64,
    /// Target minus projection; positive means hours still owed
    pub remaining: f64,
    pub vacation_days_used: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub week_count: u32,
    pub people: Vec<PersonSummary>,
    pub total_conflicts: usize,
    /// Slot assignments falling on Saturdays and Sundays
    pub weekend_assignments: usize,
    pub vacation_days_used: u32,
}

impl RosterSummary {
    /// Remaining-hours priorities for a rebalancing regeneration.
    pub fn remaining_priorities(&self) -> FxHashMap<String, f64> {
        self.people
            .iter()
            .map(|p| (p.person_id.clone(), p.remaining.max(0.0)))
            .collect()
    }
}

/// Summarize `schedule` against an annual hours target.
pub fn build_summary(
    schedule: &Schedule,
    people: &[Person],
    annual_target_hours: f64,
    time_off: &[TimeOffRecord],
    holidays: &HolidayCalendar,
    consume_vacation_on_holiday: bool,
) -> RosterSummary {
    let vacation = approved_vacation_days(time_off, holidays, consume_vacation_on_holiday);
    let mut rows: Vec<PersonSummary> = people
        .iter()
        .map(|p| PersonSummary {
            person_id: p.id.clone(),
            display_name: p.display_name.clone(),
            weekday_shifts: 0,
            weekend_shifts: 0,
            minutes: 0,
            hours: 0.0,
            annual_projection: 0.0,
            delta: 0.0,
            remaining: 0.0,
            vacation_days_used: vacation.get(&p.id).copied().unwrap_or(0),
        })
        .collect();
    let index: FxHashMap<&str, usize> = people
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    for (date, cell) in &schedule.assignments_by_date {
        let weekend = is_weekend(*date);
        for a in cell {
            let Some(&i) = a.person_id.as_deref().and_then(|pid| index.get(pid)) else {
                continue;
            };
            let row = &mut rows[i];
            if weekend {
                row.weekend_shifts += 1;
            } else {
                row.weekday_shifts += 1;
            }
            row.minutes += a.shift.net_minutes();
        }
    }

    let weeks = f64::from(schedule.week_count.max(1));
    for row in &mut rows {
        row.hours = row.minutes as f64 / 60.0;
        row.annual_projection = row.hours * (WEEKS_PER_YEAR / weeks);
        row.delta = row.annual_projection - annual_target_hours;
        row.remaining = annual_target_hours - row.annual_projection;
    }

    RosterSummary {
        period_start: schedule.horizon_start,
        period_end: schedule.horizon_start
            + Duration::days(i64::from(schedule.week_count) * 7 - 1),
        week_count: schedule.week_count,
        people: rows,
        total_conflicts: schedule.total_conflicts(),
        weekend_assignments: schedule.weekend_assignment_count(),
        vacation_days_used: vacation.values().sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayAssignment, ShiftTemplate, SlotKey};
    use crate::time_off::{TimeOffKind, TimeOffStatus};
    use std::collections::BTreeMap;

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_assignment(person: Option<&str>) -> DayAssignment {
        let shift = ShiftTemplate::new("10:00".parse().unwrap(), "18:00".parse().unwrap(), "Day");
        DayAssignment {
            slot: SlotKey::for_slot(&shift, 0),
            shift,
            person_id: person.map(str::to_string),
            conflict: person.is_none(),
            pinned: false,
        }
    }

    #[test]
    fn test_summary_projection_and_counts() {
        let people = vec![Person::new("A", 0), Person::new("B", 1)];
        let mut assignments = BTreeMap::new();
        // Monday and Saturday for A, Tuesday unfilled
        assignments.insert(make_date(2025, 3, 3), vec![make_assignment(Some("A"))]);
        assignments.insert(make_date(2025, 3, 4), vec![make_assignment(None)]);
        assignments.insert(make_date(2025, 3, 8), vec![make_assignment(Some("A"))]);
        let schedule = Schedule {
            horizon_start: make_date(2025, 3, 3),
            week_count: 4,
            assignments_by_date: assignments,
            worked_minutes_by_person: BTreeMap::new(),
            vacation_days_by_person: BTreeMap::new(),
            off_person_by_week: Vec::new(),
        };
        let records = vec![TimeOffRecord {
            person_id: "B".to_string(),
            start: make_date(2025, 3, 10),
            end: make_date(2025, 3, 14),
            kind: TimeOffKind::Vacation,
            status: TimeOffStatus::Approved,
            hours_per_day: 0.0,
        }];
        let holidays = HolidayCalendar::new("Madrid", &BTreeMap::new());
        let summary = build_summary(&schedule, &people, 1560.0, &records, &holidays, false);

        let a = &summary.people[0];
        assert_eq!(a.weekday_shifts, 1);
        assert_eq!(a.weekend_shifts, 1);
        assert_eq!(a.minutes, 960);
        assert_eq!(a.hours, 16.0);
        assert_eq!(a.annual_projection, 16.0 * 13.0);
        assert_eq!(a.remaining, 1560.0 - 208.0);
        assert_eq!(summary.people[1].vacation_days_used, 5);
        assert_eq!(summary.total_conflicts, 1);
        assert_eq!(summary.weekend_assignments, 1);
        assert_eq!(summary.period_end, make_date(2025, 3, 30));

        let priorities = summary.remaining_priorities();
        assert_eq!(priorities["B"], 1560.0);
    }

    #[test]
    fn test_over_target_has_zero_priority() {
        let people = vec![Person::new("A", 0)];
        let mut assignments = BTreeMap::new();
        assignments.insert(make_date(2025, 3, 3), vec![make_assignment(Some("A"))]);
        let schedule = Schedule {
            horizon_start: make_date(2025, 3, 3),
            week_count: 1,
            assignments_by_date: assignments,
            worked_minutes_by_person: BTreeMap::new(),
            vacation_days_by_person: BTreeMap::new(),
            off_person_by_week: Vec::new(),
        };
        let holidays = HolidayCalendar::default();
        // 8h a week projects to 416h a year
        let summary = build_summary(&schedule, &people, 100.0, &[], &holidays, false);
        assert!(summary.people[0].delta > 0.0);
        assert_eq!(summary.remaining_priorities()["A"], 0.0);
    }
}
