//! Single-pass greedy local search over same-day reassignments.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::off_person;
use crate::config::ConciliationWeights;
use crate::models::{Overrides, Person, Schedule, SlotKey};
use crate::time_off::TimeOffIndex;
use crate::{log_changes, log_debug};

use super::scoring::score_conciliation;

/// One accepted reassignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRecord {
    pub date: NaiveDate,
    pub slot: SlotKey,
    pub from: String,
    pub to: String,
    /// Horizon score after the swap
    pub score: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub schedule: Schedule,
    pub score_before: i64,
    pub score_after: i64,
    pub swaps: Vec<SwapRecord>,
}

/// Inputs the optimizer consults besides the schedule.
#[derive(Clone, Copy, Debug)]
pub struct OptimizerContext<'a> {
    pub people: &'a [Person],
    pub overrides: &'a Overrides,
    pub time_off: &'a TimeOffIndex,
    pub weights: &'a ConciliationWeights,
    pub verbosity: u8,
}

fn set_person(schedule: &mut Schedule, date: NaiveDate, index: usize, person_id: &str) {
    if let Some(a) = schedule
        .assignments_by_date
        .get_mut(&date)
        .and_then(|cell| cell.get_mut(index))
    {
        a.person_id = Some(person_id.to_string());
    }
}

/// Improve the conciliation score of a copy of `schedule`.
///
/// One chronological pass over (week, day, slot). For each occupied slot
/// that is neither overridden nor pinned, every other person in roster
/// order is tried in turn; a trial is kept only if it strictly lowers the
/// score, and later trials on the same slot start from the kept state.
/// Candidates who are the week's off-person, on time-off that day or
/// already working that day are skipped. Hard rules are not re-checked.
pub fn improve_conciliation(schedule: &Schedule, ctx: &OptimizerContext<'_>) -> OptimizationResult {
    let verbosity = ctx.verbosity;
    let mut best = schedule.clone();
    let score_before = score_conciliation(&best, ctx.people, ctx.weights);
    let mut best_score = score_before;
    let mut swaps = Vec::new();

    for week in 0..best.week_count {
        let off_id = best
            .off_person_by_week
            .get(week as usize)
            .cloned()
            .unwrap_or_else(|| off_person(ctx.people, week).id.clone());

        for day in 0..7 {
            let date = best.date_of(week, day);
            let slot_count = best.assignments(date).len();

            for index in 0..slot_count {
                let (slot, net_minutes, locked) = {
                    let a = &best.assignments(date)[index];
                    let locked = a.person_id.is_none()
                        || a.pinned
                        || ctx.overrides.is_overridden(date, &a.slot);
                    (a.slot.clone(), a.shift.net_minutes(), locked)
                };
                if locked {
                    continue;
                }

                for candidate in ctx.people {
                    let current = match &best.assignments(date)[index].person_id {
                        Some(pid) => pid.clone(),
                        None => break,
                    };
                    if candidate.id == current
                        || candidate.id == off_id
                        || ctx.time_off.has(&candidate.id, date)
                    {
                        continue;
                    }
                    let busy = best
                        .assignments(date)
                        .iter()
                        .enumerate()
                        .any(|(i, a)| i != index && a.person_id.as_deref() == Some(candidate.id.as_str()));
                    if busy {
                        continue;
                    }

                    set_person(&mut best, date, index, &candidate.id);
                    let trial = score_conciliation(&best, ctx.people, ctx.weights);
                    log_debug!(verbosity, "  trial {} {} {}->{}: {}", date, slot, current, candidate.id, trial);
                    if trial < best_score {
                        best_score = trial;
                        if let Some(m) = best.worked_minutes_by_person.get_mut(&current) {
                            *m -= net_minutes;
                        }
                        *best
                            .worked_minutes_by_person
                            .entry(candidate.id.clone())
                            .or_insert(0) += net_minutes;
                        log_changes!(verbosity, "  swap {} {}: {} -> {} (score {})", date, slot, current, candidate.id, trial);
                        swaps.push(SwapRecord {
                            date,
                            slot: slot.clone(),
                            from: current,
                            to: candidate.id.clone(),
                            score: trial,
                        });
                    } else {
                        set_person(&mut best, date, index, &current);
                    }
                }
            }
        }
    }

    OptimizationResult {
        schedule: best,
        score_before,
        score_after: best_score,
        swaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayAssignment, ShiftTemplate};
    use crate::time_off::{TimeOffKind, TimeOffRecord, TimeOffStatus};
    use std::collections::BTreeMap;

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// One week, one slot a day, with the given holder per day (None = closed).
    fn make_week(holders: [Option<&str>; 7], off: &str) -> Schedule {
        let start = make_date(2025, 3, 3);
        let shift = ShiftTemplate::new("08:00".parse().unwrap(), "16:00".parse().unwrap(), "Day");
        let mut schedule = Schedule {
            horizon_start: start,
            week_count: 1,
            assignments_by_date: BTreeMap::new(),
            worked_minutes_by_person: BTreeMap::new(),
            vacation_days_by_person: BTreeMap::new(),
            off_person_by_week: vec![off.to_string()],
        };
        for (day, holder) in holders.iter().enumerate() {
            let date = schedule.date_of(0, day as u32);
            let cell = match holder {
                Some(pid) => {
                    *schedule
                        .worked_minutes_by_person
                        .entry(pid.to_string())
                        .or_insert(0) += 480;
                    vec![DayAssignment {
                        slot: SlotKey::for_slot(&shift, 0),
                        shift: shift.clone(),
                        person_id: Some(pid.to_string()),
                        conflict: false,
                        pinned: false,
                    }]
                }
                None => Vec::new(),
            };
            schedule.assignments_by_date.insert(date, cell);
        }
        schedule
    }

    fn people() -> Vec<Person> {
        vec![Person::new("A", 0), Person::new("B", 1), Person::new("C", 2)]
    }

    #[test]
    fn test_swap_removes_an_island() {
        // A: Mon, Wed. B: Tue, Thu, Fri. Moving Wednesday to B or A's Monday
        // to someone else compacts the week.
        let schedule = make_week(
            [Some("A"), Some("B"), Some("A"), Some("B"), Some("B"), None, None],
            "C",
        );
        let people = people();
        let overrides = Overrides::new();
        let time_off = TimeOffIndex::default();
        let weights = ConciliationWeights::default();
        let ctx = OptimizerContext {
            people: &people,
            overrides: &overrides,
            time_off: &time_off,
            weights: &weights,
            verbosity: 0,
        };
        let result = improve_conciliation(&schedule, &ctx);
        assert!(result.score_after < result.score_before);
        assert!(!result.swaps.is_empty());
        assert_eq!(
            result.score_after,
            score_conciliation(&result.schedule, &people, &weights)
        );
        // C is the off-person and is never brought in
        assert!(result
            .schedule
            .assignments_by_date
            .values()
            .flatten()
            .all(|a| a.person_id.as_deref() != Some("C")));
        let total: i64 = result.schedule.worked_minutes_by_person.values().sum();
        assert_eq!(total, 5 * 480);
        // The input is untouched
        assert_eq!(schedule.assignments(make_date(2025, 3, 5))[0].person_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_locked_slots_never_move() {
        let mut schedule = make_week(
            [Some("A"), Some("B"), Some("A"), Some("B"), Some("B"), None, None],
            "C",
        );
        let monday = make_date(2025, 3, 3);
        let wednesday = make_date(2025, 3, 5);
        for cell in schedule.assignments_by_date.values_mut() {
            for a in cell.iter_mut() {
                a.pinned = true;
            }
        }
        // Unpin Monday but override it
        schedule.assignments_by_date.get_mut(&monday).unwrap()[0].pinned = false;
        let mut overrides = Overrides::new();
        let key = schedule.assignments(monday)[0].slot.clone();
        overrides.set(monday, &key, Some("A".to_string()));

        let people = people();
        let time_off = TimeOffIndex::default();
        let weights = ConciliationWeights::default();
        let ctx = OptimizerContext {
            people: &people,
            overrides: &overrides,
            time_off: &time_off,
            weights: &weights,
            verbosity: 0,
        };
        let result = improve_conciliation(&schedule, &ctx);
        assert!(result.swaps.is_empty());
        assert_eq!(result.score_after, result.score_before);
        assert_eq!(result.schedule, schedule);
        assert_eq!(result.schedule.assignments(wednesday)[0].person_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_time_off_candidates_are_skipped() {
        let schedule = make_week(
            [Some("A"), Some("B"), Some("A"), Some("B"), Some("B"), None, None],
            "C",
        );
        let people = people();
        let records: Vec<TimeOffRecord> = ["A", "B"]
            .iter()
            .map(|pid| TimeOffRecord {
                person_id: pid.to_string(),
                start: make_date(2025, 3, 3),
                end: make_date(2025, 3, 9),
                kind: TimeOffKind::DayoffGrant,
                status: TimeOffStatus::Pending,
                hours_per_day: 0.0,
            })
            .collect();
        let time_off = TimeOffIndex::build(&records);
        let overrides = Overrides::new();
        let weights = ConciliationWeights::default();
        let ctx = OptimizerContext {
            people: &people,
            overrides: &overrides,
            time_off: &time_off,
            weights: &weights,
            verbosity: 0,
        };
        let result = improve_conciliation(&schedule, &ctx);
        assert!(result.swaps.is_empty());
    }

    #[test]
    fn test_score_never_increases() {
        let fixtures = [
            [Some("A"), Some("A"), Some("A"), Some("B"), Some("B"), Some("A"), Some("A")],
            [Some("B"), None, Some("A"), None, Some("B"), Some("A"), None],
            [None, None, None, None, None, None, None],
        ];
        let people = people();
        let overrides = Overrides::new();
        let time_off = TimeOffIndex::default();
        let weights = ConciliationWeights::default();
        let ctx = OptimizerContext {
            people: &people,
            overrides: &overrides,
            time_off: &time_off,
            weights: &weights,
            verbosity: 0,
        };
        for holders in fixtures {
            let schedule = make_week(holders, "C");
            let result = improve_conciliation(&schedule, &ctx);
            assert!(result.score_after <= result.score_before);
        }
    }
}
