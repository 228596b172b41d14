//! Greedy forward-pass roster generation.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::calendar::{off_person, CalendarResolver};
use crate::models::{is_weekend, DayAssignment, InputError, Schedule, ShiftTemplate};
use crate::rules::{self, RuleContext};
use crate::slots::{required_slots, RequiredSlot};
use crate::time_off::{TimeOffIndex, TimeOffKind};
use crate::{log_changes, log_checks, log_debug};

use super::candidates::pick_best_candidate;
use super::input::EngineInput;
use super::state::{GenerationState, WeekendCarry};

/// Per-week facts computed once before the week's days are filled.
#[derive(Clone, Copy, Debug)]
struct WeekPlan<'a> {
    off_id: &'a str,
    next_off: &'a str,
    /// Off-person may only rest on the policy's limit days
    limited: bool,
}

/// How the day treats the nominal off-person.
#[derive(Clone, Copy, Debug)]
struct DayPlan<'a> {
    week: WeekPlan<'a>,
    /// Off-person must cover (at most) one slot today
    force_off_work: bool,
}

/// Single-pass greedy scheduler over (week, day, slot), without backtracking.
///
/// Unfillable slots become conflicts; hard rules always win over filling a
/// slot. All mutable state lives in a `GenerationState` created per call.
pub struct RosterScheduler<'a> {
    input: &'a EngineInput,
    calendar: CalendarResolver,
    time_off: TimeOffIndex,
    /// Remaining-hours priorities, consulted only when rebalancing
    priorities: Option<FxHashMap<String, f64>>,
}

impl<'a> RosterScheduler<'a> {
    /// Validate the input and index the calendar and time-off.
    pub fn new(input: &'a EngineInput) -> Result<Self, InputError> {
        input.validate()?;
        let calendar = CalendarResolver::new(&input.calendar_settings(), &input.time_off_records);
        let time_off = TimeOffIndex::build(&input.time_off_records);
        Ok(Self {
            input,
            calendar,
            time_off,
            priorities: None,
        })
    }

    pub fn with_priorities(mut self, priorities: FxHashMap<String, f64>) -> Self {
        self.priorities = Some(priorities);
        self
    }

    pub fn calendar(&self) -> &CalendarResolver {
        &self.calendar
    }

    pub fn time_off(&self) -> &TimeOffIndex {
        &self.time_off
    }

    /// Roster id as borrowed from the input, if the person exists.
    fn roster_id(&self, person_id: &str) -> Option<&'a str> {
        self.input
            .people
            .iter()
            .find(|p| p.id == person_id)
            .map(|p| p.id.as_str())
    }

    /// Run the generation. Identical input yields identical output.
    pub fn generate(&self) -> Schedule {
        let input = self.input;
        let people = &input.people;
        let verbosity = input.verbosity;
        let mut state = GenerationState::new(people);
        let mut off_person_by_week = Vec::with_capacity(input.week_count as usize);

        for week in 0..input.week_count {
            let plan = WeekPlan {
                off_id: off_person(people, week).id.as_str(),
                next_off: off_person(people, week + 1).id.as_str(),
                limited: self.calendar.off_limited_week(week, &input.off_policy),
            };
            log_changes!(
                verbosity,
                "Week {} from {}: off={} next_off={}{}",
                week,
                self.calendar.week_start(week),
                plan.off_id,
                plan.next_off,
                if plan.limited { " (limited)" } else { "" }
            );
            state.begin_week(people, week);
            off_person_by_week.push(plan.off_id.to_string());

            for day in 0..7 {
                let date = self.calendar.date_of(week, day);
                self.tally_vacation(&mut state, date);
                if self.calendar.is_closed(date) {
                    log_checks!(verbosity, "  {} closed", date);
                    state.assignments.insert(date, Vec::new());
                    continue;
                }
                let cell = self.fill_day(&mut state, date, plan);
                state.assignments.insert(date, cell);
            }
        }

        Schedule {
            horizon_start: input.horizon_start,
            week_count: input.week_count,
            assignments_by_date: state.assignments,
            worked_minutes_by_person: state.worked_minutes,
            vacation_days_by_person: state.vacation_days,
            off_person_by_week,
        }
    }

    /// Charge effective vacation days, closed or not.
    fn tally_vacation(&self, state: &mut GenerationState, date: NaiveDate) {
        if !self.calendar.is_effective_vacation_date(date) {
            return;
        }
        for person in &self.input.people {
            let on_vacation = self
                .time_off
                .get(&person.id, date)
                .is_some_and(|e| e.kind == TimeOffKind::Vacation);
            if on_vacation {
                state.charge_vacation_day(&person.id);
            }
        }
    }

    fn fill_day(
        &self,
        state: &mut GenerationState,
        date: NaiveDate,
        week: WeekPlan<'a>,
    ) -> Vec<DayAssignment> {
        let input = self.input;
        let verbosity = input.verbosity;
        let weekday = date.weekday();
        let weekend = is_weekend(date);
        let policy = &input.off_policy;

        let off_allowed_today = !week.limited || policy.rest_allowed_on(weekday);
        let must_cover = policy.cover_on_vacation_days
            && self.calendar.has_vacation_on(date)
            && policy.is_cover_day(weekday);
        let plan = DayPlan {
            week,
            force_off_work: must_cover || !off_allowed_today,
        };

        let working: Vec<&'a str> = input
            .people
            .iter()
            .map(|p| p.id.as_str())
            .filter(|id| *id != week.off_id || plan.force_off_work)
            .collect();
        let holder = if weekend {
            self.weekend_holder(state, date, &working, week)
        } else {
            None
        };
        log_debug!(
            verbosity,
            "  {} working={:?} force_off_work={} holder={:?}",
            date,
            working,
            plan.force_off_work,
            holder
        );

        let slots = required_slots(date, &input.slot_templates(), &input.reinforcement_events);
        let bound = self.bind_forced_pins(date, &slots);
        let mut today: Vec<DayAssignment> = Vec::with_capacity(slots.len());
        // Assigned so far plus everyone bound to a forced pin later in the day
        let mut taken: FxHashSet<&'a str> = bound.iter().flatten().copied().collect();

        for (index, slot) in slots.iter().enumerate() {
            let (mut chosen, mut pinned) = match bound[index] {
                Some(pid) => (Some(pid), true),
                None => self.resolve_slot(state, date, index, slot, &today, &taken, &working, holder, plan),
            };

            if let Some(pid) = chosen {
                if self.time_off.has(pid, date) {
                    log_changes!(verbosity, "  {} {}: {} has time-off, discarded", date, slot.key, pid);
                    chosen = None;
                    pinned = false;
                }
            }

            match chosen {
                Some(pid) => {
                    taken.insert(pid);
                    state.record(pid, &slot.shift, weekend);
                    log_changes!(
                        verbosity,
                        "  {} {} -> {}{}",
                        date,
                        slot.key,
                        pid,
                        if pinned { " (pinned)" } else { "" }
                    );
                    today.push(DayAssignment {
                        shift: slot.shift.clone(),
                        slot: slot.key.clone(),
                        person_id: Some(pid.to_string()),
                        conflict: false,
                        pinned,
                    });
                }
                None => {
                    log_changes!(verbosity, "  {} {} -> CONFLICT", date, slot.key);
                    today.push(DayAssignment {
                        shift: slot.shift.clone(),
                        slot: slot.key.clone(),
                        person_id: None,
                        conflict: true,
                        pinned: false,
                    });
                }
            }
        }

        // Travel days are credited even though the traveller is not assigned
        for id in &working {
            if let Some(entry) = self.time_off.get(id, date) {
                let credit = entry.travel_credit_minutes();
                if credit > 0 {
                    state.credit_minutes(id, credit);
                }
            }
        }

        today
    }

    /// Reserve the day's forced pins before any other slot is resolved.
    ///
    /// A pin binds when the person is on the roster, has no time-off that day
    /// and is not already bound to an earlier forced slot of the same day.
    fn bind_forced_pins(&self, date: NaiveDate, slots: &[RequiredSlot]) -> Vec<Option<&'a str>> {
        let verbosity = self.input.verbosity;
        let mut bound: Vec<Option<&'a str>> = Vec::with_capacity(slots.len());
        for slot in slots {
            let pid = slot.forced_pin().and_then(|pin| match self.roster_id(pin) {
                Some(pid) if self.time_off.has(pid, date) => {
                    log_checks!(verbosity, "    forced pin {} has time-off on {}", pid, date);
                    None
                }
                Some(pid) if bound.contains(&Some(pid)) => {
                    log_checks!(verbosity, "    forced pin {} already bound on {}", pid, date);
                    None
                }
                Some(pid) => Some(pid),
                None => {
                    log_checks!(verbosity, "    forced pin {} is not on the roster", pin);
                    None
                }
            });
            bound.push(pid);
        }
        bound
    }

    /// Pick the person for a slot that is not bound to a forced pin. Returns
    /// the choice and whether it is pinned.
    ///
    /// `taken` holds everyone already assigned today or bound to a forced pin.
    #[allow(clippy::too_many_arguments)]
    fn resolve_slot(
        &self,
        state: &GenerationState,
        date: NaiveDate,
        index: usize,
        slot: &RequiredSlot,
        today: &[DayAssignment],
        taken: &FxHashSet<&'a str>,
        working: &[&'a str],
        holder: Option<&'a str>,
        plan: DayPlan<'a>,
    ) -> (Option<&'a str>, bool) {
        let verbosity = self.input.verbosity;
        let weekend = is_weekend(date);
        let ctx = state.rule_context(today);

        let mut pool: Vec<&'a str> = working
            .iter()
            .copied()
            .filter(|id| !taken.contains(id))
            .filter(|id| !self.time_off.has(id, date))
            .filter(|id| self.admits(id, date, &slot.shift, &ctx))
            .collect();
        log_debug!(verbosity, "    {} pool={:?}", slot.key, pool);

        // An unbound forced slot falls through; overrides never apply to it
        if slot.forced_pin().is_none() {
            if let Some(wanted) = self.input.overrides.get(date, &slot.key) {
                let honoured = self.roster_id(wanted).filter(|pid| {
                    !taken.contains(pid)
                        && !self.time_off.has(pid, date)
                        && self.admits(pid, date, &slot.shift, &ctx)
                });
                match honoured {
                    Some(pid) => return (Some(pid), false),
                    None => {
                        log_checks!(verbosity, "    override {} on {} {} not honoured", wanted, date, slot.key);
                    }
                }
            }
        }

        let off_id = plan.week.off_id;
        if plan.force_off_work {
            let off_used = today
                .iter()
                .any(|a| a.person_id.as_deref() == Some(off_id));
            if !off_used && pool.contains(&off_id) {
                return (Some(off_id), false);
            }
            pool.retain(|id| *id != off_id);
        }

        if let Some(preferred) = slot.preferred_pin() {
            if let Some(pid) = pool.iter().copied().find(|id| *id == preferred) {
                return (Some(pid), false);
            }
        }

        if weekend && index == 0 {
            let continuity = holder.unwrap_or(plan.week.next_off);
            if let Some(pid) = pool.iter().copied().find(|id| *id == continuity) {
                return (Some(pid), false);
            }
        }

        (self.pick(state, &pool, weekend), false)
    }

    /// Generic tie-break, preferring on weekends those who rested last weekend.
    fn pick(&self, state: &GenerationState, pool: &[&'a str], weekend: bool) -> Option<&'a str> {
        let rested: Vec<&'a str> = if weekend {
            pool.iter()
                .copied()
                .filter(|id| !state.worked_last_weekend.contains(*id))
                .collect()
        } else {
            Vec::new()
        };
        let candidates = if rested.is_empty() { pool } else { rested.as_slice() };
        pick_best_candidate(candidates, weekend, &state.loads, self.priorities.as_ref())
    }

    fn admits(&self, person_id: &str, date: NaiveDate, shift: &ShiftTemplate, ctx: &RuleContext<'_>) -> bool {
        match rules::check(person_id, date, shift, ctx, &self.input.rule_set) {
            Ok(()) => true,
            Err(violation) => {
                log_checks!(self.input.verbosity, "    {} rejected: {}", person_id, violation);
                false
            }
        }
    }

    /// Weekend holder for slot 0. Saturday prefers next week's off-person
    /// and carries the choice to Sunday.
    fn weekend_holder(
        &self,
        state: &mut GenerationState,
        date: NaiveDate,
        working: &[&'a str],
        week: WeekPlan<'a>,
    ) -> Option<&'a str> {
        match date.weekday() {
            Weekday::Sat => {
                let sunday = date + Duration::days(1);
                let free = |id: &str| !self.time_off.has(id, date) && !self.time_off.has(id, sunday);
                let holder = if working.contains(&week.next_off) && free(week.next_off) {
                    Some(week.next_off)
                } else {
                    let pool: Vec<&'a str> = working.iter().copied().filter(|id| free(*id)).collect();
                    self.pick(state, &pool, true)
                };
                state.carry = Some(WeekendCarry {
                    sunday,
                    person_id: holder.map(str::to_string),
                });
                holder
            }
            Weekday::Sun => state
                .carry
                .as_ref()
                .filter(|c| c.sunday == date)
                .and_then(|c| c.person_id.as_deref())
                .and_then(|pid| self.roster_id(pid))
                .filter(|pid| !self.time_off.has(pid, date)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Person, ReinforcementEvent, SlotKey};
    use crate::slots::required_slot_count;
    use crate::time_off::{TimeOffRecord, TimeOffStatus};

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_shift(start: &str, end: &str, label: &str) -> ShiftTemplate {
        ShiftTemplate::new(start.parse().unwrap(), end.parse().unwrap(), label)
    }

    fn make_input(start: NaiveDate, weeks: u32) -> EngineInput {
        let people = (0..4).map(|i| Person::new(&format!("P{}", i), i)).collect();
        EngineInput::new(
            start,
            weeks,
            people,
            vec![make_shift("08:00", "16:00", "Day")],
            make_shift("10:00", "18:00", "Weekend"),
        )
    }

    fn vacation(person: &str, start: NaiveDate, end: NaiveDate) -> TimeOffRecord {
        TimeOffRecord {
            person_id: person.to_string(),
            start,
            end,
            kind: TimeOffKind::Vacation,
            status: TimeOffStatus::Approved,
            hours_per_day: 0.0,
        }
    }

    #[test]
    fn test_generation_is_idempotent() {
        let mut input = make_input(make_date(2025, 7, 28), 6);
        input.time_off_records.push(vacation("P1", make_date(2025, 8, 11), make_date(2025, 8, 15)));
        input.close_on_holidays = true;
        let scheduler = RosterScheduler::new(&input).unwrap();
        let first = serde_json::to_string(&scheduler.generate()).unwrap();
        let second = serde_json::to_string(&RosterScheduler::new(&input).unwrap().generate()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_every_open_day_has_its_required_slots() {
        let mut input = make_input(make_date(2025, 7, 28), 4);
        input.close_on_holidays = true;
        input.custom_closed_dates.push(make_date(2025, 8, 5));
        input.reinforcement_events.push(ReinforcementEvent::new(
            "Sales",
            make_date(2025, 8, 1),
            make_date(2025, 8, 10),
            1,
            1,
        ));
        let scheduler = RosterScheduler::new(&input).unwrap();
        let schedule = scheduler.generate();

        assert_eq!(schedule.assignments_by_date.len(), 28);
        for (date, cell) in &schedule.assignments_by_date {
            if scheduler.calendar().is_closed(*date) {
                assert!(cell.is_empty(), "{} should be closed", date);
            } else {
                let expected = required_slot_count(
                    *date,
                    &input.slot_templates(),
                    &input.reinforcement_events,
                );
                assert_eq!(cell.len(), expected, "slot count on {}", date);
            }
        }
        assert!(schedule.assignments(make_date(2025, 8, 15)).is_empty());
        assert!(schedule.assignments(make_date(2025, 8, 5)).is_empty());
    }

    #[test]
    fn test_nobody_works_twice_a_day() {
        let mut input = make_input(make_date(2025, 3, 3), 4);
        input.weekday_shift_templates.push(make_shift("14:00", "22:00", ""));
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        for cell in schedule.assignments_by_date.values() {
            let mut seen = FxHashSet::default();
            for id in cell.iter().filter_map(|a| a.person_id.as_deref()) {
                assert!(seen.insert(id));
            }
        }
    }

    #[test]
    fn test_off_rotation_repeats_every_four_weeks() {
        let input = make_input(make_date(2025, 3, 3), 5);
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.off_person_by_week.len(), 5);
        assert_eq!(schedule.off_person_by_week[4], schedule.off_person_by_week[0]);
        assert_eq!(schedule.off_person_by_week[0], "P3");
    }

    #[test]
    fn test_four_people_share_the_work() {
        let input = make_input(make_date(2025, 3, 3), 4);
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.total_conflicts(), 0);

        let mut days: FxHashMap<String, u32> = FxHashMap::default();
        for a in schedule.assignments_by_date.values().flatten() {
            if let Some(pid) = &a.person_id {
                *days.entry(pid.clone()).or_insert(0) += 1;
            }
        }
        assert_eq!(days.values().sum::<u32>(), 28);
        let max = days.values().max().copied().unwrap_or(0);
        let min = days.values().min().copied().unwrap_or(0);
        assert_eq!(days.len(), 4);
        assert!(max - min <= 2, "worked days {:?}", days);
    }

    #[test]
    fn test_off_person_rests_in_a_plain_week() {
        let input = make_input(make_date(2025, 3, 3), 2);
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        let off = &schedule.off_person_by_week[0];
        for day in 0..7 {
            assert!(!schedule.works_on(schedule.date_of(0, day), off));
        }
    }

    #[test]
    fn test_vacation_charged_on_business_days_only() {
        // Week 2 of a horizon from 2025-07-28 is Aug 11-17; Aug 15 is a Madrid holiday
        let mut input = make_input(make_date(2025, 7, 28), 4);
        input.time_off_records.push(vacation("P0", make_date(2025, 8, 11), make_date(2025, 8, 15)));
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.vacation_days_by_person["P0"], 4);
        assert_eq!(schedule.vacation_days_by_person["P1"], 0);
        for day in 11..=15 {
            assert!(!schedule.works_on(make_date(2025, 8, day), "P0"));
        }

        input.consume_vacation_on_holiday = true;
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.vacation_days_by_person["P0"], 5);
    }

    #[test]
    fn test_override_is_honoured() {
        let mut input = make_input(make_date(2025, 3, 3), 1);
        let tuesday = make_date(2025, 3, 4);
        let key = SlotKey::for_slot(&input.weekday_shift_templates[0], 0);
        // P3 is week 0's off-person and can still be pinned manually
        input.overrides.set(tuesday, &key, Some("P3".to_string()));
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.assignments(tuesday)[0].person_id.as_deref(), Some("P3"));
        assert!(!schedule.assignments(tuesday)[0].conflict);
    }

    #[test]
    fn test_override_on_time_off_is_ignored() {
        let mut input = make_input(make_date(2025, 3, 3), 1);
        let tuesday = make_date(2025, 3, 4);
        let key = SlotKey::for_slot(&input.weekday_shift_templates[0], 0);
        input.overrides.set(tuesday, &key, Some("P1".to_string()));
        input.time_off_records.push(vacation("P1", tuesday, tuesday));
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        let cell = schedule.assignments(tuesday);
        assert_ne!(cell[0].person_id.as_deref(), Some("P1"));
        assert!(!cell[0].conflict);
    }

    #[test]
    fn test_forced_pin_bypasses_rules() {
        let mut input = make_input(make_date(2025, 3, 3), 1);
        input.rule_set.max_daily_minutes = 60;
        let tuesday = make_date(2025, 3, 4);
        let mut event = ReinforcementEvent::new("Visit", tuesday, tuesday, 1, 0);
        event.pinned_person_id = Some("P1".to_string());
        event.forced = true;
        input.reinforcement_events.push(event);
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        let cell = schedule.assignments(tuesday);
        assert_eq!(cell.len(), 2);
        // The base slot breaks the daily limit for everyone
        assert!(cell[0].conflict);
        assert_eq!(cell[1].person_id.as_deref(), Some("P1"));
        assert!(cell[1].pinned);
    }

    fn forced_tuesday_event(extra: u32) -> ReinforcementEvent {
        let tuesday = make_date(2025, 3, 4);
        let mut event = ReinforcementEvent::new("Visit", tuesday, tuesday, extra, 0);
        event.pinned_person_id = Some("P1".to_string());
        event.forced = true;
        event
    }

    #[test]
    fn test_forced_pin_is_bound_before_base_slots() {
        // P1 would win the base slot on the tie-break alone
        let mut input = make_input(make_date(2025, 3, 3), 1);
        input.reinforcement_events.push(forced_tuesday_event(1));
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        let cell = schedule.assignments(make_date(2025, 3, 4));
        assert_eq!(cell.len(), 2);
        assert_eq!(cell[0].person_id.as_deref(), Some("P2"));
        assert!(!cell[0].pinned);
        assert_eq!(cell[1].person_id.as_deref(), Some("P1"));
        assert!(cell[1].pinned);
    }

    #[test]
    fn test_same_forced_pin_twice_falls_through() {
        let mut input = make_input(make_date(2025, 3, 3), 1);
        input.reinforcement_events.push(forced_tuesday_event(2));
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        let cell = schedule.assignments(make_date(2025, 3, 4));
        assert_eq!(cell.len(), 3);
        assert_eq!(cell[1].person_id.as_deref(), Some("P1"));
        assert!(cell[1].pinned);
        assert_eq!(cell[2].person_id.as_deref(), Some("P0"));
        assert!(!cell[2].pinned);
        assert_eq!(
            cell.iter().filter(|a| a.person_id.as_deref() == Some("P1")).count(),
            1
        );
    }

    #[test]
    fn test_off_person_covers_around_a_vacation() {
        let start = make_date(2025, 3, 3);
        let mut input = make_input(start, 2);
        input.weekday_shift_templates.push(make_shift("10:00", "18:00", "Late"));
        input
            .time_off_records
            .push(vacation("P0", make_date(2025, 3, 10), make_date(2025, 3, 14)));
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.off_person_by_week, ["P3", "P2"]);
        let holds = |date: NaiveDate, id: &str| {
            schedule
                .assignments(date)
                .iter()
                .filter(|a| a.person_id.as_deref() == Some(id))
                .count()
        };

        // The vacation week: P2 covers exactly one slot every weekday
        for offset in 7..12 {
            let date = start + Duration::days(offset);
            assert_eq!(holds(date, "P2"), 1, "P2 on {}", date);
            assert_eq!(holds(date, "P0"), 0, "P0 on {}", date);
        }

        // The adjacent week: P3 rests only on Wednesday to Friday
        let worked: Vec<i64> = (0..7)
            .filter(|d| schedule.works_on(start + Duration::days(*d), "P3"))
            .collect();
        assert_eq!(worked, vec![0, 1, 5, 6]);
        assert_eq!(holds(start, "P3"), 1);
        assert_eq!(holds(start + Duration::days(1), "P3"), 1);
    }

    #[test]
    fn test_weekend_pick_prefers_those_who_rested() {
        let input = make_input(make_date(2025, 3, 3), 1);
        let scheduler = RosterScheduler::new(&input).unwrap();
        let mut state = GenerationState::new(&input.people);
        state.loads.weekend.insert("P0".to_string(), 1);
        state.loads.weekend.insert("P1".to_string(), 3);
        state.worked_last_weekend.insert("P0".to_string());

        assert_eq!(scheduler.pick(&state, &["P0", "P1"], true), Some("P1"));
        // Weekdays ignore last weekend
        assert_eq!(scheduler.pick(&state, &["P0", "P1"], false), Some("P0"));
        state.worked_last_weekend.insert("P1".to_string());
        assert_eq!(scheduler.pick(&state, &["P0", "P1"], true), Some("P0"));
    }

    #[test]
    fn test_priorities_change_the_tie_break() {
        let input = make_input(make_date(2025, 3, 3), 1);
        let monday = make_date(2025, 3, 3);
        let base = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(base.assignments(monday)[0].person_id.as_deref(), Some("P0"));

        let mut priorities = FxHashMap::default();
        priorities.insert("P2".to_string(), 100.0);
        let rebalanced = RosterScheduler::new(&input)
            .unwrap()
            .with_priorities(priorities)
            .generate();
        assert_eq!(rebalanced.assignments(monday)[0].person_id.as_deref(), Some("P2"));
        assert_ne!(rebalanced, base);
    }

    #[test]
    fn test_enforced_rules_leave_conflicts() {
        let mut input = make_input(make_date(2025, 3, 3), 1);
        input.rule_set.max_daily_minutes = 60;
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.total_conflicts(), 7);
        assert!(schedule
            .assignments_by_date
            .values()
            .flatten()
            .all(|a| a.person_id.is_none()));

        input.rule_set.enforce = false;
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert_eq!(schedule.total_conflicts(), 0);
    }

    #[test]
    fn test_travel_credits_count_as_worked_minutes() {
        let mut input = make_input(make_date(2025, 3, 3), 1);
        let monday = make_date(2025, 3, 3);
        input.time_off_records.push(TimeOffRecord {
            person_id: "P0".to_string(),
            start: monday,
            end: monday,
            kind: TimeOffKind::Travel,
            status: TimeOffStatus::Approved,
            hours_per_day: 6.0,
        });
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        assert!(!schedule.works_on(monday, "P0"));
        let shifts = schedule.shift_minutes_by_person(&input.people);
        assert_eq!(
            schedule.worked_minutes_by_person["P0"],
            shifts["P0"] + 360
        );
    }

    #[test]
    fn test_saturday_holder_continues_on_sunday() {
        let input = make_input(make_date(2025, 3, 3), 2);
        let schedule = RosterScheduler::new(&input).unwrap().generate();
        let saturday = schedule.assignments(make_date(2025, 3, 8))[0].person_id.clone();
        let sunday = schedule.assignments(make_date(2025, 3, 9))[0].person_id.clone();
        // Next week's off-person takes the weekend
        assert_eq!(saturday.as_deref(), Some(schedule.off_person_by_week[1].as_str()));
        assert_eq!(saturday, sunday);
    }

    #[test]
    fn test_invalid_input_fails_fast() {
        let mut input = make_input(make_date(2025, 3, 3), 1);
        input.people.clear();
        assert!(matches!(
            RosterScheduler::new(&input),
            Err(InputError::EmptyRoster)
        ));
    }
}
