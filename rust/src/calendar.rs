//! Calendar and policy resolution: closed days, week indexing, the off
//! rotation and vacation-week detection.

use chrono::{Datelike, Duration, NaiveDate};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use crate::config::OffPolicy;
use crate::models::{is_weekend, Person};
use crate::time_off::{TimeOffKind, TimeOffRecord, TimeOffStatus};

/// Official holidays shipped with the engine, as (month, day) per province and year.
const OFFICIAL_HOLIDAYS: &[(&str, i32, &[(u32, u32)])] = &[
    (
        "Madrid",
        2025,
        &[
            (1, 1),
            (1, 6),
            (3, 20),
            (4, 17),
            (5, 1),
            (5, 2),
            (7, 25),
            (8, 15),
            (10, 12),
            (11, 1),
            (12, 6),
            (12, 8),
            (12, 25),
        ],
    ),
    (
        "Barcelona",
        2025,
        &[
            (1, 1),
            (1, 6),
            (4, 17),
            (4, 21),
            (5, 1),
            (6, 24),
            (8, 15),
            (9, 11),
            (10, 12),
            (11, 1),
            (12, 6),
            (12, 8),
            (12, 25),
            (12, 26),
        ],
    ),
];

/// Provinces with a built-in holiday catalog.
pub fn known_provinces() -> Vec<&'static str> {
    let mut names: Vec<&str> = OFFICIAL_HOLIDAYS.iter().map(|(p, _, _)| *p).collect();
    names.dedup();
    names
}

fn is_official_holiday(province: &str, date: NaiveDate) -> bool {
    OFFICIAL_HOLIDAYS
        .iter()
        .filter(|(p, year, _)| *p == province && *year == date.year())
        .any(|(_, _, days)| days.contains(&(date.month(), date.day())))
}

/// Holiday lookup for one province, including custom holidays by year.
#[derive(Clone, Debug, Default)]
pub struct HolidayCalendar {
    province: String,
    custom: FxHashSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(province: &str, custom_by_year: &BTreeMap<i32, Vec<NaiveDate>>) -> Self {
        // A date filed under the wrong year key is ignored
        let custom = custom_by_year
            .iter()
            .flat_map(|(year, dates)| dates.iter().filter(move |d| d.year() == *year))
            .copied()
            .collect();
        Self {
            province: province.to_string(),
            custom,
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.custom.contains(&date) || is_official_holiday(&self.province, date)
    }

    /// Whether a vacation day on `date` is charged against the balance:
    /// weekdays only, and holidays only when they consume vacation.
    pub fn is_effective_vacation_date(&self, date: NaiveDate, consume_on_holiday: bool) -> bool {
        if is_weekend(date) {
            return false;
        }
        consume_on_holiday || !self.is_holiday(date)
    }

    /// Days charged for a vacation over `start..=end`.
    pub fn vacation_days_charged(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        consume_on_holiday: bool,
    ) -> u32 {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_effective_vacation_date(*d, consume_on_holiday))
            .count() as u32
    }
}

/// Person nominally off in week `week`: the one with
/// `(week + offset) % 4 == 3`, falling back to round-robin over the roster.
///
/// Panics on an empty roster; callers validate input first.
pub fn off_person(people: &[Person], week: u32) -> &Person {
    people
        .iter()
        .find(|p| (week + p.rotation_offset) % 4 == 3)
        .unwrap_or_else(|| &people[week as usize % people.len()])
}

/// Settings the resolver needs besides the roster.
#[derive(Clone, Debug)]
pub struct CalendarSettings<'a> {
    pub horizon_start: NaiveDate,
    pub week_count: u32,
    pub province: &'a str,
    pub close_on_holidays: bool,
    pub custom_closed_dates: &'a [NaiveDate],
    pub custom_holidays_by_year: &'a BTreeMap<i32, Vec<NaiveDate>>,
    pub consume_vacation_on_holiday: bool,
}

/// Answers calendar questions for one generation horizon.
#[derive(Clone, Debug)]
pub struct CalendarResolver {
    horizon_start: NaiveDate,
    week_count: u32,
    close_on_holidays: bool,
    consume_vacation_on_holiday: bool,
    custom_closed: FxHashSet<NaiveDate>,
    holidays: HolidayCalendar,
    /// Non-denied vacation ranges, regardless of approval
    declared_vacations: Vec<(NaiveDate, NaiveDate)>,
}

impl CalendarResolver {
    pub fn new(settings: &CalendarSettings<'_>, time_off: &[TimeOffRecord]) -> Self {
        let declared_vacations = time_off
            .iter()
            .filter(|t| t.kind == TimeOffKind::Vacation && t.status != TimeOffStatus::Denied)
            .map(|t| (t.start, t.end))
            .collect();
        Self {
            horizon_start: settings.horizon_start,
            week_count: settings.week_count,
            close_on_holidays: settings.close_on_holidays,
            consume_vacation_on_holiday: settings.consume_vacation_on_holiday,
            custom_closed: settings.custom_closed_dates.iter().copied().collect(),
            holidays: HolidayCalendar::new(settings.province, settings.custom_holidays_by_year),
            declared_vacations,
        }
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    pub fn horizon_start(&self) -> NaiveDate {
        self.horizon_start
    }

    pub fn week_count(&self) -> u32 {
        self.week_count
    }

    pub fn week_start(&self, week: u32) -> NaiveDate {
        self.horizon_start + Duration::days(i64::from(week) * 7)
    }

    pub fn date_of(&self, week: u32, day: u32) -> NaiveDate {
        self.week_start(week) + Duration::days(i64::from(day))
    }

    /// Week index of a date relative to the horizon start (negative before it).
    pub fn week_index(&self, date: NaiveDate) -> i64 {
        (date - self.horizon_start).num_days().div_euclid(7)
    }

    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.custom_closed.contains(&date)
            || (self.close_on_holidays && self.holidays.is_holiday(date))
    }

    pub fn is_effective_vacation_date(&self, date: NaiveDate) -> bool {
        self.holidays
            .is_effective_vacation_date(date, self.consume_vacation_on_holiday)
    }

    /// Someone has a declared (non-denied) vacation on an effective vacation date.
    pub fn has_vacation_on(&self, date: NaiveDate) -> bool {
        self.is_effective_vacation_date(date)
            && self
                .declared_vacations
                .iter()
                .any(|(start, end)| *start <= date && date <= *end)
    }

    pub fn week_overlaps_vacation(&self, week: u32) -> bool {
        (0..7).any(|d| self.has_vacation_on(self.date_of(week, d)))
    }

    /// Whether the off-person's rest is restricted in `week`, either because
    /// the week itself overlaps a vacation or a neighbour within the window does.
    pub fn off_limited_week(&self, week: u32, policy: &OffPolicy) -> bool {
        if policy.limit_on_vacation_week && self.week_overlaps_vacation(week) {
            return true;
        }
        if !policy.block_adjacent_weeks {
            return false;
        }
        (1..=policy.window()).any(|k| {
            (week >= k && self.week_overlaps_vacation(week - k))
                || (week + k < self.week_count && self.week_overlaps_vacation(week + k))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn roster() -> Vec<Person> {
        (0..4).map(|i| Person::new(&format!("P{}", i), i)).collect()
    }

    fn vacation(person: &str, start: NaiveDate, end: NaiveDate, status: TimeOffStatus) -> TimeOffRecord {
        TimeOffRecord {
            person_id: person.to_string(),
            start,
            end,
            kind: TimeOffKind::Vacation,
            status,
            hours_per_day: 0.0,
        }
    }

    fn resolver(time_off: &[TimeOffRecord], weeks: u32) -> CalendarResolver {
        let custom = BTreeMap::new();
        let settings = CalendarSettings {
            horizon_start: date(2025, 7, 28),
            week_count: weeks,
            province: "Madrid",
            close_on_holidays: true,
            custom_closed_dates: &[],
            custom_holidays_by_year: &custom,
            consume_vacation_on_holiday: false,
        };
        CalendarResolver::new(&settings, time_off)
    }

    #[test]
    fn test_off_rotation_exactly_one_per_week() {
        let people = roster();
        for week in 0..12 {
            let matching = people
                .iter()
                .filter(|p| (week + p.rotation_offset) % 4 == 3)
                .count();
            assert_eq!(matching, 1);
        }
        assert_eq!(off_person(&people, 0).id, "P3");
        assert_eq!(off_person(&people, 1).id, "P2");
        assert_eq!(off_person(&people, 4).id, off_person(&people, 0).id);
    }

    #[test]
    fn test_off_rotation_round_robin_fallback() {
        // Nobody has offset 3 - (0 + o) % 4 never hits 3 in week 0
        let people = vec![Person::new("A", 0), Person::new("B", 1), Person::new("C", 2)];
        assert_eq!(off_person(&people, 0).id, "A");
        assert_eq!(off_person(&people, 1).id, "C");
    }

    #[test]
    fn test_vacation_days_skip_weekends_and_holidays() {
        let holidays = HolidayCalendar::new("Madrid", &BTreeMap::new());
        // Mon 11 Aug .. Sun 17 Aug 2025, with Fri 15 Aug a holiday
        let start = date(2025, 8, 11);
        let end = date(2025, 8, 17);
        assert_eq!(holidays.vacation_days_charged(start, end, false), 4);
        assert_eq!(holidays.vacation_days_charged(start, end, true), 5);
    }

    #[test]
    fn test_custom_holidays_by_year() {
        let mut custom = BTreeMap::new();
        custom.insert(2026, vec![date(2026, 3, 19), date(2025, 3, 19)]);
        let holidays = HolidayCalendar::new("Valencia", &custom);
        assert!(holidays.is_holiday(date(2026, 3, 19)));
        assert!(!holidays.is_holiday(date(2025, 3, 19)));
        assert!(!holidays.is_holiday(date(2025, 8, 15)));
    }

    #[test]
    fn test_closed_days() {
        let custom = BTreeMap::new();
        let closed = [date(2025, 8, 5)];
        let settings = CalendarSettings {
            horizon_start: date(2025, 7, 28),
            week_count: 4,
            province: "Madrid",
            close_on_holidays: false,
            custom_closed_dates: &closed,
            custom_holidays_by_year: &custom,
            consume_vacation_on_holiday: false,
        };
        let open_holidays = CalendarResolver::new(&settings, &[]);
        assert!(open_holidays.is_closed(date(2025, 8, 5)));
        assert!(!open_holidays.is_closed(date(2025, 8, 15)));

        assert!(resolver(&[], 4).is_closed(date(2025, 8, 15)));
    }

    #[test]
    fn test_week_overlap_ignores_denied_and_weekend_only_vacations() {
        let week2 = date(2025, 8, 11);
        let denied = vec![vacation("P0", week2, date(2025, 8, 14), TimeOffStatus::Denied)];
        assert!(!resolver(&denied, 4).week_overlaps_vacation(2));

        let pending = vec![vacation("P0", week2, week2, TimeOffStatus::Pending)];
        assert!(resolver(&pending, 4).week_overlaps_vacation(2));

        let weekend_only = vec![vacation(
            "P0",
            date(2025, 8, 16),
            date(2025, 8, 17),
            TimeOffStatus::Approved,
        )];
        assert!(!resolver(&weekend_only, 4).week_overlaps_vacation(2));
    }

    #[test]
    fn test_adjacent_weeks_are_limited() {
        let week2 = date(2025, 8, 11);
        let records = vec![vacation("P0", week2, date(2025, 8, 13), TimeOffStatus::Approved)];
        let calendar = resolver(&records, 5);
        let policy = OffPolicy::default();
        assert!(!calendar.off_limited_week(0, &policy));
        assert!(calendar.off_limited_week(1, &policy));
        assert!(calendar.off_limited_week(2, &policy));
        assert!(calendar.off_limited_week(3, &policy));
        assert!(!calendar.off_limited_week(4, &policy));

        let no_adjacent = OffPolicy {
            block_adjacent_weeks: false,
            ..OffPolicy::default()
        };
        assert!(!calendar.off_limited_week(1, &no_adjacent));
        assert!(calendar.off_limited_week(2, &no_adjacent));
    }

    #[test]
    fn test_week_index() {
        let calendar = resolver(&[], 4);
        assert_eq!(calendar.week_index(date(2025, 7, 28)), 0);
        assert_eq!(calendar.week_index(date(2025, 8, 3)), 0);
        assert_eq!(calendar.week_index(date(2025, 8, 4)), 1);
        assert_eq!(calendar.week_index(date(2025, 7, 27)), -1);
    }
}
