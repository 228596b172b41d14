//! Core data types for the roster engine.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Note: output maps are BTreeMaps so repeated generations serialize identically

/// Structurally invalid engine input. Raised once, before generation starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Roster is empty")]
    EmptyRoster,
    #[error("Duplicate person id: {0}")]
    DuplicatePerson(String),
    #[error("Rotation offset {offset} for {person_id} is outside 0..=3")]
    InvalidRotationOffset { person_id: String, offset: u32 },
    #[error("Horizon must cover at least one week")]
    EmptyHorizon,
    #[error("No weekday shift templates configured")]
    NoWeekdayTemplates,
    #[error("Invalid clock time {0:?} (expected HH:MM)")]
    InvalidClockTime(String),
    #[error("Range {start}..{end} ends before it starts ({context})")]
    InvertedRange {
        start: NaiveDate,
        end: NaiveDate,
        context: String,
    },
}

/// Time of day as minutes since midnight, written `HH:MM`.
///
/// `24:00` is accepted so a shift can end exactly at midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MINUTES_PER_DAY: i64 = 24 * 60;

    /// Build from hours and minutes. Returns None past 24:00.
    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if minutes >= 60 {
            return None;
        }
        let total = hours.checked_mul(60)?.checked_add(minutes)?;
        if i64::from(total) > Self::MINUTES_PER_DAY {
            return None;
        }
        Some(Self(total))
    }

    /// Whole hour, clamped to 24:00.
    pub const fn at_hour(hours: u16) -> Self {
        let h = if hours > 24 { 24 } else { hours };
        Self(h * 60)
    }

    #[inline]
    pub fn minutes(self) -> i64 {
        i64::from(self.0)
    }
}

impl FromStr for ClockTime {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InputError::InvalidClockTime(s.to_string());
        let trimmed = s.trim();
        let (h, m) = match trimmed.split_once(':') {
            Some((h, m)) => (h, m),
            None => (trimmed, "0"),
        };
        let hours: u16 = h.parse().map_err(|_| invalid())?;
        let minutes: u16 = m.parse().map_err(|_| invalid())?;
        Self::from_hm(hours, minutes).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// A team member. Stable for the whole horizon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub color_tag: String,
    /// Position in the four-week off rotation (0..=3).
    #[serde(default)]
    pub rotation_offset: u32,
}

impl Person {
    pub fn new(id: &str, rotation_offset: u32) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            color_tag: String::new(),
            rotation_offset,
        }
    }
}

/// A duty shift. Net duration is gross minus the lunch deduction, floored at 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplate {
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub lunch_deduction_minutes: i64,
}

impl ShiftTemplate {
    pub fn new(start: ClockTime, end: ClockTime, label: &str) -> Self {
        Self {
            start,
            end,
            label: label.to_string(),
            lunch_deduction_minutes: 0,
        }
    }

    pub fn gross_minutes(&self) -> i64 {
        self.end.minutes() - self.start.minutes()
    }

    pub fn net_minutes(&self) -> i64 {
        (self.gross_minutes() - self.lunch_deduction_minutes).max(0)
    }

    /// Copy of this template under another label.
    pub fn relabeled(&self, label: String) -> Self {
        Self {
            label,
            ..self.clone()
        }
    }
}

/// Identity of a required slot within a day.
///
/// Its string form `"{start}-{end}-{label}"` is the key manual overrides are
/// stored under, so it must not change between regenerations.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub start: ClockTime,
    pub end: ClockTime,
    pub label: String,
}

impl SlotKey {
    /// Key for the slot at `index` in the day's required list.
    /// Unlabelled slots fall back to `T{index+1}`.
    pub fn for_slot(shift: &ShiftTemplate, index: usize) -> Self {
        let label = if shift.label.is_empty() {
            format!("T{}", index + 1)
        } else {
            shift.label.clone()
        };
        Self {
            start: shift.start,
            end: shift.end,
            label,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.start, self.end, self.label)
    }
}

/// Where a reinforcement event came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventSource {
    /// Entered by an administrator or the peak generator.
    #[default]
    Manual,
    /// Produced by the deficit proposal generator.
    #[serde(rename_all = "camelCase")]
    Conciliation { batch_id: Option<String> },
}

/// Temporary extra slots layered on top of the base templates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementEvent {
    #[serde(default)]
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub extra_weekday_slots: u32,
    #[serde(default)]
    pub extra_weekend_slots: u32,
    #[serde(default)]
    pub pinned_person_id: Option<String>,
    #[serde(default)]
    pub forced: bool,
    #[serde(default)]
    pub source: EventSource,
}

impl ReinforcementEvent {
    pub fn new(label: &str, start: NaiveDate, end: NaiveDate, weekday: u32, weekend: u32) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
            extra_weekday_slots: weekday,
            extra_weekend_slots: weekend,
            pinned_person_id: None,
            forced: false,
            source: EventSource::Manual,
        }
    }

    #[inline]
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_conciliation(&self) -> bool {
        matches!(self.source, EventSource::Conciliation { .. })
    }
}

/// Manual pins: date -> slot key -> person (None clears the pin).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overrides(BTreeMap<NaiveDate, BTreeMap<String, Option<String>>>);

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Person pinned to a slot, if any.
    pub fn get(&self, date: NaiveDate, key: &SlotKey) -> Option<&str> {
        self.0
            .get(&date)
            .and_then(|slots| slots.get(&key.to_string()))
            .and_then(|p| p.as_deref())
    }

    pub fn is_overridden(&self, date: NaiveDate, key: &SlotKey) -> bool {
        self.get(date, key).is_some()
    }

    pub fn set(&mut self, date: NaiveDate, key: &SlotKey, person_id: Option<String>) {
        self.0
            .entry(date)
            .or_default()
            .insert(key.to_string(), person_id);
    }
}

/// One required slot on one open day, as produced by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAssignment {
    pub shift: ShiftTemplate,
    pub slot: SlotKey,
    pub person_id: Option<String>,
    pub conflict: bool,
    /// Bound by a forced reinforcement pin; never moved afterwards.
    #[serde(default)]
    pub pinned: bool,
}

/// Result of one generation over the horizon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub horizon_start: NaiveDate,
    pub week_count: u32,
    /// Every horizon date; closed days map to an empty list.
    pub assignments_by_date: BTreeMap<NaiveDate, Vec<DayAssignment>>,
    /// Net shift minutes plus travel credits.
    pub worked_minutes_by_person: BTreeMap<String, i64>,
    pub vacation_days_by_person: BTreeMap<String, u32>,
    pub off_person_by_week: Vec<String>,
}

impl Schedule {
    pub fn assignments(&self, date: NaiveDate) -> &[DayAssignment] {
        self.assignments_by_date
            .get(&date)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn works_on(&self, date: NaiveDate, person_id: &str) -> bool {
        self.assignments(date)
            .iter()
            .any(|a| a.person_id.as_deref() == Some(person_id))
    }

    /// Date of day `day` (0..7) in week `week`.
    pub fn date_of(&self, week: u32, day: u32) -> NaiveDate {
        self.horizon_start + chrono::Duration::days(i64::from(week) * 7 + i64::from(day))
    }

    pub fn total_conflicts(&self) -> usize {
        self.assignments_by_date
            .values()
            .flatten()
            .filter(|a| a.conflict)
            .count()
    }

    /// Number of slot assignments falling on Saturdays and Sundays.
    pub fn weekend_assignment_count(&self) -> usize {
        self.assignments_by_date
            .iter()
            .filter(|(date, _)| is_weekend(**date))
            .map(|(_, cell)| cell.len())
            .sum()
    }

    /// Net shift minutes per person, recomputed from the assignments alone.
    pub fn shift_minutes_by_person(&self, people: &[Person]) -> BTreeMap<String, i64> {
        let mut minutes: BTreeMap<String, i64> =
            people.iter().map(|p| (p.id.clone(), 0)).collect();
        for a in self.assignments_by_date.values().flatten() {
            if let Some(pid) = &a.person_id {
                if let Some(m) = minutes.get_mut(pid) {
                    *m += a.shift.net_minutes();
                }
            }
        }
        minutes
    }
}

#[inline]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
