//! Hard-constraint validation for a candidate assignment.

use chrono::{Duration, NaiveDate};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::RuleSet;
use crate::models::{is_weekend, ClockTime, DayAssignment, ShiftTemplate};

/// Why a candidate was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("daily limit: {committed}+{adding} > {limit} minutes")]
    DailyMinutes {
        committed: i64,
        adding: i64,
        limit: i64,
    },
    #[error("already works {days} days this week (max {limit})")]
    WeeklyDays { days: u32, limit: u32 },
    #[error("weekly limit: {committed}+{adding} > {limit} minutes")]
    WeeklyMinutes {
        committed: i64,
        adding: i64,
        limit: i64,
    },
    #[error("rest of {rest} minutes since {previous_end} is below {limit}")]
    Rest {
        rest: i64,
        previous_end: ClockTime,
        limit: i64,
    },
    #[error("worked the last {streak} weekends (max {limit})")]
    ConsecutiveWeekends { streak: u32, limit: u32 },
}

/// Partial schedule state a candidate is checked against.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'a> {
    /// Completed days of the generation so far
    pub schedule: &'a BTreeMap<NaiveDate, Vec<DayAssignment>>,
    /// Slots already resolved on the day being filled
    pub today: &'a [DayAssignment],
    pub weekly_minutes: &'a FxHashMap<String, i64>,
    pub weekly_days: &'a FxHashMap<String, u32>,
    /// Consecutive weekends worked immediately before the current week
    pub weekend_streaks: &'a FxHashMap<String, u32>,
}

fn held_by<'a>(
    cell: &'a [DayAssignment],
    person_id: &'a str,
) -> impl Iterator<Item = &'a DayAssignment> + 'a {
    cell.iter()
        .filter(move |a| a.person_id.as_deref() == Some(person_id))
}

/// Check every hard rule, reporting the first one broken.
pub fn check(
    person_id: &str,
    date: NaiveDate,
    shift: &ShiftTemplate,
    ctx: &RuleContext<'_>,
    rules: &RuleSet,
) -> Result<(), RuleViolation> {
    if !rules.enforce {
        return Ok(());
    }
    let adding = shift.net_minutes();

    let committed_today: i64 = held_by(ctx.today, person_id)
        .chain(held_by(
            ctx.schedule.get(&date).map(|v| v.as_slice()).unwrap_or(&[]),
            person_id,
        ))
        .map(|a| a.shift.net_minutes())
        .sum();
    if committed_today + adding > rules.max_daily_minutes {
        return Err(RuleViolation::DailyMinutes {
            committed: committed_today,
            adding,
            limit: rules.max_daily_minutes,
        });
    }

    let days = ctx.weekly_days.get(person_id).copied().unwrap_or(0);
    if days >= rules.max_days_per_week {
        return Err(RuleViolation::WeeklyDays {
            days,
            limit: rules.max_days_per_week,
        });
    }

    let committed_week = ctx.weekly_minutes.get(person_id).copied().unwrap_or(0);
    if committed_week + adding > rules.max_weekly_minutes {
        return Err(RuleViolation::WeeklyMinutes {
            committed: committed_week,
            adding,
            limit: rules.max_weekly_minutes,
        });
    }

    let yesterday = date - Duration::days(1);
    let previous_end = ctx
        .schedule
        .get(&yesterday)
        .and_then(|cell| held_by(cell, person_id).map(|a| a.shift.end).max());
    if let Some(previous_end) = previous_end {
        // Negative gaps wrap past midnight
        let same_day = shift.start.minutes() - previous_end.minutes();
        let rest = if same_day >= 0 {
            same_day
        } else {
            same_day + ClockTime::MINUTES_PER_DAY
        };
        if rest < rules.min_rest_minutes {
            return Err(RuleViolation::Rest {
                rest,
                previous_end,
                limit: rules.min_rest_minutes,
            });
        }
    }

    if is_weekend(date) {
        let streak = ctx.weekend_streaks.get(person_id).copied().unwrap_or(0);
        if streak >= rules.max_consecutive_weekends_worked {
            return Err(RuleViolation::ConsecutiveWeekends {
                streak,
                limit: rules.max_consecutive_weekends_worked,
            });
        }
    }

    Ok(())
}

/// Whether `person_id` may take `shift` on `date` given the partial schedule.
pub fn respects(
    person_id: &str,
    date: NaiveDate,
    shift: &ShiftTemplate,
    ctx: &RuleContext<'_>,
    rules: &RuleSet,
) -> bool {
    check(person_id, date, shift, ctx, rules).is_ok()
}
