//! Conciliation objective: fragmented workweeks and overloaded weekends.

use serde::Serialize;

use crate::config::ConciliationWeights;
use crate::models::{Person, Schedule};

/// Weekends a person may work over the horizon before each extra one is penalized.
pub const WEEKEND_ALLOWANCE: u32 = 3;
/// Consecutive worked weekends that count as one penalized run.
pub const WEEKEND_RUN_THRESHOLD: u32 = 3;

/// Worked/rest pattern of one person over one week, Monday first.
fn week_pattern(schedule: &Schedule, person_id: &str, week: u32) -> [bool; 7] {
    let mut pattern = [false; 7];
    for (day, worked) in pattern.iter_mut().enumerate() {
        *worked = schedule.works_on(schedule.date_of(week, day as u32), person_id);
    }
    pattern
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PatternCounts {
    transitions: u32,
    isolated_workdays: u32,
    isolated_restdays: u32,
}

fn pattern_counts(pattern: &[bool; 7]) -> PatternCounts {
    let mut counts = PatternCounts::default();
    for i in 1..7 {
        if pattern[i] != pattern[i - 1] {
            counts.transitions += 1;
        }
    }
    // Islands are centred on Tuesday..Saturday
    for i in 1..6 {
        let (before, day, after) = (pattern[i - 1], pattern[i], pattern[i + 1]);
        if !before && day && !after {
            counts.isolated_workdays += 1;
        }
        if before && !day && after {
            counts.isolated_restdays += 1;
        }
    }
    counts
}

/// Per-week diagnostics, summed over people.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBreakdown {
    pub week: u32,
    pub transitions: u32,
    pub isolated_workdays: u32,
    pub isolated_restdays: u32,
    pub score: i64,
}

/// Weekend load of one person over the whole horizon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekendLoad {
    pub person_id: String,
    pub weekends_worked: u32,
    pub longest_run: u32,
    /// Runs reaching the threshold, each penalized once
    pub penalized_runs: u32,
    pub score: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub total: i64,
    pub by_week: Vec<WeekBreakdown>,
    pub weekends: Vec<WeekendLoad>,
}

fn weekend_load(schedule: &Schedule, person_id: &str, weights: &ConciliationWeights) -> WeekendLoad {
    let mut load = WeekendLoad {
        person_id: person_id.to_string(),
        weekends_worked: 0,
        longest_run: 0,
        penalized_runs: 0,
        score: 0,
    };
    let mut run = 0;
    for week in 0..schedule.week_count {
        let saturday = schedule.date_of(week, 5);
        let sunday = schedule.date_of(week, 6);
        if schedule.works_on(saturday, person_id) || schedule.works_on(sunday, person_id) {
            load.weekends_worked += 1;
            run += 1;
            load.longest_run = load.longest_run.max(run);
            if run == WEEKEND_RUN_THRESHOLD {
                load.penalized_runs += 1;
            }
        } else {
            run = 0;
        }
    }
    let extra = load.weekends_worked.saturating_sub(WEEKEND_ALLOWANCE);
    load.score = i64::from(extra) * weights.per_extra_weekend
        + i64::from(load.penalized_runs) * weights.per_consecutive_weekend_run;
    load
}

fn week_score(counts: &PatternCounts, weights: &ConciliationWeights) -> i64 {
    i64::from(counts.transitions) * weights.per_weekly_transition
        + i64::from(counts.isolated_workdays) * weights.per_isolated_workday
        + i64::from(counts.isolated_restdays) * weights.per_isolated_restday
}

/// Whole-horizon badness of `schedule`. Lower is better.
pub fn score_conciliation(
    schedule: &Schedule,
    people: &[Person],
    weights: &ConciliationWeights,
) -> i64 {
    let mut score = 0;
    for person in people {
        for week in 0..schedule.week_count {
            let counts = pattern_counts(&week_pattern(schedule, &person.id, week));
            score += week_score(&counts, weights);
        }
        score += weekend_load(schedule, &person.id, weights).score;
    }
    score
}

/// Same objective as `score_conciliation`, broken down per week and per person.
pub fn score_breakdown(
    schedule: &Schedule,
    people: &[Person],
    weights: &ConciliationWeights,
) -> ScoreBreakdown {
    let by_week: Vec<WeekBreakdown> = (0..schedule.week_count)
        .map(|week| {
            let mut counts = PatternCounts::default();
            for person in people {
                let c = pattern_counts(&week_pattern(schedule, &person.id, week));
                counts.transitions += c.transitions;
                counts.isolated_workdays += c.isolated_workdays;
                counts.isolated_restdays += c.isolated_restdays;
            }
            WeekBreakdown {
                week,
                transitions: counts.transitions,
                isolated_workdays: counts.isolated_workdays,
                isolated_restdays: counts.isolated_restdays,
                score: week_score(&counts, weights),
            }
        })
        .collect();
    let weekends: Vec<WeekendLoad> = people
        .iter()
        .map(|p| weekend_load(schedule, &p.id, weights))
        .collect();
    let total = by_week.iter().map(|w| w.score).sum::<i64>()
        + weekends.iter().map(|w| w.score).sum::<i64>();
    ScoreBreakdown {
        total,
        by_week,
        weekends,
    }
}
