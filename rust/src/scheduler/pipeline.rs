//! End-to-end planning: generation, optional rebalance, conciliation pass.

use serde::Serialize;

use crate::conciliation::{
    improve_conciliation, score_breakdown, score_conciliation, OptimizerContext, ScoreBreakdown,
    SwapRecord,
};
use crate::log_changes;
use crate::models::{InputError, Schedule};
use crate::summary::{build_summary, RosterSummary};

use super::core::RosterScheduler;
use super::input::EngineInput;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlan {
    pub schedule: Schedule,
    pub score_before: i64,
    pub score_after: i64,
    pub swaps: Vec<SwapRecord>,
    pub summary: RosterSummary,
    pub breakdown: ScoreBreakdown,
}

fn summarize(input: &EngineInput, scheduler: &RosterScheduler<'_>, schedule: &Schedule) -> RosterSummary {
    build_summary(
        schedule,
        &input.people,
        input.annual_target_hours,
        &input.time_off_records,
        scheduler.calendar().holidays(),
        input.consume_vacation_on_holiday,
    )
}

/// Generate a roster and post-process it as the input asks.
///
/// With `rebalance`, a second generation favours people with the most hours
/// still owed against the annual target. With `apply_conciliation`, the
/// optimizer runs on the final generation.
pub fn plan_roster(input: &EngineInput) -> Result<RosterPlan, InputError> {
    let verbosity = input.verbosity;
    let mut scheduler = RosterScheduler::new(input)?;
    let mut schedule = scheduler.generate();

    if input.rebalance {
        let priorities = summarize(input, &scheduler, &schedule).remaining_priorities();
        log_changes!(verbosity, "Rebalancing with {} priorities", priorities.len());
        scheduler = scheduler.with_priorities(priorities);
        schedule = scheduler.generate();
    }

    let weights = &input.conciliation_weights;
    let (schedule, score_before, score_after, swaps) = if input.apply_conciliation {
        let ctx = OptimizerContext {
            people: &input.people,
            overrides: &input.overrides,
            time_off: scheduler.time_off(),
            weights,
            verbosity,
        };
        let result = improve_conciliation(&schedule, &ctx);
        log_changes!(
            verbosity,
            "Conciliation: {} -> {} with {} swaps",
            result.score_before,
            result.score_after,
            result.swaps.len()
        );
        (result.schedule, result.score_before, result.score_after, result.swaps)
    } else {
        let score = score_conciliation(&schedule, &input.people, weights);
        (schedule, score, score, Vec::new())
    };

    let summary = summarize(input, &scheduler, &schedule);
    let breakdown = score_breakdown(&schedule, &input.people, weights);
    Ok(RosterPlan {
        schedule,
        score_before,
        score_after,
        swaps,
        summary,
        breakdown,
    })
}
