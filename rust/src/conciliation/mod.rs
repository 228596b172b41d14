//! Conciliation: the soft work-life-balance objective and its optimizer.
//!
//! The scorer penalizes work/rest flips within a week, isolated work and
//! rest days, and weekend overload across the horizon. The optimizer runs
//! one greedy pass of same-day reassignments against that score.

mod optimizer;
mod scoring;

pub use optimizer::{improve_conciliation, OptimizationResult, OptimizerContext, SwapRecord};
pub use scoring::{
    score_breakdown, score_conciliation, ScoreBreakdown, WeekBreakdown, WeekendLoad,
    WEEKEND_ALLOWANCE, WEEKEND_RUN_THRESHOLD,
};
