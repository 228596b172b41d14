//! Roster generation: a greedy forward pass over (week, day, slot) and the
//! planning pipeline around it.

mod candidates;
mod core;
mod input;
mod pipeline;
mod state;

pub use candidates::{pick_best_candidate, CandidateKey};
pub use core::RosterScheduler;
pub use input::EngineInput;
pub use pipeline::{plan_roster, RosterPlan};
pub use state::{GenerationState, SlotLoads, WeekendCarry};
