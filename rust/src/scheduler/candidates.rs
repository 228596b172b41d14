//! Candidate ordering for the generic slot pick.
//!
//! Lower keys win: least loaded in the day's context (weekday or weekend
//! slots), then least loaded overall, then highest remaining-hours priority
//! when rebalancing, then the smallest id.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;

use super::state::SlotLoads;

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateKey {
    pub context_load: u32,
    pub total_load: u32,
    pub neg_priority: f64,
    pub person_id: String,
}

/// Compare f64 values for sorting, treating NaN as equal.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Eq for CandidateKey {}

impl Ord for CandidateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.context_load
            .cmp(&other.context_load)
            .then(self.total_load.cmp(&other.total_load))
            .then(cmp_f64(self.neg_priority, other.neg_priority))
            .then(self.person_id.cmp(&other.person_id))
    }
}

impl PartialOrd for CandidateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn candidate_key(
    person_id: &str,
    weekend: bool,
    loads: &SlotLoads,
    priorities: Option<&FxHashMap<String, f64>>,
) -> CandidateKey {
    let weekday = loads.weekday_of(person_id);
    let weekend_load = loads.weekend_of(person_id);
    let priority = priorities
        .and_then(|p| p.get(person_id))
        .copied()
        .unwrap_or(0.0);
    CandidateKey {
        context_load: if weekend { weekend_load } else { weekday },
        total_load: weekday + weekend_load,
        neg_priority: -priority,
        person_id: person_id.to_string(),
    }
}

/// Best candidate of `pool`, or None when it is empty.
pub fn pick_best_candidate<'a>(
    pool: &[&'a str],
    weekend: bool,
    loads: &SlotLoads,
    priorities: Option<&FxHashMap<String, f64>>,
) -> Option<&'a str> {
    pool.iter()
        .copied()
        .min_by_key(|id| candidate_key(id, weekend, loads, priorities))
}
