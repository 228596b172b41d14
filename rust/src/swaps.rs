//! Approval of shift swaps between two occupied slots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Overrides, Schedule, SlotKey};

/// Position of a slot in a generated schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRef {
    pub date: NaiveDate,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub first: SlotRef,
    pub second: SlotRef,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("No slot #{index} on {date}")]
    MissingSlot { date: NaiveDate, index: usize },
    #[error("Slot #{index} on {date} has nobody assigned")]
    Unassigned { date: NaiveDate, index: usize },
}

fn holder(schedule: &Schedule, at: SlotRef) -> Result<(&str, &SlotKey), SwapError> {
    let a = schedule
        .assignments(at.date)
        .get(at.index)
        .ok_or(SwapError::MissingSlot {
            date: at.date,
            index: at.index,
        })?;
    let person = a.person_id.as_deref().ok_or(SwapError::Unassigned {
        date: at.date,
        index: at.index,
    })?;
    Ok((person, &a.slot))
}

/// Record an approved swap as a pair of overrides so it survives regeneration.
pub fn approve_swap(
    schedule: &Schedule,
    request: &SwapRequest,
    overrides: &mut Overrides,
) -> Result<(), SwapError> {
    let (first_person, first_key) = holder(schedule, request.first)?;
    let (second_person, second_key) = holder(schedule, request.second)?;
    overrides.set(request.first.date, first_key, Some(second_person.to_string()));
    overrides.set(request.second.date, second_key, Some(first_person.to_string()));
    Ok(())
}
