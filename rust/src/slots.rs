//! Expansion of a day's required duty slots from templates and reinforcement events.

use chrono::NaiveDate;

use crate::models::{is_weekend, ReinforcementEvent, ShiftTemplate, SlotKey};

/// Label base for reinforcement slots when the template has none.
pub const DEFAULT_REINFORCEMENT_LABEL: &str = "Reinforcement";

/// Templates a day's slots are cut from.
#[derive(Clone, Copy, Debug)]
pub struct SlotTemplates<'a> {
    pub weekday: &'a [ShiftTemplate],
    pub weekend: &'a ShiftTemplate,
    pub reinforcement: &'a ShiftTemplate,
}

/// Person bound to a reinforcement slot by its event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotPin {
    pub person_id: String,
    /// Forced pins are pre-bound and never moved; unforced ones are a preference
    pub forced: bool,
}

/// A slot that must be filled on a given day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredSlot {
    pub shift: ShiftTemplate,
    pub key: SlotKey,
    pub pin: Option<SlotPin>,
}

impl RequiredSlot {
    pub fn forced_pin(&self) -> Option<&str> {
        self.pin
            .as_ref()
            .filter(|p| p.forced)
            .map(|p| p.person_id.as_str())
    }

    pub fn preferred_pin(&self) -> Option<&str> {
        self.pin
            .as_ref()
            .filter(|p| !p.forced)
            .map(|p| p.person_id.as_str())
    }
}

/// Extra slots an event contributes on `date`.
///
/// Weekend extras from generated conciliation batches are ignored so the
/// optimizer's earlier output is not expanded again.
fn extra_slots_on(event: &ReinforcementEvent, date: NaiveDate) -> u32 {
    if !event.is_active_on(date) {
        0
    } else if is_weekend(date) {
        if event.is_conciliation() {
            0
        } else {
            event.extra_weekend_slots
        }
    } else {
        event.extra_weekday_slots
    }
}

/// Required slots for `date`: base templates first, then reinforcement
/// extras in event order, numbered `"{base} {n}"` across all events.
pub fn required_slots(
    date: NaiveDate,
    templates: &SlotTemplates<'_>,
    events: &[ReinforcementEvent],
) -> Vec<RequiredSlot> {
    let weekend = is_weekend(date);
    let base: Vec<ShiftTemplate> = if weekend {
        vec![templates.weekend.clone()]
    } else {
        templates.weekday.to_vec()
    };

    let mut slots: Vec<RequiredSlot> = base
        .into_iter()
        .enumerate()
        .map(|(index, shift)| RequiredSlot {
            key: SlotKey::for_slot(&shift, index),
            shift,
            pin: None,
        })
        .collect();

    let extra_source = if weekend {
        templates.weekend
    } else {
        templates.reinforcement
    };
    let label_base = if templates.reinforcement.label.is_empty() {
        DEFAULT_REINFORCEMENT_LABEL
    } else {
        templates.reinforcement.label.as_str()
    };

    let mut number = 0;
    for event in events {
        let count = extra_slots_on(event, date);
        let pin = event.pinned_person_id.as_ref().map(|person_id| SlotPin {
            person_id: person_id.clone(),
            forced: event.forced,
        });
        for _ in 0..count {
            number += 1;
            let shift = extra_source.relabeled(format!("{} {}", label_base, number));
            let index = slots.len();
            slots.push(RequiredSlot {
                key: SlotKey::for_slot(&shift, index),
                shift,
                pin: pin.clone(),
            });
        }
    }
    slots
}

/// Number of slots `required_slots` would produce.
pub fn required_slot_count(
    date: NaiveDate,
    templates: &SlotTemplates<'_>,
    events: &[ReinforcementEvent],
) -> usize {
    let base = if is_weekend(date) {
        1
    } else {
        templates.weekday.len()
    };
    base + events
        .iter()
        .map(|e| extra_slots_on(e, date) as usize)
        .sum::<usize>()
}
