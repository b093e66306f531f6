//! Snapshots of which concepts occupy which slot.
//!
//! An [`AssignmentState`] is built from a [`Board`] at save time, serialized
//! into a [`SlotsPayload`] and then dropped. Nothing is kept between saves:
//! the board's containers stay the source of truth.

use std::collections::BTreeMap;

use crate::board::Board;
use crate::models::{PlacementEntry, SlotsPayload};

/// One concept occurrence in a slot, as read from its card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPlacement {
    /// `None` when the card's identifier is not an integer. Passed through
    /// unchanged; the server skips such entries.
    pub concept_id: Option<i64>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub timeframe: String,
    pub placements: Vec<CardPlacement>,
}

/// Every slot known to the board, keyed by timeframe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentState {
    slots: BTreeMap<String, Slot>,
}

impl AssignmentState {
    /// Read every slot container in its current top-to-bottom order.
    pub fn capture(board: &Board) -> Self {
        let slots = board
            .slots()
            .iter()
            .map(|container| {
                let placements = container
                    .cards()
                    .iter()
                    .map(|card| CardPlacement {
                        concept_id: parse_concept_id(card.concept_ref()),
                        note: card.note().unwrap_or_default().to_string(),
                    })
                    .collect();
                (
                    container.timeframe().to_string(),
                    Slot {
                        timeframe: container.timeframe().to_string(),
                        placements,
                    },
                )
            })
            .collect();
        Self { slots }
    }

    pub fn slot(&self, timeframe: &str) -> Option<&Slot> {
        self.slots.get(timeframe)
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    pub fn into_payload(self) -> SlotsPayload {
        let slots = self
            .slots
            .into_iter()
            .map(|(timeframe, slot)| {
                let entries = slot
                    .placements
                    .into_iter()
                    .map(|p| PlacementEntry {
                        concept_id: p.concept_id,
                        note: p.note,
                    })
                    .collect();
                (timeframe, entries)
            })
            .collect();
        SlotsPayload { slots }
    }
}

/// Snapshot the board into the document the persistence transport expects.
///
/// Pure read: calling it twice without touching the board yields equal
/// payloads.
pub fn build_payload(board: &Board) -> SlotsPayload {
    AssignmentState::capture(board).into_payload()
}

/// Parse a card's recorded concept identifier.
///
/// Follows the lenient rules cards have always been read with: leading
/// whitespace is skipped, an optional sign and the longest run of decimal
/// digits are taken, and anything after them is ignored (`"12px"` is `12`).
/// No digits at all, or a value that does not fit, gives `None`.
pub fn parse_concept_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
