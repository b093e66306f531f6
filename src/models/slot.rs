use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Maximum stored length of a placement note, in characters.
pub const MAX_NOTE_CHARS: usize = 240;

/// The fixed set of timeframe buckets a journal day is split into.
///
/// Variants are declared in display order (highest timeframe first).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "4H")]
    H4,
    #[serde(rename = "1H")]
    H1,
    #[serde(rename = "15M")]
    M15,
    #[serde(rename = "5M")]
    M5,
    #[serde(rename = "1M")]
    M1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Self::Daily,
        Self::H4,
        Self::H1,
        Self::M15,
        Self::M5,
        Self::M1,
    ];

    /// The key used in payloads and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "D",
            Self::H4 => "4H",
            Self::H1 => "1H",
            Self::M15 => "15M",
            Self::M5 => "5M",
            Self::M1 => "1M",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::H4 => "4H",
            Self::H1 => "1H",
            Self::M15 => "15M",
            Self::M5 => "5M",
            Self::M1 => "1M (Optional)",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tf| tf.as_str() == s)
    }
}

/// A concept placed into one timeframe of a journal day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotItem {
    pub id: Uuid,
    pub journal_id: Uuid,
    pub timeframe: Timeframe,
    pub concept_id: i64,
    /// Display name of the referenced concept, joined in for rendering.
    pub concept_name: String,
    /// Position within the timeframe; lower comes first. May have gaps.
    pub position: u32,
    pub note: String,
}

/// One timeframe bucket with its items in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeSlot {
    pub timeframe: Timeframe,
    pub label: String,
    pub items: Vec<SlotItem>,
}

/// One placement as it travels to the server.
///
/// `concept_id` is `None` when the card's recorded identifier could not be
/// parsed; it serializes as JSON `null` and the server skips the entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementEntry {
    pub concept_id: Option<i64>,
    pub note: String,
}

/// The document handed to the persistence transport.
///
/// Keys are timeframe strings. A `BTreeMap` keeps serialization canonical so
/// two snapshots of the same board are byte-identical.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotsPayload {
    pub slots: BTreeMap<String, Vec<PlacementEntry>>,
}

/// Server acknowledgement of a slot save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveSlotsResponse {
    pub ok: bool,
}

/// A validated slot item ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWrite {
    pub timeframe: Timeframe,
    pub concept_id: i64,
    pub position: u32,
    pub note: String,
}

/// Reasons a submitted slot document is refused outright.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotPayloadError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Invalid slots payload")]
    InvalidSlots,
    #[error("Invalid slot entry in {timeframe} at index {index}")]
    InvalidEntry { timeframe: String, index: usize },
    #[error("Invalid concept_id in {timeframe} at index {index}")]
    InvalidConceptId { timeframe: String, index: usize },
}

/// Parse a raw slot save body into the items to write.
///
/// The server is lenient about what clients send:
/// - a missing `slots` key means "clear the day";
/// - unknown timeframes and non-list values are skipped;
/// - entries with an empty concept id (`null`, `0`, `""`, `false`) are
///   skipped, numeric strings are accepted;
/// - notes are truncated to [`MAX_NOTE_CHARS`].
///
/// Each item's position is its index in the submitted list, skipped entries
/// included.
pub fn parse_slots_document(body: &[u8]) -> Result<Vec<SlotWrite>, SlotPayloadError> {
    let document: Value = serde_json::from_slice(body).map_err(|_| SlotPayloadError::InvalidJson)?;
    let Value::Object(document) = document else {
        return Err(SlotPayloadError::InvalidJson);
    };

    let slots = match document.get("slots") {
        None => return Ok(Vec::new()),
        Some(Value::Object(slots)) => slots,
        Some(_) => return Err(SlotPayloadError::InvalidSlots),
    };

    let mut writes = Vec::new();
    for (key, items) in slots {
        let Some(timeframe) = Timeframe::from_str(key) else {
            continue;
        };
        let Value::Array(items) = items else {
            continue;
        };

        for (index, item) in items.iter().enumerate() {
            let Value::Object(item) = item else {
                return Err(SlotPayloadError::InvalidEntry {
                    timeframe: key.clone(),
                    index,
                });
            };

            let concept_id = match coerce_concept_id(item.get("concept_id")) {
                Ok(Some(id)) => id,
                Ok(None) => continue,
                Err(()) => {
                    return Err(SlotPayloadError::InvalidConceptId {
                        timeframe: key.clone(),
                        index,
                    })
                }
            };

            let note = item
                .get("note")
                .and_then(Value::as_str)
                .map(truncate_note)
                .unwrap_or_default();

            writes.push(SlotWrite {
                timeframe,
                concept_id,
                position: index as u32,
                note,
            });
        }
    }

    Ok(writes)
}

/// `Ok(None)` for empty values, `Err` for values that are present but not
/// an integer.
fn coerce_concept_id(value: Option<&Value>) -> Result<Option<i64>, ()> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Number(n)) => {
            let id = match n.as_i64() {
                Some(id) => id,
                None => n.as_f64().filter(|f| f.is_finite()).ok_or(())?.trunc() as i64,
            };
            Ok((id != 0).then_some(id))
        }
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => {
            let id: i64 = s.trim().parse().map_err(|_| ())?;
            Ok((id != 0).then_some(id))
        }
        Some(Value::Array(a)) if a.is_empty() => Ok(None),
        Some(Value::Object(o)) if o.is_empty() => Ok(None),
        Some(_) => Err(()),
    }
}

pub fn truncate_note(note: &str) -> String {
    note.chars().take(MAX_NOTE_CHARS).collect()
}
