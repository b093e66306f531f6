use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Concept, TimeframeSlot};

/// Default trading session recorded on a new journal.
pub const DEFAULT_SESSION: &str = "NY";
pub const MAX_SESSION_CHARS: usize = 40;
pub const MAX_SYMBOL_CHARS: usize = 20;

/// One journal per calendar date.
///
/// A journal is created lazily the first time its day is opened. Its slot
/// items are stored separately and rewritten wholesale on every slot save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayJournal {
    pub id: Uuid,
    pub date: NaiveDate,
    /// Trading session the day belongs to (e.g. `NY`, `London`).
    pub session: String,
    pub symbol: String,
    pub trade_taken: bool,
    pub why_taken: String,
    pub what_i_did_well: String,
    pub what_to_improve: String,
    pub general_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for updating a journal. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDayJournalInput {
    pub session: Option<String>,
    pub symbol: Option<String>,
    pub trade_taken: Option<bool>,
    pub why_taken: Option<String>,
    pub what_i_did_well: Option<String>,
    pub what_to_improve: Option<String>,
    pub general_notes: Option<String>,
}

/// Everything the day page needs to render: the journal, the concept
/// library, and every timeframe slot in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayView {
    pub journal: DayJournal,
    pub concepts: Vec<Concept>,
    pub slots: Vec<TimeframeSlot>,
}
