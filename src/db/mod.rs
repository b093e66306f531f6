mod schema;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::MonthRef;
use crate::models::*;

/// Domain failures callers may want to tell apart from storage errors.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<DbError>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("Concept {0} not found or not active")]
    ConceptNotFound(i64),

    #[error("Concept '{0}' already exists")]
    DuplicateConcept(String),

    #[error("Invalid input: {0}")]
    Invalid(String),
}

const CONCEPT_COLUMNS: &str = "id, name, description, is_active";

const JOURNAL_COLUMNS: &str = "id, date, session, symbol, trade_taken, why_taken, \
     what_i_did_well, what_to_improve, general_notes, created_at, updated_at";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "slot-journal")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("journal.db"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        schema::run_migrations(&self.conn())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    // ============================================================
    // Concept operations
    // ============================================================

    /// Active concepts ordered by name, as shown in the library.
    pub fn list_active_concepts(&self) -> Result<Vec<Concept>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM concepts WHERE is_active = 1 ORDER BY name",
            CONCEPT_COLUMNS
        ))?;

        let concepts = stmt
            .query_map([], row_to_concept)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(concepts)
    }

    pub fn get_concept(&self, id: i64) -> Result<Option<Concept>> {
        let conn = self.conn();
        let concept = conn
            .query_row(
                &format!("SELECT {} FROM concepts WHERE id = ?", CONCEPT_COLUMNS),
                [id],
                row_to_concept,
            )
            .optional()?;
        Ok(concept)
    }

    pub fn create_concept(&self, input: CreateConceptInput) -> Result<Concept> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DbError::Invalid("Concept name is required".to_string()).into());
        }
        if name.chars().count() > MAX_CONCEPT_NAME_CHARS {
            return Err(DbError::Invalid(format!(
                "Concept name must be at most {} characters",
                MAX_CONCEPT_NAME_CHARS
            ))
            .into());
        }
        let description = input.description.unwrap_or_default();

        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM concepts WHERE name = ?)",
            [&name],
            |row| row.get(0),
        )?;
        if exists {
            return Err(DbError::DuplicateConcept(name).into());
        }

        conn.execute(
            "INSERT INTO concepts (name, description, is_active) VALUES (?, ?, 1)",
            (&name, &description),
        )?;

        Ok(Concept {
            id: conn.last_insert_rowid(),
            name,
            description,
            is_active: true,
        })
    }

    /// Hide or restore a concept. Returns false if it does not exist.
    pub fn set_concept_active(&self, id: i64, active: bool) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE concepts SET is_active = ? WHERE id = ?",
            (active, id),
        )?;
        Ok(rows > 0)
    }

    /// Get-or-create each named concept. Returns how many were created.
    pub fn seed_concepts(&self, names: &[&str]) -> Result<usize> {
        let conn = self.conn();
        let mut created = 0;
        for name in names {
            created += conn.execute("INSERT OR IGNORE INTO concepts (name) VALUES (?)", [name])?;
        }
        Ok(created)
    }

    // ============================================================
    // Journal operations
    // ============================================================

    pub fn get_journal(&self, date: NaiveDate) -> Result<Option<DayJournal>> {
        let conn = self.conn();
        let journal = conn
            .query_row(
                &format!("SELECT {} FROM day_journals WHERE date = ?", JOURNAL_COLUMNS),
                [date.to_string()],
                row_to_journal,
            )
            .optional()?;
        Ok(journal)
    }

    pub fn get_or_create_journal(&self, date: NaiveDate) -> Result<DayJournal> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        let created = conn.execute(
            "INSERT OR IGNORE INTO day_journals (id, date, session, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                date.to_string(),
                DEFAULT_SESSION,
                &now,
                &now,
            ),
        )?;
        if created > 0 {
            tracing::debug!(%date, "Created journal");
        }

        let journal = conn.query_row(
            &format!("SELECT {} FROM day_journals WHERE date = ?", JOURNAL_COLUMNS),
            [date.to_string()],
            row_to_journal,
        )?;
        Ok(journal)
    }

    pub fn update_journal(&self, date: NaiveDate, input: UpdateDayJournalInput) -> Result<DayJournal> {
        if let Some(ref session) = input.session {
            if session.trim().is_empty() {
                return Err(DbError::Invalid("Session is required".to_string()).into());
            }
            check_length("Session", session, MAX_SESSION_CHARS)?;
        }
        if let Some(ref symbol) = input.symbol {
            check_length("Symbol", symbol, MAX_SYMBOL_CHARS)?;
        }

        let existing = self.get_or_create_journal(date)?;
        let now = Utc::now();
        let journal = DayJournal {
            session: input.session.unwrap_or(existing.session),
            symbol: input.symbol.unwrap_or(existing.symbol),
            trade_taken: input.trade_taken.unwrap_or(existing.trade_taken),
            why_taken: input.why_taken.unwrap_or(existing.why_taken),
            what_i_did_well: input.what_i_did_well.unwrap_or(existing.what_i_did_well),
            what_to_improve: input.what_to_improve.unwrap_or(existing.what_to_improve),
            general_notes: input.general_notes.unwrap_or(existing.general_notes),
            updated_at: now,
            ..existing
        };

        let conn = self.conn();
        conn.execute(
            "UPDATE day_journals SET session = ?, symbol = ?, trade_taken = ?, why_taken = ?,
             what_i_did_well = ?, what_to_improve = ?, general_notes = ?, updated_at = ?
             WHERE id = ?",
            (
                &journal.session,
                &journal.symbol,
                journal.trade_taken,
                &journal.why_taken,
                &journal.what_i_did_well,
                &journal.what_to_improve,
                &journal.general_notes,
                now.to_rfc3339(),
                journal.id.to_string(),
            ),
        )?;

        Ok(journal)
    }

    /// Dates within `month` that have a journal.
    pub fn journal_dates_in_month(&self, month: MonthRef) -> Result<BTreeSet<NaiveDate>> {
        let (Some(start), Some(end)) = (month.first_day(), month.next().first_day()) else {
            return Ok(BTreeSet::new());
        };

        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT date FROM day_journals WHERE date >= ? AND date < ? ORDER BY date")?;
        let dates = stmt
            .query_map([start.to_string(), end.to_string()], |row| {
                Ok(parse_date(row.get::<_, String>(0)?))
            })?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(dates)
    }

    // ============================================================
    // Slot operations
    // ============================================================

    /// Items of a journal, ordered by position within each timeframe.
    pub fn get_slot_items(&self, journal_id: Uuid) -> Result<Vec<SlotItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT i.id, i.journal_id, i.timeframe, i.concept_id, c.name, i.position, i.note
             FROM journal_slot_items i JOIN concepts c ON c.id = i.concept_id
             WHERE i.journal_id = ? ORDER BY i.position, i.rowid",
        )?;

        let items = stmt
            .query_map([journal_id.to_string()], |row| {
                let timeframe: String = row.get(2)?;
                let Some(timeframe) = Timeframe::from_str(&timeframe) else {
                    return Ok(None);
                };
                Ok(Some(SlotItem {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    journal_id: parse_uuid(row.get::<_, String>(1)?),
                    timeframe,
                    concept_id: row.get(3)?,
                    concept_name: row.get(4)?,
                    position: row.get(5)?,
                    note: row.get(6)?,
                }))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Rows with a timeframe outside the fixed set are not rendered.
        Ok(items.into_iter().flatten().collect())
    }

    /// The journal, the concept library and every timeframe slot of a day.
    pub fn get_day_view(&self, date: NaiveDate) -> Result<DayView> {
        let journal = self.get_or_create_journal(date)?;
        let concepts = self.list_active_concepts()?;
        let items = self.get_slot_items(journal.id)?;

        let slots = Timeframe::ALL
            .into_iter()
            .map(|timeframe| TimeframeSlot {
                timeframe,
                label: timeframe.label().to_string(),
                items: items
                    .iter()
                    .filter(|item| item.timeframe == timeframe)
                    .cloned()
                    .collect(),
            })
            .collect();

        Ok(DayView {
            journal,
            concepts,
            slots,
        })
    }

    /// Replace every slot item of the day with `writes`, atomically.
    ///
    /// Fails with [`DbError::ConceptNotFound`] if any write references a
    /// missing or inactive concept; nothing is changed in that case.
    pub fn replace_slot_items(&self, date: NaiveDate, writes: &[SlotWrite]) -> Result<usize> {
        let journal = self.get_or_create_journal(date)?;

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM journal_slot_items WHERE journal_id = ?",
            [journal.id.to_string()],
        )?;

        for write in writes {
            let active: Option<bool> = tx
                .query_row(
                    "SELECT is_active FROM concepts WHERE id = ?",
                    [write.concept_id],
                    |row| row.get(0),
                )
                .optional()?;
            if active != Some(true) {
                return Err(DbError::ConceptNotFound(write.concept_id).into());
            }

            tx.execute(
                "INSERT INTO journal_slot_items (id, journal_id, timeframe, concept_id, position, note)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    Uuid::new_v4().to_string(),
                    journal.id.to_string(),
                    write.timeframe.as_str(),
                    write.concept_id,
                    write.position,
                    &write.note,
                ),
            )?;
        }

        tx.commit()?;
        tracing::info!(%date, items = writes.len(), "Replaced slot items");
        Ok(writes.len())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(DbError::Invalid(format!(
            "{} must be at most {} characters",
            field, max
        ))
        .into());
    }
    Ok(())
}

fn row_to_concept(row: &Row<'_>) -> rusqlite::Result<Concept> {
    Ok(Concept {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_active: row.get(3)?,
    })
}

fn row_to_journal(row: &Row<'_>) -> rusqlite::Result<DayJournal> {
    Ok(DayJournal {
        id: parse_uuid(row.get::<_, String>(0)?),
        date: parse_date(row.get::<_, String>(1)?),
        session: row.get(2)?,
        symbol: row.get(3)?,
        trade_taken: row.get(4)?,
        why_taken: row.get(5)?,
        what_i_did_well: row.get(6)?,
        what_to_improve: row.get(7)?,
        general_notes: row.get(8)?,
        created_at: parse_datetime(row.get::<_, String>(9)?),
        updated_at: parse_datetime(row.get::<_, String>(10)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_date(s: String) -> NaiveDate {
    s.parse().unwrap_or_default()
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
