use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::calendar::{month_view, MonthRef, MonthView};
use crate::db::{Database, DbError};
use crate::models::*;

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Map a database failure to a response.
///
/// Domain errors ([`DbError`]) are safe to show the client and keep their
/// message. Anything else is logged server-side and answered with a generic
/// 500.
fn internal_error(e: anyhow::Error) -> ApiError {
    let Some(err) = e.downcast_ref::<DbError>() else {
        tracing::error!("Internal error: {:#}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        );
    };

    let status = match err {
        DbError::ConceptNotFound(_) => StatusCode::NOT_FOUND,
        DbError::DuplicateConcept(_) => StatusCode::CONFLICT,
        DbError::Invalid(_) => StatusCode::BAD_REQUEST,
    };
    tracing::warn!("Validation error: {}", err);
    (status, err.to_string())
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, message.into())
}

fn parse_date((year, month, day): (i32, u32, u32)) -> Result<NaiveDate, ApiError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| bad_request("Invalid date"))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Concepts
// ============================================================

pub async fn list_concepts(State(db): State<Database>) -> Result<Json<Vec<Concept>>, ApiError> {
    db.list_active_concepts().map(Json).map_err(internal_error)
}

/// Takes the raw body so a malformed document is a 400 like any other
/// invalid concept.
pub async fn create_concept(
    State(db): State<Database>,
    body: Bytes,
) -> Result<(StatusCode, Json<Concept>), ApiError> {
    let input: CreateConceptInput = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Rejected concept: {}", e);
        bad_request("Invalid concept payload")
    })?;
    db.create_concept(input)
        .map(|c| (StatusCode::CREATED, Json(c)))
        .map_err(internal_error)
}

// ============================================================
// Calendar
// ============================================================

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn calendar(
    State(db): State<Database>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthView>, ApiError> {
    let today = Local::now().date_naive();
    let current = MonthRef::of(today);
    let month = MonthRef::new(
        query.year.unwrap_or(current.year),
        query.month.unwrap_or(current.month),
    )
    .ok_or_else(|| bad_request("Invalid month"))?;

    let journal_days = db.journal_dates_in_month(month).map_err(internal_error)?;
    month_view(month, today, &journal_days)
        .map(Json)
        .ok_or_else(|| bad_request("Invalid month"))
}

// ============================================================
// Days
// ============================================================

pub async fn get_day(
    State(db): State<Database>,
    Path(ymd): Path<(i32, u32, u32)>,
) -> Result<Json<DayView>, ApiError> {
    let date = parse_date(ymd)?;
    db.get_day_view(date).map(Json).map_err(internal_error)
}

pub async fn update_day(
    State(db): State<Database>,
    Path(ymd): Path<(i32, u32, u32)>,
    Json(input): Json<UpdateDayJournalInput>,
) -> Result<Json<DayJournal>, ApiError> {
    let date = parse_date(ymd)?;
    db.update_journal(date, input)
        .map(Json)
        .map_err(internal_error)
}

/// Replace a day's slot items with the submitted document.
///
/// The body is taken raw so malformed documents get the plain-text
/// `Invalid JSON` / `Invalid slots payload` answers instead of axum's
/// extractor rejections.
pub async fn save_slots(
    State(db): State<Database>,
    Path(ymd): Path<(i32, u32, u32)>,
    body: Bytes,
) -> Result<Json<SaveSlotsResponse>, ApiError> {
    let date = parse_date(ymd)?;
    let writes = parse_slots_document(&body).map_err(|e| {
        tracing::warn!(%date, "Rejected slot save: {}", e);
        bad_request(e.to_string())
    })?;

    db.replace_slot_items(date, &writes).map_err(internal_error)?;
    Ok(Json(SaveSlotsResponse { ok: true }))
}
