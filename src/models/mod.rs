//! Domain models for the slot journal.
//!
//! # Core Concepts
//!
//! - [`Concept`]: A catalog item the user can schedule. Concepts make up the
//!   read-only library that cards are dragged out of.
//! - [`DayJournal`]: One journal per calendar date, holding free-form notes
//!   about the trading day.
//! - [`SlotItem`]: A concept placed into a [`Timeframe`] of a journal, with
//!   an ordered position and an optional note.
//!
//! ## Wire types
//!
//! - [`SlotsPayload`]: The document the client posts when the user saves,
//!   mapping each timeframe key to its ordered [`PlacementEntry`] list.

mod concept;
mod journal;
mod slot;

pub use concept::*;
pub use journal::*;
pub use slot::*;
