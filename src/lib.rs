//! Timeframe slot planner.
//!
//! A day's trading journal is split into fixed timeframe slots. Concepts from
//! a shared library are dragged into those slots, each placement can carry a
//! short note, and the whole assignment is saved in one request.
//!
//! - [`board`] models the drag-and-drop surface (library, slots, cards).
//! - [`assignment`] captures a board into the payload that gets persisted.
//! - [`save`] runs a save through a [`save::SlotTransport`].
//! - [`api`] and [`db`] are the server side; [`client`] talks to it.

pub mod api;
pub mod assignment;
pub mod board;
pub mod calendar;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod save;
pub mod seed;
