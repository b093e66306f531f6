//! Handing snapshots to the persistence transport.
//!
//! The payload is captured when [`SlotSaver::save`] is called, before the
//! transport is awaited, so edits made while a save is in flight belong to
//! the next save. Only one save runs at a time: while one is pending, further
//! requests return [`SaveNotice::Busy`] without contacting the transport.
//! Failures are reported once and never retried.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::assignment::build_payload;
use crate::board::Board;
use crate::models::SlotsPayload;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    #[error("Save rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Accepts a finished payload and reports whether it was stored.
#[async_trait]
pub trait SlotTransport: Send + Sync {
    async fn submit(&self, payload: &SlotsPayload) -> Result<(), TransportError>;
}

/// The user-visible outcome of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveNotice {
    Saved,
    Failed,
    /// Another save was still pending; nothing was sent.
    Busy,
}

impl SaveNotice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Saved => "Saved slots.",
            Self::Failed => "Save failed. Try again.",
            Self::Busy => "A save is already in progress.",
        }
    }
}

pub struct SlotSaver<T> {
    transport: T,
    in_flight: AtomicBool,
}

impl<T: SlotTransport> SlotSaver<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether the save control should currently be disabled.
    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot `board` now and submit it.
    ///
    /// The snapshot and the busy check happen before this returns; the
    /// returned future does not borrow the board.
    pub fn save<'a>(&'a self, board: &Board) -> impl Future<Output = SaveNotice> + 'a {
        let payload = build_payload(board);
        let guard = InFlight::acquire(&self.in_flight);
        async move {
            let Some(_guard) = guard else {
                tracing::info!("Save requested while another is pending");
                return SaveNotice::Busy;
            };
            self.send(&payload).await
        }
    }

    /// Submit an already captured payload.
    pub async fn submit(&self, payload: SlotsPayload) -> SaveNotice {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            tracing::info!("Save requested while another is pending");
            return SaveNotice::Busy;
        };
        self.send(&payload).await
    }

    async fn send(&self, payload: &SlotsPayload) -> SaveNotice {
        let placements: usize = payload.slots.values().map(Vec::len).sum();
        match self.transport.submit(payload).await {
            Ok(()) => {
                tracing::info!(slots = payload.slots.len(), placements, "Saved slots");
                SaveNotice::Saved
            }
            Err(e) => {
                tracing::warn!("Save failed: {}", e);
                SaveNotice::Failed
            }
        }
    }
}

/// Held for the duration of one save.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
