//! Guard against late decode results.
//!
//! Decoding runs asynchronously on the host. A session hands out a ticket per
//! request and only accepts the result carrying its latest ticket, so a result
//! arriving after the session moved on (or for a different session) is dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Claim on the result of one decode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeTicket {
    pub session: u64,
    pub generation: u64,
}

/// A decode result arrived for another session or a superseded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Stale decode result (session {session}, generation {generation})")]
pub struct StaleDecode {
    pub session: u64,
    pub generation: u64,
}

/// Per-session ticket issuer.
#[derive(Debug)]
pub struct DecodeSlot {
    session: u64,
    generation: u64,
}

impl DecodeSlot {
    /// Issuer with a process-unique session id.
    pub fn new() -> Self {
        Self {
            session: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Issue a ticket that supersedes every earlier one.
    pub fn request(&mut self) -> DecodeTicket {
        self.generation += 1;
        DecodeTicket {
            session: self.session,
            generation: self.generation,
        }
    }

    /// Check that `ticket` is the latest one issued by this slot.
    pub fn accept(&self, ticket: DecodeTicket) -> Result<(), StaleDecode> {
        if self.generation > 0
            && ticket.session == self.session
            && ticket.generation == self.generation
        {
            return Ok(());
        }
        tracing::debug!(
            session = self.session,
            ticket_session = ticket.session,
            ticket_generation = ticket.generation,
            "Discarding stale decode result"
        );
        Err(StaleDecode {
            session: ticket.session,
            generation: ticket.generation,
        })
    }
}

impl Default for DecodeSlot {
    fn default() -> Self {
        Self::new()
    }
}
