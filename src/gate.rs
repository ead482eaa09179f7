//! Write gate: serializes protocol exchanges and tracks the IDLE/BUSY phase.
//!
//! A writer is counted from the moment it asks for the gate until its settle delay has
//! elapsed, so polls see BUSY even while the writer is still queued behind another
//! exchange.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Client phase as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No write in flight; polls are allowed.
    Idle,
    /// A write is queued, in flight, or settling; polls are dropped.
    Busy,
}

#[derive(Debug, Default)]
pub(crate) struct WriteGate {
    exchange: Mutex<()>,
    writers: AtomicUsize,
}

impl WriteGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn phase(&self) -> Phase {
        if self.writers.load(Ordering::Acquire) > 0 {
            Phase::Busy
        } else {
            Phase::Idle
        }
    }

    /// Enters BUSY and waits for exclusive use of the link.
    ///
    /// The phase returns to IDLE when the ticket is dropped, including when the
    /// caller's future is dropped while still waiting.
    pub(crate) async fn acquire(&self) -> WriteTicket<'_> {
        let mark = BusyMark::enter(&self.writers);
        let exchange = self.exchange.lock().await;
        WriteTicket {
            _exchange: exchange,
            _mark: mark,
        }
    }

    /// Exclusive use of the link for a read, or `None` if anything else holds it.
    pub(crate) fn try_exchange(&self) -> Option<MutexGuard<'_, ()>> {
        self.exchange.try_lock().ok()
    }
}

struct BusyMark<'a> {
    writers: &'a AtomicUsize,
}

impl<'a> BusyMark<'a> {
    fn enter(writers: &'a AtomicUsize) -> Self {
        writers.fetch_add(1, Ordering::AcqRel);
        Self { writers }
    }
}

impl Drop for BusyMark<'_> {
    fn drop(&mut self) {
        self.writers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Held by a writer for the whole write plus settle period.
pub(crate) struct WriteTicket<'a> {
    _exchange: MutexGuard<'a, ()>,
    _mark: BusyMark<'a>,
}
