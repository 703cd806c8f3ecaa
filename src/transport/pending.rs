//! Pending-request table.
//!
//! Maps outstanding request ids to the channel their response is
//! delivered on. The table is shared by the client and every
//! connection it opens, so requests abandoned by a dropped socket
//! stay registered until their own timeout removes them.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::Envelope;

// ============================================================================
// Constants
// ============================================================================

/// Maximum pending requests before rejecting new ones.
pub const MAX_PENDING_REQUESTS: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// Outcome delivered to a waiting request.
pub type PendingResult = Result<Envelope>;

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<PendingResult>>;

// ============================================================================
// PendingTable
// ============================================================================

/// Correlates request ids with their completion channels.
///
/// At most one entry exists per id. An entry leaves the table exactly once:
/// on response, on timeout removal, on cancellation, or when its
/// [`PendingGuard`] is dropped.
#[derive(Debug)]
pub struct PendingTable {
    entries: Mutex<CorrelationMap>,
    max_pending: usize,
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new(MAX_PENDING_REQUESTS)
    }
}

impl PendingTable {
    /// Creates an empty table accepting up to `max_pending` entries.
    #[inline]
    #[must_use]
    pub fn new(max_pending: usize) -> Self {
        Self {
            entries: Mutex::new(CorrelationMap::default()),
            max_pending,
        }
    }

    /// Registers a new pending request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the id is already pending or the
    /// table is full.
    pub fn register(&self, id: RequestId) -> Result<oneshot::Receiver<PendingResult>> {
        let mut entries = self.entries.lock();

        if entries.len() >= self.max_pending {
            warn!(
                pending = entries.len(),
                max = self.max_pending,
                "Too many pending requests"
            );
            return Err(Error::protocol(format!(
                "Too many pending requests: {}/{}",
                entries.len(),
                self.max_pending
            )));
        }

        if entries.contains_key(&id) {
            return Err(Error::protocol(format!("Request id {id} is already pending")));
        }

        let (tx, rx) = oneshot::channel();
        entries.insert(id, tx);
        Ok(rx)
    }

    /// Delivers a response to its waiter.
    ///
    /// Returns `false` if no request with that id is pending.
    pub fn complete(&self, envelope: Envelope) -> bool {
        let tx = self.entries.lock().remove(&envelope.id);

        match tx {
            Some(tx) => {
                let _ = tx.send(Ok(envelope));
                true
            }
            None => false,
        }
    }

    /// Fails a pending request with the given error.
    ///
    /// Returns `false` if no request with that id is pending.
    pub fn fail(&self, id: &RequestId, error: Error) -> bool {
        let tx = self.entries.lock().remove(id);

        match tx {
            Some(tx) => {
                let _ = tx.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Removes an entry without notifying its waiter.
    pub fn remove(&self, id: &RequestId) -> bool {
        let removed = self.entries.lock().remove(id).is_some();
        if removed {
            debug!(request_id = %id, "Removed pending request");
        }
        removed
    }

    /// Fails every pending request with [`Error::Cancelled`].
    ///
    /// Returns the number of requests cancelled.
    pub fn cancel_all(&self) -> usize {
        let pending: Vec<_> = self.entries.lock().drain().collect();
        let count = pending.len();

        for (id, tx) in pending {
            let _ = tx.send(Err(Error::cancelled(id)));
        }

        if count > 0 {
            debug!(count, "Cancelled pending requests");
        }
        count
    }

    /// Returns `true` if the id is pending.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Removes a request's entry from the table when dropped.
///
/// Held by the waiting side of a request, so the entry leaves the table
/// even when the caller stops polling before a response or timeout.
/// Removal after the entry was already completed or cancelled is a no-op.
#[derive(Debug)]
pub struct PendingGuard {
    table: Arc<PendingTable>,
    id: RequestId,
}

impl PendingGuard {
    /// Guards the entry for `id` in `table`.
    #[inline]
    #[must_use]
    pub fn new(table: Arc<PendingTable>, id: RequestId) -> Self {
        Self { table, id }
    }

    /// Returns the guarded request id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.table.remove(&self.id);
    }
}

// ============================================================================
// Tests
// ============================================================================
