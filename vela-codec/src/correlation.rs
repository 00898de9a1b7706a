//! Maps outstanding request IDs to a pending-result slot, with a background
//! sweep that drops entries nobody claimed within a grace window (the store
//! must tolerate `take` racing `register` with no pathological memory
//! growth, §4.6).

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::message::{Request, Response};

struct PendingEntry {
    request: Request,
    registered_at: Instant,
    sender: oneshot::Sender<Response>,
}

/// Thread-safe request-id → pending-response map.
pub struct CorrelationStore {
    entries: DashMap<u64, PendingEntry>,
    grace: Duration,
}

impl CorrelationStore {
    pub fn new(grace: Duration) -> Self {
        Self { entries: DashMap::new(), grace }
    }

    /// Register `request`'s ID as outstanding. Returns a receiver that
    /// resolves with the matching [`Response`] once [`Self::take`] completes
    /// it, or is dropped (resolving to `Err`) if the entry is swept first.
    pub fn register(&self, request: Request) -> oneshot::Receiver<Response> {
        let (tx, rx) = oneshot::channel();
        self.entries.insert(
            request.id,
            PendingEntry { request, registered_at: Instant::now(), sender: tx },
        );
        rx
    }

    /// Remove the pending entry for `id` and complete its waiter with
    /// `response`. Returns the original request for decoding context, or
    /// `None` if nothing (or nothing still live) was registered for `id` —
    /// the caller already timed out, or the ID was never ours.
    pub fn take(&self, id: u64, response: Response) -> Option<Request> {
        let (_, entry) = self.entries.remove(&id)?;
        let _ = entry.sender.send(response);
        Some(entry.request)
    }

    /// Drop the pending entry for `id` without completing it (e.g. the
    /// connection it was waiting on died).
    pub fn cancel(&self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&self) {
        let now = Instant::now();
        let stale: Vec<u64> = self
            .entries
            .iter()
            .filter(|e| now.duration_since(e.registered_at) >= self.grace)
            .map(|e| *e.key())
            .collect();
        for id in stale {
            if self.entries.remove(&id).is_some() {
                tracing::debug!(id, "dropping correlation entry past grace window");
            }
        }
    }

    /// Spawn a background task that sweeps stale entries every `interval`.
    /// Aborting (or dropping) the returned handle stops the sweep; it does
    /// not affect already-registered entries.
    pub fn spawn_sweep(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.sweep();
            }
        })
    }
}
