use crate::debounce::Debouncer;
use crate::store::SessionState;
use fairway_core::repository::SessionRepository;
use fairway_store::SessionBackend;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// The two independently persisted parts of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    Pack,
    Booking,
}

impl Slice {
    fn label(&self) -> &'static str {
        match self {
            Slice::Pack => "pack",
            Slice::Booking => "booking",
        }
    }
}

struct SliceLane {
    debouncer: Debouncer,
    // Write-in-flight guard: a flush queued behind a running write waits
    // for it, so writes within one slice never reorder.
    guard: Arc<Mutex<()>>,
}

impl SliceLane {
    fn new(debounce: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(debounce),
            guard: Arc::new(Mutex::new(())),
        }
    }
}

/// Mirrors the in-memory session to durable storage without blocking the
/// caller.
///
/// Each slice has its own debounce window, so a burst of edits produces a
/// single write carrying the final merged state, and its own write guard,
/// so a second write for the same slice waits for the first instead of
/// racing it. Writes for different slices are independent; they touch
/// disjoint document fields. A failed write degrades to device storage
/// and is only ever logged.
pub struct SessionMirror {
    backend: Arc<SessionBackend>,
    state: Arc<RwLock<SessionState>>,
    pack: SliceLane,
    booking: SliceLane,
}

impl SessionMirror {
    pub fn new(
        backend: Arc<SessionBackend>,
        state: Arc<RwLock<SessionState>>,
        debounce: Duration,
    ) -> Self {
        Self {
            backend,
            state,
            pack: SliceLane::new(debounce),
            booking: SliceLane::new(debounce),
        }
    }

    fn lane(&self, slice: Slice) -> &SliceLane {
        match slice {
            Slice::Pack => &self.pack,
            Slice::Booking => &self.booking,
        }
    }

    /// Note a mutation of the given slice; the actual write happens after
    /// the quiet window elapses.
    pub fn schedule(&self, slice: Slice) {
        let lane = self.lane(slice);
        let backend = self.backend.clone();
        let state = self.state.clone();
        let guard = lane.guard.clone();
        lane.debouncer.schedule(async move {
            flush_slice(slice, &backend, &state, &guard).await;
        });
    }

    /// Write the slice out immediately, subject to the write guard.
    pub async fn flush(&self, slice: Slice) {
        let guard = self.lane(slice).guard.clone();
        flush_slice(slice, &self.backend, &self.state, &guard).await;
    }

    /// Abort pending quiet windows, e.g. when the wizard unmounts. Writes
    /// already in progress run to completion.
    pub fn cancel_pending(&self) {
        self.pack.debouncer.cancel();
        self.booking.debouncer.cancel();
    }

    /// Wait for all pending and in-progress writes. Test and shutdown
    /// helper.
    pub async fn settle(&self) {
        self.pack.debouncer.settle().await;
        self.booking.debouncer.settle().await;
    }
}

/// One mirror write. The payload is serialized after the write guard is
/// acquired, so a flush queued behind an in-flight write carries whatever
/// the state is once its turn comes.
async fn flush_slice(
    slice: Slice,
    backend: &SessionBackend,
    state: &RwLock<SessionState>,
    guard: &Mutex<()>,
) {
    let _guard = guard.lock().await;

    let payload = {
        let state = state.read().await;
        match slice {
            Slice::Pack => serde_json::to_value(&state.pack_items),
            Slice::Booking => serde_json::to_value(&state.booking),
        }
    };
    let payload = match payload {
        Ok(payload) => payload,
        Err(err) => {
            warn!(slice = slice.label(), error = %err, "Could not serialize session slice");
            return;
        }
    };

    let repo = backend.select();
    let result = match slice {
        Slice::Pack => repo.save_pack_items(&payload).await,
        Slice::Booking => repo.save_booking_details(&payload).await,
    };

    match result {
        Ok(()) => {
            debug!(
                slice = slice.label(),
                backend = repo.name(),
                "Session slice mirrored"
            );
        }
        Err(err) => {
            if err.is_resource_exhausted() {
                warn!(
                    slice = slice.label(),
                    backend = repo.name(),
                    "Storage quota exhausted; falling back to device storage"
                );
            } else {
                warn!(
                    slice = slice.label(),
                    backend = repo.name(),
                    error = %err,
                    "Session write failed; falling back to device storage"
                );
            }
            if repo.name() != "local" {
                fall_back(slice, backend, &payload).await;
            }
        }
    }
}

async fn fall_back(slice: Slice, backend: &SessionBackend, payload: &Value) {
    let local = backend.local();
    let result = match slice {
        Slice::Pack => local.save_pack_items(payload).await,
        Slice::Booking => local.save_booking_details(payload).await,
    };
    if let Err(err) = result {
        warn!(slice = slice.label(), error = %err, "Device-storage fallback write failed");
    }
}
