use crate::mirror::{SessionMirror, Slice};
use crate::models::{BookingDetails, PackItem};
use crate::patch::{
    BookingDetailsPatch, ReservationHolderPatch, SpecialRequestsPatch, TravelerPatch,
};
use crate::SessionError;
use fairway_catalog::{CatalogKind, CatalogSummary};
use fairway_core::repository::{SessionDocument, SessionRepository};
use fairway_store::SessionBackend;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// The visitor's in-progress session: selected pack items plus the
/// booking details accumulated across the wizard pages. The in-memory
/// copy is authoritative for the session's lifetime; the mirror trails it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub pack_items: Vec<PackItem>,
    pub booking: BookingDetails,
}

/// Shared session store the wizard pages read from and write to.
///
/// Every mutation reports whether state actually changed and schedules a
/// debounced mirror write only when it did. Collaborators come in through
/// the constructor; tests build isolated instances over in-memory
/// backends.
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    mirror: Arc<SessionMirror>,
    backend: Arc<SessionBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<SessionBackend>, debounce: Duration) -> Self {
        let state = Arc::new(RwLock::new(SessionState::default()));
        let mirror = Arc::new(SessionMirror::new(backend.clone(), state.clone(), debounce));
        Self {
            state,
            mirror,
            backend,
        }
    }

    pub fn mirror(&self) -> &Arc<SessionMirror> {
        &self.mirror
    }

    pub fn backend(&self) -> &Arc<SessionBackend> {
        &self.backend
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn pack_len(&self) -> usize {
        self.state.read().await.pack_items.len()
    }

    pub async fn is_pack_empty(&self) -> bool {
        self.pack_len().await == 0
    }

    // ----- pack store -----

    /// Add a catalog selection to the pack. Adding an item that is
    /// already present (same id and kind) is a no-op.
    pub async fn add_to_pack(&self, summary: CatalogSummary) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            if state
                .pack_items
                .iter()
                .any(|item| item.matches(&summary.id, summary.kind))
            {
                false
            } else {
                debug!(id = %summary.id, kind = ?summary.kind, "Pack item added");
                state.pack_items.push(PackItem::from_summary(summary));
                true
            }
        };
        if changed {
            self.mirror.schedule(Slice::Pack);
        }
        changed
    }

    pub async fn remove_from_pack(&self, id: &str, kind: CatalogKind) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            let before = state.pack_items.len();
            state.pack_items.retain(|item| !item.matches(id, kind));
            state.pack_items.len() != before
        };
        if changed {
            debug!(id, ?kind, "Pack item removed");
            self.mirror.schedule(Slice::Pack);
        }
        changed
    }

    /// Empty the pack. When a signed-in session exists the remote record
    /// is also cleared immediately, best effort: a failure is logged and
    /// never surfaced.
    pub async fn clear_pack(&self) {
        let changed = {
            let mut state = self.state.write().await;
            let had_items = !state.pack_items.is_empty();
            state.pack_items.clear();
            had_items
        };
        if changed {
            self.mirror.schedule(Slice::Pack);
        }

        if self.backend.is_signed_in() {
            let repo = self.backend.select();
            if let Err(err) = repo.clear_pack_items().await {
                warn!(error = %err, "Best-effort remote pack clear failed");
            }
        }
    }

    // ----- booking details -----

    /// Merge trip-wide fields. An unchanged merge returns false and
    /// schedules no write.
    pub async fn update_booking_details(&self, patch: BookingDetailsPatch) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            patch.apply(&mut state.booking)
        };
        if changed {
            self.mirror.schedule(Slice::Booking);
        }
        changed
    }

    /// Merge into the reservation holder. Travelers linked to the holder
    /// are re-mirrored so their identity fields never drift.
    pub async fn update_reservation_holder(&self, patch: ReservationHolderPatch) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            let changed = patch.apply(&mut state.booking.reservation_holder);
            if changed {
                let holder = state.booking.reservation_holder.clone();
                for traveler in state
                    .booking
                    .travelers
                    .iter_mut()
                    .filter(|t| t.same_as_reservation_holder)
                {
                    traveler.mirror_from(&holder);
                }
            }
            changed
        };
        if changed {
            self.mirror.schedule(Slice::Booking);
        }
        changed
    }

    pub async fn update_special_requests(&self, patch: SpecialRequestsPatch) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            patch.apply(&mut state.booking.special_requests)
        };
        if changed {
            self.mirror.schedule(Slice::Booking);
        }
        changed
    }

    /// Merge into one roster entry, enforcing the traveler invariants:
    /// identity fields are owned by the holder link while it is on, the
    /// link itself only exists on traveler zero, and equipment rental
    /// switches off with `playing_golf`.
    pub async fn update_traveler(
        &self,
        index: usize,
        patch: TravelerPatch,
    ) -> Result<bool, SessionError> {
        let changed = {
            let mut state = self.state.write().await;
            let holder = state.booking.reservation_holder.clone();
            let travelers = &mut state.booking.travelers;
            if index >= travelers.len() {
                return Err(SessionError::TravelerIndex(index));
            }
            let mut changed = false;

            if let Some(linked) = patch.same_as_reservation_holder {
                if index == 0 {
                    let traveler = &mut travelers[0];
                    if traveler.same_as_reservation_holder != linked {
                        traveler.same_as_reservation_holder = linked;
                        if linked {
                            traveler.mirror_from(&holder);
                        } else {
                            traveler.clear_identity();
                        }
                        changed = true;
                    }
                } else {
                    debug!(index, "Holder link ignored for non-primary traveler");
                }
            }

            let traveler = &mut travelers[index];
            if !traveler.same_as_reservation_holder {
                if let Some(first_name) = &patch.first_name {
                    if traveler.first_name != *first_name {
                        traveler.first_name = first_name.clone();
                        changed = true;
                    }
                }
                if let Some(last_name) = &patch.last_name {
                    if traveler.last_name != *last_name {
                        traveler.last_name = last_name.clone();
                        changed = true;
                    }
                }
                if let Some(age) = patch.age {
                    if traveler.age != Some(age) {
                        traveler.age = Some(age);
                        changed = true;
                    }
                }
                if let Some(gender) = patch.gender {
                    if traveler.gender != Some(gender) {
                        traveler.gender = Some(gender);
                        changed = true;
                    }
                }
            }

            if let Some(email) = &patch.email {
                if traveler.email.as_deref() != Some(email.as_str()) {
                    traveler.email = Some(email.clone());
                    changed = true;
                }
            }
            if let Some(playing) = patch.playing_golf {
                if traveler.playing_golf != playing
                    || (!playing && traveler.requires_equipment)
                {
                    traveler.set_playing_golf(playing);
                    changed = true;
                }
            }
            if let Some(requires) = patch.requires_equipment {
                let effective = requires && traveler.playing_golf;
                if traveler.requires_equipment != effective {
                    traveler.set_requires_equipment(requires);
                    changed = true;
                }
            }

            changed
        };
        if changed {
            self.mirror.schedule(Slice::Booking);
        }
        Ok(changed)
    }

    pub async fn add_traveler(&self) {
        {
            let mut state = self.state.write().await;
            state.booking.travelers.push(Default::default());
            state.booking.number_of_people = state.booking.travelers.len() as u32;
        }
        self.mirror.schedule(Slice::Booking);
    }

    /// Remove a roster entry and recompute the party size from the new
    /// length. The roster never drops below one traveler.
    pub async fn remove_traveler(&self, index: usize) -> Result<(), SessionError> {
        {
            let mut state = self.state.write().await;
            let travelers = &mut state.booking.travelers;
            if travelers.len() <= 1 {
                return Err(SessionError::RosterUnderflow);
            }
            if index >= travelers.len() {
                return Err(SessionError::TravelerIndex(index));
            }
            travelers.remove(index);
            state.booking.number_of_people = state.booking.travelers.len() as u32;
        }
        self.mirror.schedule(Slice::Booking);
        Ok(())
    }

    /// Bring the roster back in line with `number_of_people`. Run by the
    /// travel-dates page after a successful submit rather than inside the
    /// merge itself.
    pub async fn reconcile_travelers(&self) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            state.booking.reconcile_travelers()
        };
        if changed {
            self.mirror.schedule(Slice::Booking);
        }
        changed
    }

    // ----- bootstrap -----

    /// Hydrate from durable storage.
    ///
    /// Signed in: the remote record is the only source; whatever an
    /// anonymous visit left in device storage is deliberately discarded,
    /// never merged into the account. Anonymous: device storage is the
    /// source, tolerating missing or unparseable slices. Failures leave
    /// the defaults in place and are only logged.
    pub async fn bootstrap(&self) {
        let signed_in = self.backend.is_signed_in();
        let repo = self.backend.select();
        let document = match repo.load().await {
            Ok(document) => document,
            Err(err) => {
                warn!(backend = repo.name(), error = %err, "Session bootstrap failed; starting empty");
                SessionDocument::default()
            }
        };

        {
            let mut state = self.state.write().await;
            state.pack_items =
                hydrate_slice("packItems", document.pack_items).unwrap_or_default();
            state.booking =
                hydrate_slice("bookingDetails", document.booking_details).unwrap_or_default();
            // Stored records may predate the roster invariant.
            state.booking.reconcile_travelers();
        }

        if signed_in {
            if let Err(err) = self.backend.local().clear_all().await {
                warn!(error = %err, "Could not clear anonymous device copy");
            }
        }
    }
}

fn hydrate_slice<T: DeserializeOwned>(label: &str, value: Option<Value>) -> Option<T> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(slice = label, error = %err, "Discarding unparseable session slice");
            None
        }
    }
}
