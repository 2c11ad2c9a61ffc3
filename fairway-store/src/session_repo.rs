use async_trait::async_trait;
use fairway_core::identity::AuthSession;
use fairway_core::repository::{DocumentStore, SessionDocument, SessionRepository, StoreError};
use fairway_shared::keys::{
    BOOKING_DETAILS_FIELD, PACK_ITEMS_FIELD, USERS_COLLECTION, USER_PACK_KEY,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Session mirror kept in the signed-in user's document record.
pub struct RemoteSessionRepository {
    documents: Arc<dyn DocumentStore>,
    uid: String,
}

impl RemoteSessionRepository {
    pub fn new(documents: Arc<dyn DocumentStore>, uid: impl Into<String>) -> Self {
        Self {
            documents,
            uid: uid.into(),
        }
    }

    /// Read-check-then-write: patch just the given slice when the record
    /// exists, otherwise create the full record with the other slice
    /// defaulted so a pack write never clobbers booking details (and the
    /// reverse).
    async fn save_slice(&self, field: &str, value: &Value) -> Result<(), StoreError> {
        let existing = self.documents.get(USERS_COLLECTION, &self.uid).await?;
        match existing {
            Some(_) => {
                self.documents
                    .update(USERS_COLLECTION, &self.uid, json!({ field: value }))
                    .await
            }
            None => {
                let mut doc = json!({
                    PACK_ITEMS_FIELD: [],
                    BOOKING_DETAILS_FIELD: {},
                });
                doc[field] = value.clone();
                self.documents.set(USERS_COLLECTION, &self.uid, doc).await
            }
        }
    }
}

#[async_trait]
impl SessionRepository for RemoteSessionRepository {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn load(&self) -> Result<SessionDocument, StoreError> {
        let doc = self.documents.get(USERS_COLLECTION, &self.uid).await?;
        match doc {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Ok(SessionDocument::default()),
        }
    }

    async fn save_pack_items(&self, items: &Value) -> Result<(), StoreError> {
        self.save_slice(PACK_ITEMS_FIELD, items).await
    }

    async fn save_booking_details(&self, details: &Value) -> Result<(), StoreError> {
        self.save_slice(BOOKING_DETAILS_FIELD, details).await
    }

    async fn clear_pack_items(&self) -> Result<(), StoreError> {
        if self
            .documents
            .get(USERS_COLLECTION, &self.uid)
            .await?
            .is_some()
        {
            self.documents
                .update(USERS_COLLECTION, &self.uid, json!({ PACK_ITEMS_FIELD: [] }))
                .await?;
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        // The user record carries profile fields too, so the session is
        // blanked rather than the record deleted.
        if self
            .documents
            .get(USERS_COLLECTION, &self.uid)
            .await?
            .is_some()
        {
            self.documents
                .update(
                    USERS_COLLECTION,
                    &self.uid,
                    json!({ PACK_ITEMS_FIELD: [], BOOKING_DETAILS_FIELD: {} }),
                )
                .await?;
        }
        Ok(())
    }
}

/// Session mirror for anonymous visitors, kept in device storage under the
/// fixed `userPack` / `bookingDetails` keys.
pub struct LocalSessionRepository {
    storage: Arc<dyn fairway_core::repository::DeviceStorage>,
}

impl LocalSessionRepository {
    pub fn new(storage: Arc<dyn fairway_core::repository::DeviceStorage>) -> Self {
        Self { storage }
    }

    async fn load_slice(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw = self.storage.get_item(key).await?;
        match raw {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    // A corrupt device copy must not break bootstrap; the
                    // slice hydrates to its default instead.
                    warn!(key, error = %err, "Discarding unparseable device-storage slice");
                    Ok(None)
                }
            },
        }
    }
}

#[async_trait]
impl SessionRepository for LocalSessionRepository {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load(&self) -> Result<SessionDocument, StoreError> {
        Ok(SessionDocument {
            pack_items: self.load_slice(USER_PACK_KEY).await?,
            booking_details: self.load_slice(BOOKING_DETAILS_FIELD).await?,
        })
    }

    async fn save_pack_items(&self, items: &Value) -> Result<(), StoreError> {
        self.storage
            .set_item(USER_PACK_KEY, &items.to_string())
            .await
    }

    async fn save_booking_details(&self, details: &Value) -> Result<(), StoreError> {
        self.storage
            .set_item(BOOKING_DETAILS_FIELD, &details.to_string())
            .await
    }

    async fn clear_pack_items(&self) -> Result<(), StoreError> {
        self.storage.remove_item(USER_PACK_KEY).await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.storage.remove_item(USER_PACK_KEY).await?;
        self.storage.remove_item(BOOKING_DETAILS_FIELD).await
    }
}

/// Per-write backend selection: signed-in sessions mirror to the remote
/// record, anonymous sessions to device storage. Constructed once and
/// consulted on every write so a sign-in mid-session takes effect
/// immediately.
pub struct SessionBackend {
    documents: Arc<dyn DocumentStore>,
    local: Arc<LocalSessionRepository>,
    auth: Arc<dyn AuthSession>,
}

impl SessionBackend {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        storage: Arc<dyn fairway_core::repository::DeviceStorage>,
        auth: Arc<dyn AuthSession>,
    ) -> Self {
        Self {
            documents,
            local: Arc::new(LocalSessionRepository::new(storage)),
            auth,
        }
    }

    pub fn select(&self) -> Arc<dyn SessionRepository> {
        match self.auth.current() {
            Some(user) => Arc::new(RemoteSessionRepository::new(
                self.documents.clone(),
                user.uid,
            )),
            None => self.local.clone(),
        }
    }

    /// The device-storage repository, used as the fallback write target
    /// when the selected backend fails.
    pub fn local(&self) -> Arc<LocalSessionRepository> {
        self.local.clone()
    }

    pub fn auth(&self) -> &Arc<dyn AuthSession> {
        &self.auth
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.current().is_some()
    }
}
