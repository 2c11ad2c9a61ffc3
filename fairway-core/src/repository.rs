use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors from the persistence backends.
///
/// `ResourceExhausted` is split out because the session mirror dispatches
/// on it: quota conditions are an expected degradation, everything else is
/// unexpected but handled the same way (fall back to device storage).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Storage quota exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, StoreError::ResourceExhausted(_))
    }
}

/// Equality filter for `DocumentStore::query`.
#[derive(Debug, Clone)]
pub enum Filter {
    Eq(String, Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// The managed document database, as seen by this codebase.
///
/// `update` is a shallow field merge: fields present in `patch` replace the
/// stored fields, everything else is left alone. `add` generates the id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Insert with a generated id; returns the new id.
    async fn add(&self, collection: &str, doc: Value) -> Result<String, StoreError>;
}

/// Key-value storage on the visitor's device. Values are serialized JSON.
#[async_trait]
pub trait DeviceStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// The two slices of a persisted session, still in wire form.
///
/// A slice is `None` when the backing record does not carry it; the session
/// layer hydrates missing slices to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionDocument {
    pub pack_items: Option<Value>,
    pub booking_details: Option<Value>,
}

/// Durable mirror of one visitor's in-progress session.
///
/// Two implementations exist: one over the remote document record (signed
/// in) and one over device storage (anonymous). The wizard depends only on
/// this trait; a selector picks the implementation per write.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Backend label for log lines.
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<SessionDocument, StoreError>;

    async fn save_pack_items(&self, items: &Value) -> Result<(), StoreError>;

    async fn save_booking_details(&self, details: &Value) -> Result<(), StoreError>;

    async fn clear_pack_items(&self) -> Result<(), StoreError>;

    /// Remove the whole mirrored session.
    async fn clear_all(&self) -> Result<(), StoreError>;
}
