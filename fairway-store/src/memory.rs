use async_trait::async_trait;
use fairway_core::repository::{
    DeviceStorage, DocumentStore, Filter, OrderBy, SortDirection, StoreError,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Failure a test can inject into the in-memory backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Quota,
    Backend,
}

impl FailureMode {
    fn to_error(self) -> StoreError {
        match self {
            FailureMode::Quota => StoreError::ResourceExhausted("simulated quota".to_string()),
            FailureMode::Backend => StoreError::Backend("simulated backend failure".to_string()),
        }
    }
}

/// In-memory `DocumentStore` for tests: counts writes and can be told to
/// fail every write until the failure is cleared.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<HashMap<(String, String), Value>>,
    failure: Mutex<Option<FailureMode>>,
    read_failure: Mutex<Option<FailureMode>>,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write until cleared.
    pub fn set_failure(&self, mode: Option<FailureMode>) {
        *self.failure.lock().expect("failure lock") = mode;
    }

    /// Fail every read until cleared.
    pub fn set_read_failure(&self, mode: Option<FailureMode>) {
        *self.read_failure.lock().expect("failure lock") = mode;
    }

    /// Number of successful writes (set/update/add/delete) so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Direct read for assertions, bypassing the trait.
    pub fn doc(&self, collection: &str, id: &str) -> Option<Value> {
        self.docs
            .lock()
            .expect("docs lock")
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.docs
            .lock()
            .expect("docs lock")
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match *self.failure.lock().expect("failure lock") {
            Some(mode) => Err(mode.to_error()),
            None => Ok(()),
        }
    }

    fn check_read_failure(&self) -> Result<(), StoreError> {
        match *self.read_failure.lock().expect("failure lock") {
            Some(mode) => Err(mode.to_error()),
            None => Ok(()),
        }
    }
}

fn sort_key(doc: &Value, field: &str) -> String {
    match doc.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.check_read_failure()?;
        Ok(self.doc(collection, id))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Value>, StoreError> {
        self.check_read_failure()?;
        let docs = self.docs.lock().expect("docs lock");
        let mut matches: Vec<Value> = docs
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, doc)| doc)
            .filter(|doc| {
                filters
                    .iter()
                    .all(|Filter::Eq(field, value)| doc.get(field) == Some(value))
            })
            .cloned()
            .collect();

        if let Some(order_by) = order {
            matches.sort_by_key(|doc| sort_key(doc, &order_by.field));
            if order_by.direction == SortDirection::Descending {
                matches.reverse();
            }
        }
        Ok(matches)
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        self.check_failure()?;
        self.docs
            .lock()
            .expect("docs lock")
            .insert((collection.to_string(), id.to_string()), doc);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.check_failure()?;
        let mut docs = self.docs.lock().expect("docs lock");
        let key = (collection.to_string(), id.to_string());
        let doc = docs.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        // Shallow field merge, matching the production store's semantics.
        if let (Value::Object(target), Value::Object(fields)) = (doc, patch) {
            for (field, value) in fields {
                target.insert(field, value);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_failure()?;
        self.docs
            .lock()
            .expect("docs lock")
            .remove(&(collection.to_string(), id.to_string()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add(&self, collection: &str, doc: Value) -> Result<String, StoreError> {
        self.check_failure()?;
        let id = Uuid::new_v4().to_string();
        self.docs
            .lock()
            .expect("docs lock")
            .insert((collection.to_string(), id.clone()), doc);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}

/// In-memory `DeviceStorage` for tests.
#[derive(Default)]
pub struct MemoryDeviceStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryDeviceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(&self, key: &str) -> Option<String> {
        self.items.lock().expect("items lock").get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("items lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DeviceStorage for MemoryDeviceStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.item(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .lock()
            .expect("items lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.lock().expect("items lock").remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn update_is_a_shallow_merge() {
        let store = MemoryDocumentStore::new();
        store
            .set("users", "u1", json!({"packItems": [1], "bookingDetails": {"a": 1}}))
            .await
            .unwrap();
        store
            .update("users", "u1", json!({"packItems": [1, 2]}))
            .await
            .unwrap();

        let doc = store.doc("users", "u1").unwrap();
        assert_eq!(doc["packItems"], json!([1, 2]));
        assert_eq!(doc["bookingDetails"], json!({"a": 1}));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store.update("users", "nope", json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn injected_quota_failure_hits_writes_only() {
        let store = MemoryDocumentStore::new();
        store.set("users", "u1", json!({})).await.unwrap();
        store.set_failure(Some(FailureMode::Quota));

        assert!(store.get("users", "u1").await.is_ok());
        let err = store.set("users", "u1", json!({})).await.unwrap_err();
        assert!(err.is_resource_exhausted());

        store.set_failure(None);
        assert!(store.set("users", "u1", json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn query_filters_and_orders() {
        let store = MemoryDocumentStore::new();
        store
            .add("inquiries", json!({"userEmail": "a@b.com", "createdAt": "2030-01-01"}))
            .await
            .unwrap();
        store
            .add("inquiries", json!({"userEmail": "a@b.com", "createdAt": "2030-02-01"}))
            .await
            .unwrap();
        store
            .add("inquiries", json!({"userEmail": "z@b.com", "createdAt": "2030-03-01"}))
            .await
            .unwrap();

        let results = store
            .query(
                "inquiries",
                &[Filter::Eq("userEmail".to_string(), json!("a@b.com"))],
                Some(OrderBy::desc("createdAt")),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["createdAt"], json!("2030-02-01"));
    }
}
