use crate::store::SessionStore;
use fairway_core::identity::AuthSession;
use fairway_core::repository::DocumentStore;
use fairway_core::{CoreError, CoreResult};
use fairway_store::app_config::Config;
use fairway_store::{FileDeviceStorage, SessionBackend};
use std::sync::Arc;
use tracing::info;

/// Config-driven wiring for a session: device storage in the configured
/// data dir, backend selection over the given auth session, store
/// hydrated from whichever backend applies.
pub struct SessionRuntime {
    store: Arc<SessionStore>,
}

impl SessionRuntime {
    pub async fn initialize(
        config: &Config,
        documents: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthSession>,
    ) -> CoreResult<Self> {
        let data_dir = config.storage.resolve_data_dir();
        info!(dir = %data_dir.display(), "Opening device storage");
        let storage = FileDeviceStorage::new(data_dir)
            .map_err(|err| CoreError::ConfigError(err.to_string()))?;

        let backend = Arc::new(SessionBackend::new(documents, Arc::new(storage), auth));
        let store = Arc::new(SessionStore::new(backend, config.persistence.debounce()));
        store.bootstrap().await;

        Ok(Self { store })
    }

    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }
}
