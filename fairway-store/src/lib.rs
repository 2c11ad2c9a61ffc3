pub mod app_config;
pub mod database;
pub mod device;
pub mod memory;
pub mod session_repo;

pub use database::{DbClient, PgDocumentStore};
pub use device::FileDeviceStorage;
pub use memory::{FailureMode, MemoryDeviceStorage, MemoryDocumentStore};
pub use session_repo::{LocalSessionRepository, RemoteSessionRepository, SessionBackend};
