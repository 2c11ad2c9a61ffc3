use async_trait::async_trait;
use fairway_core::repository::{DeviceStorage, StoreError};
use std::io;
use std::path::{Path, PathBuf};

// ENOSPC: the device-storage analogue of a quota error.
const ENOSPC: i32 = 28;

/// `DeviceStorage` backed by one JSON file per key in an app data
/// directory. This is what anonymous sessions persist to.
pub struct FileDeviceStorage {
    dir: PathBuf,
}

impl FileDeviceStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(map_io_err)?;
        Ok(Self { dir })
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn map_io_err(err: io::Error) -> StoreError {
    if err.raw_os_error() == Some(ENOSPC) {
        StoreError::ResourceExhausted(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl DeviceStorage for FileDeviceStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.item_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(map_io_err(err)),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.item_path(key), value).map_err(map_io_err)
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(map_io_err(err)),
        }
    }
}
