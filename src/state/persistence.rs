use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while talking to durable storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to serialize state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// String-valued key-value store the stroke history is written through to.
pub trait KeyValueStorage {
    /// Read a value, `Ok(None)` if the key was never written
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
}

/// In-process storage, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Storage shared between owners, e.g. a store and a test inspecting what it wrote.
impl<T: KeyValueStorage> KeyValueStorage for std::sync::Arc<parking_lot::Mutex<T>> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.lock().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.lock().set(key, value)
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::PathBuf;

    use super::{KeyValueStorage, StorageResult};

    /// One `<key>.json` file per key inside a directory.
    #[derive(Debug, Clone)]
    pub struct FileStorage {
        dir: PathBuf,
    }

    impl FileStorage {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        fn path_for(&self, key: &str) -> PathBuf {
            let file_name: String = key
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '_' })
                .collect();
            self.dir.join(format!("{}.json", file_name))
        }
    }

    impl KeyValueStorage for FileStorage {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            match fs::read_to_string(self.path_for(key)) {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err.into()),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
            // Create state directory if it doesn't exist
            fs::create_dir_all(&self.dir)?;
            fs::write(self.path_for(key), value)?;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{KeyValueStorage, StorageError, StorageResult};

    /// The browser's `window.localStorage`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorage;

    impl LocalStorage {
        fn storage() -> StorageResult<web_sys::Storage> {
            web_sys::window()
                .ok_or_else(|| StorageError::Unavailable("no window".to_owned()))?
                .local_storage()
                .map_err(|err| StorageError::Unavailable(format!("{:?}", err)))?
                .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_owned()))
        }
    }

    impl KeyValueStorage for LocalStorage {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            Self::storage()?
                .get_item(key)
                .map_err(|err| StorageError::Unavailable(format!("{:?}", err)))
        }

        fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
            Self::storage()?
                .set_item(key, value)
                .map_err(|err| StorageError::Unavailable(format!("{:?}", err)))
        }
    }
}
