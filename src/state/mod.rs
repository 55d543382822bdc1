mod persistence;
mod settings;
mod store;

pub use persistence::{KeyValueStorage, MemoryStorage, StorageError, StorageResult};
#[cfg(not(target_arch = "wasm32"))]
pub use persistence::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use persistence::LocalStorage;
pub use settings::BoardSettings;
pub use store::{BOARD_KEY, DELETED_KEY, STORED_KEY, StrokeStore, UNDO_CAP};
