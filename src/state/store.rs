use std::collections::VecDeque;

use serde_json::{Value, json};

use super::persistence::{KeyValueStorage, StorageResult};
use super::settings::BoardSettings;
use crate::stroke::{Stroke, strokes_from_json, strokes_to_json};

/// Maximum number of undone strokes kept for redo
pub const UNDO_CAP: usize = 100;

/// Key of the combined settings + history payload
pub const BOARD_KEY: &str = "handwriting.board";
/// Key of the committed stroke sequence
pub const STORED_KEY: &str = "handwriting.stored";
/// Key of the undone stroke sequence
pub const DELETED_KEY: &str = "handwriting.deleted";

/// Committed and undone strokes, written through to durable storage on every change.
///
/// The in-memory sequences are authoritative; storage failures are logged and ignored.
pub struct StrokeStore {
    committed: Vec<Stroke>,
    undone: VecDeque<Stroke>,
    settings: BoardSettings,
    storage: Option<Box<dyn KeyValueStorage>>,
}

impl std::fmt::Debug for StrokeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrokeStore")
            .field("committed", &self.committed.len())
            .field("undone", &self.undone.len())
            .field("settings", &self.settings)
            .field("has_storage", &self.storage.is_some())
            .finish()
    }
}

impl StrokeStore {
    /// Create an empty store backed by `storage`. Call [`Self::load`] to read existing data.
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            committed: Vec::new(),
            undone: VecDeque::new(),
            settings: BoardSettings::default(),
            storage: Some(storage),
        }
    }

    /// A store with no durable storage at all.
    pub fn detached() -> Self {
        Self {
            committed: Vec::new(),
            undone: VecDeque::new(),
            settings: BoardSettings::default(),
            storage: None,
        }
    }

    pub fn committed(&self) -> &[Stroke] {
        &self.committed
    }

    /// Undone strokes, oldest first
    pub fn undone(&self) -> impl ExactSizeIterator<Item = &Stroke> + DoubleEndedIterator {
        self.undone.iter()
    }

    pub fn undone_len(&self) -> usize {
        self.undone.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.committed.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Replace the settings and persist them.
    pub fn set_settings(&mut self, settings: BoardSettings) {
        self.settings = settings.sanitized();
        self.persist();
    }

    /// Append a finished stroke. Redo history is dropped.
    pub fn commit(&mut self, stroke: Stroke) -> bool {
        if stroke.is_empty() {
            return false;
        }
        log::debug!("Committing stroke with {} segments", stroke.len());
        self.committed.push(stroke);
        self.undone.clear();
        self.persist();
        true
    }

    /// Move the newest committed stroke to the undone list.
    pub fn undo(&mut self) -> bool {
        let Some(stroke) = self.committed.pop() else {
            return false;
        };
        self.undone.push_back(stroke);
        while self.undone.len() > UNDO_CAP {
            self.undone.pop_front();
        }
        self.persist();
        true
    }

    /// Move the newest undone stroke back to the committed list.
    pub fn redo(&mut self) -> bool {
        let Some(stroke) = self.undone.pop_back() else {
            return false;
        };
        self.committed.push(stroke);
        self.persist();
        true
    }

    /// Drop all strokes.
    pub fn reset(&mut self) {
        log::info!("Clearing {} committed strokes", self.committed.len());
        self.committed.clear();
        self.undone.clear();
        self.persist();
    }

    /// Replace in-memory state with whatever storage holds. Never fails:
    /// missing or malformed data leaves an empty history.
    pub fn load(&mut self) {
        self.committed.clear();
        self.undone.clear();

        let Some(storage) = &self.storage else {
            return;
        };

        match read_json(&**storage, BOARD_KEY) {
            Some(payload) if payload.is_object() => {
                self.settings = payload
                    .get("settings")
                    .map(BoardSettings::from_json)
                    .unwrap_or_default();
                self.committed = payload.get("stored").map(strokes_from_json).unwrap_or_default();
                self.undone = payload
                    .get("deleted")
                    .map(strokes_from_json)
                    .unwrap_or_default()
                    .into();
            }
            _ => {
                // Fall back to the per-sequence cache
                self.committed = read_json(&**storage, STORED_KEY)
                    .map(|v| strokes_from_json(&v))
                    .unwrap_or_default();
                self.undone = read_json(&**storage, DELETED_KEY)
                    .map(|v| strokes_from_json(&v))
                    .unwrap_or_default()
                    .into();
            }
        }

        while self.undone.len() > UNDO_CAP {
            self.undone.pop_front();
        }

        log::info!(
            "Loaded {} strokes ({} undone)",
            self.committed.len(),
            self.undone.len()
        );
    }

    /// Write everything to storage. Failures are logged, never returned.
    pub fn persist(&mut self) {
        if let Err(err) = self.try_persist() {
            log::warn!("Failed to persist strokes: {}", err);
        }
    }

    fn try_persist(&mut self) -> StorageResult<()> {
        let Some(storage) = self.storage.as_mut() else {
            return Ok(());
        };

        let stored = strokes_to_json(&self.committed);
        let deleted = strokes_to_json(&self.undone);
        let payload = json!({
            "settings": serde_json::to_value(&self.settings)?,
            "stored": stored,
            "deleted": deleted,
        });

        storage.set(BOARD_KEY, &payload.to_string())?;
        storage.set(STORED_KEY, &payload["stored"].to_string())?;
        storage.set(DELETED_KEY, &payload["deleted"].to_string())?;
        Ok(())
    }
}

fn read_json(storage: &dyn KeyValueStorage, key: &str) -> Option<Value> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            log::warn!("Failed to read {}: {}", key, err);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Ignoring malformed data under {}: {}", key, err);
            None
        }
    }
}
