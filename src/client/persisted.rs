use std::{marker::PhantomData, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::storage::SnapshotStore;

/// A JSON snapshot of a list of lines under a fixed key. Failures are logged
/// and swallowed: a store that cannot persist keeps working in memory.
pub(crate) struct Persisted<T> {
    key: &'static str,
    store: Arc<dyn SnapshotStore>,
    _lines: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Persisted<T> {
    pub(crate) fn new(key: &'static str, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            key,
            store,
            _lines: PhantomData,
        }
    }

    pub(crate) fn load(&self) -> Vec<T> {
        let bytes = match self.store.load(self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = self.key, error = %e, "snapshot load failed");
                return Vec::new();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(key = self.key, error = %e, "snapshot is not valid JSON; starting empty");
                Vec::new()
            }
        }
    }

    pub(crate) fn save(&self, lines: &[T]) {
        let bytes = match serde_json::to_vec(lines) {
            Ok(b) => b,
            Err(e) => {
                warn!(key = self.key, error = %e, "snapshot encode failed");
                return;
            }
        };
        match self.store.save(self.key, &bytes) {
            Ok(()) => debug!(key = self.key, lines = lines.len(), "snapshot saved"),
            Err(e) => warn!(key = self.key, error = %e, "snapshot save failed"),
        }
    }
}
