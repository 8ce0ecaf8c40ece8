use std::sync::Arc;

use tracing::warn;

use crate::domain::error::Result;
use crate::domain::sketch::SketchResult;
use crate::infrastructure::kv_store::{KeyValueStore, HISTORY_KEY};

pub const HISTORY_CAPACITY: usize = 10;

/// Newest-first list of past results, at most [`HISTORY_CAPACITY`] long.
///
/// `append` is a plain read-modify-write over one key. Two writers that read
/// the same snapshot will each write their own copy back and the later write
/// wins; the server runs a single worker so in-process callers never overlap
/// between the read and the write.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the results pushed out past the capacity.
    pub fn append(&self, result: SketchResult) -> Result<Vec<SketchResult>> {
        let mut sketches = self.load_all();
        sketches.insert(0, result);
        let evicted = sketches.split_off(sketches.len().min(HISTORY_CAPACITY));
        let serialized = serde_json::to_string(&sketches)?;
        self.store.set(HISTORY_KEY, &serialized)?;
        Ok(evicted)
    }

    /// Never fails: unreadable or malformed data reads as an empty history.
    pub fn load_all(&self) -> Vec<SketchResult> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "Failed to read sketch history");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(sketches) => sketches,
            Err(err) => {
                warn!(error = %err, "Ignoring malformed sketch history");
                Vec::new()
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<SketchResult> {
        self.load_all().into_iter().find(|s| s.id == id)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(HISTORY_KEY)
    }
}
