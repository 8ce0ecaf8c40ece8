use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use crate::domain::image_model::ImageBlob;

pub const OBJECT_URL_PREFIX: &str = "blob:sketchdesk/";

/// Session-local, revocable references to image bytes.
///
/// Nothing here is persisted. A reference stored in history outlives the
/// process that created it and resolves to `None` after a restart.
#[derive(Default)]
pub struct ObjectUrlRegistry {
    blobs: Mutex<HashMap<String, ImageBlob>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, blob: ImageBlob) -> String {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, bytes = blob.bytes.len(), "Registered image reference");
        self.blobs_mut().insert(id.clone(), blob);
        format!("{}{}", OBJECT_URL_PREFIX, id)
    }

    pub fn resolve(&self, url: &str) -> Option<ImageBlob> {
        let id = Self::id_of(url)?;
        self.blobs_mut().get(id).cloned()
    }

    pub fn revoke(&self, url: &str) -> bool {
        match Self::id_of(url) {
            Some(id) => self.blobs_mut().remove(id).is_some(),
            None => false,
        }
    }

    pub fn revoke_all(&self) -> usize {
        let mut blobs = self.blobs_mut();
        let count = blobs.len();
        blobs.clear();
        count
    }

    /// The `<uuid>` part of a reference, or `None` if it is not one of ours.
    pub fn id_of(url: &str) -> Option<&str> {
        url.strip_prefix(OBJECT_URL_PREFIX).filter(|id| !id.is_empty())
    }

    pub fn url_for(id: &str) -> String {
        format!("{}{}", OBJECT_URL_PREFIX, id)
    }

    fn blobs_mut(&self) -> std::sync::MutexGuard<'_, HashMap<String, ImageBlob>> {
        // The map holds plain data, so a poisoned lock is still usable.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_resolve() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create(ImageBlob::png(vec![1, 2, 3]));
        assert!(url.starts_with(OBJECT_URL_PREFIX));
        assert_eq!(registry.resolve(&url).unwrap().bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_revoked_reference_no_longer_resolves() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create(ImageBlob::png(vec![9]));
        assert!(registry.revoke(&url));
        assert!(registry.resolve(&url).is_none());
        assert!(!registry.revoke(&url));
    }

    #[test]
    fn test_reference_from_another_session_is_stale() {
        let first = ObjectUrlRegistry::new();
        let url = first.create(ImageBlob::png(vec![7]));
        let after_restart = ObjectUrlRegistry::new();
        assert!(after_restart.resolve(&url).is_none());
    }

    #[test]
    fn test_foreign_urls_are_ignored() {
        let registry = ObjectUrlRegistry::new();
        assert!(registry.resolve("https://example.com/a.png").is_none());
        assert!(ObjectUrlRegistry::id_of(OBJECT_URL_PREFIX).is_none());
    }

    #[test]
    fn test_revoke_all() {
        let registry = ObjectUrlRegistry::new();
        registry.create(ImageBlob::png(vec![1]));
        registry.create(ImageBlob::png(vec![2]));
        assert_eq!(registry.revoke_all(), 2);
        assert_eq!(registry.revoke_all(), 0);
    }
}
