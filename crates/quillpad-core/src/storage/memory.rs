//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::document::SketchDocument;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sketches: RwLock<HashMap<String, SketchDocument>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, document: &SketchDocument) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let document = document.clone();
        Box::pin(async move {
            self.sketches.write().map_err(lock_error)?.insert(id, document);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SketchDocument>> {
        let id = id.to_string();
        Box::pin(async move {
            let sketches = self.sketches.read().map_err(lock_error)?;
            sketches.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.sketches.write().map_err(lock_error)?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let sketches = self.sketches.read().map_err(lock_error)?;
            Ok(sketches.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let sketches = self.sketches.read().map_err(lock_error)?;
            Ok(sketches.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let doc = SketchDocument::new(100, 100);

        block_on(storage.save("sketch", &doc)).unwrap();
        let loaded = block_on(storage.load("sketch")).unwrap();

        assert_eq!(doc.id, loaded.id);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));

        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_delete_and_exists() {
        let storage = MemoryStorage::new();
        let doc = SketchDocument::new(100, 100);

        assert!(!block_on(storage.exists("sketch")).unwrap());
        block_on(storage.save("sketch", &doc)).unwrap();
        assert!(block_on(storage.exists("sketch")).unwrap());

        block_on(storage.delete("sketch")).unwrap();
        assert!(!block_on(storage.exists("sketch")).unwrap());
        assert!(block_on(storage.list()).unwrap().is_empty());
    }
}
