use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::stream;
use vela_core::prelude::*;

#[derive(Debug, Clone)]
struct Entry {
    bytes: Bytes,
    content_type: String,
    content_encoding: Option<String>,
    metadata: HashMap<String, String>,
    revision: u64,
}

/// An [`ObjectStore`] held entirely in memory.
///
/// Every `put` on a key bumps its revision, mimicking a store that assigns
/// a fresh version id per write.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type the object at `key` was last uploaded with.
    pub fn content_type_of(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().ok()?;
        inner.get(key).map(|e| e.content_type.clone())
    }

    /// Content encoding the object at `key` was last uploaded with.
    pub fn content_encoding_of(&self, key: &str) -> Option<String> {
        let inner = self.inner.lock().ok()?;
        inner.get(key).and_then(|e| e.content_encoding.clone())
    }

    /// How many times `key` has been written.
    pub fn write_count(&self, key: &str) -> u64 {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.get(key).map(|e| e.revision))
            .unwrap_or(0)
    }
}

impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Generic("memory store lock poisoned".to_string()))?;
        let revision = inner.get(key).map(|e| e.revision + 1).unwrap_or(1);
        inner.insert(
            key.to_string(),
            Entry {
                bytes: data,
                content_type: opts.content_type,
                content_encoding: opts.content_encoding,
                metadata: opts.metadata,
                revision,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Generic("memory store lock poisoned".to_string()))?;
        let entry = inner
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        Ok(StoredObject {
            bytes: entry.bytes.clone(),
            size: entry.bytes.len() as u64,
            metadata: entry.metadata.clone(),
            revision: format!("r{}", entry.revision),
        })
    }

    async fn list(&self, prefix: &str) -> Result<KeyStream, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Generic("memory store lock poisoned".to_string()))?;
        let mut keys: Vec<String> = inner
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(Box::pin(stream::iter(keys.into_iter().map(Ok))))
    }

    fn url(&self, key: &str, revision: &str) -> String {
        format!("memory://{key}?rev={revision}")
    }
}
