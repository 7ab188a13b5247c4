use std::collections::HashMap;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use crate::asset::VERSION_METADATA_KEY;
use crate::error::StoreError;

/// Boxed stream of object keys, as produced by [`ObjectStore::list`].
pub type KeyStream = Pin<Box<dyn Stream<Item = Result<String, StoreError>> + Send>>;

/// Upload parameters for [`ObjectStore::put`].
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// An object read back from the store. The store is the source of truth for
/// size, metadata and revision; callers never trust local state for these.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub size: u64,
    pub metadata: HashMap<String, String>,

    /// Store-assigned revision identifier for this write (e.g. an S3
    /// version id). Feeds [`ObjectStore::url`].
    pub revision: String,
}

impl StoredObject {
    /// The published asset version carried in object metadata, if parsable.
    pub fn version(&self) -> Option<u64> {
        self.metadata.get(VERSION_METADATA_KEY)?.parse().ok()
    }
}

pub trait ObjectStore: Send + Sync + 'static + Clone {
    fn put(
        &self,
        key: &str,
        data: Bytes,
        opts: PutOptions,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<StoredObject, StoreError>> + Send;

    /// Enumerate keys under `prefix`. An empty prefix lists every object.
    fn list(&self, prefix: &str) -> impl Future<Output = Result<KeyStream, StoreError>> + Send;

    /// Canonical public URL of an object pinned to a store revision.
    fn url(&self, key: &str, revision: &str) -> String;
}
