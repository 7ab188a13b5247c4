//! A local filesystem backend for vela.
//!
//! Implements the [`ObjectStore`] trait against a root directory. Object
//! metadata (content type, encoding, version metadata, revision) lives in a
//! `<key>.obj.json` sidecar next to each object, since bare files cannot
//! carry it. Writes are atomic: data goes to a temporary file first and is
//! renamed into place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use vela_core::prelude::*;
use walkdir::WalkDir;

const SIDECAR_SUFFIX: &str = ".obj.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    content_encoding: Option<String>,
    metadata: HashMap<String, String>,
    revision: String,
}

async fn atomic_write(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(StoreError::Io)?;
    }

    let tmp_path = path.with_extension("tmp");

    fs::write(&tmp_path, data).await.map_err(StoreError::Io)?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(StoreError::Io)?;

    Ok(())
}

fn content_revision(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}{SIDECAR_SUFFIX}"))
    }
}

impl ObjectStore for FileSystemStore {
    async fn put(&self, key: &str, data: Bytes, opts: PutOptions) -> Result<(), StoreError> {
        let sidecar = Sidecar {
            content_type: opts.content_type,
            content_encoding: opts.content_encoding,
            metadata: opts.metadata,
            revision: content_revision(&data),
        };
        atomic_write(&self.object_path(key), &data).await?;
        atomic_write(&self.sidecar_path(key), &serde_json::to_vec(&sidecar)?).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let path = self.object_path(key);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        // A missing sidecar degrades to empty metadata with a content-derived
        // revision, so a hand-populated root still reads back.
        let sidecar = match fs::read(&self.sidecar_path(key)).await {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Sidecar {
                revision: content_revision(&data),
                ..Default::default()
            },
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(StoredObject {
            size: data.len() as u64,
            bytes: Bytes::from(data),
            metadata: sidecar.metadata,
            revision: sidecar.revision,
        })
    }

    async fn list(&self, prefix: &str) -> Result<KeyStream, StoreError> {
        // A root that was never written to is an empty store, not an error.
        if !self.root.exists() {
            return Ok(Box::pin(stream::empty()));
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| StoreError::Generic(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| StoreError::Generic(e.to_string()))?;
            let key = relative.to_string_lossy().replace('\\', "/");
            if key.ends_with(SIDECAR_SUFFIX) || key.ends_with(".tmp") {
                continue;
            }
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(Box::pin(stream::iter(keys.into_iter().map(Ok))))
    }

    fn url(&self, key: &str, _revision: &str) -> String {
        format!("file://{}", self.object_path(key).display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::TempDir;

    fn put_opts(version: u64) -> PutOptions {
        PutOptions {
            content_type: "application/json; charset=utf-8".to_string(),
            content_encoding: None,
            metadata: HashMap::from([("version".to_string(), version.to_string())]),
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = FileSystemStore::new(tmp.path());
        store
            .put("assets/a.json", Bytes::from_static(b"{}"), put_opts(3))
            .await
            .unwrap();

        let object = store.get("assets/a.json").await.unwrap();
        assert_eq!(object.bytes.as_ref(), b"{}");
        assert_eq!(object.size, 2);
        assert_eq!(object.version(), Some(3));
        assert!(!object.revision.is_empty());
    }

    #[tokio::test]
    async fn identical_bytes_share_a_revision() {
        let tmp = TempDir::new().unwrap();
        let store = FileSystemStore::new(tmp.path());
        store
            .put("assets/a.json", Bytes::from_static(b"{}"), put_opts(1))
            .await
            .unwrap();
        let first = store.get("assets/a.json").await.unwrap().revision;
        store
            .put("assets/a.json", Bytes::from_static(b"{}"), put_opts(1))
            .await
            .unwrap();
        let second = store.get("assets/a.json").await.unwrap().revision;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = FileSystemStore::new(tmp.path());
        match store.get("assets/missing.json").await {
            Err(StoreError::NotFound(key)) => assert_eq!(key, "assets/missing.json"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_on_unwritten_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileSystemStore::new(tmp.path().join("fresh"));
        let keys: Vec<String> = store
            .list("")
            .await
            .unwrap()
            .map(|k| k.unwrap())
            .collect()
            .await;
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn list_skips_sidecars_and_respects_prefix() {
        let tmp = TempDir::new().unwrap();
        let store = FileSystemStore::new(tmp.path());
        store
            .put("assets/a.json", Bytes::from_static(b"{}"), put_opts(1))
            .await
            .unwrap();
        store
            .put("config/1.0.0.json", Bytes::from_static(b"{}"), put_opts(1))
            .await
            .unwrap();

        let keys: Vec<String> = store
            .list("assets/")
            .await
            .unwrap()
            .map(|k| k.unwrap())
            .collect()
            .await;
        assert_eq!(keys, ["assets/a.json"]);
    }
}
