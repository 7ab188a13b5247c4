//! Remote state reader: one full enumeration of the store, partitioned into
//! published manifests and published assets.

use std::collections::HashMap;

use bytes::Bytes;
use futures::TryStreamExt;
use tracing::{info, warn};
use vela_core::prelude::*;

use crate::error::ReleaseError;

/// A published asset as the store currently holds it.
#[derive(Debug, Clone)]
pub struct RemoteAsset {
    pub content: Bytes,
    /// Parsed from object metadata; 0 when missing or garbled, so the next
    /// content change republishes at 1.
    pub version: u64,
    pub revision: String,
    /// A `.gz` variant object exists for this asset.
    pub compressed: bool,
}

/// A published manifest plus its patch state.
#[derive(Debug, Clone)]
pub struct RemoteManifest {
    pub key: String,
    pub manifest: Manifest,
    /// Set by the compatibility patcher (or by building a fresh manifest);
    /// only dirty manifests are republished.
    pub dirty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteState {
    /// Keyed by slash-name (`/a.json`).
    pub assets: HashMap<String, RemoteAsset>,
    pub manifests: Vec<RemoteManifest>,
}

/// Enumerate the store and load every manifest and asset under the
/// `config/` and `assets/` prefixes. Must complete before any upload
/// starts. An unparsable manifest is fatal for the whole run.
pub async fn load_remote_state<S: ObjectStore>(store: &S) -> Result<RemoteState, ReleaseError> {
    let keys: Vec<String> = store.list("").await?.try_collect().await?;

    let mut state = RemoteState::default();
    let mut compressed_keys = Vec::new();
    for key in keys {
        if key.starts_with(CONFIG_PREFIX) && key.len() > CONFIG_PREFIX.len() {
            let object = store.get(&key).await?;
            let manifest = serde_json::from_slice(&object.bytes)
                .map_err(|source| ReleaseError::ManifestParse {
                    key: key.clone(),
                    source,
                })?;
            info!("Parsed existing config `{key}`");
            state.manifests.push(RemoteManifest {
                key,
                manifest,
                dirty: false,
            });
        } else if key.starts_with(ASSET_PREFIX) && key.len() > ASSET_PREFIX.len() {
            if key.ends_with(COMPRESSED_SUFFIX) {
                compressed_keys.push(key);
                continue;
            }
            let object = store.get(&key).await?;
            let name = key[ASSET_PREFIX.len() - 1..].to_string();
            let version = object.version().unwrap_or_else(|| {
                warn!("asset `{key}` carries no parsable version metadata; treating as 0");
                0
            });
            info!("Parsed existing asset `{name}`");
            state.assets.insert(
                name,
                RemoteAsset {
                    content: object.bytes,
                    version,
                    revision: object.revision,
                    compressed: false,
                },
            );
        }
    }

    // `.gz` objects merge into their sibling's record rather than standing
    // alone.
    for key in compressed_keys {
        let name = key[ASSET_PREFIX.len() - 1..key.len() - COMPRESSED_SUFFIX.len()].to_string();
        match state.assets.get_mut(&name) {
            Some(asset) => asset.compressed = true,
            None => warn!("orphan compressed object `{key}` has no base asset; skipping"),
        }
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_memory::MemoryStore;

    async fn seed(store: &MemoryStore, key: &str, body: &[u8], version: Option<u64>) {
        let metadata = version
            .map(|v| HashMap::from([(VERSION_METADATA_KEY.to_string(), v.to_string())]))
            .unwrap_or_default();
        store
            .put(
                key,
                Bytes::copy_from_slice(body),
                PutOptions {
                    content_type: "application/octet-stream".to_string(),
                    content_encoding: None,
                    metadata,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn partitions_configs_and_assets() {
        let store = MemoryStore::new();
        seed(&store, "assets/a.json", b"{\"a\":1}", Some(2)).await;
        seed(&store, "assets/a.json.gz", b"gz", Some(2)).await;
        seed(&store, "assets/b.txt", b"hello", Some(1)).await;
        seed(
            &store,
            "config/1.0.0.json",
            br#"{"files":[],"lastUpdatedAt":1,"whatsNew":{"description_en":"","description_fr":""}}"#,
            None,
        )
        .await;

        let state = load_remote_state(&store).await.unwrap();
        assert_eq!(state.manifests.len(), 1);
        assert_eq!(state.manifests[0].key, "config/1.0.0.json");
        assert!(!state.manifests[0].dirty);
        assert_eq!(state.assets.len(), 2);

        let a = &state.assets["/a.json"];
        assert_eq!(a.version, 2);
        assert!(a.compressed);
        assert!(!state.assets["/b.txt"].compressed);
    }

    #[tokio::test]
    async fn unparsable_manifest_is_fatal() {
        let store = MemoryStore::new();
        seed(&store, "config/1.0.0.json", b"not json", None).await;
        match load_remote_state(&store).await {
            Err(ReleaseError::ManifestParse { key, .. }) => {
                assert_eq!(key, "config/1.0.0.json");
            }
            other => panic!("expected ManifestParse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_version_metadata_defaults_to_zero() {
        let store = MemoryStore::new();
        seed(&store, "assets/a.json", b"{}", None).await;
        let state = load_remote_state(&store).await.unwrap();
        assert_eq!(state.assets["/a.json"].version, 0);
    }

    #[tokio::test]
    async fn orphan_compressed_object_is_skipped() {
        let store = MemoryStore::new();
        seed(&store, "assets/gone.json.gz", b"gz", None).await;
        let state = load_remote_state(&store).await.unwrap();
        assert!(state.assets.is_empty());
    }
}
