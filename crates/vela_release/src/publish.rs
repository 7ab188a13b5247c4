//! Manifest publisher: writes dirty manifests back to the store.

use bytes::Bytes;
use tracing::info;
use vela_core::prelude::*;

use crate::error::ReleaseError;

/// Publish every dirty manifest. Returns the keys written.
pub async fn publish_manifests<S: ObjectStore>(
    store: &S,
    manifests: &[crate::remote::RemoteManifest],
) -> Result<Vec<String>, ReleaseError> {
    let mut published = Vec::new();
    for remote in manifests {
        if !remote.dirty {
            continue;
        }
        info!("Uploading config `{}`", remote.key);
        let body = remote
            .manifest
            .to_canonical_json()
            .map_err(StoreError::Serialization)?;
        store
            .put(
                &remote.key,
                Bytes::from(body),
                PutOptions {
                    content_type: "application/json; charset=utf-8".to_string(),
                    content_encoding: None,
                    metadata: Default::default(),
                },
            )
            .await?;
        published.push(remote.key.clone());
    }
    Ok(published)
}
