//! Diff & version engine: decides, per local asset, whether an upload is
//! needed and which version it publishes at. Pure planning; version
//! assignment completes before any upload begins.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use vela_core::prelude::*;

use crate::error::{ReleaseError, io_err};
use crate::remote::RemoteAsset;
use crate::scan::LocalAsset;

/// One asset the release run will process.
#[derive(Debug, Clone)]
pub struct PlannedAsset {
    /// Slash-name, e.g. `/a.json`.
    pub name: String,
    pub ty: AssetType,
    pub content: Bytes,
    pub zcontent: Option<Bytes>,
    /// The version this asset publishes at (unchanged assets keep their
    /// remote version).
    pub target_version: u64,
    pub upload: bool,
    /// Whether the store holds a compressed variant after this run.
    pub expect_compressed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReleasePlan {
    pub assets: Vec<PlannedAsset>,
}

impl ReleasePlan {
    pub fn upload_count(&self) -> usize {
        self.assets.iter().filter(|a| a.upload).count()
    }
}

/// Split the scanned set by the operator allow-list. A pure set-membership
/// predicate, applied once, upstream of the engine; names match with or
/// without the leading `/`.
pub fn apply_allow_list(
    assets: Vec<LocalAsset>,
    only: Option<&HashSet<String>>,
) -> (Vec<LocalAsset>, Vec<LocalAsset>) {
    let Some(only) = only else {
        return (assets, Vec::new());
    };
    assets.into_iter().partition(|asset| {
        only.contains(&asset.slash_name()) || only.contains(&asset.file_name)
    })
}

fn content_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compare every kept local asset against remote state and assign target
/// versions. Reads asset content from disk; a read failure here is fatal,
/// the asset is queued for comparison or upload.
pub async fn plan_release(
    locals: &[LocalAsset],
    remote: &HashMap<String, RemoteAsset>,
) -> Result<ReleasePlan, ReleaseError> {
    let mut plan = ReleasePlan::default();
    for local in locals {
        let name = local.slash_name();
        let path = local.path();
        let content = Bytes::from(
            tokio::fs::read(&path)
                .await
                .map_err(|e| io_err(&path, e))?,
        );
        let zcontent = if local.compressed {
            let zpath = local.compressed_path();
            Some(Bytes::from(
                tokio::fs::read(&zpath)
                    .await
                    .map_err(|e| io_err(&zpath, e))?,
            ))
        } else {
            None
        };

        let planned = match remote.get(&name) {
            None => {
                info!("asset `{name}` is new; publishing at version 1");
                PlannedAsset {
                    name,
                    ty: local.ty,
                    expect_compressed: zcontent.is_some(),
                    content,
                    zcontent,
                    target_version: 1,
                    upload: true,
                }
            }
            Some(existing) if content_digest(&existing.content) == content_digest(&content) => {
                debug!("asset `{name}` unchanged; keeping version {}", existing.version);
                PlannedAsset {
                    name,
                    ty: local.ty,
                    expect_compressed: existing.compressed,
                    content,
                    zcontent,
                    target_version: existing.version,
                    upload: false,
                }
            }
            Some(existing) => {
                info!(
                    "asset `{name}` changed; bumping version {} -> {}",
                    existing.version,
                    existing.version + 1
                );
                PlannedAsset {
                    name,
                    ty: local.ty,
                    expect_compressed: zcontent.is_some(),
                    content,
                    zcontent,
                    target_version: existing.version + 1,
                    upload: true,
                }
            }
        };
        plan.assets.push(planned);
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::scan::scan_assets;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        fs::write(root.join(rel), content).unwrap();
    }

    fn remote_asset(content: &[u8], version: u64, compressed: bool) -> RemoteAsset {
        RemoteAsset {
            content: Bytes::copy_from_slice(content),
            version,
            revision: "r1".to_string(),
            compressed,
        }
    }

    #[tokio::test]
    async fn new_asset_targets_version_one() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", b"{}");
        let locals = scan_assets(tmp.path()).unwrap();
        let plan = plan_release(&locals, &HashMap::new()).await.unwrap();
        assert_eq!(plan.assets.len(), 1);
        assert!(plan.assets[0].upload);
        assert_eq!(plan.assets[0].target_version, 1);
        assert_eq!(plan.upload_count(), 1);
    }

    #[tokio::test]
    async fn identical_content_is_not_uploaded_and_keeps_version() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", b"{\"v\":1}");
        let locals = scan_assets(tmp.path()).unwrap();
        let remote = HashMap::from([(
            "/a.json".to_string(),
            remote_asset(b"{\"v\":1}", 4, false),
        )]);
        let plan = plan_release(&locals, &remote).await.unwrap();
        assert!(!plan.assets[0].upload);
        assert_eq!(plan.assets[0].target_version, 4);
        assert_eq!(plan.upload_count(), 0);
    }

    #[tokio::test]
    async fn changed_content_bumps_by_exactly_one() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", b"{\"v\":2}");
        let locals = scan_assets(tmp.path()).unwrap();
        let remote = HashMap::from([(
            "/a.json".to_string(),
            remote_asset(b"{\"v\":1}", 4, false),
        )]);
        let plan = plan_release(&locals, &remote).await.unwrap();
        assert!(plan.assets[0].upload);
        assert_eq!(plan.assets[0].target_version, 5);
    }

    #[tokio::test]
    async fn unchanged_asset_carries_remote_compressed_flag() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", b"{}");
        let locals = scan_assets(tmp.path()).unwrap();
        let remote = HashMap::from([("/a.json".to_string(), remote_asset(b"{}", 2, true))]);
        let plan = plan_release(&locals, &remote).await.unwrap();
        assert!(!plan.assets[0].upload);
        assert!(plan.assets[0].expect_compressed);
    }

    #[tokio::test]
    async fn changed_asset_without_local_variant_drops_compression() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", b"new");
        let locals = scan_assets(tmp.path()).unwrap();
        let remote = HashMap::from([("/a.json".to_string(), remote_asset(b"old", 2, true))]);
        let plan = plan_release(&locals, &remote).await.unwrap();
        assert!(plan.assets[0].upload);
        assert!(!plan.assets[0].expect_compressed);
        assert!(plan.assets[0].zcontent.is_none());
    }

    #[test]
    fn allow_list_partitions_by_name_with_or_without_slash() {
        let a = LocalAsset {
            dir: "x".into(),
            file_name: "a.json".to_string(),
            ty: AssetType::Json,
            compressed: false,
        };
        let b = LocalAsset {
            dir: "x".into(),
            file_name: "b.txt".to_string(),
            ty: AssetType::Text,
            compressed: false,
        };
        let only = HashSet::from(["/a.json".to_string()]);
        let (kept, skipped) = apply_allow_list(vec![a.clone(), b.clone()], Some(&only));
        assert_eq!(kept, vec![a.clone()]);
        assert_eq!(skipped, vec![b.clone()]);

        let (kept, skipped) = apply_allow_list(vec![a, b], None);
        assert_eq!(kept.len(), 2);
        assert!(skipped.is_empty());
    }
}
