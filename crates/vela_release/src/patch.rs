//! Compatibility patcher: rewrites entries of already-published manifests
//! that are pinned exactly one version behind a freshly published asset, so
//! clients embedding an old manifest keep a reachable URL without a full
//! republish.

use tracing::{debug, info};
use vela_core::prelude::*;

use crate::remote::RemoteManifest;

/// Examine every entry of every manifest against the run's published
/// records. An entry at `record.version - 1` is rewritten to the record's
/// size/url/version; its compressed-variant fields follow the record
/// (added, refreshed or stripped). Manifests with at least one rewrite are
/// marked dirty and restamped at `now`.
///
/// Entries two or more versions behind stay untouched: compatibility spans
/// exactly one version step.
pub fn patch_manifests(manifests: &mut [RemoteManifest], records: &[AssetEntry], now: i64) -> usize {
    let mut patched = 0;
    for remote in manifests.iter_mut() {
        let mut updated = false;
        for entry in &mut remote.manifest.files {
            for record in records {
                if entry.name != record.name || entry.version + 1 != record.version {
                    continue;
                }
                debug!(
                    "patching `{}` in `{}`: version {} -> {}",
                    entry.name, remote.key, entry.version, record.version
                );
                entry.size = record.size;
                entry.url = record.url.clone();
                entry.version = record.version;
                entry.zsize = record.zsize;
                entry.zurl = record.zurl.clone();
                updated = true;
            }
        }
        if updated {
            remote.dirty = true;
            remote.manifest.last_updated_at = now;
            patched += 1;
            info!("Config `{}` patched for compatibility", remote.key);
        }
    }
    patched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, version: u64, zsize: Option<u64>) -> AssetEntry {
        AssetEntry {
            name: name.to_string(),
            size: 20,
            ty: AssetType::Json,
            url: format!("memory://assets{name}?rev=r{version}"),
            version,
            zsize,
            zurl: zsize.map(|_| format!("memory://assets{name}.gz?rev=r{version}")),
        }
    }

    fn manifest_with(entries: Vec<AssetEntry>) -> RemoteManifest {
        RemoteManifest {
            key: "config/1.0.0.json".to_string(),
            manifest: Manifest {
                files: entries,
                last_updated_at: 100,
                whats_new: WhatsNew::default(),
            },
            dirty: false,
        }
    }

    fn pinned(name: &str, version: u64, zsize: Option<u64>) -> AssetEntry {
        AssetEntry {
            name: name.to_string(),
            size: 10,
            ty: AssetType::Json,
            url: "memory://old".to_string(),
            version,
            zsize,
            zurl: zsize.map(|_| "memory://old.gz".to_string()),
        }
    }

    #[test]
    fn entry_one_version_behind_is_rewritten() {
        let mut manifests = vec![manifest_with(vec![pinned("/a.json", 3, None)])];
        let patched = patch_manifests(&mut manifests, &[record("/a.json", 4, None)], 999);
        assert_eq!(patched, 1);
        assert!(manifests[0].dirty);
        assert_eq!(manifests[0].manifest.last_updated_at, 999);
        let entry = &manifests[0].manifest.files[0];
        assert_eq!(entry.version, 4);
        assert_eq!(entry.size, 20);
        assert_eq!(entry.url, "memory://assets/a.json?rev=r4");
    }

    #[test]
    fn entry_two_versions_behind_is_left_alone() {
        let mut manifests = vec![manifest_with(vec![pinned("/a.json", 2, None)])];
        let patched = patch_manifests(&mut manifests, &[record("/a.json", 4, None)], 999);
        assert_eq!(patched, 0);
        assert!(!manifests[0].dirty);
        assert_eq!(manifests[0].manifest.last_updated_at, 100);
        assert_eq!(manifests[0].manifest.files[0].version, 2);
    }

    #[test]
    fn losing_the_compressed_variant_strips_z_fields() {
        let mut manifests = vec![manifest_with(vec![pinned("/a.json", 3, Some(5))])];
        patch_manifests(&mut manifests, &[record("/a.json", 4, None)], 999);
        let entry = &manifests[0].manifest.files[0];
        assert_eq!(entry.zsize, None);
        assert_eq!(entry.zurl, None);
    }

    #[test]
    fn gaining_a_compressed_variant_adds_z_fields() {
        let mut manifests = vec![manifest_with(vec![pinned("/a.json", 3, None)])];
        patch_manifests(&mut manifests, &[record("/a.json", 4, Some(8))], 999);
        let entry = &manifests[0].manifest.files[0];
        assert_eq!(entry.zsize, Some(8));
        assert_eq!(
            entry.zurl.as_deref(),
            Some("memory://assets/a.json.gz?rev=r4")
        );
    }

    #[test]
    fn untouched_manifests_stay_clean() {
        let mut manifests = vec![manifest_with(vec![pinned("/other.json", 1, None)])];
        let patched = patch_manifests(&mut manifests, &[record("/a.json", 4, None)], 999);
        assert_eq!(patched, 0);
        assert!(!manifests[0].dirty);
    }
}
