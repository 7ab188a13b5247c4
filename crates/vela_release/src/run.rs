//! The sequential release pipeline: list, scan, diff, upload, build/patch,
//! publish.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info};
use vela_core::prelude::*;

use crate::error::ReleaseError;
use crate::version::{ConfigVersion, VersionToken};
use crate::{build, diff, minify, patch, publish, remote, scan, upload, version};

/// Options for one release run. Constructed once at process start and
/// threaded by reference through every stage; no component rebinds it.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    pub asset_dir: PathBuf,
    /// Where the minify step stages assets; scanned instead of `asset_dir`
    /// when a minify command is configured.
    pub output_dir: PathBuf,
    /// `major`, `minor`, `patch`, or an explicit `X.Y.Z`.
    pub version: String,
    /// Restrict the run to these asset names (with or without the leading
    /// `/`). `None` releases everything.
    pub only: Option<HashSet<String>>,
    /// Build and publish a fresh manifest. `false` pushes assets and, with
    /// `compatible`, patches existing manifests only.
    pub build_config: bool,
    /// Enable the compatibility patcher over already-published manifests.
    pub compatible: bool,
    pub whats_new: WhatsNew,
    /// External minify command, invoked as `<cmd> <asset_dir> <output_dir>`.
    pub minify_command: Option<String>,
}

/// What a release run did, for operator reporting.
#[derive(Debug, Clone, Default)]
pub struct ReleaseSummary {
    pub scanned: usize,
    pub uploaded: usize,
    /// Existing manifests republished by the compatibility patcher.
    pub patched_configs: Vec<String>,
    pub new_config: Option<String>,
    pub new_version: Option<ConfigVersion>,
}

/// Run a release against `store`.
///
/// The full remote listing and the whole version-assignment plan complete
/// before the first upload; manifests only ever reference records read back
/// from the store after upload.
pub async fn run_release<S: ObjectStore>(
    store: &S,
    opts: &ReleaseOptions,
) -> Result<ReleaseSummary, ReleaseError> {
    // Configuration errors abort before any remote mutation.
    let token = VersionToken::parse(&opts.version)?;

    let scan_root = minify::prepare_assets(
        &opts.asset_dir,
        &opts.output_dir,
        opts.minify_command.as_deref(),
    )
    .await?;
    let locals = scan::scan_assets(&scan_root)?;

    let mut state = remote::load_remote_state(store).await?;

    let (kept, skipped) = diff::apply_allow_list(locals, opts.only.as_ref());
    info!("Retrieved {} assets", kept.len());

    let plan = diff::plan_release(&kept, &state.assets).await?;
    let mut summary = ReleaseSummary {
        scanned: kept.len() + skipped.len(),
        uploaded: plan.upload_count(),
        ..Default::default()
    };

    let mut records = upload::execute_plan(store, &plan).await?;

    if opts.compatible {
        patch::patch_manifests(&mut state.manifests, &records, Utc::now().timestamp());
        summary.patched_configs = publish::publish_manifests(store, &state.manifests).await?;
    }

    if opts.build_config {
        let keys = state.manifests.iter().map(|m| m.key.as_str());
        let next = version::next_version(keys, token);

        // Allow-list-filtered assets are carried forward from whatever the
        // store already publishes for them.
        for asset in &skipped {
            let name = asset.slash_name();
            match state.assets.get(&name) {
                Some(existing) => records.push(
                    upload::read_back(store, &name, asset.ty, existing.compressed, existing.version)
                        .await?,
                ),
                None => debug!(
                    "asset `{name}` is filtered out and unpublished; leaving it out of the new config"
                ),
            }
        }

        let manifest = build::build_manifest(records, opts.whats_new.clone(), Utc::now().timestamp());
        let key = config_key(&next.to_string());
        info!("Built config file `{key}`");
        let fresh = remote::RemoteManifest {
            key: key.clone(),
            manifest,
            dirty: true,
        };
        publish::publish_manifests(store, std::slice::from_ref(&fresh)).await?;
        summary.new_config = Some(key);
        summary.new_version = Some(next);
    }

    Ok(summary)
}
