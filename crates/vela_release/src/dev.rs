//! Dev-config builder: manifests for a development environment, pointing at
//! local URLs, built without touching any remote store.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use vela_core::prelude::*;

use crate::build::report_sizes;
use crate::error::{ReleaseError, io_err};
use crate::scan::{LocalAsset, scan_assets};

/// Target platform of a dev config. Each platform reaches the dev asset
/// server through a different host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }

    /// Base URL assets resolve against on this platform. The Android
    /// emulator reaches the host machine through 10.0.2.2.
    pub fn asset_host(&self) -> &'static str {
        match self {
            Self::Ios => "http://localhost:8080",
            Self::Android => "http://10.0.2.2:8080",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DevOptions {
    pub asset_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Output config name, e.g. `public.json`, expanded per platform to
    /// `public.ios.json` / `public.android.json`.
    pub file_name: String,
    /// App bundle directories to refresh with assets and a
    /// `base_config.json`, per platform.
    pub app_dirs: Vec<(Platform, PathBuf)>,
    pub whats_new: WhatsNew,
}

fn platform_file_name(file_name: &str, platform: Platform) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{}.{ext}", platform.as_str()),
        None => format!("{file_name}.{}", platform.as_str()),
    }
}

fn dev_entry(asset: &LocalAsset, platform: Platform) -> Result<AssetEntry, ReleaseError> {
    let path = asset.path();
    let size = std::fs::metadata(&path)
        .map_err(|e| io_err(&path, e))?
        .len();
    let host = platform.asset_host();
    let mut entry = AssetEntry {
        name: asset.slash_name(),
        size,
        ty: asset.ty,
        url: format!("{host}/{}/{}", asset.ty.as_str(), asset.file_name),
        version: 1,
        zsize: None,
        zurl: None,
    };
    if asset.compressed {
        let zpath = asset.compressed_path();
        entry.zsize = Some(
            std::fs::metadata(&zpath)
                .map_err(|e| io_err(&zpath, e))?
                .len(),
        );
        entry.zurl = Some(format!(
            "{host}/{}/{}{COMPRESSED_SUFFIX}",
            asset.ty.as_str(),
            asset.file_name
        ));
    }
    Ok(entry)
}

async fn refresh_app_dir(dir: &Path, assets: &[LocalAsset]) -> Result<(), ReleaseError> {
    if dir.exists() {
        tokio::fs::remove_dir_all(dir)
            .await
            .map_err(|e| io_err(dir, e))?;
    } else {
        debug!("app asset directory `{}` absent; nothing to clear", dir.display());
    }
    info!("Creating app asset directory `{}`", dir.display());
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| io_err(dir, e))?;

    for asset in assets {
        let type_dir = dir.join(asset.ty.as_str());
        tokio::fs::create_dir_all(&type_dir)
            .await
            .map_err(|e| io_err(&type_dir, e))?;
        let target = type_dir.join(&asset.file_name);
        tokio::fs::copy(asset.path(), &target)
            .await
            .map_err(|e| io_err(&target, e))?;
    }
    Ok(())
}

async fn write_config(path: &Path, manifest: &Manifest) -> Result<(), ReleaseError> {
    info!("Dumping config to `{}`", path.display());
    let body = manifest
        .to_pretty_json()
        .map_err(StoreError::Serialization)?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Build one dev config per platform and write them to the output
/// directory; refresh any configured app bundle directories along the way.
/// Returns the config paths written.
pub async fn build_dev_configs(opts: &DevOptions) -> Result<Vec<PathBuf>, ReleaseError> {
    let assets = scan_assets(&opts.asset_dir)?;
    info!("Retrieved {} assets", assets.len());

    info!("Creating output directory `{}`", opts.output_dir.display());
    tokio::fs::create_dir_all(&opts.output_dir)
        .await
        .map_err(|e| io_err(&opts.output_dir, e))?;

    for (_, dir) in &opts.app_dirs {
        refresh_app_dir(dir, &assets).await?;
    }

    let now = chrono::Utc::now().timestamp();
    let mut written = Vec::new();
    for platform in [Platform::Ios, Platform::Android] {
        let mut manifest = Manifest::new(now, opts.whats_new.clone());
        for asset in &assets {
            manifest.files.push(dev_entry(asset, platform)?);
        }
        manifest.sort_files();
        report_sizes(&manifest);

        let out_path = opts
            .output_dir
            .join(platform_file_name(&opts.file_name, platform));
        write_config(&out_path, &manifest).await?;
        written.push(out_path);

        for (app_platform, dir) in &opts.app_dirs {
            if *app_platform == platform {
                let app_path = dir.join("base_config.json");
                write_config(&app_path, &manifest).await?;
                written.push(app_path);
            }
        }
    }
    Ok(written)
}
