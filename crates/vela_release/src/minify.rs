//! Minification hook: an opaque external command that populates the output
//! directory from the asset directory before the release scan.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crate::error::{ReleaseError, io_err};

/// Prepare the directory the release will scan.
///
/// With a command configured, the output directory is cleared and
/// `<command> <asset_dir> <output_dir>` is expected to fill it; its exit
/// status is checked. With none, assets are read straight from `asset_dir`.
pub async fn prepare_assets(
    asset_dir: &Path,
    output_dir: &Path,
    command: Option<&str>,
) -> Result<PathBuf, ReleaseError> {
    let Some(command) = command else {
        return Ok(asset_dir.to_path_buf());
    };

    info!("Cleaning output directory `{}`", output_dir.display());
    if output_dir.exists() {
        tokio::fs::remove_dir_all(output_dir)
            .await
            .map_err(|e| io_err(output_dir, e))?;
    }

    info!(
        "Beginning minify subprocess, from `{}` to `{}`",
        asset_dir.display(),
        output_dir.display()
    );
    let status = Command::new(command)
        .arg(asset_dir)
        .arg(output_dir)
        .status()
        .await
        .map_err(|e| io_err(command, e))?;
    if !status.success() {
        return Err(ReleaseError::Minify {
            command: command.to_string(),
            status,
        });
    }
    Ok(output_dir.to_path_buf())
}
