//! Asset inventory scanner: walks a local directory tree and classifies
//! every publishable file by its extension.

use std::path::{Path, PathBuf};

use vela_core::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::error::ReleaseError;

/// A publishable file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    /// Directory containing the file.
    pub dir: PathBuf,
    pub file_name: String,
    pub ty: AssetType,
    /// A `<file_name>.gz` sibling sits next to it.
    pub compressed: bool,
}

impl LocalAsset {
    /// The asset's store-relative name, with a leading `/`.
    pub fn slash_name(&self) -> String {
        format!("/{}", self.file_name)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub fn compressed_path(&self) -> PathBuf {
        self.dir.join(format!("{}{COMPRESSED_SUFFIX}", self.file_name))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_config_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().contains("config")
}

/// Recursively inventory `root`.
///
/// Hidden files, extensionless files and anything in a manifest-bearing
/// subtree are excluded. A `.gz` file is folded into its uncompressed
/// sibling rather than listed on its own. An extension outside the fixed
/// type table is an error, never a silent skip. Results are sorted by file
/// name.
pub fn scan_assets(root: &Path) -> Result<Vec<LocalAsset>, ReleaseError> {
    let mut assets = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_hidden(e) && !is_config_dir(e));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            match e.into_io_error() {
                Some(source) => ReleaseError::Io { path, source },
                None => ReleaseError::Io {
                    path,
                    source: std::io::Error::other("directory walk failed"),
                },
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !file_name.contains('.') || file_name.contains("config") {
            continue;
        }
        if file_name.ends_with(COMPRESSED_SUFFIX) {
            continue;
        }

        let ty = AssetType::from_name(&file_name).ok_or_else(|| ReleaseError::UnknownAssetType {
            name: file_name.clone(),
        })?;
        let dir = entry
            .path()
            .parent()
            .unwrap_or(root)
            .to_path_buf();
        let compressed = dir
            .join(format!("{file_name}{COMPRESSED_SUFFIX}"))
            .exists();
        assets.push(LocalAsset {
            dir,
            file_name,
            ty,
            compressed,
        });
    }
    assets.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(assets)
}
