use std::path::{Path, PathBuf};

use thiserror::Error;
use vela_core::prelude::StoreError;

#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The extension of a local file maps to no known asset type. An
    /// unclassified asset cannot be published with a correct content type.
    #[error("unrecognized asset type for `{name}`")]
    UnknownAssetType { name: String },

    #[error("version must be one of `major`, `minor`, `patch`, or match `X.Y.Z`; got `{token}`")]
    BadVersionToken { token: String },

    /// A published manifest that cannot be decoded is fatal for the whole
    /// run; the compatibility patcher cannot reason about it.
    #[error("failed to parse manifest `{key}`: {source}")]
    ManifestParse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("minify command `{command}` exited with {status}")]
    Minify {
        command: String,
        status: std::process::ExitStatus,
    },
}

pub(crate) fn io_err(path: impl AsRef<Path>, source: std::io::Error) -> ReleaseError {
    ReleaseError::Io {
        path: path.as_ref().to_path_buf(),
        source,
    }
}
