//! Release synchronization engine for versioned client assets.
//!
//! One run inventories a local asset tree, diffs it against what the object
//! store already publishes, uploads only the deltas at bumped versions,
//! builds a fresh manifest for current clients and, in compatible mode,
//! patches already-published manifests in place so clients pinned one
//! version behind keep working.

pub mod build;
pub mod dev;
pub mod diff;
pub mod error;
pub mod minify;
pub mod patch;
pub mod publish;
pub mod remote;
pub mod run;
pub mod scan;
pub mod upload;
pub mod version;

pub use dev::{DevOptions, Platform, build_dev_configs};
pub use error::ReleaseError;
pub use run::{ReleaseOptions, ReleaseSummary, run_release};
pub use version::{ConfigVersion, VersionToken};
