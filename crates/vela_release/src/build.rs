//! Manifest builder: assembles the fully-enumerated manifest for a release.

use tracing::info;
use vela_core::prelude::*;

/// Build the release manifest from every asset's current record, in
/// canonical `(type, name)` order, stamped at `now` (epoch seconds).
pub fn build_manifest(records: Vec<AssetEntry>, whats_new: WhatsNew, now: i64) -> Manifest {
    let mut manifest = Manifest::new(now, whats_new);
    manifest.files = records;
    manifest.sort_files();
    report_sizes(&manifest);
    manifest
}

/// Operator-facing aggregate download size report, in kilobytes.
pub fn report_sizes(manifest: &Manifest) {
    let totals = manifest.total_sizes();
    info!(
        "Config total download size: {}/{} ({})",
        totals.base / 1000,
        totals.compressed / 1000,
        totals.combined / 1000
    );
}
