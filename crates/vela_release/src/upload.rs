//! Upload executor: pushes planned content to the store and reads every
//! object back so the store's own size, version and revision become the
//! asset's published record.

use std::collections::HashMap;

use tracing::info;
use vela_core::prelude::*;

use crate::diff::ReleasePlan;
use crate::error::ReleaseError;

fn put_options(content_type: String, content_encoding: Option<String>, version: u64) -> PutOptions {
    PutOptions {
        content_type,
        content_encoding,
        metadata: HashMap::from([(VERSION_METADATA_KEY.to_string(), version.to_string())]),
    }
}

/// Read an asset's published record back from the store.
///
/// `fallback_version` covers objects whose metadata cannot be parsed;
/// otherwise the store's metadata wins.
pub async fn read_back<S: ObjectStore>(
    store: &S,
    name: &str,
    ty: AssetType,
    expect_compressed: bool,
    fallback_version: u64,
) -> Result<AssetEntry, ReleaseError> {
    let key = asset_key(name);
    let object = store.get(&key).await?;
    let mut entry = AssetEntry {
        name: name.to_string(),
        size: object.size,
        ty,
        url: store.url(&key, &object.revision),
        version: object.version().unwrap_or(fallback_version),
        zsize: None,
        zurl: None,
    };
    if expect_compressed {
        let zkey = compressed_asset_key(name);
        let zobject = store.get(&zkey).await?;
        entry.zsize = Some(zobject.size);
        entry.zurl = Some(store.url(&zkey, &zobject.revision));
    }
    Ok(entry)
}

/// Execute the plan sequentially in deterministic order.
///
/// A failed put or read-back aborts the run; the asset is never reported as
/// published.
pub async fn execute_plan<S: ObjectStore>(
    store: &S,
    plan: &ReleasePlan,
) -> Result<Vec<AssetEntry>, ReleaseError> {
    let mut records = Vec::with_capacity(plan.assets.len());
    for asset in &plan.assets {
        if asset.upload {
            let key = asset_key(&asset.name);
            let content_type = asset.ty.content_type(&asset.name);
            info!("Uploading asset `{key}`");
            store
                .put(
                    &key,
                    asset.content.clone(),
                    put_options(content_type.clone(), None, asset.target_version),
                )
                .await?;

            if let Some(zcontent) = &asset.zcontent {
                let zkey = compressed_asset_key(&asset.name);
                info!("Uploading asset `{zkey}`");
                store
                    .put(
                        &zkey,
                        zcontent.clone(),
                        put_options(content_type, Some("gzip".to_string()), asset.target_version),
                    )
                    .await?;
            }
        }
        records.push(
            read_back(
                store,
                &asset.name,
                asset.ty,
                asset.expect_compressed,
                asset.target_version,
            )
            .await?,
        );
    }
    Ok(records)
}
