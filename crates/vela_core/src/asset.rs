use serde::{Deserialize, Serialize};

/// Key prefix under which asset objects live in the store.
pub const ASSET_PREFIX: &str = "assets/";

/// Key prefix under which manifest ("config") objects live in the store.
pub const CONFIG_PREFIX: &str = "config/";

/// Suffix marking the pre-compressed variant of an asset.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Store-side metadata key carrying an asset's published version.
pub const VERSION_METADATA_KEY: &str = "version";

/// The type of a published asset, derived solely from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Json,
    Text,
}

impl AssetType {
    /// Classify a file name by its extension.
    ///
    /// Returns `None` for extensions outside the fixed table; callers treat
    /// that as a configuration error rather than skipping the file.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "png" | "gif" | "jpg" => Some(Self::Image),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Json => "json",
            Self::Text => "text",
        }
    }

    /// The content type an object of this type is uploaded with.
    pub fn content_type(&self, name: &str) -> String {
        match self {
            Self::Json => "application/json; charset=utf-8".to_string(),
            Self::Text => "text/plain; charset=utf-8".to_string(),
            Self::Image => mime_guess::from_path(name)
                .first_or_octet_stream()
                .to_string(),
        }
    }
}

/// Store key for an asset. `name` carries a leading `/`.
pub fn asset_key(name: &str) -> String {
    format!("assets{name}")
}

/// Store key for the compressed variant of an asset.
pub fn compressed_asset_key(name: &str) -> String {
    format!("assets{name}{COMPRESSED_SUFFIX}")
}

/// Store key for a manifest at a `MAJOR.MINOR.PATCH` version.
pub fn config_key(version: &str) -> String {
    format!("{CONFIG_PREFIX}{version}.json")
}
