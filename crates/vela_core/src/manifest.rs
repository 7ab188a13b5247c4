use serde::{Deserialize, Serialize};

use crate::asset::AssetType;

/// The manifest ("config") is the document clients fetch to discover asset
/// URLs, sizes and versions. One is published per release under
/// `config/MAJOR.MINOR.PATCH.json`.
///
/// Struct fields are declared in alphabetical order so plain serde
/// serialization emits sorted keys; identical logical content serializes to
/// identical bytes across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<AssetEntry>,

    /// Epoch seconds of the last publish or in-place patch.
    #[serde(rename = "lastUpdatedAt")]
    pub last_updated_at: i64,

    #[serde(rename = "whatsNew")]
    pub whats_new: WhatsNew,
}

/// One published asset inside a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Store-relative path with a leading `/`. Unique within a manifest.
    pub name: String,

    /// Size in bytes of the raw content, as reported by the store.
    pub size: u64,

    #[serde(rename = "type")]
    pub ty: AssetType,

    /// Canonical access URL, pinned to the store revision of the upload.
    pub url: String,

    /// Starts at 1, bumps by exactly 1 per content change.
    pub version: u64,

    /// Size of the pre-compressed variant, when one is published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zsize: Option<u64>,

    /// Access URL of the pre-compressed variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zurl: Option<String>,
}

/// Bilingual free-text change description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsNew {
    pub description_en: String,
    pub description_fr: String,
}

/// Aggregate download sizes of a manifest, for operator reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTotals {
    pub base: u64,
    pub compressed: u64,
    pub combined: u64,
}

impl Manifest {
    /// An empty manifest stamped at `last_updated_at`.
    pub fn new(last_updated_at: i64, whats_new: WhatsNew) -> Self {
        Self {
            files: Vec::new(),
            last_updated_at,
            whats_new,
        }
    }

    /// Sort `files` by `(type, name)`, the canonical manifest order.
    pub fn sort_files(&mut self) {
        self.files
            .sort_by(|a, b| (a.ty, a.name.as_str()).cmp(&(b.ty, b.name.as_str())));
    }

    /// Total raw size, total compressed-variant size, and their sum.
    pub fn total_sizes(&self) -> SizeTotals {
        let mut totals = SizeTotals {
            base: 0,
            compressed: 0,
            combined: 0,
        };
        for entry in &self.files {
            totals.base += entry.size;
            totals.compressed += entry.zsize.unwrap_or(0);
        }
        totals.combined = totals.base + totals.compressed;
        totals
    }

    /// Compact JSON with sorted keys; the byte-reproducible publish format.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Indented JSON with sorted keys, for configs written to disk.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, ty: AssetType, version: u64) -> AssetEntry {
        AssetEntry {
            name: name.to_string(),
            size: 10,
            ty,
            url: format!("https://example.test{name}"),
            version,
            zsize: None,
            zurl: None,
        }
    }

    #[test]
    fn serializes_with_sorted_keys_and_skips_absent_variant() {
        let manifest = Manifest {
            files: vec![entry("/a.json", AssetType::Json, 1)],
            last_updated_at: 1500000000,
            whats_new: WhatsNew {
                description_en: "Update".to_string(),
                description_fr: "Mise à jour".to_string(),
            },
        };
        let json = String::from_utf8(manifest.to_canonical_json().unwrap()).unwrap();
        assert_eq!(
            json,
            "{\"files\":[{\"name\":\"/a.json\",\"size\":10,\"type\":\"json\",\
             \"url\":\"https://example.test/a.json\",\"version\":1}],\
             \"lastUpdatedAt\":1500000000,\"whatsNew\":{\"description_en\":\"Update\",\
             \"description_fr\":\"Mise à jour\"}}"
        );
    }

    #[test]
    fn compressed_variant_fields_serialize_in_key_order() {
        let mut e = entry("/b.json", AssetType::Json, 2);
        e.zsize = Some(4);
        e.zurl = Some("https://example.test/b.json.gz".to_string());
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(
            json,
            "{\"name\":\"/b.json\",\"size\":10,\"type\":\"json\",\
             \"url\":\"https://example.test/b.json\",\"version\":2,\
             \"zsize\":4,\"zurl\":\"https://example.test/b.json.gz\"}"
        );
    }

    #[test]
    fn sorts_by_type_then_name() {
        let mut manifest = Manifest::new(0, WhatsNew::default());
        manifest.files = vec![
            entry("/b.txt", AssetType::Text, 1),
            entry("/z.png", AssetType::Image, 1),
            entry("/a.json", AssetType::Json, 1),
            entry("/b.json", AssetType::Json, 1),
        ];
        manifest.sort_files();
        let names: Vec<&str> = manifest.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["/z.png", "/a.json", "/b.json", "/b.txt"]);
    }

    #[test]
    fn totals_sum_base_and_compressed() {
        let mut manifest = Manifest::new(0, WhatsNew::default());
        let mut a = entry("/a.json", AssetType::Json, 1);
        a.size = 100;
        a.zsize = Some(40);
        let mut b = entry("/b.txt", AssetType::Text, 1);
        b.size = 25;
        manifest.files = vec![a, b];
        let totals = manifest.total_sizes();
        assert_eq!(totals.base, 125);
        assert_eq!(totals.compressed, 40);
        assert_eq!(totals.combined, 165);
    }

    #[test]
    fn canonical_json_round_trips() {
        let mut manifest = Manifest::new(12345, WhatsNew::default());
        let mut e = entry("/a.json", AssetType::Json, 3);
        e.zsize = Some(7);
        e.zurl = Some("memory://assets/a.json.gz?rev=1".to_string());
        manifest.files.push(e);
        let bytes = manifest.to_canonical_json().unwrap();
        let parsed: Manifest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, manifest);
    }
}
