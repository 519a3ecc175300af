use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Bucket;

/// A validated, persisted media file. Invalid payloads never become an
/// `Asset`; construction happens only in the fetch-and-validate step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub file_name: String,
    pub original_url: String,
    pub raw_caption: String,
    pub file_size_bytes: u64,
    /// Pixel dimensions, recorded for image/document buckets only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub height: Option<u32>,
}

/// Source-specific provenance block carried on every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_id: String,
    pub origin_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date_published: Option<String>,
    /// Catalogue label/value rows; empty for API sources.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub fields: BTreeMap<String, String>,
}

/// One source item's full output: metadata plus per-bucket asset lists.
///
/// A record is persisted only when at least one non-rejected bucket is
/// non-empty. Empty lists are omitted from the JSON so bundle copies carry
/// only their own bucket's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Source-prefixed item id, e.g. `re-entanglements_3181`.
    pub id: String,
    pub source_name: String,
    pub source_type: String,
    pub original_url: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub raw_content: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub images: Vec<Asset>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub audio: Vec<Asset>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub documents: Vec<Asset>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags_scraped: Vec<String>,
    pub license_info: String,
    pub timestamp_scraped: String,
    pub source_specific_metadata: Provenance,
}

impl ItemRecord {
    /// Asset list for a kept bucket, `None` for `Rejected`.
    pub fn assets(&self, bucket: Bucket) -> Option<&Vec<Asset>> {
        match bucket {
            Bucket::Image => Some(&self.images),
            Bucket::Audio => Some(&self.audio),
            Bucket::Document => Some(&self.documents),
            Bucket::Rejected => None,
        }
    }

    pub fn assets_mut(&mut self, bucket: Bucket) -> Option<&mut Vec<Asset>> {
        match bucket {
            Bucket::Image => Some(&mut self.images),
            Bucket::Audio => Some(&mut self.audio),
            Bucket::Document => Some(&mut self.documents),
            Bucket::Rejected => None,
        }
    }

    pub fn push_asset(&mut self, bucket: Bucket, asset: Asset) {
        if let Some(list) = self.assets_mut(bucket) {
            list.push(asset);
        }
    }

    /// True when any kept bucket holds at least one asset; records failing
    /// this are discarded instead of persisted.
    pub fn has_assets(&self) -> bool {
        Bucket::KEPT
            .iter()
            .any(|bucket| self.assets(*bucket).is_some_and(|list| !list.is_empty()))
    }

    /// Shallow per-bundle copy: keeps this bucket's asset list, clears the
    /// others so they serialize away. `None` when this bucket is empty.
    pub fn bundle_view(&self, bucket: Bucket) -> Option<ItemRecord> {
        let assets = self.assets(bucket)?;
        if assets.is_empty() {
            return None;
        }
        let mut view = self.clone();
        for other in Bucket::KEPT {
            if other != bucket {
                if let Some(list) = view.assets_mut(other) {
                    list.clear();
                }
            }
        }
        Some(view)
    }
}
