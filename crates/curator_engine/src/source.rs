use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Bucket;

/// A named origin configured at startup. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Short identifier used in record ids, filenames and log lines.
    pub id: String,
    /// Human-readable source name recorded in every item.
    pub name: String,
    /// Base URL that relative asset/item URLs are resolved against.
    pub base_url: String,
    /// License string copied verbatim into each record.
    pub license: String,
    /// `"primary"` or `"secondary"`, recorded as-is.
    pub source_type: String,
    pub kind: SourceKind,
}

/// Per-source harvesting strategy. Catalogue sites paginate a rendered
/// search page with a page parameter; WordPress sites expose numbered JSON
/// pages on the REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceKind {
    Catalogue(CatalogueSource),
    WordPressApi(WordPressSource),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueSource {
    /// Search/listing URL for page 1; `page=N` is appended for later pages.
    pub search_url: String,
    /// Substring an item URL must contain (e.g. `/photographs/`).
    pub item_path_segment: String,
    /// Text expected on every non-empty results page. A page without it is
    /// treated as past the end of the listing.
    pub results_marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPressSource {
    /// Posts endpoint, e.g. `https://example.net/wp-json/wp/v2/posts`.
    pub api_url: String,
    pub per_page: usize,
}

/// Explicit raw/clean directory roots, passed into every component instead
/// of being ambient process state. Two runs with different layouts never
/// touch each other's files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLayout {
    pub raw_root: PathBuf,
    pub clean_root: PathBuf,
}

impl DataLayout {
    pub fn new(raw_root: impl Into<PathBuf>, clean_root: impl Into<PathBuf>) -> Self {
        Self {
            raw_root: raw_root.into(),
            clean_root: clean_root.into(),
        }
    }

    /// Both roots under a common parent, mirroring the conventional
    /// `<root>/raw` + `<root>/clean` on-disk split.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(root.join("raw"), root.join("clean"))
    }

    /// Line-delimited metadata file holding every raw [`crate::ItemRecord`].
    pub fn raw_jsonl(&self) -> PathBuf {
        self.raw_root.join("data.jsonl")
    }

    /// Raw asset folder for a kept bucket, `None` for `Rejected`.
    pub fn raw_media_dir(&self, bucket: Bucket) -> Option<PathBuf> {
        bucket.dir_name().map(|name| self.raw_root.join(name))
    }

    /// Bundle directory for a kept bucket, `None` for `Rejected`.
    pub fn bundle_dir(&self, bucket: Bucket) -> Option<PathBuf> {
        bucket.dir_name().map(|name| self.clean_root.join(name))
    }

    /// Asset subfolder inside a bucket's bundle directory.
    pub fn bundle_media_dir(&self, bucket: Bucket) -> Option<PathBuf> {
        let name = bucket.dir_name()?;
        Some(self.clean_root.join(name).join(name))
    }
}
