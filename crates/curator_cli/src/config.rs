//! Application configuration, read from `curator.ron` when present.
//!
//! The built-in source table mirrors the archives the pipeline was written
//! for, so the binary is useful with no config file at all; a config file
//! replaces the table wholesale rather than merging with it.

use std::path::{Path, PathBuf};

use curator_engine::{Bucket, CatalogueSource, DataLayout, SourceKind, SourceSpec, WordPressSource};
use pipeline_logging::pipeline_warn;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "curator.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory holding one `<source_id>/raw` + `<source_id>/clean`
    /// pair per source.
    pub data_root: PathBuf,
    pub publish: PublishConfig,
    pub sources: Vec<SourceSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Dataset-host account the bundle repositories live under. Publishing
    /// stays in dry-run mode while this is unset.
    pub namespace: Option<String>,
    pub attempts: u32,
    pub backoff_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            attempts: 3,
            backoff_secs: 10,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            publish: PublishConfig::default(),
            sources: builtin_sources(),
        }
    }
}

impl AppConfig {
    /// Load the config file, falling back to the built-in defaults when the
    /// file is absent or unreadable. A malformed file is reported and
    /// ignored rather than aborting the run.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match ron::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                pipeline_warn!("Failed to parse config from {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn find_source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|source| source.id == id)
    }

    pub fn layout_for(&self, source: &SourceSpec) -> DataLayout {
        DataLayout::under(&self.data_root.join(&source.id))
    }

    /// Dataset repository id for one source bucket, e.g.
    /// `account/re-entanglements-audio`. `None` until a namespace is
    /// configured.
    pub fn repo_id(&self, source: &SourceSpec, bucket: Bucket) -> Option<String> {
        let namespace = self.publish.namespace.as_deref()?;
        let media = bucket.dir_name()?;
        Some(format!(
            "{namespace}/{}-{media}",
            source.id.replace('_', "-")
        ))
    }
}

fn builtin_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec {
            id: "pitt_rivers".to_string(),
            name: "Pitt Rivers Museum".to_string(),
            base_url: "https://www.prm.ox.ac.uk".to_string(),
            license: "Copyright University of Oxford, Pitt Rivers Museum".to_string(),
            source_type: "primary".to_string(),
            kind: SourceKind::Catalogue(CatalogueSource {
                search_url: "https://www.prm.ox.ac.uk/collections-online#/search/simple-search/%2522Igbo%2522/%257B%2522catalogue%2522%253A%257B%2522collection%2522%253A%255B%2522Photograph%2522%255D%252C%2522multimedia.isPublished%2522%253A%255B%2522Yes%2522%255D%257D%257D/1/24/_score/desc/catalogue".to_string(),
                item_path_segment: "item".to_string(),
                results_marker: None,
            }),
        },
        SourceSpec {
            id: "maa_cambridge".to_string(),
            name: "Museum of Archaeology and Anthropology, Cambridge".to_string(),
            base_url: "https://collections.maa.cam.ac.uk".to_string(),
            license: "Copyright University of Cambridge, MAA".to_string(),
            source_type: "primary".to_string(),
            kind: SourceKind::Catalogue(CatalogueSource {
                search_url: "https://collections.maa.cam.ac.uk/photographs/?advanced_search=%5B%7B%22field%22%3A%22place%22%2C%22value%22%3A%22South+Eastern+Nigeria%22%7D%5D&filters=image_available".to_string(),
                item_path_segment: "photographs".to_string(),
                results_marker: Some("Search returned".to_string()),
            }),
        },
        SourceSpec {
            id: "re-entanglements".to_string(),
            name: "Re-entanglements".to_string(),
            base_url: "https://re-entanglements.net".to_string(),
            license: "Copyright © 2025 [Re:]Entanglements".to_string(),
            source_type: "secondary".to_string(),
            kind: SourceKind::WordPressApi(WordPressSource {
                api_url: "https://re-entanglements.net/wp-json/wp/v2/posts".to_string(),
                per_page: 20,
            }),
        },
    ]
}
