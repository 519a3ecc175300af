use std::time::Duration;

use chrono::Utc;
use pipeline_logging::{pipeline_debug, pipeline_info, pipeline_warn};
use thiserror::Error;
use url::Url;

use crate::assets::{AssetStore, ImageProbe};
use crate::classify::Classifier;
use crate::extract::{extract_catalogue_item, extract_wp_post, ExtractedItem};
use crate::harvest::{harvest_api_posts, harvest_catalogue_links};
use crate::persist::JsonlWriter;
use crate::source::{DataLayout, SourceKind, SourceSpec};
use crate::{
    Bucket, Fetcher, ItemRecord, PageRenderer, PersistError, Provenance,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid base url for source {source_id}: {message}")]
    InvalidBaseUrl { source_id: String, message: String },
    /// The only fatal harvest failure: the initial listing could not be
    /// obtained at all, so there is nothing to iterate.
    #[error("initial listing unavailable for source {source_id}")]
    ListingUnavailable { source_id: String },
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Inter-request pacing, kept deliberately above zero in production to stay
/// within the remote hosts' fair-use limits.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Pause after each API listing page.
    pub page_delay: Duration,
    /// Pause after each asset download.
    pub download_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(1),
            download_delay: Duration::from_millis(500),
        }
    }
}

/// Counters reported after one source run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub source_id: String,
    pub items_discovered: usize,
    pub records_written: usize,
    pub items_skipped: usize,
    pub assets_saved: usize,
}

/// The harvest half of the pipeline: walks one source, extracts and
/// classifies every item, downloads validated assets into the raw layout
/// and appends one metadata line per kept record.
///
/// Execution is sequential: one item, one asset in flight at a time. Every
/// per-item and per-asset failure is logged and skipped; only the inability
/// to obtain the initial listing aborts the run.
pub struct Pipeline<'a> {
    renderer: &'a dyn PageRenderer,
    fetcher: &'a dyn Fetcher,
    probe: &'a dyn ImageProbe,
    classifier: &'a Classifier,
    layout: &'a DataLayout,
    settings: PipelineSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        renderer: &'a dyn PageRenderer,
        fetcher: &'a dyn Fetcher,
        probe: &'a dyn ImageProbe,
        classifier: &'a Classifier,
        layout: &'a DataLayout,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            renderer,
            fetcher,
            probe,
            classifier,
            layout,
            settings,
        }
    }

    pub async fn run_source(&self, source: &SourceSpec) -> Result<RunSummary, PipelineError> {
        let base_url =
            Url::parse(&source.base_url).map_err(|err| PipelineError::InvalidBaseUrl {
                source_id: source.id.clone(),
                message: err.to_string(),
            })?;

        let mut writer = JsonlWriter::create(self.layout.raw_jsonl())?;
        let store = AssetStore::new(
            self.fetcher,
            self.probe,
            self.layout,
            self.settings.download_delay,
        );

        let mut summary = RunSummary {
            source_id: source.id.clone(),
            items_discovered: 0,
            records_written: 0,
            items_skipped: 0,
            assets_saved: 0,
        };

        match &source.kind {
            SourceKind::Catalogue(catalogue) => {
                let outcome =
                    harvest_catalogue_links(self.renderer, &base_url, catalogue).await;
                if outcome.pages_fetched == 0 {
                    return Err(PipelineError::ListingUnavailable {
                        source_id: source.id.clone(),
                    });
                }
                summary.items_discovered = outcome.refs.len();

                for item in &outcome.refs {
                    let html = match self.renderer.load(&item.url).await {
                        Ok(html) => html,
                        Err(err) => {
                            pipeline_warn!("skipping item {} ({}): {err}", item.origin_id, item.url);
                            summary.items_skipped += 1;
                            continue;
                        }
                    };
                    let extracted = extract_catalogue_item(&html, item, &base_url);
                    self.finish_item(source, extracted, &store, &mut writer, &mut summary)
                        .await;
                }
            }
            SourceKind::WordPressApi(wp) => {
                let harvest =
                    harvest_api_posts(self.fetcher, wp, self.settings.page_delay).await;
                if harvest.aborted && harvest.posts.is_empty() {
                    return Err(PipelineError::ListingUnavailable {
                        source_id: source.id.clone(),
                    });
                }
                summary.items_discovered = harvest.posts.len();

                for post in &harvest.posts {
                    let Some(extracted) = extract_wp_post(post, &base_url) else {
                        pipeline_warn!(
                            "skipping malformed post object from {}",
                            source.id
                        );
                        summary.items_skipped += 1;
                        continue;
                    };
                    self.finish_item(source, extracted, &store, &mut writer, &mut summary)
                        .await;
                }
            }
        }

        pipeline_info!(
            "source {} done: {} discovered, {} records, {} skipped, {} assets",
            summary.source_id,
            summary.items_discovered,
            summary.records_written,
            summary.items_skipped,
            summary.assets_saved
        );
        Ok(summary)
    }

    /// Classify and download one extracted item's candidates, then persist
    /// its record if anything survived. Infallible from the caller's view:
    /// a failed append skips the item like any other per-item failure.
    async fn finish_item(
        &self,
        source: &SourceSpec,
        extracted: ExtractedItem,
        store: &AssetStore<'_>,
        writer: &mut JsonlWriter,
        summary: &mut RunSummary,
    ) {
        let mut record = ItemRecord {
            id: format!("{}_{}", source.id, extracted.origin_id),
            source_name: source.name.clone(),
            source_type: source.source_type.clone(),
            original_url: extracted.url,
            title: extracted.title,
            raw_content: extracted.body_text,
            images: Vec::new(),
            audio: Vec::new(),
            documents: Vec::new(),
            tags_scraped: extracted.tags,
            license_info: source.license.clone(),
            timestamp_scraped: Utc::now().to_rfc3339(),
            source_specific_metadata: Provenance {
                source_id: source.id.clone(),
                origin_id: extracted.origin_id.clone(),
                date_published: extracted.date_published,
                fields: extracted.metadata,
            },
        };

        for candidate in &extracted.candidates {
            let bucket = self.classifier.classify(&candidate.caption, candidate.kind);
            if bucket == Bucket::Rejected {
                let group = self
                    .classifier
                    .matched_group(&candidate.caption, candidate.kind)
                    .unwrap_or("no matching group");
                pipeline_info!(
                    "rejecting {:?} candidate ({group}): '{}'",
                    candidate.kind,
                    truncate_caption(&candidate.caption)
                );
                continue;
            }
            if let Some(asset) = store
                .fetch_and_validate(&source.id, &extracted.origin_id, candidate, bucket)
                .await
            {
                summary.assets_saved += 1;
                record.push_asset(bucket, asset);
            }
        }

        if record.has_assets() {
            match writer.append(&record) {
                Ok(()) => summary.records_written += 1,
                Err(err) => {
                    pipeline_warn!("failed to persist record {}: {err}", record.id);
                    summary.items_skipped += 1;
                }
            }
        } else {
            pipeline_debug!(
                "discarding record {} with no surviving assets",
                record.id
            );
        }
    }
}

fn truncate_caption(caption: &str) -> String {
    const MAX: usize = 60;
    if caption.chars().count() <= MAX {
        caption.to_string()
    } else {
        let cut: String = caption.chars().take(MAX).collect();
        format!("{cut}...")
    }
}
