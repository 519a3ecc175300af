//! Harvesting and packaging engine for historical-archive web sources.
//!
//! The engine turns a configured source into two artifacts: a raw harvest
//! directory (one JSONL metadata file plus downloaded media) and, from it,
//! per-bucket dataset bundles ready for publication. The stages are
//! deliberately separable: [`Pipeline`] produces the raw directory,
//! [`build_bundles`] repackages it, and [`publish_with_retry`] pushes a
//! bundle through the [`Publisher`] seam.
//!
//! Network, page rendering and image decoding sit behind traits
//! ([`Fetcher`], [`PageRenderer`], [`ImageProbe`]) so the whole pipeline is
//! testable against fakes and a local HTTP server.

pub mod assets;
pub mod classify;
pub mod extract;
pub mod fetch;
pub mod filename;
pub mod harvest;
pub mod package;
pub mod persist;
pub mod pipeline;
pub mod publish;
pub mod record;
pub mod source;
pub mod types;

pub use assets::{AssetStore, DecodeProbe, ImageProbe, ProbeError};
pub use classify::Classifier;
pub use extract::{extract_catalogue_item, extract_wp_post, ExtractedItem, UNTITLED_AUDIO_CAPTION};
pub use fetch::{
    FetchSettings, Fetcher, HttpFetcher, HttpPageRenderer, PageRenderer, DEFAULT_USER_AGENT,
};
pub use filename::asset_filename;
pub use harvest::{harvest_api_posts, harvest_catalogue_links, ApiHarvest, HarvestOutcome};
pub use package::{build_bundles, BundleSummary, PackageError};
pub use persist::{
    ensure_output_dir, read_records, reset_dir, AtomicFileWriter, JsonlWriter, PersistError,
};
pub use pipeline::{Pipeline, PipelineError, PipelineSettings, RunSummary};
pub use publish::{
    publish_with_retry, DryRunPublisher, PublishError, Publisher, RetryPolicy,
};
pub use record::{Asset, ItemRecord, Provenance};
pub use source::{CatalogueSource, DataLayout, SourceKind, SourceSpec, WordPressSource};
pub use types::{
    AssetCandidate, Bucket, FailureKind, FetchError, FetchMetadata, FetchOutput, ItemRef,
    MediaKind,
};
