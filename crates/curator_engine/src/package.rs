use std::fs;
use std::path::PathBuf;

use pipeline_logging::{pipeline_info, pipeline_warn};
use thiserror::Error;

use crate::assets::ImageProbe;
use crate::persist::{ensure_output_dir, read_records, reset_dir, AtomicFileWriter, JsonlWriter};
use crate::source::DataLayout;
use crate::{Asset, Bucket};

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("raw metadata file missing or unreadable: {0}")]
    RawData(String),
    #[error("persist error: {0}")]
    Persist(#[from] crate::PersistError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-bundle record and asset counts, used for the bundle README and the
/// run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub bucket: Bucket,
    pub records: usize,
    pub assets: usize,
    pub dir: PathBuf,
}

/// Rebuild every bucket's dataset bundle from the raw directory.
///
/// Bundle directories are wiped and rebuilt from scratch; packaging is not
/// incremental, so two runs over an unchanged raw directory produce the
/// same line and asset counts. Image and document files are validated a
/// second time here as a defense against partial writes: a file failing the
/// re-check is excluded from the bundle folder and from every record's
/// asset list, never surfaced as a hard error.
pub fn build_bundles(
    layout: &DataLayout,
    probe: &dyn ImageProbe,
) -> Result<Vec<BundleSummary>, PackageError> {
    let raw_path = layout.raw_jsonl();
    let records = read_records(&raw_path)
        .map_err(|err| PackageError::RawData(format!("{}: {err}", raw_path.display())))?;

    let mut summaries = Vec::with_capacity(Bucket::KEPT.len());
    for bucket in Bucket::KEPT {
        summaries.push(build_bundle(layout, probe, &records, bucket)?);
    }
    Ok(summaries)
}

fn build_bundle(
    layout: &DataLayout,
    probe: &dyn ImageProbe,
    records: &[crate::ItemRecord],
    bucket: Bucket,
) -> Result<BundleSummary, PackageError> {
    // KEPT buckets always carry directory names.
    let dir = layout
        .bundle_dir(bucket)
        .expect("kept bucket has a bundle dir");
    let media_dir = layout
        .bundle_media_dir(bucket)
        .expect("kept bucket has a media dir");

    reset_dir(&dir)?;
    ensure_output_dir(&media_dir)?;

    let mut jsonl = JsonlWriter::create(dir.join("data.jsonl"))?;
    let mut records_written = 0usize;
    let mut assets_copied = 0usize;

    for record in records {
        let Some(mut view) = record.bundle_view(bucket) else {
            continue;
        };

        let mut kept: Vec<Asset> = Vec::new();
        for asset in view.assets(bucket).cloned().unwrap_or_default() {
            if self_check(layout, probe, bucket, &asset) {
                let src = layout
                    .raw_media_dir(bucket)
                    .expect("kept bucket has a raw media dir")
                    .join(&asset.file_name);
                fs::copy(&src, media_dir.join(&asset.file_name))?;
                kept.push(asset);
            }
        }

        if kept.is_empty() {
            continue;
        }
        assets_copied += kept.len();
        if let Some(list) = view.assets_mut(bucket) {
            *list = kept;
        }
        jsonl.append(&view)?;
        records_written += 1;
    }

    write_readme(&dir, bucket, records_written, assets_copied)?;
    pipeline_info!(
        "{bucket} bundle: {records_written} records, {assets_copied} assets ({})",
        dir.display()
    );

    Ok(BundleSummary {
        bucket,
        records: records_written,
        assets: assets_copied,
        dir,
    })
}

/// Re-validate a persisted asset file before it enters a bundle.
fn self_check(
    layout: &DataLayout,
    probe: &dyn ImageProbe,
    bucket: Bucket,
    asset: &Asset,
) -> bool {
    let Some(raw_dir) = layout.raw_media_dir(bucket) else {
        return false;
    };
    let path = raw_dir.join(&asset.file_name);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            pipeline_warn!("bundle skips missing asset {}: {err}", path.display());
            return false;
        }
    };
    match bucket {
        Bucket::Image | Bucket::Document => match probe.probe(&bytes) {
            Ok(_) => true,
            Err(err) => {
                pipeline_warn!("bundle skips invalid {bucket} file {}: {err}", asset.file_name);
                false
            }
        },
        _ => {
            if bytes.is_empty() {
                pipeline_warn!("bundle skips empty audio file {}", asset.file_name);
                false
            } else {
                true
            }
        }
    }
}

fn write_readme(
    dir: &std::path::Path,
    bucket: Bucket,
    records: usize,
    assets: usize,
) -> Result<(), PackageError> {
    let media = bucket.dir_name().unwrap_or("media");
    let content = format!(
        "---\ndataset_info:\n  license: other\n---\n# {bucket} bundle\n\nThis dataset contains {records} items with {assets} {media} files, packaged\nfrom the raw harvest of this source. Metadata lives in `data.jsonl` (one\nJSON object per item); the files themselves are under `{media}/`.\n",
    );
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    writer.write("README.md", &content)?;
    Ok(())
}
