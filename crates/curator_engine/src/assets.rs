use std::io::Cursor;
use std::time::Duration;

use chrono::Utc;
use pipeline_logging::pipeline_warn;
use thiserror::Error;

use crate::filename::asset_filename;
use crate::persist::AtomicFileWriter;
use crate::source::DataLayout;
use crate::{Asset, AssetCandidate, Bucket, Fetcher};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unrecognized image container: {0}")]
    UnknownFormat(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Image-decode collaborator: confirm the payload is a well-formed image
/// and report its pixel dimensions.
pub trait ImageProbe: Send + Sync {
    fn probe(&self, bytes: &[u8]) -> Result<(u32, u32), ProbeError>;
}

/// Probe backed by the `image` crate's format sniffing and header decode.
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeProbe;

impl ImageProbe for DecodeProbe {
    fn probe(&self, bytes: &[u8]) -> Result<(u32, u32), ProbeError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| ProbeError::UnknownFormat(err.to_string()))?;
        reader
            .into_dimensions()
            .map_err(|err| ProbeError::Decode(err.to_string()))
    }
}

/// Downloads classified candidates, validates the payload for the assigned
/// bucket and persists it under a collision-free filename in the raw layout.
pub struct AssetStore<'a> {
    fetcher: &'a dyn Fetcher,
    probe: &'a dyn ImageProbe,
    layout: &'a DataLayout,
    download_delay: Duration,
}

impl<'a> AssetStore<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        probe: &'a dyn ImageProbe,
        layout: &'a DataLayout,
        download_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            probe,
            layout,
            download_delay,
        }
    }

    /// Fetch and validate one candidate. Any failure — network error,
    /// undecodable image, empty audio payload — logs a warning and yields
    /// `None`; the caller cannot distinguish the cases and does not need to.
    ///
    /// Validation happens before the file is written, so the raw folder
    /// never holds a payload that failed its check.
    pub async fn fetch_and_validate(
        &self,
        source_id: &str,
        item_id: &str,
        candidate: &AssetCandidate,
        bucket: Bucket,
    ) -> Option<Asset> {
        let media_dir = self.layout.raw_media_dir(bucket)?;

        let output = match self.fetcher.get(&candidate.url).await {
            Ok(output) => output,
            Err(err) => {
                pipeline_warn!("asset download failed ({}): {err}", candidate.url);
                return None;
            }
        };
        let bytes = output.bytes;

        let (width, height) = match bucket {
            Bucket::Image | Bucket::Document => match self.probe.probe(&bytes) {
                Ok((w, h)) => (Some(w), Some(h)),
                Err(err) => {
                    pipeline_warn!(
                        "discarding undecodable {bucket} asset ({}): {err}",
                        candidate.url
                    );
                    return None;
                }
            },
            _ => {
                if bytes.is_empty() {
                    pipeline_warn!("discarding empty audio payload ({})", candidate.url);
                    return None;
                }
                (None, None)
            }
        };

        let file_name = asset_filename(
            source_id,
            item_id,
            candidate.index,
            Utc::now().timestamp_millis(),
            &candidate.url,
        );
        let writer = AtomicFileWriter::new(media_dir);
        if let Err(err) = writer.write_bytes(&file_name, &bytes) {
            pipeline_warn!("failed to persist asset {file_name}: {err}");
            return None;
        }

        tokio::time::sleep(self.download_delay).await;

        Some(Asset {
            file_name,
            original_url: candidate.url.clone(),
            raw_caption: candidate.caption.clone(),
            file_size_bytes: bytes.len() as u64,
            width,
            height,
        })
    }
}
