use std::fmt;

/// The media kind of a candidate as discovered in the page markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Audio,
}

/// Classification outcome for one asset candidate.
///
/// `Rejected` candidates are dropped before persistence; the other three
/// buckets each map to a raw media folder and a dataset bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Image,
    Audio,
    Document,
    Rejected,
}

impl Bucket {
    /// The buckets that are materialized on disk, in bundle order.
    pub const KEPT: [Bucket; 3] = [Bucket::Image, Bucket::Audio, Bucket::Document];

    /// Folder name used for this bucket's assets, `None` for `Rejected`.
    pub fn dir_name(self) -> Option<&'static str> {
        match self {
            Bucket::Image => Some("images"),
            Bucket::Audio => Some("audio"),
            Bucket::Document => Some("documents"),
            Bucket::Rejected => None,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Image => write!(f, "image"),
            Bucket::Audio => write!(f, "audio"),
            Bucket::Document => write!(f, "document"),
            Bucket::Rejected => write!(f, "rejected"),
        }
    }
}

/// A discovered item: canonical URL plus the origin-specific trailing id.
///
/// Deduplicated by normalized URL (query stripped, trailing slash trimmed)
/// during harvesting; consumed once by the extraction stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub url: String,
    pub origin_id: String,
}

/// One media reference discovered inside an item. Ephemeral: lives only
/// through classification and the download step of a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCandidate {
    /// Absolute URL, already resolved against the source base URL.
    pub url: String,
    pub caption: String,
    /// Positional index within the item, used for filename disambiguation.
    pub index: usize,
    pub kind: MediaKind,
}

/// Raw bytes plus transport metadata returned by a [`crate::Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    NotUtf8,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::NotUtf8 => write!(f, "response body is not valid utf-8"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
