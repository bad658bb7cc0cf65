use std::path::PathBuf;

use crate::badge_type::BadgeType;
use crate::media::MediaRef;

/// A single request fully resolved and ready for the dispatcher.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub poster_input_path: PathBuf,
    pub media_ref: Option<MediaRef>,
    pub badge_types: Vec<BadgeType>,
    pub use_demo_data: bool,
    pub final_output_path: Option<PathBuf>,
}

/// Per-badge outcome returned by every processor.
///
/// A processor must not fail the whole request when its data source
/// yields nothing — it returns `success = true, applied_badges = []`
/// and leaves the poster untouched. It fails only when rendering or
/// compositing itself errors.
#[derive(Debug, Clone)]
pub struct PosterResult {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub applied_badges: Vec<BadgeType>,
    pub success: bool,
    pub error: Option<String>,
}

impl PosterResult {
    pub fn unchanged(path: PathBuf) -> Self {
        Self {
            source_path: path.clone(),
            output_path: path,
            applied_badges: Vec::new(),
            success: true,
            error: None,
        }
    }

    pub fn applied(source: PathBuf, output: PathBuf, badge: BadgeType) -> Self {
        Self {
            source_path: source,
            output_path: output,
            applied_badges: vec![badge],
            success: true,
            error: None,
        }
    }

    pub fn failed(source: PathBuf, error: impl Into<String>) -> Self {
        Self {
            source_path: source.clone(),
            output_path: source,
            applied_badges: Vec::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Execution mode selection for the universal dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    Immediate,
    Queued,
    Auto,
}

impl ProcessingMode {
    /// `auto` resolves to `queued` once the bulk request exceeds 5 items,
    /// otherwise `immediate`.
    pub fn resolve(self, bulk_len: usize) -> ResolvedMode {
        match self {
            ProcessingMode::Immediate => ResolvedMode::Immediate,
            ProcessingMode::Queued => ResolvedMode::Queued,
            ProcessingMode::Auto if bulk_len > 5 => ResolvedMode::Queued,
            ProcessingMode::Auto => ResolvedMode::Immediate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedMode {
    Immediate,
    Queued,
}

/// One poster to decorate.
#[derive(Debug, Clone)]
pub struct SingleBadgeRequest {
    pub poster_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub badge_types: Vec<BadgeType>,
    pub use_demo_data: bool,
    pub media_ref: Option<MediaRef>,
}

/// Many posters to decorate in one call.
#[derive(Debug, Clone)]
pub struct BulkBadgeRequest {
    pub poster_paths: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub badge_types: Vec<BadgeType>,
    pub use_demo_data: bool,
}

/// Either shape a caller of the universal dispatcher can submit.
#[derive(Debug, Clone)]
pub enum BadgeRequestBody {
    Single(SingleBadgeRequest),
    Bulk(BulkBadgeRequest),
}

/// The dispatcher's entry-point request.
#[derive(Debug, Clone)]
pub struct UniversalBadgeRequest {
    pub body: BadgeRequestBody,
    pub processing_mode: ProcessingMode,
}

impl UniversalBadgeRequest {
    /// Number of posters this request ultimately covers — 1 for a single
    /// request, the bulk list length otherwise. Used by `ProcessingMode::
    /// resolve`.
    pub fn item_count(&self) -> usize {
        match &self.body {
            BadgeRequestBody::Single(_) => 1,
            BadgeRequestBody::Bulk(bulk) => bulk.poster_paths.len(),
        }
    }

    pub fn resolved_mode(&self) -> ResolvedMode {
        self.processing_mode.resolve(self.item_count())
    }
}
