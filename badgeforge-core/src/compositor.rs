//! Poster Compositor (C10) — resizes to a canonical width and applies
//! badges sequentially while preserving a stable output-path discipline.

use std::path::{Path, PathBuf};

use badgeforge_model::settings::BadgePosition;
use badgeforge_model::{BadgeSettings, BadgeType};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use tracing::debug;

use crate::error::Result;
use crate::render::RenderedBadge;

/// Canonical poster width every request resizes to before any badge is
/// applied.
pub const CANONICAL_WIDTH: u32 = 1000;

/// JPEG quality used for every write the compositor performs.
const JPEG_QUALITY: u8 = 95;

/// Scale `poster` to [`CANONICAL_WIDTH`] preserving aspect ratio with a
/// high-quality resampler, writing the result to `output_path` as a
/// quality-95 JPEG. If the source is already exactly `CANONICAL_WIDTH`
/// wide, the input path is returned unchanged and nothing is written.
pub fn resize(poster_path: &Path, output_path: &Path) -> Result<PathBuf> {
    let image = image::open(poster_path)?;
    let (width, height) = image.dimensions();
    if width == CANONICAL_WIDTH {
        debug!(path = %poster_path.display(), "poster already at canonical width, skipping resize");
        return Ok(poster_path.to_path_buf());
    }

    let target_height = ((height as u64 * CANONICAL_WIDTH as u64) / width.max(1) as u64) as u32;
    let resized = image.resize_exact(CANONICAL_WIDTH, target_height.max(1), FilterType::Lanczos3);
    write_jpeg(&resized, output_path)?;
    Ok(output_path.to_path_buf())
}

/// Edge padding scaled by the poster's aspect ratio: a poster taller than
/// the canonical 2:3 movie-poster ratio gets proportionally more
/// padding so the badge sits the same visual distance from the edge
/// regardless of how the source poster was cropped.
fn dynamic_edge_padding(poster_width: u32, poster_height: u32, configured: u32) -> u32 {
    const REFERENCE_ASPECT: f64 = 3.0 / 2.0; // canonical movie-poster height:width
    let aspect = poster_height as f64 / poster_width.max(1) as f64;
    let scale = (aspect / REFERENCE_ASPECT).clamp(0.75, 1.5);
    ((configured as f64) * scale).round() as u32
}

/// Resolve the top-left paste coordinate for `badge_size` on a poster of
/// `poster_size`, for one of the ten named anchors.
fn anchor_position(
    position: BadgePosition,
    poster_size: (u32, u32),
    badge_size: (u32, u32),
    padding: u32,
) -> (i64, i64) {
    let (pw, ph) = poster_size;
    let (bw, bh) = badge_size;
    let left = padding as i64;
    let right = pw as i64 - bw as i64 - padding as i64;
    let top = padding as i64;
    let bottom = ph as i64 - bh as i64 - padding as i64;
    let h_center = (pw as i64 - bw as i64) / 2;
    let v_center = (ph as i64 - bh as i64) / 2;

    match position {
        BadgePosition::TopLeft => (left, top),
        BadgePosition::TopRight => (right, top),
        BadgePosition::BottomLeft => (left, bottom),
        BadgePosition::BottomRight => (right, bottom),
        BadgePosition::TopCenter => (h_center, top),
        BadgePosition::CenterLeft => (left, v_center),
        BadgePosition::Center => (h_center, v_center),
        BadgePosition::CenterRight => (right, v_center),
        BadgePosition::BottomCenter => (h_center, bottom),
        // "Flush" pins the badge exactly at the corner, ignoring padding.
        BadgePosition::BottomRightFlush => (pw as i64 - bw as i64, ph as i64 - bh as i64),
    }
}

/// Paste `badge` onto `poster_path` at the anchor named by
/// `settings.general.general_badge_position` and write the result as an
/// RGB JPEG to `output_path`.
pub fn apply_badge(
    poster_path: &Path,
    badge: &RenderedBadge,
    settings: &BadgeSettings,
    output_path: &Path,
) -> Result<()> {
    let poster = image::open(poster_path)?.to_rgba8();
    let (pw, ph) = poster.dimensions();
    let padding = dynamic_edge_padding(pw, ph, settings.general.general_edge_padding);
    let (x, y) = anchor_position(
        settings.general.general_badge_position,
        (pw, ph),
        badge.image.dimensions(),
        padding,
    );

    let mut canvas = poster;
    image::imageops::overlay(&mut canvas, &badge.image, x, y);
    write_jpeg(&DynamicImage::ImageRgba8(canvas), output_path)
}

/// Re-encode an already-loaded image as a canonical quality-95 JPEG at
/// `output_path`. Used when a poster was already at the canonical width
/// but not necessarily stored as a JPEG, so the output-path discipline
/// (every write is a JPEG) still holds.
pub fn write_canonical_jpeg(image: &DynamicImage, output_path: &Path) -> Result<()> {
    write_jpeg(image, output_path)
}

fn write_jpeg(image: &DynamicImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rgb: RgbImage = image.to_rgb8();
    flatten_and_encode(&rgb, output_path)
}

fn flatten_and_encode(rgb: &RgbImage, output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    DynamicImage::ImageRgb8(rgb.clone())
        .write_with_encoder(encoder)
        .map_err(crate::error::CoreError::Image)
}

/// Flatten an RGBA canvas straight to a JPEG without going through
/// `DynamicImage` — used when the caller already holds an [`RgbaImage`]
/// (e.g. the "no badge applied" copy path in the dispatcher).
pub fn write_rgba_as_jpeg(image: &RgbaImage, output_path: &Path) -> Result<()> {
    write_jpeg(&DynamicImage::ImageRgba8(image.clone()), output_path)
}

// ---------------------------------------------------------------------
// Output-path discipline
// ---------------------------------------------------------------------

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `true` once a path's basename already carries the `preview_` prefix.
pub fn is_preview_path(path: &Path) -> bool {
    basename(path).starts_with("preview_")
}

/// The canonical, non-chained preview path for a finished request:
/// `preview_<basename-of-input>.jpg` inside `preview_dir`.
pub fn preview_output_path(preview_dir: &Path, original_input: &Path) -> PathBuf {
    let stem = original_input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    preview_dir.join(format!("preview_{stem}.jpg"))
}

/// Intermediate, badge-type-tagged preview path used between badges in
/// a single request so each step's output is still traceable back to
/// its badge type (`preview_audio_<original>.jpg`). Strips any existing
/// `preview_` prefix from the original stem first so chains never nest
/// (`preview_preview_…`).
pub fn chained_preview_path(preview_dir: &Path, original_input: &Path, badge_type: BadgeType) -> PathBuf {
    let stem = original_input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let trimmed = stem.strip_prefix("preview_").unwrap_or(&stem);
    const KNOWN_TYPES: [BadgeType; 4] = [
        BadgeType::Audio,
        BadgeType::Resolution,
        BadgeType::Review,
        BadgeType::Awards,
    ];
    let trimmed = KNOWN_TYPES.iter().fold(trimmed.to_string(), |acc, ty| {
        acc.strip_prefix(&format!("{ty}_")).map(str::to_string).unwrap_or(acc)
    });
    preview_dir.join(format!("preview_{badge_type}_{trimmed}.jpg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_model::settings::GeneralSection;

    #[test]
    fn top_right_anchor_honors_padding() {
        let pos = anchor_position(BadgePosition::TopRight, (1000, 1500), (100, 100), 20);
        assert_eq!(pos, (880, 20));
    }

    #[test]
    fn center_anchor_centers_on_both_axes() {
        let pos = anchor_position(BadgePosition::Center, (1000, 1500), (100, 200), 20);
        assert_eq!(pos, (450, 650));
    }

    #[test]
    fn bottom_right_flush_ignores_padding() {
        let pos = anchor_position(BadgePosition::BottomRightFlush, (1000, 1500), (100, 100), 20);
        assert_eq!(pos, (900, 1400));
    }

    #[test]
    fn dynamic_padding_scales_with_taller_than_reference_aspect() {
        // reference aspect is 3:2 (height:width); a much taller poster
        // should get more padding than the configured baseline.
        let baseline = dynamic_edge_padding(1000, 1500, 24);
        let taller = dynamic_edge_padding(1000, 2200, 24);
        assert!(taller > baseline);
    }

    #[test]
    fn preview_output_path_prefixes_stem() {
        let path = preview_output_path(Path::new("/previews"), Path::new("/posters/inception.jpg"));
        assert_eq!(path, Path::new("/previews/preview_inception.jpg"));
    }

    #[test]
    fn chained_preview_path_does_not_nest_prefixes() {
        let first = chained_preview_path(Path::new("/p"), Path::new("/posters/inception.jpg"), BadgeType::Audio);
        assert_eq!(first, Path::new("/p/preview_audio_inception.jpg"));
        let second = chained_preview_path(Path::new("/p"), &first, BadgeType::Resolution);
        assert_eq!(second, Path::new("/p/preview_resolution_inception.jpg"));
    }

    #[test]
    fn general_section_default_has_sane_padding() {
        assert!(GeneralSection::default().general_edge_padding > 0);
    }
}
