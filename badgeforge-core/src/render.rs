//! Badge Renderer (C9) — produces a single RGBA image per badge: text,
//! image-with-background, or a multi-row/column review container.
//!
//! The renderer never touches its inputs — every function here takes a
//! settings document and some content and returns a freshly allocated
//! `RgbaImage`. Font/mask/compose failures degrade rather than panic:
//! a missing font falls back to a plain rectangle, a missing badge image
//! falls back to text (when `fallback_to_text` allows it).

use std::path::{Path, PathBuf};

use badgeforge_model::settings::{BadgeOrientation, ShadowSection, TextSection};
use badgeforge_model::BadgeSettings;
use image::{Rgba, RgbaImage};
use tracing::warn;

use crate::error::Result;

/// One rendered badge, ready to be pasted onto a poster by the
/// compositor (C10).
#[derive(Debug, Clone)]
pub struct RenderedBadge {
    pub image: RgbaImage,
}

/// What a single call into the renderer is asked to produce.
pub enum BadgeContent<'a> {
    Text(&'a str),
    Image(PathBuf),
    /// An image badge that degrades to text when the image is missing or
    /// `enable_image_badges` is off and `fallback_to_text` allows it.
    ImageWithTextFallback {
        image_path: Option<PathBuf>,
        text: &'a str,
    },
}

/// Entry point used by the badge processors: dispatch on content kind,
/// applying the image→text fallback rule where applicable.
pub fn render_badge(content: &BadgeContent<'_>, settings: &BadgeSettings, fonts_dir: &Path) -> RenderedBadge {
    match content {
        BadgeContent::Text(text) => render_text_badge(text, settings, fonts_dir),
        BadgeContent::Image(path) => match render_image_badge(path, settings) {
            Ok(badge) => badge,
            Err(err) => {
                warn!(%err, path = %path.display(), "image badge render failed, falling back to text");
                render_text_badge(&path.to_string_lossy(), settings, fonts_dir)
            }
        },
        BadgeContent::ImageWithTextFallback { image_path, text } => {
            if settings.image_badges.enable_image_badges {
                if let Some(path) = image_path {
                    match render_image_badge(path, settings) {
                        Ok(badge) => return badge,
                        Err(err) => warn!(%err, path = %path.display(), "image badge unavailable"),
                    }
                }
            }
            render_text_badge(text, settings, fonts_dir)
        }
    }
}

// ---------------------------------------------------------------------
// Color parsing
// ---------------------------------------------------------------------

/// Parse a hex color, tolerating a leading `#`, 3- or 6-digit forms, and
/// incidental wrapping characters (backticks, quotes):
/// `parse("#AABBCC") == parse(" \`AABBCC\` ") == parse("AABBCC")`.
pub fn parse_color(input: &str) -> Option<Rgba<u8>> {
    let trimmed = input.trim().trim_matches(|c| matches!(c, '`' | '\'' | '"'));
    let trimmed = trimmed.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let expanded = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => hex.to_string(),
        _ => return None,
    };
    let r = u8::from_str_radix(&expanded[0..2], 16).ok()?;
    let g = u8::from_str_radix(&expanded[2..4], 16).ok()?;
    let b = u8::from_str_radix(&expanded[4..6], 16).ok()?;
    Some(Rgba([r, g, b, 255]))
}

/// Parse a color, substituting `default` and logging a warning on
/// failure rather than propagating an error.
fn parse_color_or_default(input: &str, default: Rgba<u8>) -> Rgba<u8> {
    parse_color(input).unwrap_or_else(|| {
        warn!(color = input, "invalid color string, substituting default");
        default
    })
}

fn with_opacity(color: Rgba<u8>, opacity_percent: u8) -> Rgba<u8> {
    let alpha = (opacity_percent.min(100) as u32 * 255 / 100) as u8;
    Rgba([color[0], color[1], color[2], alpha])
}

// ---------------------------------------------------------------------
// Font loading
// ---------------------------------------------------------------------

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/msttcorefonts",
    "/usr/share/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts",
];

fn candidate_font_paths(family: &str, fonts_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let direct = PathBuf::from(family);
    if direct.is_absolute() || direct.extension().is_some() {
        candidates.push(direct);
    }
    for ext in ["ttf", "otf"] {
        candidates.push(fonts_dir.join(format!("{family}.{ext}")));
        for dir in SYSTEM_FONT_DIRS {
            candidates.push(Path::new(dir).join(format!("{family}.{ext}")));
        }
    }
    candidates
}

fn try_load_font_file(path: &Path) -> Option<fontdue::Font> {
    let bytes = std::fs::read(path).ok()?;
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).ok()
}

/// Direct path, fonts dir, then system font directories, trying `font`
/// first and `fallback_font` second. `None` means neither
/// family could be found or parsed anywhere — the caller degrades to a
/// plain rectangle.
fn load_font(text: &TextSection, fonts_dir: &Path) -> Option<fontdue::Font> {
    for path in candidate_font_paths(&text.font, fonts_dir) {
        if let Some(font) = try_load_font_file(&path) {
            return Some(font);
        }
    }
    for path in candidate_font_paths(&text.fallback_font, fonts_dir) {
        if let Some(font) = try_load_font_file(&path) {
            return Some(font);
        }
    }
    warn!(font = %text.font, fallback = %text.fallback_font, "no font file found on any search path, rendering without text");
    None
}

/// Rasterize a single line of text into its own tightly cropped RGBA
/// image using the font's coverage bitmaps as an alpha mask.
fn rasterize_text(font: &fontdue::Font, text: &str, size_px: f32, color: Rgba<u8>) -> RgbaImage {
    let line_metrics = font
        .horizontal_line_metrics(size_px)
        .unwrap_or(fontdue::LineMetrics {
            ascent: size_px,
            descent: -size_px * 0.2,
            line_gap: 0.0,
            new_line_size: size_px,
        });

    struct Glyph {
        x_cursor: f32,
        metrics: fontdue::Metrics,
        bitmap: Vec<u8>,
    }

    let mut glyphs = Vec::new();
    let mut cursor = 0.0f32;
    for ch in text.chars() {
        let (metrics, bitmap) = font.rasterize(ch, size_px);
        glyphs.push(Glyph { x_cursor: cursor, metrics, bitmap });
        cursor += glyphs.last().unwrap().metrics.advance_width;
    }

    let width = cursor.ceil().max(1.0) as u32;
    let height = (line_metrics.ascent - line_metrics.descent).ceil().max(1.0) as u32;
    let mut out = RgbaImage::new(width, height);

    for glyph in &glyphs {
        let origin_x = glyph.x_cursor + glyph.metrics.xmin as f32;
        let origin_y = line_metrics.ascent - glyph.metrics.ymin as f32 - glyph.metrics.height as f32;
        for row in 0..glyph.metrics.height {
            for col in 0..glyph.metrics.width {
                let coverage = glyph.bitmap[row * glyph.metrics.width + col];
                if coverage == 0 {
                    continue;
                }
                let px = origin_x as i64 + col as i64;
                let py = origin_y as i64 + row as i64;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    continue;
                }
                let alpha = (coverage as u32 * color[3] as u32 / 255) as u8;
                out.put_pixel(px as u32, py as u32, Rgba([color[0], color[1], color[2], alpha]));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------
// Background + border canvas shared by every badge kind
// ---------------------------------------------------------------------

fn build_background_canvas(width: u32, height: u32, settings: &BadgeSettings) -> RgbaImage {
    let background = with_opacity(
        parse_color_or_default(&settings.background.background_color, Rgba([0, 0, 0, 255])),
        settings.background.background_opacity,
    );
    let mut canvas = RgbaImage::from_pixel(width.max(1), height.max(1), background);

    let border_width = settings.border.border_width;
    if border_width > 0 {
        let border_color = parse_color_or_default(&settings.border.border_color, Rgba([255, 255, 255, 255]));
        draw_border_ring(&mut canvas, border_width, border_color);
    }
    canvas
}

fn draw_border_ring(canvas: &mut RgbaImage, width: u32, color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    for y in 0..h {
        for x in 0..w {
            let on_border = x < width || y < width || x + width >= w || y + width >= h;
            if on_border {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}

/// Effective radius = `min(configured, w/4, h/4)`, applied as a
/// compositional alpha mask over the already-composed background+border
/// layer. Pure pixel arithmetic — this step cannot fail; a zero radius
/// is simply a no-op.
fn apply_rounded_corners(mut canvas: RgbaImage, configured_radius: u32) -> RgbaImage {
    let (w, h) = canvas.dimensions();
    let radius = configured_radius.min(w / 4).min(h / 4);
    if radius == 0 {
        return canvas;
    }
    for y in 0..h {
        for x in 0..w {
            if corner_mask_is_outside(x, y, w, h, radius) {
                let p = *canvas.get_pixel(x, y);
                canvas.put_pixel(x, y, Rgba([p[0], p[1], p[2], 0]));
            }
        }
    }
    canvas
}

fn corner_mask_is_outside(x: u32, y: u32, w: u32, h: u32, radius: u32) -> bool {
    let left = x < radius;
    let right = x + radius >= w;
    let top = y < radius;
    let bottom = y + radius >= h;

    let center = if left && top {
        (radius, radius)
    } else if right && top {
        (w - radius, radius)
    } else if left && bottom {
        (radius, h - radius)
    } else if right && bottom {
        (w - radius, h - radius)
    } else {
        return false;
    };

    let dx = x as f32 + 0.5 - center.0 as f32;
    let dy = y as f32 + 0.5 - center.1 as f32;
    (dx * dx + dy * dy).sqrt() > radius as f32
}

/// Optional Gaussian-ish blur of the badge silhouette, offset, and
/// composited behind the badge into a larger canvas. Implemented as three passes of a separable box blur over
/// the silhouette's alpha channel, which converges visually close to a
/// true Gaussian without pulling in a second blur implementation.
fn apply_shadow(badge: RgbaImage, shadow: &ShadowSection) -> RgbaImage {
    if !shadow.shadow_enable {
        return badge;
    }
    let blur_radius = shadow.shadow_blur.max(1);
    let (w, h) = badge.dimensions();
    let margin = blur_radius * 2 + shadow.shadow_offset_x.unsigned_abs() + shadow.shadow_offset_y.unsigned_abs();
    let canvas_w = w + margin * 2;
    let canvas_h = h + margin * 2;

    let mut silhouette = RgbaImage::new(canvas_w, canvas_h);
    for y in 0..h {
        for x in 0..w {
            let alpha = badge.get_pixel(x, y)[3];
            if alpha == 0 {
                continue;
            }
            let sx = x as i64 + margin as i64 + shadow.shadow_offset_x as i64;
            let sy = y as i64 + margin as i64 + shadow.shadow_offset_y as i64;
            if sx >= 0 && sy >= 0 && (sx as u32) < canvas_w && (sy as u32) < canvas_h {
                silhouette.put_pixel(sx as u32, sy as u32, Rgba([0, 0, 0, alpha]));
            }
        }
    }

    let blurred = box_blur_alpha(silhouette, blur_radius);
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    image::imageops::overlay(&mut canvas, &blurred, 0, 0);
    image::imageops::overlay(&mut canvas, &badge, margin as i64, margin as i64);
    canvas
}

fn box_blur_alpha(mut image: RgbaImage, radius: u32) -> RgbaImage {
    for _ in 0..3 {
        image = box_blur_pass(&image, radius, true);
        image = box_blur_pass(&image, radius, false);
    }
    image
}

fn box_blur_pass(image: &RgbaImage, radius: u32, horizontal: bool) -> RgbaImage {
    let (w, h) = image.dimensions();
    let mut out = image.clone();
    let r = radius as i64;
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0u32;
            let mut count = 0u32;
            for d in -r..=r {
                let (sx, sy) = if horizontal { (x as i64 + d, y as i64) } else { (x as i64, y as i64 + d) };
                if sx >= 0 && sy >= 0 && (sx as u32) < w && (sy as u32) < h {
                    sum += image.get_pixel(sx as u32, sy as u32)[3] as u32;
                    count += 1;
                }
            }
            let mut pixel = *out.get_pixel(x, y);
            pixel[3] = (sum / count.max(1)) as u8;
            out.put_pixel(x, y, pixel);
        }
    }
    out
}

// ---------------------------------------------------------------------
// Per-kind renderers
// ---------------------------------------------------------------------

/// Text badge: dimensions are either the configured fixed square or
/// derived from the text bounding box plus padding plus border width.
/// Never fails — a missing font degrades to a plain
/// rectangle with no glyphs drawn.
pub fn render_text_badge(text: &str, settings: &BadgeSettings, fonts_dir: &Path) -> RenderedBadge {
    let text_color = parse_color_or_default(&settings.text.text_color, Rgba([255, 255, 255, 255]));
    let font = load_font(&settings.text, fonts_dir);
    let glyph_image = font.as_ref().map(|f| rasterize_text(f, text, settings.text.text_size as f32, text_color));

    let padding = settings.general.general_text_padding;
    let border = settings.border.border_width;
    let (content_w, content_h) = glyph_image
        .as_ref()
        .map(|img| (img.width(), img.height()))
        .unwrap_or((0, settings.text.text_size));

    let (width, height) = if settings.general.use_dynamic_sizing {
        (content_w + padding * 2 + border * 2, content_h + padding * 2 + border * 2)
    } else {
        (settings.general.general_badge_size, settings.general.general_badge_size)
    };

    let mut canvas = build_background_canvas(width, height, settings);
    if let Some(glyphs) = glyph_image {
        let ox = canvas.width().saturating_sub(glyphs.width()) / 2;
        let oy = canvas.height().saturating_sub(glyphs.height()) / 2;
        image::imageops::overlay(&mut canvas, &glyphs, ox as i64, oy as i64);
    }

    let canvas = apply_rounded_corners(canvas, settings.border.border_radius);
    let canvas = apply_shadow(canvas, &settings.shadow);
    RenderedBadge { image: canvas }
}

/// Image badge: load an image by path, optionally overlay
/// background/border from settings.
pub fn render_image_badge(image_path: &Path, settings: &BadgeSettings) -> Result<RenderedBadge> {
    let loaded = image::open(image_path)?.to_rgba8();
    let padding = settings.image_badges.image_padding;
    let border = settings.border.border_width;

    let (width, height) = if settings.general.use_dynamic_sizing {
        (loaded.width() + padding * 2 + border * 2, loaded.height() + padding * 2 + border * 2)
    } else {
        (settings.general.general_badge_size, settings.general.general_badge_size)
    };

    let mut canvas = build_background_canvas(width, height, settings);
    let ox = canvas.width().saturating_sub(loaded.width()) / 2;
    let oy = canvas.height().saturating_sub(loaded.height()) / 2;
    image::imageops::overlay(&mut canvas, &loaded, ox as i64, oy as i64);

    let canvas = apply_rounded_corners(canvas, settings.border.border_radius);
    let canvas = apply_shadow(canvas, &settings.shadow);
    Ok(RenderedBadge { image: canvas })
}

/// Container badge (review only): lay out N child badges in a row or
/// column, center-aligned on the cross axis, with a 3x spacing
/// multiplier and extra top/bottom padding in vertical mode.
pub fn render_container_badge(children: Vec<RenderedBadge>, settings: &BadgeSettings) -> RenderedBadge {
    let images: Vec<RgbaImage> = children.into_iter().map(|b| b.image).collect();
    if images.is_empty() {
        return RenderedBadge { image: RgbaImage::new(1, 1) };
    }

    let spacing = settings.general.badge_spacing;
    match settings.general.badge_orientation {
        BadgeOrientation::Horizontal => {
            let total_width: u32 = images.iter().map(|i| i.width()).sum::<u32>() + spacing * (images.len() as u32 - 1);
            let max_height = images.iter().map(|i| i.height()).max().unwrap_or(1);
            let mut canvas = RgbaImage::new(total_width.max(1), max_height.max(1));
            let mut cursor = 0i64;
            for image in &images {
                let oy = (max_height.saturating_sub(image.height()) / 2) as i64;
                image::imageops::overlay(&mut canvas, image, cursor, oy);
                cursor += image.width() as i64 + spacing as i64;
            }
            RenderedBadge { image: canvas }
        }
        BadgeOrientation::Vertical => {
            let vertical_spacing = spacing * 3;
            let extra_padding = spacing;
            let max_width = images.iter().map(|i| i.width()).max().unwrap_or(1);
            let total_height: u32 = images.iter().map(|i| i.height()).sum::<u32>()
                + vertical_spacing * (images.len() as u32 - 1)
                + extra_padding * 2;
            let mut canvas = RgbaImage::new(max_width.max(1), total_height.max(1));
            let mut cursor = extra_padding as i64;
            for image in &images {
                let ox = (max_width.saturating_sub(image.width()) / 2) as i64;
                image::imageops::overlay(&mut canvas, image, ox, cursor);
                cursor += image.height() as i64 + vertical_spacing as i64;
            }
            RenderedBadge { image: canvas }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parsing_tolerates_hash_backticks_and_case() {
        let a = parse_color("#AABBCC").unwrap();
        let b = parse_color(" `AABBCC` ").unwrap();
        let c = parse_color("AABBCC").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn three_digit_hex_expands_each_channel() {
        let short = parse_color("#0F0").unwrap();
        let long = parse_color("#00FF00").unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn invalid_color_yields_none_so_caller_can_substitute() {
        assert!(parse_color("not-a-color").is_none());
    }

    #[test]
    fn rounded_corner_radius_is_capped_at_quarter_dimension() {
        let canvas = RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255]));
        let rounded = apply_rounded_corners(canvas, 1000);
        // capped at w/4 = 10: the exact corner pixel (0,0) must be masked out.
        assert_eq!(rounded.get_pixel(0, 0)[3], 0);
        // center stays fully opaque regardless of how large the configured radius was.
        assert_eq!(rounded.get_pixel(20, 20)[3], 255);
    }

    #[test]
    fn horizontal_container_sums_widths_plus_spacing() {
        let mut settings = BadgeSettings::default();
        settings.general.badge_orientation = BadgeOrientation::Horizontal;
        settings.general.badge_spacing = 5;
        let a = RenderedBadge { image: RgbaImage::new(10, 20) };
        let b = RenderedBadge { image: RgbaImage::new(15, 10) };
        let container = render_container_badge(vec![a, b], &settings);
        assert_eq!(container.image.width(), 10 + 15 + 5);
        assert_eq!(container.image.height(), 20);
    }

    #[test]
    fn vertical_container_uses_triple_spacing_and_extra_padding() {
        let mut settings = BadgeSettings::default();
        settings.general.badge_orientation = BadgeOrientation::Vertical;
        settings.general.badge_spacing = 4;
        let a = RenderedBadge { image: RgbaImage::new(10, 10) };
        let b = RenderedBadge { image: RgbaImage::new(10, 10) };
        let container = render_container_badge(vec![a, b], &settings);
        // 10 + 10 + (4*3) + (4*2) = 10+10+12+8 = 40
        assert_eq!(container.image.height(), 40);
    }
}
