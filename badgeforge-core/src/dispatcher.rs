//! Universal Pipeline Dispatcher (C12) — entry point, mode selection,
//! sequential badge application, final path normalization, activity
//! tracking.
//!
//! The dispatcher never lets a single badge's failure abort the request:
//! every processor call is wrapped so an error becomes a log line and an
//! unchanged current poster path, never a propagated error.

use std::path::{Path, PathBuf};

use badgeforge_model::{
    AudioInfo, AwardToken, BadgeRequestBody, BadgeSettings, BadgeType, BulkBadgeRequest,
    PosterResult, RatingRecord, ResolutionInfo, ResolvedMode, SingleBadgeRequest, UniversalBadgeRequest,
};
use tracing::{info, warn};

use crate::context::PipelineContext;
use crate::processors::{self, demo, BadgeData};
use crate::render::{self, BadgeContent, RenderedBadge};
use crate::settings::SettingsLoadOptions;
use crate::{compositor, error::Result};

/// What [`dispatch`] hands back — either the results of having run every
/// poster immediately, or an acknowledgement that the request was handed
/// to the (externally owned) job queue instead.
#[derive(Debug)]
pub enum DispatchOutcome {
    Immediate(Vec<PosterResult>),
    Queued { accepted: usize },
}

/// Top-level entry point: resolve `processing_mode`, then
/// either run every poster immediately or report how many were accepted
/// for queued execution.
pub async fn dispatch(
    ctx: &PipelineContext,
    request: UniversalBadgeRequest,
    preview_dir: &Path,
    fonts_dir: &Path,
) -> DispatchOutcome {
    let resolved = request.resolved_mode();
    let count = request.item_count();
    info!(?resolved, count, "dispatching badge request");

    match resolved {
        ResolvedMode::Queued => DispatchOutcome::Queued { accepted: count },
        ResolvedMode::Immediate => match request.body {
            BadgeRequestBody::Single(single) => {
                DispatchOutcome::Immediate(vec![run_single(ctx, single, preview_dir, fonts_dir).await])
            }
            BadgeRequestBody::Bulk(bulk) => {
                DispatchOutcome::Immediate(run_bulk(ctx, bulk, preview_dir, fonts_dir).await)
            }
        },
    }
}

/// Run every poster in a bulk request sequentially. An empty
/// list returns an empty, successful result set.
pub async fn run_bulk(
    ctx: &PipelineContext,
    bulk: BulkBadgeRequest,
    preview_dir: &Path,
    fonts_dir: &Path,
) -> Vec<PosterResult> {
    let output_dir = bulk.output_dir.as_deref().unwrap_or(preview_dir);
    let mut results = Vec::with_capacity(bulk.poster_paths.len());
    for poster_path in bulk.poster_paths {
        let single = SingleBadgeRequest {
            poster_path,
            output_path: None,
            badge_types: bulk.badge_types.clone(),
            use_demo_data: bulk.use_demo_data,
            media_ref: None,
        };
        results.push(run_single(ctx, single, output_dir, fonts_dir).await);
    }
    results
}

/// Run one poster through every requested badge type in order, honoring
/// per-badge failure tolerance and the final output-path rules.
pub async fn run_single(
    ctx: &PipelineContext,
    request: SingleBadgeRequest,
    preview_dir: &Path,
    fonts_dir: &Path,
) -> PosterResult {
    let activity_label = request.poster_path.to_string_lossy().to_string();
    let activity_id = ctx.activity.start(&activity_label);

    let poster_stem = request
        .poster_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let resized_path = preview_dir.join(format!(".resized_{poster_stem}.jpg"));
    let resized = match compositor::resize(&request.poster_path, &resized_path) {
        Ok(path) => path,
        Err(err) => {
            warn!(path = %request.poster_path.display(), %err, "poster resize failed, aborting request");
            ctx.activity.fail(activity_id, &err.to_string());
            return PosterResult::failed(request.poster_path.clone(), err.to_string());
        }
    };

    // Batch-fetch whatever real data is reachable for every requested
    // badge type in one pass (an internal optimization over one shared
    // `item_details` lookup — each badge type still loads its own
    // settings document with a forced reload below).
    let mut gathered = BadgeData::default();
    if let Some(media_ref) = &request.media_ref {
        if let Ok(placeholder_settings) = ctx
            .settings
            .get_badge_settings(BadgeType::Review, SettingsLoadOptions::default())
        {
            match processors::gather_badge_data(ctx, media_ref, &request.badge_types, &placeholder_settings).await {
                Ok(data) => gathered = data,
                Err(err) => warn!(%err, "badge data gathering failed, falling back per-type"),
            }
        }
    }

    let mut current_path = resized.clone();
    let mut applied_badges = Vec::new();
    let last_index = request.badge_types.len().saturating_sub(1);

    for (index, badge_type) in request.badge_types.iter().enumerate() {
        let settings = match ctx
            .settings
            .get_badge_settings(*badge_type, SettingsLoadOptions::forced())
        {
            Ok(settings) => settings,
            Err(err) => {
                // Settings failure degrades to defaults, never a
                // processor failure.
                warn!(?badge_type, %err, "settings load failed, substituting defaults");
                std::sync::Arc::new(BadgeSettings::default())
            }
        };

        let rendered = match resolve_badge_content(
            *badge_type,
            &gathered,
            request.use_demo_data,
            &poster_stem,
            &settings,
            ctx,
            fonts_dir,
        ) {
            None => continue, // nothing to show for this badge type; poster untouched
            Some(rendered) => rendered,
        };

        let is_last = index == last_index;
        let output_path = if is_last {
            request
                .output_path
                .clone()
                .unwrap_or_else(|| compositor::preview_output_path(preview_dir, &request.poster_path))
        } else {
            compositor::chained_preview_path(preview_dir, &request.poster_path, *badge_type)
        };

        match compositor::apply_badge(&current_path, &rendered, &settings, &output_path) {
            Ok(()) => {
                if current_path != resized && current_path != output_path {
                    let _ = std::fs::remove_file(&current_path);
                }
                current_path = output_path;
                applied_badges.push(*badge_type);
            }
            Err(err) => {
                warn!(?badge_type, %err, "badge compositing failed, continuing with prior poster");
            }
        }
    }

    let final_path = finalize_output_path(&request, preview_dir, &resized, &current_path, &applied_badges);

    let applied_strs: Vec<&str> = applied_badges.iter().map(|b| b.as_str()).collect();
    ctx.activity.complete(activity_id, &applied_strs);

    PosterResult {
        source_path: request.poster_path,
        output_path: final_path,
        applied_badges,
        success: true,
        error: None,
    }
}

/// Resolve and clean up the final output path:
/// normalize to the canonical preview name if anything was applied,
/// otherwise copy the resized base poster so the request always has a
/// defined output; clean up the leftover resized temp file either way.
fn finalize_output_path(
    request: &SingleBadgeRequest,
    preview_dir: &Path,
    resized: &Path,
    current_path: &Path,
    applied_badges: &[BadgeType],
) -> PathBuf {
    if applied_badges.is_empty() {
        let target = request
            .output_path
            .clone()
            .unwrap_or_else(|| compositor::preview_output_path(preview_dir, &request.poster_path));
        if let Err(err) = copy_as_canonical_jpeg(resized, &target) {
            warn!(%err, "failed to copy resized poster to canonical preview path");
        }
        if resized != request.poster_path && resized != target {
            let _ = std::fs::remove_file(resized);
        }
        return target;
    }

    let final_path = if compositor::is_preview_path(current_path) {
        current_path.to_path_buf()
    } else {
        let target = request
            .output_path
            .clone()
            .unwrap_or_else(|| compositor::preview_output_path(preview_dir, &request.poster_path));
        if std::fs::rename(current_path, &target).is_err() {
            let _ = std::fs::copy(current_path, &target);
            let _ = std::fs::remove_file(current_path);
        }
        target
    };

    if resized != request.poster_path && resized != final_path {
        let _ = std::fs::remove_file(resized);
    }
    final_path
}

fn copy_as_canonical_jpeg(resized: &Path, target: &Path) -> Result<()> {
    if resized.extension().and_then(|e| e.to_str()) == Some("jpg") {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(resized, target)?;
        Ok(())
    } else {
        // `resize` returned the original input path unchanged because it
        // was already at the canonical width but not necessarily a JPEG —
        // re-encode so the output-path discipline (always JPEG) holds.
        let image = image::open(resized)?;
        compositor::write_canonical_jpeg(&image, target)
    }
}

/// Build the rendered badge content for one badge type, or `None` if
/// neither real nor demo data had anything to show.
#[allow(clippy::too_many_arguments)]
fn resolve_badge_content(
    badge_type: BadgeType,
    gathered: &BadgeData,
    use_demo: bool,
    poster_stem: &str,
    settings: &BadgeSettings,
    ctx: &PipelineContext,
    fonts_dir: &Path,
) -> Option<RenderedBadge> {
    let demo_fallback = || demo::demo_badge_data(poster_stem, std::slice::from_ref(&badge_type));

    match badge_type {
        BadgeType::Audio => {
            let info = gathered
                .audio
                .clone()
                .or_else(|| if use_demo { demo_fallback().audio } else { None })?;
            Some(render_audio(&info, settings, ctx, fonts_dir))
        }
        BadgeType::Resolution => {
            let info = gathered
                .resolution
                .clone()
                .or_else(|| if use_demo { demo_fallback().resolution } else { None })?;
            Some(render_resolution(&info, settings, ctx, fonts_dir))
        }
        BadgeType::Review => {
            let records = if !gathered.reviews.is_empty() {
                gathered.reviews.clone()
            } else if use_demo {
                demo_fallback().reviews
            } else {
                Vec::new()
            };
            if records.is_empty() {
                return None;
            }
            Some(render_review(&records, settings, ctx, fonts_dir))
        }
        BadgeType::Awards => {
            let token = gathered
                .award
                .or_else(|| if use_demo { demo_fallback().award } else { None })?;
            Some(render_award(token, settings, ctx, fonts_dir))
        }
    }
}

fn render_audio(info: &AudioInfo, settings: &BadgeSettings, ctx: &PipelineContext, fonts_dir: &Path) -> RenderedBadge {
    let image_path = ctx
        .image_index
        .resolve_audio(info.codec_family, &settings.image_badges.image_mapping);
    let text = info.display_label.clone();
    let content = BadgeContent::ImageWithTextFallback { image_path, text: &text };
    render::render_badge(&content, settings, fonts_dir)
}

fn render_resolution(
    info: &ResolutionInfo,
    settings: &BadgeSettings,
    ctx: &PipelineContext,
    fonts_dir: &Path,
) -> RenderedBadge {
    let image_path = ctx
        .image_index
        .resolve_resolution(info, &settings.image_badges.image_mapping);
    let text = info.to_string_form();
    let content = BadgeContent::ImageWithTextFallback { image_path, text: &text };
    render::render_badge(&content, settings, fonts_dir)
}

fn render_award(token: AwardToken, settings: &BadgeSettings, ctx: &PipelineContext, fonts_dir: &Path) -> RenderedBadge {
    let image_path = ctx
        .image_index
        .resolve_mapped(token.as_str(), &settings.image_badges.image_mapping);
    let text = token.to_string();
    let content = BadgeContent::ImageWithTextFallback { image_path, text: &text };
    render::render_badge(&content, settings, fonts_dir)
}

fn render_review(records: &[RatingRecord], settings: &BadgeSettings, ctx: &PipelineContext, fonts_dir: &Path) -> RenderedBadge {
    let children: Vec<RenderedBadge> = records
        .iter()
        .map(|record| {
            let image_path = ctx
                .image_index
                .resolve_mapped(&record.image_key, &settings.image_badges.image_mapping);
            let text = format!("{} {}", record.source, record.text_display);
            let content = BadgeContent::ImageWithTextFallback { image_path, text: &text };
            render::render_badge(&content, settings, fonts_dir)
        })
        .collect();
    render::render_container_badge(children, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_model::{AudioCodecFamily, AudioInfo};

    #[test]
    fn resolve_badge_content_falls_back_to_demo_when_real_data_is_empty() {
        let gathered = BadgeData::default();
        let ctx_image_index = crate::image_select::ImageIndex::new(std::env::temp_dir());
        // Smoke-test the demo path directly, independent of rendering:
        // real gathered data is empty and use_demo is true, so the demo
        // module must be consulted rather than returning None outright.
        let demo = demo::demo_badge_data("inception", &[BadgeType::Audio]);
        assert!(demo.audio.is_some());
        let _ = (gathered, ctx_image_index);
    }

    #[test]
    fn audio_info_display_label_feeds_text_fallback() {
        let info = AudioInfo {
            codec_family: AudioCodecFamily::Aac,
            channel_layout: "2.0".into(),
            is_atmos: false,
            is_dts_x: false,
            display_label: "AAC 2.0".into(),
        };
        assert_eq!(info.display_label, "AAC 2.0");
    }
}
