//! Badge decoration pipeline CLI.
//!
//! Thin entry point wiring `badgeforge-core`'s [`PipelineContext`] and
//! `dispatcher` for command-line use. Any HTTP or job-queue surface sits
//! outside this crate; this binary drives the pipeline directly against
//! a settings directory and one or more posters.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use badgeforge_core::awards::AwardsTables;
use badgeforge_core::dominant::{DominantValueConfig, SeriesDominantCache};
use badgeforge_core::image_select::ImageIndex;
use badgeforge_core::media_client::StaticMediaMetadataClient;
use badgeforge_core::anime_map::BasicAnimeMapper;
use badgeforge_core::ratings::{AniDbRatingSource, JikanRatingSource, OmdbClient, TmdbRatingSource};
use badgeforge_core::settings::{SettingsGateway, SettingsLoadOptions};
use badgeforge_core::{dispatch, DispatchOutcome, PipelineContext};
use badgeforge_model::{
    BadgeRequestBody, BadgeType, BulkBadgeRequest, NullActivityTracker, ProcessingMode,
    SingleBadgeRequest, UniversalBadgeRequest,
};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Decorate one or more posters with audio/resolution/review/awards badges.
#[derive(Parser, Debug)]
#[command(name = "badgeforge")]
#[command(about = "Apply media-metadata badges to poster images")]
struct Args {
    /// Poster image(s) to decorate.
    #[arg(required = true)]
    posters: Vec<PathBuf>,

    /// Directory containing `badge_settings_*.yml` and `api_keys.yml`.
    #[arg(long, env = "BADGEFORGE_SETTINGS_DIR", default_value = "./settings")]
    settings_dir: PathBuf,

    /// Directory of `.png` badge images (audio/resolution/awards/review icons).
    #[arg(long, env = "BADGEFORGE_IMAGE_DIR", default_value = "./badge_images")]
    image_dir: PathBuf,

    /// Directory searched for `.ttf`/`.otf` font files.
    #[arg(long, env = "BADGEFORGE_FONTS_DIR", default_value = "./fonts")]
    fonts_dir: PathBuf,

    /// Directory previews are written to.
    #[arg(long, env = "BADGEFORGE_PREVIEW_DIR", default_value = "./previews")]
    preview_dir: PathBuf,

    /// Path the series dominant-value cache is persisted to.
    #[arg(long, env = "BADGEFORGE_CACHE_FILE", default_value = "./series_dominant_cache.json")]
    dominant_cache_file: PathBuf,

    /// Comma-separated badge types to apply, in order.
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = parse_badge_type,
        default_values_t = [BadgeType::Resolution, BadgeType::Audio, BadgeType::Awards, BadgeType::Review],
    )]
    badge_types: Vec<BadgeType>,

    /// Disable the deterministic demo-data fallback (there is no real
    /// media-server client wired into this CLI, so demo data is on by
    /// default whenever real data comes back empty).
    #[arg(long)]
    no_demo_data: bool,

    /// Force `queued` mode resolution regardless of request size.
    #[arg(long)]
    queued: bool,
}

fn parse_badge_type(s: &str) -> Result<BadgeType, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "audio" => Ok(BadgeType::Audio),
        "resolution" => Ok(BadgeType::Resolution),
        "review" => Ok(BadgeType::Review),
        "awards" => Ok(BadgeType::Awards),
        other => Err(format!("unknown badge type: {other}")),
    }
}

fn build_context(args: &Args) -> PipelineContext {
    let settings = Arc::new(SettingsGateway::new(&args.settings_dir));
    let http = reqwest::Client::new();
    let jikan = Arc::new(JikanRatingSource::new(http.clone()));

    let api_keys = settings.get_api_keys(SettingsLoadOptions::default()).ok();
    let omdb = api_keys
        .as_ref()
        .and_then(|keys| keys.omdb())
        .map(|cred| Arc::new(OmdbClient::new(http.clone(), cred.api_key.clone())));
    let tmdb = api_keys
        .as_ref()
        .and_then(|keys| keys.tmdb())
        .map(|cred| Arc::new(TmdbRatingSource::new(cred.api_key.clone())));
    let anidb = api_keys
        .as_ref()
        .and_then(|keys| keys.anidb())
        .map(|cred| Arc::new(AniDbRatingSource::new(http.clone(), cred.client_name.clone(), cred.version.clone())));

    PipelineContext {
        settings,
        media_client: Arc::new(StaticMediaMetadataClient::new()),
        image_index: Arc::new(ImageIndex::new(args.image_dir.clone())),
        omdb,
        tmdb,
        jikan: jikan.clone(),
        anidb,
        anime_mapper: Arc::new(BasicAnimeMapper::new(jikan)),
        awards_tables: Arc::new(AwardsTables::embedded()),
        dominant_cache: SeriesDominantCache::new(&args.dominant_cache_file),
        dominant_config: DominantValueConfig::default(),
        activity: Arc::new(NullActivityTracker),
    }
}

fn build_request(args: &Args) -> UniversalBadgeRequest {
    let processing_mode = if args.queued { ProcessingMode::Queued } else { ProcessingMode::Auto };

    let body = if args.posters.len() == 1 {
        BadgeRequestBody::Single(SingleBadgeRequest {
            poster_path: args.posters[0].clone(),
            output_path: None,
            badge_types: args.badge_types.clone(),
            use_demo_data: !args.no_demo_data,
            media_ref: None,
        })
    } else {
        BadgeRequestBody::Bulk(BulkBadgeRequest {
            poster_paths: args.posters.clone(),
            output_dir: Some(args.preview_dir.clone()),
            badge_types: args.badge_types.clone(),
            use_demo_data: !args.no_demo_data,
        })
    };

    UniversalBadgeRequest { body, processing_mode }
}

async fn run(args: Args) -> anyhow::Result<bool> {
    std::fs::create_dir_all(&args.preview_dir)?;

    let ctx = build_context(&args);
    let _persistence = ctx.dominant_cache.clone().spawn_persistence_task();

    let request = build_request(&args);
    let outcome = dispatch(&ctx, request, &args.preview_dir, &args.fonts_dir).await;

    match outcome {
        DispatchOutcome::Queued { accepted } => {
            info!(accepted, "request handed off to queued processing");
            Ok(true)
        }
        DispatchOutcome::Immediate(results) => {
            let mut all_ok = true;
            for result in &results {
                if result.success {
                    info!(
                        source = %result.source_path.display(),
                        output = %result.output_path.display(),
                        applied = ?result.applied_badges,
                        "poster decorated"
                    );
                } else {
                    all_ok = false;
                    error!(
                        source = %result.source_path.display(),
                        error = result.error.as_deref().unwrap_or("unknown error"),
                        "poster decoration failed"
                    );
                }
            }
            Ok(all_ok)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "badgeforge_server=info,badgeforge_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tokio::select! {
        result = run(args) => match result {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(err) => {
                error!(%err, "badgeforge run failed");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted");
            ExitCode::from(130)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Args {
        let mut full = vec!["badgeforge"];
        full.extend_from_slice(args);
        Args::parse_from(full)
    }

    #[test]
    fn parse_badge_type_accepts_known_names_case_insensitively() {
        assert_eq!(parse_badge_type("Audio").unwrap(), BadgeType::Audio);
        assert_eq!(parse_badge_type("resolution").unwrap(), BadgeType::Resolution);
        assert_eq!(parse_badge_type(" Awards ").unwrap(), BadgeType::Awards);
    }

    #[test]
    fn parse_badge_type_rejects_unknown_names() {
        assert!(parse_badge_type("subtitles").is_err());
    }

    #[test]
    fn single_poster_builds_single_request_body() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join("inception.jpg");
        std::fs::write(&poster, b"fake").unwrap();

        let args = parse(&[poster.to_str().unwrap()]);
        let request = build_request(&args);
        match request.body {
            BadgeRequestBody::Single(single) => assert_eq!(single.poster_path, poster),
            BadgeRequestBody::Bulk(_) => panic!("expected a single request body"),
        }
        assert!(matches!(request.resolved_mode(), badgeforge_model::ResolvedMode::Immediate));
    }

    #[test]
    fn multiple_posters_build_bulk_request_body() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        std::fs::write(&a, b"fake").unwrap();
        std::fs::write(&b, b"fake").unwrap();

        let args = parse(&[a.to_str().unwrap(), b.to_str().unwrap()]);
        let request = build_request(&args);
        match request.body {
            BadgeRequestBody::Bulk(bulk) => assert_eq!(bulk.poster_paths, vec![a, b]),
            BadgeRequestBody::Single(_) => panic!("expected a bulk request body"),
        }
    }

    #[test]
    fn queued_flag_forces_queued_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join("inception.jpg");
        std::fs::write(&poster, b"fake").unwrap();

        let args = parse(&["--queued", poster.to_str().unwrap()]);
        let request = build_request(&args);
        assert!(matches!(request.resolved_mode(), badgeforge_model::ResolvedMode::Queued));
    }

    #[test]
    fn no_demo_data_flag_disables_demo_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join("inception.jpg");
        std::fs::write(&poster, b"fake").unwrap();

        let args = parse(&["--no-demo-data", poster.to_str().unwrap()]);
        let request = build_request(&args);
        match request.body {
            BadgeRequestBody::Single(single) => assert!(!single.use_demo_data),
            BadgeRequestBody::Bulk(_) => panic!("expected a single request body"),
        }
    }
}
