//! Badge Processors (C11) — one module per badge type, plus the demo-data
//! fallback every processor can be asked to use instead of a live media
//! server.

pub mod audio;
pub mod awards;
pub mod resolution;
pub mod review;

use badgeforge_model::{
    AudioInfo, AwardToken, BadgeSettings, BadgeType, MediaRef, RatingRecord, ResolutionInfo,
};

use crate::context::PipelineContext;
use crate::error::{CoreError, Result};

/// Everything the renderer (C9) needs to know about one poster, gathered
/// across whichever badge types were requested. Fields for types that
/// weren't requested (or that had nothing to say) stay at their default.
#[derive(Debug, Clone, Default)]
pub struct BadgeData {
    pub audio: Option<AudioInfo>,
    pub resolution: Option<ResolutionInfo>,
    pub reviews: Vec<RatingRecord>,
    pub award: Option<AwardToken>,
}

/// Run every requested badge type against the live media server and
/// upstream rating/anime/awards sources.
pub async fn gather_badge_data(
    ctx: &PipelineContext,
    media_ref: &MediaRef,
    badge_types: &[BadgeType],
    settings: &BadgeSettings,
) -> Result<BadgeData> {
    let details = ctx
        .media_client
        .item_details(media_ref)
        .await
        .map_err(|e| CoreError::Internal(e.to_string()))?;

    let mut data = BadgeData::default();

    for badge_type in badge_types {
        match badge_type {
            BadgeType::Audio => {
                data.audio = audio::resolve_audio_info(
                    &ctx.media_client,
                    media_ref,
                    ctx.dominant_config,
                    &ctx.dominant_cache,
                )
                .await;
            }
            BadgeType::Resolution => {
                data.resolution = resolution::resolve_resolution_info(
                    &ctx.media_client,
                    media_ref,
                    ctx.dominant_config,
                    &ctx.dominant_cache,
                )
                .await;
            }
            BadgeType::Review => {
                let sources = review::ReviewSources {
                    omdb: ctx.omdb.clone(),
                    tmdb: ctx.tmdb.clone(),
                    jikan: ctx.jikan.clone(),
                    anidb: ctx.anidb.clone(),
                    anime_mapper: ctx.anime_mapper.clone(),
                };
                let raw = review::fetch_all_records(&sources, &details, media_ref.kind).await;
                data.reviews = review::aggregate(raw, settings, details.is_anime);
            }
            BadgeType::Awards => {
                let sources = awards::AwardsSources {
                    omdb: ctx.omdb.clone(),
                    tmdb: ctx.tmdb.clone(),
                    tables: ctx.awards_tables.clone(),
                };
                data.award = awards::resolve_award(&sources, &details, media_ref.kind).await;
            }
        }
    }

    Ok(data)
}

/// Demo-data fallback used when a request sets `use_demo_data` — every
/// value is derived deterministically from the poster file's stem so
/// repeated runs against the same file produce the same badges, with no
/// media server or upstream rating source involved at all.
pub mod demo {
    use sha2::{Digest, Sha256};

    use badgeforge_model::{
        AudioCodecFamily, AudioInfo, AwardToken, BadgeType, BaseResolution, RatingRecord,
        RatingSource, ResolutionInfo,
    };

    use super::BadgeData;

    /// Hash a poster's file stem down to an index seed.
    fn seed(stem: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(stem.as_bytes());
        let digest = hasher.finalize();
        u64::from_be_bytes(digest[0..8].try_into().expect("digest is at least 8 bytes"))
    }

    fn demo_audio(stem: &str) -> AudioInfo {
        let family = AudioCodecFamily::PRIORITY[(seed(stem) % 8) as usize];
        const LAYOUTS: [&str; 3] = ["7.1", "5.1", "2.0"];
        let layout = LAYOUTS[(seed(stem) / 8 % 3) as usize].to_string();
        AudioInfo {
            codec_family: family,
            channel_layout: layout.clone(),
            is_atmos: family == AudioCodecFamily::DolbyAtmos,
            is_dts_x: family == AudioCodecFamily::DtsX,
            display_label: format!("{family} {layout}"),
        }
    }

    fn demo_resolution(stem: &str) -> ResolutionInfo {
        const TABLE: [(BaseResolution, bool, bool, bool); 6] = [
            (BaseResolution::K4, true, false, false),
            (BaseResolution::K4, false, true, false),
            (BaseResolution::P1080, false, false, true),
            (BaseResolution::P1080, false, false, false),
            (BaseResolution::K8, false, false, false),
            (BaseResolution::P720, false, false, false),
        ];
        let (base, is_dv, is_hdr_plus, is_hdr) = TABLE[(seed(stem) % TABLE.len() as u64) as usize];
        let (width, height) = match base {
            BaseResolution::P480 => (854, 480),
            BaseResolution::P576 => (1024, 576),
            BaseResolution::P720 => (1280, 720),
            BaseResolution::P1080 => (1920, 1080),
            BaseResolution::P1440 => (2560, 1440),
            BaseResolution::K4 => (3840, 2160),
            BaseResolution::K8 => (7680, 4320),
        };
        ResolutionInfo {
            height,
            width,
            base_resolution: base,
            is_hdr: is_hdr || is_dv || is_hdr_plus,
            is_dv,
            is_hdr_plus,
            codec: "HEVC".to_string(),
            color_space: Some("bt2020".to_string()),
            video_range: Some(if is_dv { "DOVI" } else { "SDR" }.to_string()),
            bit_depth: Some(10),
            bitrate: Some(18_000_000),
            profile: Some("Main 10".to_string()),
        }
    }

    fn demo_reviews(stem: &str) -> Vec<RatingRecord> {
        const PRESETS: [(RatingSource, f64, f64); 4] = [
            (RatingSource::ImdbTop250, 8.7, 10.0),
            (RatingSource::Tmdb, 8.1, 10.0),
            (RatingSource::RtCritics, 92.0, 100.0),
            (RatingSource::Metacritic, 78.0, 100.0),
        ];
        let offset = (seed(stem) % PRESETS.len() as u64) as usize;
        PRESETS
            .iter()
            .cycle()
            .skip(offset)
            .take(3)
            .map(|(source, score, max)| RatingRecord {
                source: *source,
                text_display: format!("{score:.1}"),
                numeric_score: *score,
                max_score: *max,
                image_key: source.image_key().to_string(),
                variant_tag: None,
            })
            .collect()
    }

    fn demo_award(stem: &str) -> Option<AwardToken> {
        const ROTATION: [Option<AwardToken>; 4] = [
            Some(AwardToken::Oscars),
            None,
            Some(AwardToken::Imdb),
            None,
        ];
        ROTATION[(seed(stem) % ROTATION.len() as u64) as usize]
    }

    /// Build demo badge data for exactly the badge types that were
    /// requested, leaving the rest at their defaults.
    pub fn demo_badge_data(poster_stem: &str, badge_types: &[BadgeType]) -> BadgeData {
        let mut data = BadgeData::default();
        for badge_type in badge_types {
            match badge_type {
                BadgeType::Audio => data.audio = Some(demo_audio(poster_stem)),
                BadgeType::Resolution => data.resolution = Some(demo_resolution(poster_stem)),
                BadgeType::Review => data.reviews = demo_reviews(poster_stem),
                BadgeType::Awards => data.award = demo_award(poster_stem),
            }
        }
        data
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn same_stem_yields_same_demo_data() {
            let a = demo_badge_data("inception", &[BadgeType::Audio, BadgeType::Resolution]);
            let b = demo_badge_data("inception", &[BadgeType::Audio, BadgeType::Resolution]);
            assert_eq!(a.audio, b.audio);
            assert_eq!(a.resolution, b.resolution);
        }

        #[test]
        fn unrequested_types_stay_empty() {
            let data = demo_badge_data("inception", &[BadgeType::Audio]);
            assert!(data.audio.is_some());
            assert!(data.resolution.is_none());
            assert!(data.reviews.is_empty());
            assert!(data.award.is_none());
        }
    }
}
