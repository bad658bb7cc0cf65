//! Audio Processor (C11a) — classification
//! plus the processor's data-source selection order.

use std::sync::Arc;

use badgeforge_model::{AudioCodecFamily, AudioInfo, AudioStream, MediaKind, MediaRef};
use tracing::debug;

use crate::dominant::{dominant_audio, series_cache_key, DominantValueConfig, SeriesDominantCache};
use crate::media_client::MediaMetadataClient;

/// Substrings (case-insensitive) that mark a stream as carrying Dolby
/// Atmos or DTS-X, scanned across codec/profile/display-title.
const ATMOS_PATTERNS: &[&str] = &["ATMOS"];
const DTS_X_PATTERNS: &[&str] = &["DTS:X", "DTS-X", "DTSX"];

fn matches_any(haystack: &str, patterns: &[&str]) -> bool {
    let upper = haystack.to_ascii_uppercase();
    patterns.iter().any(|p| upper.contains(&p.to_ascii_uppercase()))
}

fn scan_fields(stream: &AudioStream) -> Vec<&str> {
    let mut fields = vec![stream.codec.as_str()];
    if let Some(p) = stream.profile.as_deref() {
        fields.push(p);
    }
    if let Some(t) = stream.title.as_deref() {
        fields.push(t);
    }
    fields
}

/// Canonical codec-family classification, in priority order:
/// `Dolby Atmos > DTS-X > TrueHD > DTS-HD MA > Dolby Digital Plus >
/// Dolby Digital > DTS > AAC`.
pub fn classify(stream: &AudioStream) -> AudioInfo {
    let fields = scan_fields(stream);
    let is_atmos = fields.iter().any(|f| matches_any(f, ATMOS_PATTERNS));
    let is_dts_x = fields.iter().any(|f| matches_any(f, DTS_X_PATTERNS));
    let codec_upper = stream.codec.to_ascii_uppercase();
    let profile_upper = stream.profile.as_deref().unwrap_or("").to_ascii_uppercase();

    let codec_family = if is_atmos {
        AudioCodecFamily::DolbyAtmos
    } else if is_dts_x {
        AudioCodecFamily::DtsX
    } else if codec_upper.contains("TRUEHD") {
        AudioCodecFamily::TrueHd
    } else if profile_upper.contains("MA") && (codec_upper.contains("DTS") || profile_upper.contains("DTS")) {
        AudioCodecFamily::DtsHdMa
    } else if codec_upper.contains("EAC3") || codec_upper.contains("DDP") || profile_upper.contains("DIGITAL PLUS") {
        AudioCodecFamily::DolbyDigitalPlus
    } else if codec_upper.contains("AC3") {
        AudioCodecFamily::DolbyDigital
    } else if codec_upper.contains("DTS") {
        AudioCodecFamily::Dts
    } else {
        AudioCodecFamily::Aac
    };

    let channel_layout = stream
        .layout
        .clone()
        .unwrap_or_else(|| format!("{:.1}", stream.channels as f64));

    AudioInfo {
        codec_family,
        channel_layout,
        is_atmos,
        is_dts_x,
        display_label: format!("{codec_family} {}", stream.layout.as_deref().unwrap_or("")),
    }
}

/// Resolve audio data by source order: movie/episode reads the first
/// audio stream directly; series/season
/// delegates to the dominant-value analyzer (C6); anything else yields
/// nothing.
pub async fn resolve_audio_info(
    client: &Arc<dyn MediaMetadataClient>,
    media_ref: &MediaRef,
    config: DominantValueConfig,
    dominant_cache: &Arc<SeriesDominantCache>,
) -> Option<AudioInfo> {
    match media_ref.kind {
        MediaKind::Movie | MediaKind::Episode => {
            let streams = client.media_streams(media_ref).await.ok()?;
            let info = streams.first_audio().map(classify);
            if info.is_none() {
                debug!(?media_ref, "no audio stream available for item");
            }
            info
        }
        MediaKind::Series | MediaKind::Season => {
            let key = series_cache_key(media_ref);
            if let Some(cached) = dominant_cache.get_audio(key).await {
                return Some(cached);
            }
            let episodes = client.episodes(media_ref).await.ok()?;
            if episodes.is_empty() {
                return None;
            }
            let value = dominant_audio(client, &episodes, config).await;
            dominant_cache.put_audio(key, value.clone()).await;
            Some(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(codec: &str) -> AudioStream {
        AudioStream {
            codec: codec.to_string(),
            channels: 6,
            ..Default::default()
        }
    }

    #[test]
    fn atmos_substring_in_profile_wins_over_codec() {
        let mut s = stream("TRUEHD");
        s.profile = Some("Dolby Atmos".into());
        assert_eq!(classify(&s).codec_family, AudioCodecFamily::DolbyAtmos);
    }

    #[test]
    fn truehd_without_atmos_classifies_as_truehd() {
        assert_eq!(classify(&stream("TrueHD")).codec_family, AudioCodecFamily::TrueHd);
    }

    #[test]
    fn eac3_classifies_as_dolby_digital_plus() {
        assert_eq!(classify(&stream("EAC3")).codec_family, AudioCodecFamily::DolbyDigitalPlus);
    }

    #[test]
    fn plain_ac3_classifies_as_dolby_digital() {
        assert_eq!(classify(&stream("AC3")).codec_family, AudioCodecFamily::DolbyDigital);
    }

    #[test]
    fn unknown_codec_falls_back_to_aac() {
        assert_eq!(classify(&stream("mp3")).codec_family, AudioCodecFamily::Aac);
    }
}
