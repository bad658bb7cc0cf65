//! Resolution Detector (C7) — extracts base resolution plus HDR/DV/HDR10+
//! enhancements from stream metadata.

use badgeforge_model::{BaseResolution, ResolutionInfo};
use regex::Regex;
use std::sync::OnceLock;

use badgeforge_model::VideoStream;

const HDR_PATTERNS: &[&str] = &["HDR", "HDR10", "BT2020", "PQ", "ST2084", "HLG", "ARIB"];
const DV_PATTERNS: &[&str] = &["DV", "DOLBY VISION", "DVHE", "DVH1"];
const HDR10_PLUS_PATTERNS: &[&str] = &["HDR10+", "PLUS", "ST2094"];

/// Bitrate above which the stream is treated as carrying HDR10+-quality
/// mastering even absent an explicit tag.
const HDR_PLUS_BITRATE_THRESHOLD_BPS: u64 = 15_000_000;

fn display_title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)4k|2160p|1080p|720p|576p|480p").unwrap())
}

fn matches_any(haystack: &str, patterns: &[&str]) -> bool {
    let upper = haystack.to_ascii_uppercase();
    patterns.iter().any(|p| upper.contains(p))
}

/// Classify a single [`VideoStream`] into a [`ResolutionInfo`].
pub fn classify(stream: &VideoStream) -> ResolutionInfo {
    let base_resolution = base_resolution_from_display_title(stream.display_title.as_deref())
        .unwrap_or_else(|| base_resolution_from_dimensions(stream.height, stream.width));

    let mut fields: Vec<&str> = Vec::new();
    if let Some(title) = stream.display_title.as_deref() {
        fields.push(title);
    }
    if let Some(vr) = stream.video_range.as_deref() {
        fields.push(vr);
    }
    if let Some(vrt) = stream.video_range_type.as_deref() {
        fields.push(vrt);
    }
    for tag in &stream.tags {
        fields.push(tag.as_str());
    }
    if let Some(profile) = stream.profile.as_deref() {
        fields.push(profile);
    }

    let is_hdr = fields.iter().any(|f| matches_any(f, HDR_PATTERNS));
    let is_dv = fields.iter().any(|f| matches_any(f, DV_PATTERNS));
    let mut is_hdr_plus = fields.iter().any(|f| matches_any(f, HDR10_PLUS_PATTERNS));
    if let Some(bitrate) = stream.bitrate {
        if bitrate > HDR_PLUS_BITRATE_THRESHOLD_BPS {
            is_hdr_plus = true;
        }
    }

    ResolutionInfo {
        height: stream.height,
        width: stream.width,
        base_resolution,
        is_hdr,
        is_dv,
        is_hdr_plus,
        codec: stream.codec.clone(),
        color_space: stream.color_space.clone(),
        video_range: stream.video_range.clone(),
        bit_depth: None,
        bitrate: stream.bitrate,
        profile: stream.profile.clone(),
    }
}

fn base_resolution_from_display_title(title: Option<&str>) -> Option<BaseResolution> {
    let title = title?;
    let m = display_title_regex().find(title)?;
    BaseResolution::parse(m.as_str())
}

fn base_resolution_from_dimensions(height: u32, width: u32) -> BaseResolution {
    if height >= 4320 || width >= 7680 {
        BaseResolution::K8
    } else if height >= 2160 || width >= 3840 {
        BaseResolution::K4
    } else if height >= 1440 || width >= 2560 {
        BaseResolution::P1440
    } else if height >= 1080 || width >= 1920 {
        BaseResolution::P1080
    } else if height >= 720 || width >= 1280 {
        BaseResolution::P720
    } else if height >= 576 || width >= 1024 {
        BaseResolution::P576
    } else {
        BaseResolution::P480
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(height: u32, width: u32) -> VideoStream {
        VideoStream {
            height,
            width,
            codec: "hevc".into(),
            ..Default::default()
        }
    }

    #[test]
    fn falls_back_to_dimensions_when_no_display_title() {
        let info = classify(&stream(2160, 3840));
        assert_eq!(info.base_resolution, BaseResolution::K4);
    }

    #[test]
    fn display_title_takes_priority_over_dimensions() {
        let mut s = stream(1072, 1920);
        s.display_title = Some("1080p HEVC HDR".into());
        let info = classify(&s);
        assert_eq!(info.base_resolution, BaseResolution::P1080);
        assert!(info.is_hdr);
    }

    #[test]
    fn dolby_vision_and_hdr_can_both_be_set() {
        let mut s = stream(2160, 3840);
        s.video_range_type = Some("DOVI".into());
        s.tags = vec!["DV".into(), "HDR10".into()];
        let info = classify(&s);
        assert!(info.is_dv);
        assert!(info.is_hdr);
        assert_eq!(info.dominant_enhancement(), badgeforge_model::Enhancement::DolbyVision);
    }

    #[test]
    fn high_bitrate_implies_hdr_plus_heuristic() {
        let mut s = stream(2160, 3840);
        s.bitrate = Some(20_000_000);
        let info = classify(&s);
        assert!(info.is_hdr_plus);
    }
}
