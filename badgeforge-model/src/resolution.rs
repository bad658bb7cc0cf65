use std::fmt;

/// Canonical base resolution buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaseResolution {
    P480,
    P576,
    P720,
    P1080,
    P1440,
    K4,
    K8,
}

impl BaseResolution {
    pub fn as_str(self) -> &'static str {
        match self {
            BaseResolution::P480 => "480p",
            BaseResolution::P576 => "576p",
            BaseResolution::P720 => "720p",
            BaseResolution::P1080 => "1080p",
            BaseResolution::P1440 => "1440p",
            BaseResolution::K4 => "4k",
            BaseResolution::K8 => "8k",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "480p" => Some(Self::P480),
            "576p" => Some(Self::P576),
            "720p" | "720i" => Some(Self::P720),
            "1080p" | "1080i" => Some(Self::P1080),
            "1440p" => Some(Self::P1440),
            "4k" | "2160p" => Some(Self::K4),
            "8k" => Some(Self::K8),
            _ => None,
        }
    }

    /// One-step fallback target for image lookups.
    pub fn fallback(self) -> Option<Self> {
        match self {
            BaseResolution::P1440 => Some(BaseResolution::P1080),
            BaseResolution::K8 => Some(BaseResolution::K4),
            _ => None,
        }
    }
}

impl fmt::Display for BaseResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived, classified resolution + enhancement record.
///
/// Invariant: exactly one `base_resolution`. `is_dv` takes precedence
/// over `is_hdr` at image-selection time, though both flags may be set
/// simultaneously on the record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionInfo {
    pub height: u32,
    pub width: u32,
    pub base_resolution: BaseResolution,
    pub is_hdr: bool,
    pub is_dv: bool,
    pub is_hdr_plus: bool,
    pub codec: String,
    pub color_space: Option<String>,
    pub video_range: Option<String>,
    pub bit_depth: Option<u32>,
    pub bitrate: Option<u64>,
    pub profile: Option<String>,
}

impl ResolutionInfo {
    /// Stable string form used for tallying/round-tripping.
    pub fn to_string_form(&self) -> String {
        let mut s = self.base_resolution.as_str().to_string();
        if self.is_dv {
            s.push_str(" DV");
        } else if self.is_hdr_plus {
            s.push_str(" HDR10+");
        } else if self.is_hdr {
            s.push_str(" HDR");
        }
        s
    }

    /// Precedence image-selection base: DV beats HDR10+ beats HDR.
    pub fn dominant_enhancement(&self) -> Enhancement {
        if self.is_dv {
            Enhancement::DolbyVision
        } else if self.is_hdr_plus {
            Enhancement::Hdr10Plus
        } else if self.is_hdr {
            Enhancement::Hdr
        } else {
            Enhancement::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enhancement {
    DolbyVision,
    Hdr10Plus,
    Hdr,
    None,
}
