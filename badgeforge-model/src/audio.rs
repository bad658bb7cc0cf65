use std::fmt;

/// Canonical audio codec family, ordered by the renderer priority chain:
/// Atmos > DTS-X > TrueHD > DTS-HD MA > DD+ > DD > DTS > AAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AudioCodecFamily {
    DolbyAtmos,
    DtsX,
    TrueHd,
    DtsHdMa,
    DolbyDigitalPlus,
    DolbyDigital,
    Dts,
    Aac,
}

impl AudioCodecFamily {
    /// Priority order, highest first.
    pub const PRIORITY: [AudioCodecFamily; 8] = [
        AudioCodecFamily::DolbyAtmos,
        AudioCodecFamily::DtsX,
        AudioCodecFamily::TrueHd,
        AudioCodecFamily::DtsHdMa,
        AudioCodecFamily::DolbyDigitalPlus,
        AudioCodecFamily::DolbyDigital,
        AudioCodecFamily::Dts,
        AudioCodecFamily::Aac,
    ];

    pub fn image_stem(self) -> &'static str {
        match self {
            AudioCodecFamily::DolbyAtmos => "dolby_atmos",
            AudioCodecFamily::DtsX => "dts_x",
            AudioCodecFamily::TrueHd => "truehd",
            AudioCodecFamily::DtsHdMa => "dts_hd_ma",
            AudioCodecFamily::DolbyDigitalPlus => "dolby_digital_plus",
            AudioCodecFamily::DolbyDigital => "dolby_digital",
            AudioCodecFamily::Dts => "dts",
            AudioCodecFamily::Aac => "aac",
        }
    }

    /// One-step fallback when the preferred image is unavailable.
    pub fn fallback(self) -> Option<AudioCodecFamily> {
        match self {
            AudioCodecFamily::DolbyAtmos => Some(AudioCodecFamily::TrueHd),
            AudioCodecFamily::DtsX => Some(AudioCodecFamily::DtsHdMa),
            _ => None,
        }
    }
}

impl fmt::Display for AudioCodecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AudioCodecFamily::DolbyAtmos => "Dolby Atmos",
            AudioCodecFamily::DtsX => "DTS-X",
            AudioCodecFamily::TrueHd => "TrueHD",
            AudioCodecFamily::DtsHdMa => "DTS-HD MA",
            AudioCodecFamily::DolbyDigitalPlus => "Dolby Digital Plus",
            AudioCodecFamily::DolbyDigital => "Dolby Digital",
            AudioCodecFamily::Dts => "DTS",
            AudioCodecFamily::Aac => "AAC",
        };
        f.write_str(label)
    }
}

/// Classified audio record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioInfo {
    pub codec_family: AudioCodecFamily,
    pub channel_layout: String,
    pub is_atmos: bool,
    pub is_dts_x: bool,
    pub display_label: String,
}

impl AudioInfo {
    /// Stable string form, e.g. `"EAC3 6.0"`, used for modal tallying
    /// and as the fallback demo default.
    pub fn to_string_form(&self) -> String {
        format!("{} {}", self.codec_family, self.channel_layout)
    }
}
