//! Typed badge-settings documents. Values are strongly typed once loaded; unknown
//! sections are ignored by the settings gateway, not by these types.

use std::collections::HashMap;

use crate::badge_type::BadgeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BadgePosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    TopCenter,
    CenterLeft,
    Center,
    CenterRight,
    BottomCenter,
    BottomRightFlush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BadgeOrientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneralSection {
    pub general_badge_size: u32,
    pub general_text_padding: u32,
    pub use_dynamic_sizing: bool,
    pub general_badge_position: BadgePosition,
    pub general_edge_padding: u32,
    pub badge_orientation: BadgeOrientation,
    pub badge_spacing: u32,
    pub max_badges_to_display: u32,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            general_badge_size: 100,
            general_text_padding: 8,
            use_dynamic_sizing: true,
            general_badge_position: BadgePosition::TopRight,
            general_edge_padding: 24,
            badge_orientation: BadgeOrientation::Vertical,
            badge_spacing: 10,
            max_badges_to_display: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TextSection {
    pub font: String,
    pub fallback_font: String,
    pub text_size: u32,
    pub text_color: String,
}

impl Default for TextSection {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            fallback_font: "DejaVuSans".to_string(),
            text_size: 40,
            text_color: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BackgroundSection {
    pub background_color: String,
    pub background_opacity: u8,
}

impl Default for BackgroundSection {
    fn default() -> Self {
        Self {
            background_color: "#000000".to_string(),
            background_opacity: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BorderSection {
    pub border_color: String,
    pub border_width: u32,
    pub border_radius: u32,
}

impl Default for BorderSection {
    fn default() -> Self {
        Self {
            border_color: "#FFFFFF".to_string(),
            border_width: 0,
            border_radius: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShadowSection {
    pub shadow_enable: bool,
    pub shadow_blur: u32,
    pub shadow_offset_x: i32,
    pub shadow_offset_y: i32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImageBadgesSection {
    pub enable_image_badges: bool,
    pub fallback_to_text: bool,
    pub image_padding: u32,
    pub codec_image_directory: String,
    pub image_mapping: HashMap<String, String>,
}

impl Default for ImageBadgesSection {
    fn default() -> Self {
        Self {
            enable_image_badges: true,
            fallback_to_text: true,
            image_padding: 10,
            codec_image_directory: "images/badges".to_string(),
            image_mapping: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SourcesSection {
    pub enable_imdb: bool,
    pub enable_tmdb: bool,
    pub enable_rotten_tomatoes_critics: bool,
    pub enable_metacritic: bool,
    pub enable_myanimelist: bool,
    pub enable_anidb: bool,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            enable_imdb: true,
            enable_tmdb: true,
            enable_rotten_tomatoes_critics: true,
            enable_metacritic: true,
            enable_myanimelist: true,
            enable_anidb: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AwardsSection {
    pub color_scheme: String,
    pub award_sources: Vec<String>,
}

impl Default for AwardsSection {
    fn default() -> Self {
        Self {
            color_scheme: "black".to_string(),
            award_sources: Vec::new(),
        }
    }
}

/// A fully parsed badge-settings document.
///
/// Every section is always present with defaults; the settings gateway
/// (C1) is responsible for enforcing the per-badge-type required-section
/// list before handing this back to a processor.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BadgeSettings {
    pub general: GeneralSection,
    pub text: TextSection,
    pub background: BackgroundSection,
    pub border: BorderSection,
    pub shadow: ShadowSection,
    pub image_badges: ImageBadgesSection,
    pub sources: SourcesSection,
    pub awards: AwardsSection,
}

/// Sections a badge type must supply before it is considered valid.
pub fn required_sections(badge_type: BadgeType) -> &'static [&'static str] {
    match badge_type {
        BadgeType::Audio | BadgeType::Resolution => {
            &["General", "Text", "Background", "Border", "ImageBadges"]
        }
        BadgeType::Review => &["General", "Text", "Background", "Border"],
        BadgeType::Awards => &["General", "Background", "Border", "ImageBadges"],
    }
}
