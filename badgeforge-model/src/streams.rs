//! Raw stream metadata as reported by the media server, prior to any badge-specific classification.

/// A single audio track reported by the media server.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioStream {
    pub codec: String,
    pub channels: u32,
    pub profile: Option<String>,
    pub layout: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
}

/// A single video track reported by the media server.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VideoStream {
    pub height: u32,
    pub width: u32,
    pub codec: String,
    pub color_space: Option<String>,
    pub video_range: Option<String>,
    pub video_range_type: Option<String>,
    pub tags: Vec<String>,
    pub display_title: Option<String>,
    pub bitrate: Option<u64>,
    pub profile: Option<String>,
}

/// Ordered sequence of audio/video streams extracted for a single item
/// (movie, episode).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaStreams {
    pub audio: Vec<AudioStream>,
    pub video: Vec<VideoStream>,
}

impl MediaStreams {
    pub fn first_audio(&self) -> Option<&AudioStream> {
        self.audio.first()
    }

    pub fn first_video(&self) -> Option<&VideoStream> {
        self.video.first()
    }
}
