//! Media Metadata Client (C2) — typed access to the media server: item
//! details, episode listings, media-stream inspection, poster bytes.
//!
//! The transport (HTTP client, auth header, connection pooling) is an
//! external collaborator; this module only defines the capability the
//! rest of the pipeline depends on, plus a couple of in-memory test
//! doubles.

use async_trait::async_trait;
use badgeforge_model::{MediaRef, MediaStreams};
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum MediaClientError {
    #[error("item not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unauthorized")]
    Unauthorized,
}

/// Provider ids and anime flags a processor needs to fan out to C3/C4/C5.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDetails {
    pub title: String,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<u64>,
    pub tvdb_id: Option<u64>,
    pub anilist_id: Option<u64>,
    pub mal_id: Option<u64>,
    pub anidb_id: Option<u64>,
    pub is_anime: bool,
}

/// One episode of a series, as listed by the media server.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRef {
    pub media_ref: MediaRef,
    pub season_number: u32,
    pub episode_number: u32,
}

/// Capability the badge pipeline needs from the media server.
///
/// Authentication is by token header at the transport layer; nothing
/// about it is visible here.
#[async_trait]
pub trait MediaMetadataClient: Send + Sync {
    async fn item_details(&self, media_ref: &MediaRef) -> Result<ItemDetails, MediaClientError>;

    async fn episodes(&self, series_ref: &MediaRef) -> Result<Vec<EpisodeRef>, MediaClientError>;

    async fn media_streams(&self, media_ref: &MediaRef) -> Result<MediaStreams, MediaClientError>;

    async fn poster_bytes(&self, media_ref: &MediaRef) -> Result<Vec<u8>, MediaClientError>;
}

/// An in-memory [`MediaMetadataClient`] for tests and demo wiring — holds
/// a fixed table of items keyed by [`MediaRef`] id, never touches the
/// network.
#[derive(Debug, Default)]
pub struct StaticMediaMetadataClient {
    details: HashMap<String, ItemDetails>,
    episodes: HashMap<String, Vec<EpisodeRef>>,
    streams: HashMap<String, MediaStreams>,
    posters: HashMap<String, Vec<u8>>,
}

impl StaticMediaMetadataClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_details(mut self, media_ref: &MediaRef, details: ItemDetails) -> Self {
        self.details.insert(media_ref.id.as_str().to_string(), details);
        self
    }

    pub fn with_episodes(mut self, series_ref: &MediaRef, episodes: Vec<EpisodeRef>) -> Self {
        self.episodes
            .insert(series_ref.id.as_str().to_string(), episodes);
        self
    }

    pub fn with_streams(mut self, media_ref: &MediaRef, streams: MediaStreams) -> Self {
        self.streams.insert(media_ref.id.as_str().to_string(), streams);
        self
    }

    pub fn with_poster(mut self, media_ref: &MediaRef, bytes: Vec<u8>) -> Self {
        self.posters.insert(media_ref.id.as_str().to_string(), bytes);
        self
    }
}

#[async_trait]
impl MediaMetadataClient for StaticMediaMetadataClient {
    async fn item_details(&self, media_ref: &MediaRef) -> Result<ItemDetails, MediaClientError> {
        self.details
            .get(media_ref.id.as_str())
            .cloned()
            .ok_or_else(|| MediaClientError::NotFound(media_ref.id.as_str().to_string()))
    }

    async fn episodes(&self, series_ref: &MediaRef) -> Result<Vec<EpisodeRef>, MediaClientError> {
        Ok(self
            .episodes
            .get(series_ref.id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn media_streams(&self, media_ref: &MediaRef) -> Result<MediaStreams, MediaClientError> {
        self.streams
            .get(media_ref.id.as_str())
            .cloned()
            .ok_or_else(|| MediaClientError::NotFound(media_ref.id.as_str().to_string()))
    }

    async fn poster_bytes(&self, media_ref: &MediaRef) -> Result<Vec<u8>, MediaClientError> {
        self.posters
            .get(media_ref.id.as_str())
            .cloned()
            .ok_or_else(|| MediaClientError::NotFound(media_ref.id.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_model::{MediaItemId, MediaKind};

    #[tokio::test]
    async fn static_client_returns_not_found_for_unknown_ref() {
        let client = StaticMediaMetadataClient::new();
        let media_ref = MediaRef::new(MediaItemId::new("missing").unwrap(), MediaKind::Movie);
        let err = client.item_details(&media_ref).await.unwrap_err();
        assert!(matches!(err, MediaClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn static_client_round_trips_registered_details() {
        let media_ref = MediaRef::new(MediaItemId::new("tt0111161").unwrap(), MediaKind::Movie);
        let details = ItemDetails {
            title: "The Shawshank Redemption".into(),
            imdb_id: Some("tt0111161".into()),
            ..Default::default()
        };
        let client = StaticMediaMetadataClient::new().with_details(&media_ref, details.clone());
        assert_eq!(client.item_details(&media_ref).await.unwrap(), details);
    }
}
