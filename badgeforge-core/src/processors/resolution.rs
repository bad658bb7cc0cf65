//! Resolution Processor (C11b) — delegates extraction to C7, series
//! sampling to C6.

use std::sync::Arc;

use badgeforge_model::{MediaKind, MediaRef, ResolutionInfo};
use tracing::debug;

use crate::dominant::{dominant_resolution, series_cache_key, DominantValueConfig, SeriesDominantCache};
use crate::media_client::MediaMetadataClient;

pub async fn resolve_resolution_info(
    client: &Arc<dyn MediaMetadataClient>,
    media_ref: &MediaRef,
    config: DominantValueConfig,
    dominant_cache: &Arc<SeriesDominantCache>,
) -> Option<ResolutionInfo> {
    match media_ref.kind {
        MediaKind::Movie | MediaKind::Episode => {
            let streams = client.media_streams(media_ref).await.ok()?;
            let info = streams.first_video().map(crate::resolution::classify);
            if info.is_none() {
                debug!(?media_ref, "no video stream available for item");
            }
            info
        }
        MediaKind::Series | MediaKind::Season => {
            let key = series_cache_key(media_ref);
            if let Some(cached) = dominant_cache.get_resolution(key).await {
                return Some(cached);
            }
            let episodes = client.episodes(media_ref).await.ok()?;
            if episodes.is_empty() {
                return None;
            }
            let value = dominant_resolution(client, &episodes, config).await;
            dominant_cache.put_resolution(key, value.clone()).await;
            Some(value)
        }
    }
}
