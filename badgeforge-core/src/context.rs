//! Shared dependency bag every badge processor (C11) is handed by the
//! dispatcher (C12) — one instance per process, not per request, in the
//! same shape as a conventional `AppState` struct.

use std::fmt;
use std::sync::Arc;

use badgeforge_model::ActivityTracker;

use crate::anime_map::AnimeMapper;
use crate::awards::AwardsTables;
use crate::dominant::{DominantValueConfig, SeriesDominantCache};
use crate::image_select::ImageIndex;
use crate::media_client::MediaMetadataClient;
use crate::ratings::anidb::AniDbRatingSource;
use crate::ratings::jikan::JikanRatingSource;
use crate::ratings::omdb::OmdbClient;
use crate::ratings::tmdb::TmdbRatingSource;
use crate::settings::SettingsGateway;

/// Everything the four badge processors need, constructed once at
/// startup and shared (read-mostly, internally synchronized) across
/// every request.
#[derive(Clone)]
pub struct PipelineContext {
    pub settings: Arc<SettingsGateway>,
    pub media_client: Arc<dyn MediaMetadataClient>,
    pub image_index: Arc<ImageIndex>,
    pub omdb: Option<Arc<OmdbClient>>,
    pub tmdb: Option<Arc<TmdbRatingSource>>,
    pub jikan: Arc<JikanRatingSource>,
    pub anidb: Option<Arc<AniDbRatingSource>>,
    pub anime_mapper: Arc<dyn AnimeMapper>,
    pub awards_tables: Arc<AwardsTables>,
    pub dominant_cache: Arc<SeriesDominantCache>,
    pub dominant_config: DominantValueConfig,
    pub activity: Arc<dyn ActivityTracker>,
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext").finish_non_exhaustive()
    }
}
