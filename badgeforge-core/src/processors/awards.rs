//! Awards Processor (C11d) — gathers the raw signals C5 needs from the
//! item's provider ids and the already-fetched OMDb/TMDb data, then
//! reduces them to the single emitted award token.

use std::sync::Arc;

use badgeforge_model::{AwardToken, MediaKind};

use crate::awards::{detect_and_select, AwardsSignals, AwardsTables};
use crate::media_client::ItemDetails;
use crate::ratings::omdb::OmdbClient;
use crate::ratings::tmdb::TmdbRatingSource;

pub struct AwardsSources {
    pub omdb: Option<Arc<OmdbClient>>,
    pub tmdb: Option<Arc<TmdbRatingSource>>,
    pub tables: Arc<AwardsTables>,
}

/// Collect whatever signals are reachable for this item and resolve
/// them to a single award token, or `None` if nothing was detected.
pub async fn resolve_award(
    sources: &AwardsSources,
    details: &ItemDetails,
    kind: MediaKind,
) -> Option<AwardToken> {
    let omdb_awards_text = match (&sources.omdb, details.imdb_id.as_deref()) {
        (Some(omdb), Some(imdb_id)) => omdb.awards_text(imdb_id).await,
        _ => None,
    };

    let tmdb_vote_average = match (&sources.tmdb, details.tmdb_id) {
        (Some(tmdb), Some(tmdb_id)) => tmdb.fetch(tmdb_id, kind).await.map(|v| v.vote_average),
        _ => None,
    };

    let signals = AwardsSignals {
        imdb_id: details.imdb_id.as_deref(),
        kind: Some(kind),
        tmdb_vote_average,
        tmdb_keyword_text: None,
        omdb_awards_text: omdb_awards_text.as_deref(),
        tmdb_id: details.tmdb_id,
        title: Some(details.title.as_str()),
    };

    detect_and_select(&signals, &sources.tables)
}
