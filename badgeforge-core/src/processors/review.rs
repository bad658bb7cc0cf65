//! Review Processor (C11c) — fans out to OMDb, TMDb, Jikan/MAL, and
//! AniDB, then applies the per-source enable flags, anime gating, and
//! display-count cap.

use std::sync::Arc;

use badgeforge_model::{BadgeSettings, MediaKind, RatingRecord, RatingSource};
use tracing::debug;

use crate::anime_map::AnimeMapper;
use crate::media_client::{ItemDetails, MediaMetadataClient};
use crate::ratings;
use crate::ratings::anidb::AniDbRatingSource;
use crate::ratings::jikan::JikanRatingSource;
use crate::ratings::omdb::OmdbClient;
use crate::ratings::tmdb::TmdbRatingSource;

/// Every source this processor can fan out to, bundled so callers don't
/// have to thread five `Option<Arc<_>>` parameters around.
pub struct ReviewSources {
    pub omdb: Option<Arc<OmdbClient>>,
    pub tmdb: Option<Arc<TmdbRatingSource>>,
    pub jikan: Arc<JikanRatingSource>,
    pub anidb: Option<Arc<AniDbRatingSource>>,
    pub anime_mapper: Arc<dyn AnimeMapper>,
}

/// Resolve the MAL id for an item: direct id, else derive from AniList
/// via C4, else title search.
async fn resolve_mal_id(
    sources: &ReviewSources,
    details: &ItemDetails,
) -> Option<(u64, Option<String>)> {
    if let Some(mal_id) = details.mal_id {
        return Some((mal_id, None));
    }
    if let Some(anilist_id) = details.anilist_id {
        if let Some(mal_id) = sources.anime_mapper.mal_from_anilist(anilist_id).await {
            return Some((mal_id, None));
        }
    }
    let (mal_id, canonical_title) = sources.anime_mapper.mal_from_title(&details.title).await?;
    Some((mal_id, Some(canonical_title)))
}

/// Resolve the AniDB id: direct id, else derive via C4 from
/// TMDb/TVDB/IMDb/AniList.
async fn resolve_anidb_id(sources: &ReviewSources, details: &ItemDetails) -> Option<u64> {
    if let Some(id) = details.anidb_id {
        return Some(id);
    }
    sources
        .anime_mapper
        .anidb_from_ids(
            details.tmdb_id,
            details.imdb_id.as_deref(),
            details.tvdb_id,
            details.anilist_id,
        )
        .await
}

/// Gather every record available for one item, unfiltered and
/// unordered — the caller applies enable flags, the anime content-type
/// predicate, display order, and the display-count cap.
pub async fn fetch_all_records(
    sources: &ReviewSources,
    details: &ItemDetails,
    kind: MediaKind,
) -> Vec<RatingRecord> {
    let mut records = Vec::new();

    if let (Some(omdb), Some(imdb_id)) = (&sources.omdb, details.imdb_id.as_deref()) {
        records.extend(ratings::fetch_omdb_records(omdb, imdb_id).await);
    }

    if let (Some(tmdb), Some(tmdb_id)) = (&sources.tmdb, details.tmdb_id) {
        if let Some(record) = tmdb.fetch_record(tmdb_id, kind).await {
            records.push(record);
        }
    }

    if details.is_anime {
        if let Some((mal_id, _canonical_title)) = resolve_mal_id(sources, details).await {
            if let Some(anime) = sources.jikan.fetch_by_id(mal_id).await {
                if let Some(record) = JikanRatingSource::to_record(&anime) {
                    records.push(record);
                }
            }
        }

        if let Some(anidb) = &sources.anidb {
            if let Some(aid) = resolve_anidb_id(sources, details).await {
                if let Some(rating) = anidb.fetch(aid).await {
                    if let Some(record) = AniDbRatingSource::to_record(&rating) {
                        records.push(record);
                    }
                }
            }
        }
    }

    debug!(count = records.len(), title = %details.title, "collected raw rating records");
    records
}

/// Apply per-source enable flags, the anime content-type predicate,
/// normalization, display order, and the `max_badges_to_display` cap.
pub fn aggregate(mut records: Vec<RatingRecord>, settings: &BadgeSettings, is_anime: bool) -> Vec<RatingRecord> {
    let sources = &settings.sources;
    records.retain(|record| match record.source {
        RatingSource::Imdb | RatingSource::ImdbTop250 | RatingSource::ImdbTop1000 => sources.enable_imdb,
        RatingSource::Tmdb => sources.enable_tmdb,
        RatingSource::RtCritics => sources.enable_rotten_tomatoes_critics,
        RatingSource::Metacritic => sources.enable_metacritic,
        RatingSource::MyAnimeList => sources.enable_myanimelist && is_anime,
        RatingSource::AniDb => sources.enable_anidb && is_anime,
    });

    ratings::normalize(&mut records);

    // Display order: IMDb first, then TMDb, then the two OMDb critic
    // aggregates, then the two anime-specific sources. Lacking a
    // per-install ordering override this fixed order is the default.
    const DISPLAY_ORDER: [RatingSource; 6] = [
        RatingSource::ImdbTop250,
        RatingSource::ImdbTop1000,
        RatingSource::Imdb,
        RatingSource::Tmdb,
        RatingSource::RtCritics,
        RatingSource::Metacritic,
    ];
    records.sort_by_key(|record| {
        DISPLAY_ORDER
            .iter()
            .position(|s| *s == record.source)
            .unwrap_or(DISPLAY_ORDER.len())
    });

    records.truncate(settings.general.max_badges_to_display.max(1) as usize);
    records
}
