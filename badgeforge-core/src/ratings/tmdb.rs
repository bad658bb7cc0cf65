//! TMDb aggregator.

use std::time::Duration;

use badgeforge_model::{MediaKind, RatingRecord, RatingSource as SourceKind};
use tmdb_api::client::{reqwest::ReqwestExecutor, Client};
use tmdb_api::movie::details::MovieDetails;
use tmdb_api::prelude::Command;
use tmdb_api::tvshow::details::TVShowDetails;
use tracing::warn;

use super::cache::TtlCache;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TmdbVote {
    pub vote_average: f64,
    pub vote_count: u64,
}

pub struct TmdbRatingSource {
    client: Client<ReqwestExecutor>,
    cache: TtlCache<TmdbVote>,
    ttl: Duration,
}

impl TmdbRatingSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::<ReqwestExecutor>::new(api_key.into()),
            cache: TtlCache::new(),
            ttl: badgeforge_model::cache::ttl::RATING,
        }
    }

    pub async fn fetch(&self, tmdb_id: u64, kind: MediaKind) -> Option<TmdbVote> {
        let cache_key = format!("{kind:?}:{tmdb_id}");
        if let Some(cached) = self.cache.get_fresh(&cache_key) {
            return Some(cached);
        }

        let vote = match kind {
            MediaKind::Movie | MediaKind::Episode => {
                let cmd = MovieDetails::new(tmdb_id);
                match cmd.execute(&self.client).await {
                    Ok(details) => TmdbVote {
                        vote_average: details.inner.vote_average as f64,
                        vote_count: details.inner.vote_count as u64,
                    },
                    Err(err) => {
                        warn!(tmdb_id, %err, "TMDb movie details request failed");
                        return None;
                    }
                }
            }
            MediaKind::Series | MediaKind::Season => {
                let cmd = TVShowDetails::new(tmdb_id);
                match cmd.execute(&self.client).await {
                    Ok(details) => TmdbVote {
                        vote_average: details.inner.vote_average as f64,
                        vote_count: details.inner.vote_count as u64,
                    },
                    Err(err) => {
                        warn!(tmdb_id, %err, "TMDb tv details request failed");
                        return None;
                    }
                }
            }
        };

        self.cache.insert(cache_key, vote.clone(), self.ttl);
        Some(vote)
    }

    pub async fn fetch_record(&self, tmdb_id: u64, kind: MediaKind) -> Option<RatingRecord> {
        let vote = self.fetch(tmdb_id, kind).await?;
        Some(RatingRecord {
            source: SourceKind::Tmdb,
            text_display: format!("{:.1}", vote.vote_average),
            numeric_score: vote.vote_average,
            max_score: 10.0,
            image_key: SourceKind::Tmdb.image_key().to_string(),
            variant_tag: None,
        })
    }
}
