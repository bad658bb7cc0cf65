//! OMDb aggregator.
//!
//! One HTTP call yields IMDb, Rotten Tomatoes (critics), and Metacritic
//! in a single response — `OmdbClient` owns the call + cache, and the
//! three [`RatingSource`](super::RatingSource) adapters each project out
//! their own record so the aggregator can still treat every source the
//! same way.

use std::sync::Arc;
use std::time::Duration;

use badgeforge_model::rating::imdb_variant;
use badgeforge_model::{RatingRecord, RatingSource as SourceKind};
use serde::Deserialize;
use tracing::{debug, warn};

use super::cache::TtlCache;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize)]
struct OmdbRatingEntry {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    imdb_votes: Option<String>,
    #[serde(rename = "Ratings", default)]
    ratings: Vec<OmdbRatingEntry>,
    #[serde(rename = "Response")]
    response: Option<String>,
}

/// Parsed view of one OMDb lookup — every field optional since any of
/// these may be absent from a given title's response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OmdbRatings {
    pub imdb_score: Option<f64>,
    pub imdb_votes: Option<u64>,
    pub rt_critics_percent: Option<f64>,
    pub metacritic_score: Option<f64>,
}

#[derive(Debug)]
pub struct OmdbClient {
    http: reqwest::Client,
    api_key: String,
    cache: TtlCache<OmdbRatings>,
    ttl: Duration,
}

impl OmdbClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            cache: TtlCache::new(),
            ttl: badgeforge_model::cache::ttl::RATING,
        }
    }

    pub async fn fetch(&self, imdb_id: &str) -> Option<OmdbRatings> {
        if let Some(cached) = self.cache.get_fresh(imdb_id) {
            return Some(cached);
        }

        let url = "http://www.omdbapi.com/";
        let response = self
            .http
            .get(url)
            .query(&[("i", imdb_id), ("apikey", self.api_key.as_str())])
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(err) => {
                warn!(imdb_id, %err, "OMDb request failed, treating as empty");
                return None;
            }
        };

        let parsed: OmdbResponse = match response.json().await {
            Ok(p) => p,
            Err(err) => {
                warn!(imdb_id, %err, "OMDb response did not parse, treating as empty");
                return None;
            }
        };

        if parsed.response.as_deref() == Some("False") {
            debug!(imdb_id, "OMDb reported no such title");
            return None;
        }

        let ratings = OmdbRatings {
            imdb_score: parsed.imdb_rating.as_deref().and_then(|s| s.parse().ok()),
            imdb_votes: parsed
                .imdb_votes
                .as_deref()
                .map(|s| s.replace(',', ""))
                .and_then(|s| s.parse().ok()),
            rt_critics_percent: parsed
                .ratings
                .iter()
                .find(|r| r.source == "Rotten Tomatoes")
                .and_then(|r| r.value.trim_end_matches('%').parse().ok()),
            metacritic_score: parsed
                .ratings
                .iter()
                .find(|r| r.source == "Metacritic")
                .and_then(|r| r.value.split('/').next())
                .and_then(|s| s.parse().ok()),
        };

        self.cache.insert(imdb_id, ratings.clone(), self.ttl);
        Some(ratings)
    }

    /// Does the raw OMDb "Awards" text (not modeled above — fetched
    /// on-demand by C5) mention an award keyword. Used by the awards
    /// detector's OMDb scan.
    pub async fn awards_text(&self, imdb_id: &str) -> Option<String> {
        let url = "http://www.omdbapi.com/";
        let response = self
            .http
            .get(url)
            .query(&[("i", imdb_id), ("apikey", self.api_key.as_str())])
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await
            .ok()?;
        #[derive(Deserialize)]
        struct AwardsOnly {
            #[serde(rename = "Awards")]
            awards: Option<String>,
        }
        let parsed: AwardsOnly = response.json().await.ok()?;
        parsed.awards
    }
}

fn imdb_record(score: f64, votes: u64) -> RatingRecord {
    let source = imdb_variant(score, votes);
    RatingRecord {
        source,
        text_display: format!("{score:.1}"),
        numeric_score: score,
        max_score: 10.0,
        image_key: source.image_key().to_string(),
        variant_tag: source.is_imdb_variant().then(|| source.display_name().to_string()),
    }
}

fn rt_record(percent: f64) -> RatingRecord {
    RatingRecord {
        source: SourceKind::RtCritics,
        text_display: format!("{percent:.0}%"),
        numeric_score: percent,
        max_score: 100.0,
        image_key: SourceKind::RtCritics.image_key().to_string(),
        variant_tag: None,
    }
}

fn metacritic_record(score: f64) -> RatingRecord {
    RatingRecord {
        source: SourceKind::Metacritic,
        text_display: format!("{score:.0}"),
        numeric_score: score,
        max_score: 100.0,
        image_key: SourceKind::Metacritic.image_key().to_string(),
        variant_tag: None,
    }
}

/// Projects every record OMDb can yield for one title, in no particular
/// order — the aggregator (C11c) applies enable flags, ordering, and the
/// display-count cap afterward.
pub async fn fetch_omdb_records(client: &Arc<OmdbClient>, imdb_id: &str) -> Vec<RatingRecord> {
    let Some(ratings) = client.fetch(imdb_id).await else {
        return Vec::new();
    };
    let mut records = Vec::new();
    if let (Some(score), Some(votes)) = (ratings.imdb_score, ratings.imdb_votes) {
        records.push(imdb_record(score, votes));
    }
    if let Some(percent) = ratings.rt_critics_percent {
        records.push(rt_record(percent));
    }
    if let Some(score) = ratings.metacritic_score {
        records.push(metacritic_record(score));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imdb_record_selects_top_250_variant() {
        let record = imdb_record(8.7, 300_000);
        assert_eq!(record.source, SourceKind::ImdbTop250);
        assert_eq!(record.as_percentage(), 87.0);
    }

    #[test]
    fn rt_record_is_already_a_percentage() {
        let record = rt_record(91.0);
        assert_eq!(record.as_percentage(), 91.0);
    }
}
