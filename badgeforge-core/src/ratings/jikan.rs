//! Jikan/MyAnimeList aggregator.

use std::time::Duration;

use badgeforge_model::{RatingRecord, RatingSource as SourceKind};
use serde::Deserialize;
use tracing::{debug, warn};

use super::cache::TtlCache;
use super::rate_limit::MinIntervalLimiter;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_CALL_INTERVAL: Duration = Duration::from_secs(1);
const RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Title-match score threshold below which a candidate is rejected.
const MATCH_SCORE_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JikanAnime {
    pub mal_id: u64,
    pub title: String,
    pub score: Option<f64>,
    pub scored_by: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JikanAnimeData {
    mal_id: u64,
    #[serde(default)]
    title: String,
    score: Option<f64>,
    scored_by: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JikanSingleResponse {
    data: JikanAnimeData,
}

#[derive(Debug, Deserialize)]
struct JikanSearchResponse {
    #[serde(default)]
    data: Vec<JikanAnimeData>,
}

impl From<JikanAnimeData> for JikanAnime {
    fn from(d: JikanAnimeData) -> Self {
        Self {
            mal_id: d.mal_id,
            title: d.title,
            score: d.score,
            scored_by: d.scored_by,
        }
    }
}

pub struct JikanRatingSource {
    http: reqwest::Client,
    cache: TtlCache<JikanAnime>,
    limiter: MinIntervalLimiter,
    ttl: Duration,
}

impl JikanRatingSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            cache: TtlCache::new(),
            limiter: MinIntervalLimiter::new(MIN_CALL_INTERVAL),
            ttl: badgeforge_model::cache::ttl::ANIME_DETAILS,
        }
    }

    async fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> Option<reqwest::Response> {
        self.limiter.acquire().await;
        let mut response = self
            .http
            .get(url)
            .query(query)
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await
            .ok()?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            debug!(url, "Jikan rate-limited, retrying once after backoff");
            tokio::time::sleep(RETRY_BACKOFF).await;
            self.limiter.acquire().await;
            response = self
                .http
                .get(url)
                .query(query)
                .timeout(DEFAULT_TIMEOUT)
                .send()
                .await
                .ok()?;
        }

        response.error_for_status().ok()
    }

    pub async fn fetch_by_id(&self, mal_id: u64) -> Option<JikanAnime> {
        let cache_key = format!("id:{mal_id}");
        if let Some(cached) = self.cache.get_fresh(&cache_key) {
            return Some(cached);
        }

        let url = format!("https://api.jikan.moe/v4/anime/{mal_id}");
        let response = self.get_with_retry(&url, &[]).await?;
        let parsed: JikanSingleResponse = match response.json().await {
            Ok(p) => p,
            Err(err) => {
                warn!(mal_id, %err, "Jikan single-anime response did not parse");
                return None;
            }
        };

        let anime: JikanAnime = parsed.data.into();
        self.cache.insert(cache_key, anime.clone(), self.ttl);
        Some(anime)
    }

    /// Generate up to five title variations to search with:
    /// the original; stripped of a year/season suffix; punctuation-free;
    /// article-free; possessive-free; first-N-words. Capped at five,
    /// deduplicating and preserving this priority order.
    pub fn title_variations(title: &str) -> Vec<String> {
        let mut variations = vec![title.to_string()];

        let year_stripped = year_or_season_suffix_regex().replace(title, "").trim().to_string();
        if !year_stripped.is_empty() && year_stripped != title {
            variations.push(year_stripped);
        }

        let punctuation_free: String = title
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if !punctuation_free.is_empty() && !variations.contains(&punctuation_free) {
            variations.push(punctuation_free);
        }

        let article_free = strip_leading_article(title);
        if !variations.contains(&article_free) {
            variations.push(article_free);
        }

        let possessive_free = title.replace("'s", "").replace("'s", "");
        if !variations.contains(&possessive_free) {
            variations.push(possessive_free);
        }

        let first_n_words: String = title.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
        if !first_n_words.is_empty() && !variations.contains(&first_n_words) {
            variations.push(first_n_words);
        }

        variations.truncate(5);
        variations
    }

    /// Score a candidate title against the query title: exact = 100,
    /// substring = 80, otherwise word-overlap via the Jaccard ratio
    /// scaled up to 60.
    pub fn score_candidate(query: &str, candidate: &str) -> f64 {
        let query_norm = query.trim().to_lowercase();
        let candidate_norm = candidate.trim().to_lowercase();

        if query_norm == candidate_norm {
            return 100.0;
        }
        if candidate_norm.contains(&query_norm) || query_norm.contains(&candidate_norm) {
            return 80.0;
        }

        let query_words: std::collections::HashSet<&str> = query_norm.split_whitespace().collect();
        let candidate_words: std::collections::HashSet<&str> = candidate_norm.split_whitespace().collect();
        if query_words.is_empty() || candidate_words.is_empty() {
            return 0.0;
        }
        let intersection = query_words.intersection(&candidate_words).count() as f64;
        let union = query_words.union(&candidate_words).count() as f64;
        if union == 0.0 {
            0.0
        } else {
            (intersection / union) * 60.0
        }
    }

    /// Search each title variation in turn, score every candidate
    /// against the *original* title, and return the best match above
    /// threshold. Ties break by (Jikan score desc, votes desc).
    pub async fn search_best_match(&self, original_title: &str) -> Option<JikanAnime> {
        let mut best: Option<(f64, JikanAnime)> = None;

        for query in Self::title_variations(original_title) {
            let url = "https://api.jikan.moe/v4/anime";
            let Some(response) = self.get_with_retry(url, &[("q", query.clone())]).await else {
                continue;
            };
            let parsed: JikanSearchResponse = match response.json().await {
                Ok(p) => p,
                Err(err) => {
                    warn!(query, %err, "Jikan search response did not parse");
                    continue;
                }
            };
            let candidates: Vec<JikanAnime> = parsed.data.into_iter().take(10).map(Into::into).collect();

            for candidate in candidates {
                let score = Self::score_candidate(original_title, &candidate.title);
                let replace = match &best {
                    None => score > MATCH_SCORE_THRESHOLD,
                    Some((best_score, best_candidate)) => {
                        score > MATCH_SCORE_THRESHOLD
                            && (score > *best_score
                                || (score == *best_score
                                    && candidate.scored_by.unwrap_or(0) > best_candidate.scored_by.unwrap_or(0)))
                    }
                };
                if replace {
                    best = Some((score, candidate));
                }
            }
        }

        best.map(|(_, candidate)| candidate)
    }

    pub fn to_record(anime: &JikanAnime) -> Option<RatingRecord> {
        let score = anime.score?;
        Some(RatingRecord {
            source: SourceKind::MyAnimeList,
            text_display: format!("{score:.2}"),
            numeric_score: score,
            max_score: 10.0,
            image_key: SourceKind::MyAnimeList.image_key().to_string(),
            variant_tag: None,
        })
    }
}

fn strip_leading_article(title: &str) -> String {
    for article in ["The ", "A ", "An "] {
        if let Some(stripped) = title.strip_prefix(article) {
            return stripped.to_string();
        }
    }
    title.to_string()
}

fn year_or_season_suffix_regex() -> &'static regex::Regex {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"(?i)\s*[:\-]?\s*(season\s*\d+|part\s*\d+|\(\d{4}\))\s*$").unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_100() {
        assert_eq!(JikanRatingSource::score_candidate("Naruto", "Naruto"), 100.0);
    }

    #[test]
    fn substring_match_scores_80() {
        assert_eq!(
            JikanRatingSource::score_candidate("Naruto", "Naruto Shippuden"),
            80.0
        );
    }

    #[test]
    fn disjoint_titles_score_zero() {
        assert_eq!(JikanRatingSource::score_candidate("Naruto", "Bleach"), 0.0);
    }

    #[test]
    fn title_variations_are_capped_at_five_and_deduplicated() {
        let variations = JikanRatingSource::title_variations("The Promised Neverland (2019)");
        assert!(variations.len() <= 5);
        assert_eq!(variations[0], "The Promised Neverland (2019)");
    }
}
