//! AniDB HTTP API aggregator.
//!
//! AniDB's API is the one source in this pipeline that speaks XML
//! rather than JSON; we parse only the handful of fields the badge
//! needs rather than pulling in a general-purpose XML-to-struct mapper.

use std::time::Duration;

use badgeforge_model::{RatingRecord, RatingSource as SourceKind};
use tracing::warn;

use super::cache::TtlCache;
use super::rate_limit::MinIntervalLimiter;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const MIN_CALL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AniDbRating {
    pub aid: u64,
    pub permanent_rating: Option<f64>,
    pub temporary_rating: Option<f64>,
}

pub struct AniDbRatingSource {
    http: reqwest::Client,
    client_name: String,
    client_version: String,
    cache: TtlCache<AniDbRating>,
    limiter: MinIntervalLimiter,
    ttl: Duration,
}

impl AniDbRatingSource {
    pub fn new(http: reqwest::Client, client_name: impl Into<String>, client_version: impl Into<String>) -> Self {
        Self {
            http,
            client_name: client_name.into(),
            client_version: client_version.into(),
            cache: TtlCache::new(),
            limiter: MinIntervalLimiter::new(MIN_CALL_INTERVAL),
            ttl: badgeforge_model::cache::ttl::ANIME_DETAILS,
        }
    }

    pub async fn fetch(&self, aid: u64) -> Option<AniDbRating> {
        let cache_key = aid.to_string();
        if let Some(cached) = self.cache.get_fresh(&cache_key) {
            return Some(cached);
        }

        self.limiter.acquire().await;
        let response = self
            .http
            .get("http://api.anidb.net:9001/httpapi")
            .query(&[
                ("request", "anime"),
                ("aid", &aid.to_string()),
                ("client", &self.client_name),
                ("clientver", &self.client_version),
                ("protover", "1"),
            ])
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await;

        let body = match response {
            Ok(r) => match r.text().await {
                Ok(b) => b,
                Err(err) => {
                    warn!(aid, %err, "AniDB response body unreadable");
                    return None;
                }
            },
            Err(err) => {
                warn!(aid, %err, "AniDB request failed");
                return None;
            }
        };

        let rating = AniDbRating {
            aid,
            permanent_rating: extract_tag_f64(&body, "ratings><permanent"),
            temporary_rating: extract_tag_f64(&body, "ratings><temporary"),
        };

        self.cache.insert(cache_key, rating.clone(), self.ttl);
        Some(rating)
    }

    pub fn to_record(rating: &AniDbRating) -> Option<RatingRecord> {
        let score = rating.permanent_rating.or(rating.temporary_rating)?;
        Some(RatingRecord {
            source: SourceKind::AniDb,
            text_display: format!("{score:.2}"),
            numeric_score: score,
            max_score: 10.0,
            image_key: SourceKind::AniDb.image_key().to_string(),
            variant_tag: None,
        })
    }
}

/// Pull a single numeric leaf out of the AniDB anime XML document,
/// tolerating attribute soup within the matched tag. `path` is a
/// `><`-joined sequence of tag name fragments to search for in order
/// (e.g. `"ratings><permanent"`), since the real document nests
/// `<ratings><permanent count="...">N</permanent></ratings>`.
fn extract_tag_f64(xml: &str, path: &str) -> Option<f64> {
    let leaf = path.rsplit("><").next().unwrap_or(path);
    let open_prefix = format!("<{leaf}");
    let close_tag = format!("</{leaf}>");
    let open_start = xml.find(&open_prefix)?;
    let open_end = xml[open_start..].find('>').map(|i| open_start + i + 1)?;
    let close_start = xml[open_end..].find(&close_tag).map(|i| open_end + i)?;
    xml[open_end..close_start].trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_permanent_rating_from_attributed_tag() {
        let xml = r#"<anime id="1"><ratings><permanent count="42">8.37</permanent></ratings></anime>"#;
        assert_eq!(extract_tag_f64(xml, "ratings><permanent"), Some(8.37));
    }

    #[test]
    fn missing_tag_yields_none() {
        let xml = r#"<anime id="1"></anime>"#;
        assert_eq!(extract_tag_f64(xml, "ratings><permanent"), None);
    }
}
