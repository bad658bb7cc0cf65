//! Rating Aggregators (C3) — per-source fetchers (OMDb, TMDb, Jikan/MAL,
//! AniDB) with caching and rate limits.
//!
//! Each source is a stateless struct paired with its own [`cache::TtlCache`];
//! the review processor (C11c, `crate::processors::review`) owns the
//! ordered aggregation and display-order/enable-flag filtering.

pub mod anidb;
pub mod cache;
pub mod jikan;
pub mod omdb;
pub mod rate_limit;
pub mod tmdb;

pub use anidb::{AniDbRating, AniDbRatingSource};
pub use jikan::{JikanAnime, JikanRatingSource};
pub use omdb::{fetch_omdb_records, OmdbClient, OmdbRatings};
pub use tmdb::{TmdbRatingSource, TmdbVote};

use badgeforge_model::RatingRecord;

/// Normalize every record's display text to a percentage-style string
/// unless the badge settings explicitly disable normalization for that
/// source. Callers that need to preserve a source's native scale should
/// read `numeric_score`/`max_score` directly rather than `text_display`.
pub fn normalize(records: &mut [RatingRecord]) {
    for record in records.iter_mut() {
        record.text_display = format!("{:.0}%", record.as_percentage());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_model::RatingSource;

    #[test]
    fn normalize_rewrites_display_text_to_percentage() {
        let mut records = vec![RatingRecord {
            source: RatingSource::Imdb,
            text_display: "8.7".into(),
            numeric_score: 8.7,
            max_score: 10.0,
            image_key: "imdb".into(),
            variant_tag: None,
        }];
        normalize(&mut records);
        assert_eq!(records[0].text_display, "87%");
    }
}
