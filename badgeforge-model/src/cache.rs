use std::time::Duration;

#[cfg(feature = "chrono")]
use chrono::{DateTime, Utc};

/// A single TTL-governed cache entry. `fresh()` answers the only question every reader needs:
/// has the entry aged past its own TTL.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    #[cfg(feature = "chrono")]
    pub inserted_at: DateTime<Utc>,
    #[cfg(not(feature = "chrono"))]
    pub inserted_at: std::time::Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    #[cfg(feature = "chrono")]
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Utc::now(),
            ttl,
        }
    }

    #[cfg(feature = "chrono")]
    pub fn is_fresh(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.inserted_at);
        age.to_std().map(|age| age < self.ttl).unwrap_or(false)
    }

    #[cfg(not(feature = "chrono"))]
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: std::time::Instant::now(),
            ttl,
        }
    }

    #[cfg(not(feature = "chrono"))]
    pub fn is_fresh(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// Default source-specific TTLs.
pub mod ttl {
    use std::time::Duration;

    pub const RATING: Duration = Duration::from_secs(60 * 60);
    pub const ANIME_DETAILS: Duration = Duration::from_secs(24 * 60 * 60);
    pub const AWARDS: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    pub const SERIES_DOMINANT_VALUE: Duration = Duration::from_secs(24 * 60 * 60);
    pub const ANIME_ID_SECONDARY_MAP: Duration = Duration::from_secs(24 * 60 * 60);
}
