//! Anime ID Mapper (C4) — cross-provider ID mapping (AniList↔MAL,
//! AniDB↔MAL, TVDB↔AniDB, title→MAL) over a downloaded mapping corpus.
//!
//! The corpus itself (~50 MB JSON) and its download are external-service
//! concerns; this module owns parsing it into in-memory indexes and the
//! two public entry points (`resolve_mal`, `resolve_anidb`) the review
//! and awards processors use. A single `AnimeMapper` interface backs
//! both a basic and a comprehensive implementation, picked at
//! startup by whether the corpus is loadable; `BasicAnimeMapper` only
//! ever does title search, `CorpusAnimeMapper` additionally has the
//! downloaded indexes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::ratings::cache::TtlCache;
use crate::ratings::jikan::JikanRatingSource;

/// Fixed upstream corpus location.
pub const CORPUS_URL: &str =
    "https://raw.githubusercontent.com/manami-project/anime-offline-database/master/anime-offline-database-minified.json";

/// Community-maintained secondary corpus, mapping TMDB/IMDB/TVDB/AniList
/// → AniDB.
pub const ANIME_IDS_URL: &str =
    "https://raw.githubusercontent.com/Kometa-Team/Anime-IDs/master/anime_ids.json";

const CORPUS_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const CORPUS_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Capability the review (C11c) and awards (C11d) processors depend on.
/// Never raises: a lookup miss is simply `None`, same as any other
/// "upstream empty" outcome in this pipeline.
#[async_trait]
pub trait AnimeMapper: Send + Sync {
    async fn mal_from_anilist(&self, anilist_id: u64) -> Option<u64>;
    async fn mal_from_anidb(&self, anidb_id: u64) -> Option<u64>;
    async fn anilist_from_mal(&self, mal_id: u64) -> Option<u64>;
    async fn mal_from_title(&self, title: &str) -> Option<(u64, String)>;
    async fn anidb_from_ids(&self, tmdb: Option<u64>, imdb: Option<&str>, tvdb: Option<u64>, anilist: Option<u64>) -> Option<u64>;
}

#[derive(Debug, Clone, Deserialize)]
struct CorpusEntry {
    title: String,
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CorpusDocument {
    #[serde(default)]
    data: Vec<CorpusEntry>,
}

/// Parsed provider ids for a single corpus entry. Malformed entries
/// are skipped, not fatal.
fn parse_source_url(url: &str) -> Option<(&'static str, u64)> {
    const PROVIDERS: &[(&str, &str)] = &[
        ("myanimelist.net/anime/", "mal"),
        ("anilist.co/anime/", "anilist"),
        ("anidb.net/anime/", "anidb"),
        ("kitsu.app/anime/", "kitsu"),
    ];
    for (needle, tag) in PROVIDERS {
        if let Some(pos) = url.find(needle) {
            let rest = &url[pos + needle.len()..];
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if let Ok(id) = digits.parse::<u64>() {
                return Some((tag, id));
            }
        }
    }
    None
}

/// Five in-memory indexes built once from the corpus.
#[derive(Debug, Default)]
struct CorpusIndexes {
    anilist_to_mal: HashMap<u64, u64>,
    anidb_to_mal: HashMap<u64, u64>,
    kitsu_to_mal: HashMap<u64, u64>,
    mal_to_anilist: HashMap<u64, u64>,
    title_to_mal: HashMap<String, (u64, String)>,
}

fn build_indexes(doc: &CorpusDocument) -> CorpusIndexes {
    let mut indexes = CorpusIndexes::default();
    for entry in &doc.data {
        let mut ids: HashMap<&'static str, u64> = HashMap::new();
        for source in &entry.sources {
            if let Some((tag, id)) = parse_source_url(source) {
                ids.insert(tag, id);
            }
        }
        let Some(&mal_id) = ids.get("mal") else {
            continue;
        };
        if let Some(&anilist_id) = ids.get("anilist") {
            indexes.anilist_to_mal.insert(anilist_id, mal_id);
            indexes.mal_to_anilist.insert(mal_id, anilist_id);
        }
        if let Some(&anidb_id) = ids.get("anidb") {
            indexes.anidb_to_mal.insert(anidb_id, mal_id);
        }
        if let Some(&kitsu_id) = ids.get("kitsu") {
            indexes.kitsu_to_mal.insert(kitsu_id, mal_id);
        }
        let key = entry.title.trim().to_lowercase();
        if !key.is_empty() {
            indexes.title_to_mal.entry(key).or_insert((mal_id, entry.title.clone()));
        }
    }
    indexes
}

/// Secondary TMDB/IMDB/TVDB/AniList → AniDB corpus.
#[derive(Debug, Clone, Default, Deserialize)]
struct AnimeIdsEntry {
    #[serde(default)]
    anidb_id: Option<serde_json::Value>,
    #[serde(default)]
    tmdb_id: Option<serde_json::Value>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    tvdb_id: Option<serde_json::Value>,
    #[serde(default)]
    anilist_id: Option<serde_json::Value>,
}

fn as_u64(value: &Option<serde_json::Value>) -> Option<u64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// A full [`AnimeMapper`] backed by the downloaded corpora. Holds both corpora's indexes
/// behind a one-shot guard: once built, every reader sees the completed
/// indexes without further locking.
pub struct CorpusAnimeMapper {
    http: reqwest::Client,
    cache_dir: PathBuf,
    indexes: OnceLock<CorpusIndexes>,
    anime_ids: OnceLock<Vec<AnimeIdsEntry>>,
    jikan: Arc<JikanRatingSource>,
    anidb_cache: TtlCache<u64>,
}

impl CorpusAnimeMapper {
    pub fn new(http: reqwest::Client, cache_dir: impl Into<PathBuf>, jikan: Arc<JikanRatingSource>) -> Self {
        Self {
            http,
            cache_dir: cache_dir.into(),
            indexes: OnceLock::new(),
            anime_ids: OnceLock::new(),
            jikan,
            anidb_cache: TtlCache::new(),
        }
    }

    fn corpus_cache_path(&self) -> PathBuf {
        self.cache_dir.join("anime-offline-database-minified.json")
    }

    fn anime_ids_cache_path(&self) -> PathBuf {
        self.cache_dir.join("anime_ids.json")
    }

    /// Download-unless-fresh-local-copy: skips the network round trip
    /// when a local copy is less than 7 days old.
    async fn fetch_or_use_local(&self, url: &str, path: &Path) -> Option<String> {
        if let Ok(metadata) = std::fs::metadata(path) {
            if let Ok(modified) = metadata.modified() {
                if modified.elapsed().map(|age| age < CORPUS_MAX_AGE).unwrap_or(false) {
                    if let Ok(text) = std::fs::read_to_string(path) {
                        debug!(path = %path.display(), "using fresh local corpus copy");
                        return Some(text);
                    }
                }
            }
        }

        debug!(url, "downloading anime id corpus");
        let response = self
            .http
            .get(url)
            .timeout(CORPUS_DOWNLOAD_TIMEOUT)
            .send()
            .await;
        let text = match response {
            Ok(r) => match r.text().await {
                Ok(t) => t,
                Err(err) => {
                    warn!(url, %err, "corpus response body unreadable");
                    return std::fs::read_to_string(path).ok();
                }
            },
            Err(err) => {
                warn!(url, %err, "corpus download failed, falling back to stale local copy if any");
                return std::fs::read_to_string(path).ok();
            }
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::write(path, &text);
        Some(text)
    }

    async fn indexes(&self) -> Option<&CorpusIndexes> {
        if let Some(indexes) = self.indexes.get() {
            return Some(indexes);
        }
        let text = self.fetch_or_use_local(CORPUS_URL, &self.corpus_cache_path()).await?;
        let doc: CorpusDocument = match serde_json::from_str(&text) {
            Ok(d) => d,
            Err(err) => {
                warn!(%err, "anime corpus did not parse");
                return None;
            }
        };
        let built = build_indexes(&doc);
        Some(self.indexes.get_or_init(|| built))
    }

    async fn anime_ids_entries(&self) -> Option<&Vec<AnimeIdsEntry>> {
        if let Some(entries) = self.anime_ids.get() {
            return Some(entries);
        }
        let text = self.fetch_or_use_local(ANIME_IDS_URL, &self.anime_ids_cache_path()).await?;
        #[derive(Deserialize)]
        struct Doc {
            #[serde(flatten)]
            entries: HashMap<String, AnimeIdsEntry>,
        }
        let parsed: Doc = match serde_json::from_str(&text) {
            Ok(d) => d,
            Err(err) => {
                warn!(%err, "anime_ids.json did not parse");
                return None;
            }
        };
        let list: Vec<AnimeIdsEntry> = parsed.entries.into_values().collect();
        Some(self.anime_ids.get_or_init(|| list))
    }
}

#[async_trait]
impl AnimeMapper for CorpusAnimeMapper {
    async fn mal_from_anilist(&self, anilist_id: u64) -> Option<u64> {
        self.indexes().await?.anilist_to_mal.get(&anilist_id).copied()
    }

    async fn mal_from_anidb(&self, anidb_id: u64) -> Option<u64> {
        self.indexes().await?.anidb_to_mal.get(&anidb_id).copied()
    }

    async fn anilist_from_mal(&self, mal_id: u64) -> Option<u64> {
        self.indexes().await?.mal_to_anilist.get(&mal_id).copied()
    }

    async fn mal_from_title(&self, title: &str) -> Option<(u64, String)> {
        let key = title.trim().to_lowercase();
        if let Some(hit) = self.indexes().await.and_then(|idx| idx.title_to_mal.get(&key)) {
            return Some(hit.clone());
        }
        let anime = self.jikan.search_best_match(title).await?;
        Some((anime.mal_id, anime.title))
    }

    async fn anidb_from_ids(&self, tmdb: Option<u64>, imdb: Option<&str>, tvdb: Option<u64>, anilist: Option<u64>) -> Option<u64> {
        let cache_key = format!("{tmdb:?}:{imdb:?}:{tvdb:?}:{anilist:?}");
        if let Some(cached) = self.anidb_cache.get_fresh(&cache_key) {
            return Some(cached);
        }
        let entries = self.anime_ids_entries().await?;
        let found = entries.iter().find(|e| {
            (tmdb.is_some() && as_u64(&e.tmdb_id) == tmdb)
                || (imdb.is_some() && e.imdb_id.as_deref() == imdb)
                || (tvdb.is_some() && as_u64(&e.tvdb_id) == tvdb)
                || (anilist.is_some() && as_u64(&e.anilist_id) == anilist)
        })?;
        let anidb_id = as_u64(&found.anidb_id)?;
        self.anidb_cache.insert(cache_key, anidb_id, badgeforge_model::cache::ttl::ANIME_ID_SECONDARY_MAP);
        Some(anidb_id)
    }
}

/// Degenerate [`AnimeMapper`] used when the corpus cannot be loaded at
/// startup: only title search via Jikan, no cross-provider
/// corpus lookups.
pub struct BasicAnimeMapper {
    jikan: Arc<JikanRatingSource>,
}

impl BasicAnimeMapper {
    pub fn new(jikan: Arc<JikanRatingSource>) -> Self {
        Self { jikan }
    }
}

#[async_trait]
impl AnimeMapper for BasicAnimeMapper {
    async fn mal_from_anilist(&self, _anilist_id: u64) -> Option<u64> {
        None
    }

    async fn mal_from_anidb(&self, _anidb_id: u64) -> Option<u64> {
        None
    }

    async fn anilist_from_mal(&self, _mal_id: u64) -> Option<u64> {
        None
    }

    async fn mal_from_title(&self, title: &str) -> Option<(u64, String)> {
        let anime = self.jikan.search_best_match(title).await?;
        Some((anime.mal_id, anime.title))
    }

    async fn anidb_from_ids(&self, _tmdb: Option<u64>, _imdb: Option<&str>, _tvdb: Option<u64>, _anilist: Option<u64>) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_urls_with_trailing_path() {
        assert_eq!(
            parse_source_url("https://myanimelist.net/anime/20/Naruto"),
            Some(("mal", 20))
        );
        assert_eq!(parse_source_url("https://anilist.co/anime/20"), Some(("anilist", 20)));
        assert_eq!(parse_source_url("https://anidb.net/anime/69"), Some(("anidb", 69)));
    }

    #[test]
    fn malformed_source_url_is_skipped_not_fatal() {
        assert_eq!(parse_source_url("https://myanimelist.net/anime/not-a-number"), None);
    }

    #[test]
    fn builds_cross_reference_indexes_from_entries() {
        let doc = CorpusDocument {
            data: vec![CorpusEntry {
                title: "Naruto".into(),
                sources: vec![
                    "https://myanimelist.net/anime/20".into(),
                    "https://anilist.co/anime/20".into(),
                ],
            }],
        };
        let indexes = build_indexes(&doc);
        assert_eq!(indexes.anilist_to_mal.get(&20), Some(&20));
        assert_eq!(indexes.mal_to_anilist.get(&20), Some(&20));
        assert_eq!(
            indexes.title_to_mal.get("naruto"),
            Some(&(20, "Naruto".to_string()))
        );
    }

    #[test]
    fn entries_without_a_mal_id_are_skipped() {
        let doc = CorpusDocument {
            data: vec![CorpusEntry {
                title: "No MAL".into(),
                sources: vec!["https://anidb.net/anime/5".into()],
            }],
        };
        let indexes = build_indexes(&doc);
        assert!(indexes.anidb_to_mal.is_empty());
    }
}
