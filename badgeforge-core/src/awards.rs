//! Awards Detector (C5) — combines a static curated mapping table,
//! TMDb/OMDb keyword scans, and a curated Crunchyroll list; emits one
//! prioritized award token.
//!
//! The detector itself never makes a network call — the awards
//! processor (C11d) gathers the raw signals from C3's OMDb/TMDb clients
//! and hands them in as [`AwardsSignals`], so this module stays pure
//! aggregation-and-selection logic, independently testable without a
//! network double.

use std::collections::{HashMap, HashSet};

use badgeforge_model::{AwardToken, MediaKind};
use tracing::debug;

/// Substrings (lowercased) that, if found anywhere in a TMDb overview or
/// keyword list, count as a detected mention of that award.
const KEYWORD_PATTERNS: &[(&str, AwardToken)] = &[
    ("oscar", AwardToken::Oscars),
    ("academy award", AwardToken::Oscars),
    ("cannes", AwardToken::Cannes),
    ("golden globe", AwardToken::Golden),
    ("bafta", AwardToken::Bafta),
    ("emmy", AwardToken::Emmys),
    ("crunchyroll anime award", AwardToken::Crunchyroll),
    ("berlinale", AwardToken::Berlinale),
    ("golden bear", AwardToken::Berlinale),
    ("venice film festival", AwardToken::Venice),
    ("golden lion", AwardToken::Venice),
    ("sundance", AwardToken::Sundance),
    ("independent spirit", AwardToken::Spirit),
    ("cesar award", AwardToken::Cesar),
    ("césar", AwardToken::Cesar),
    ("people's choice", AwardToken::Choice),
    ("critics' choice", AwardToken::Choice),
    ("letterboxd", AwardToken::Letterboxd),
    ("metacritic must-see", AwardToken::Metacritic),
    ("certified fresh", AwardToken::Rotten),
    ("netflix top 10", AwardToken::Netflix),
];

/// TMDb `vote_average` at or above which the implicit `imdb` signal
/// fires.
const TMDB_IMPLICIT_IMDB_THRESHOLD: f64 = 8.5;

/// Raw signal bundle the awards processor assembles before handing off
/// to [`detect`]. Every field is independently optional — any source
/// may have nothing to say about a given item.
#[derive(Debug, Clone, Default)]
pub struct AwardsSignals<'a> {
    pub imdb_id: Option<&'a str>,
    pub kind: Option<MediaKind>,
    pub tmdb_vote_average: Option<f64>,
    pub tmdb_keyword_text: Option<&'a str>,
    pub omdb_awards_text: Option<&'a str>,
    pub tmdb_id: Option<u64>,
    pub title: Option<&'a str>,
}

/// Static curated award tables: the IMDb-id map is keyed per `(imdb_id,
/// kind)` since the same title can carry different awards depending on
/// whether the ref is a movie, a season, or an episode cut; the
/// Crunchyroll list is a flat set of lowercased titles and/or TMDb ids.
#[derive(Debug, Clone, Default)]
pub struct AwardsTables {
    pub static_by_imdb: HashMap<String, Vec<AwardToken>>,
    pub crunchyroll_titles: HashSet<String>,
    pub crunchyroll_tmdb_ids: HashSet<u64>,
}

impl AwardsTables {
    /// Load the two curated JSON tables embedded at build time.
    pub fn embedded() -> Self {
        let static_by_imdb: HashMap<String, Vec<AwardToken>> =
            serde_json::from_str(include_str!("../data/static_awards.json"))
                .unwrap_or_default();
        let crunchyroll_titles: HashSet<String> =
            serde_json::from_str::<Vec<String>>(include_str!("../data/crunchyroll_awards.json"))
                .unwrap_or_default()
                .into_iter()
                .map(|t| t.to_lowercase())
                .collect();
        Self {
            static_by_imdb,
            crunchyroll_titles,
            crunchyroll_tmdb_ids: HashSet::new(),
        }
    }

    fn static_tokens(&self, imdb_id: Option<&str>) -> Vec<AwardToken> {
        imdb_id
            .and_then(|id| self.static_by_imdb.get(id))
            .cloned()
            .unwrap_or_default()
    }

    fn crunchyroll_hit(&self, tmdb_id: Option<u64>, title: Option<&str>) -> bool {
        if let Some(id) = tmdb_id {
            if self.crunchyroll_tmdb_ids.contains(&id) {
                return true;
            }
        }
        if let Some(title) = title {
            if self.crunchyroll_titles.contains(&title.to_lowercase()) {
                return true;
            }
        }
        false
    }
}

fn scan_keywords(text: &str) -> Vec<AwardToken> {
    let lower = text.to_lowercase();
    KEYWORD_PATTERNS
        .iter()
        .filter(|(needle, _)| lower.contains(needle))
        .map(|(_, token)| *token)
        .collect()
}

/// Aggregate every signal into the full detected set — order is
/// arbitrary and irrelevant, since `select_award` reduces it to a single
/// priority winner.
pub fn detect(signals: &AwardsSignals<'_>, tables: &AwardsTables) -> Vec<AwardToken> {
    let mut detected = tables.static_tokens(signals.imdb_id);

    if let Some(text) = signals.tmdb_keyword_text {
        detected.extend(scan_keywords(text));
    }
    if let Some(text) = signals.omdb_awards_text {
        detected.extend(scan_keywords(text));
    }
    if tables.crunchyroll_hit(signals.tmdb_id, signals.title) {
        detected.push(AwardToken::Crunchyroll);
    }
    if signals.tmdb_vote_average.unwrap_or(0.0) >= TMDB_IMPLICIT_IMDB_THRESHOLD {
        detected.push(AwardToken::Imdb);
    }

    debug!(detected = ?detected, "awards detection signals collected");
    detected
}

/// Run detection and immediately reduce to the single emitted token.
pub fn detect_and_select(signals: &AwardsSignals<'_>, tables: &AwardsTables) -> Option<AwardToken> {
    badgeforge_model::select_award(&detect(signals, tables))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_table_hit_wins_regardless_of_scan_order() {
        let mut tables = AwardsTables::default();
        tables
            .static_by_imdb
            .insert("tt0111161".into(), vec![AwardToken::Imdb]);
        let signals = AwardsSignals {
            imdb_id: Some("tt0111161"),
            omdb_awards_text: Some("Won 1 Oscar. Another 21 wins."),
            tmdb_vote_average: Some(9.3),
            ..Default::default()
        };
        let selected = detect_and_select(&signals, &tables);
        assert_eq!(selected, Some(AwardToken::Oscars));
    }

    #[test]
    fn implicit_imdb_signal_fires_above_threshold() {
        let tables = AwardsTables::default();
        let signals = AwardsSignals {
            tmdb_vote_average: Some(8.6),
            ..Default::default()
        };
        assert_eq!(detect_and_select(&signals, &tables), Some(AwardToken::Imdb));
    }

    #[test]
    fn crunchyroll_title_hit_is_detected() {
        let mut tables = AwardsTables::default();
        tables.crunchyroll_titles.insert("demon slayer".into());
        let signals = AwardsSignals {
            title: Some("Demon Slayer"),
            ..Default::default()
        };
        assert_eq!(detect_and_select(&signals, &tables), Some(AwardToken::Crunchyroll));
    }

    #[test]
    fn no_signals_yields_no_award() {
        let tables = AwardsTables::default();
        let signals = AwardsSignals::default();
        assert_eq!(detect_and_select(&signals, &tables), None);
    }

    #[test]
    fn embedded_tables_load_and_parse() {
        let tables = AwardsTables::embedded();
        assert!(!tables.static_by_imdb.is_empty());
        assert!(tables.crunchyroll_titles.contains("demon slayer"));
    }
}
