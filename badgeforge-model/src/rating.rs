use std::fmt;

/// Rating source identity, including the IMDb prestige variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RatingSource {
    Imdb,
    ImdbTop250,
    ImdbTop1000,
    Tmdb,
    RtCritics,
    Metacritic,
    MyAnimeList,
    AniDb,
}

impl RatingSource {
    pub fn display_name(self) -> &'static str {
        match self {
            RatingSource::Imdb => "IMDb",
            RatingSource::ImdbTop250 => "IMDb Top 250",
            RatingSource::ImdbTop1000 => "IMDb Top 1000",
            RatingSource::Tmdb => "TMDb",
            RatingSource::RtCritics => "RT Critics",
            RatingSource::Metacritic => "Metacritic",
            RatingSource::MyAnimeList => "MyAnimeList",
            RatingSource::AniDb => "AniDB",
        }
    }

    pub fn image_key(self) -> &'static str {
        match self {
            RatingSource::Imdb | RatingSource::ImdbTop250 | RatingSource::ImdbTop1000 => "imdb",
            RatingSource::Tmdb => "tmdb",
            RatingSource::RtCritics => "rotten_tomatoes",
            RatingSource::Metacritic => "metacritic",
            RatingSource::MyAnimeList => "myanimelist",
            RatingSource::AniDb => "anidb",
        }
    }

    pub fn is_imdb_variant(self) -> bool {
        matches!(
            self,
            RatingSource::Imdb | RatingSource::ImdbTop250 | RatingSource::ImdbTop1000
        )
    }
}

impl fmt::Display for RatingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single rating pulled from one upstream source.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingRecord {
    pub source: RatingSource,
    pub text_display: String,
    pub numeric_score: f64,
    pub max_score: f64,
    pub image_key: String,
    pub variant_tag: Option<String>,
}

impl RatingRecord {
    /// Score normalized to a 0..=100 percentage.
    pub fn as_percentage(&self) -> f64 {
        if self.max_score <= 0.0 {
            0.0
        } else {
            (self.numeric_score / self.max_score * 100.0).clamp(0.0, 100.0)
        }
    }
}

/// Select the IMDb variant token for a given score/vote pair.
pub fn imdb_variant(score: f64, votes: u64) -> RatingSource {
    if score >= 8.5 && votes >= 250_000 {
        RatingSource::ImdbTop250
    } else if score >= 8.0 && votes >= 100_000 {
        RatingSource::ImdbTop1000
    } else {
        RatingSource::Imdb
    }
}
