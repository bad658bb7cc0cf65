use std::fmt;

/// A single award token, ordered by prestige. `PRIORITY` is the
/// tie-break order the awards detector (C5) applies across every source
/// that fired — highest-prestige match wins regardless of discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AwardToken {
    Oscars,
    Cannes,
    Golden,
    Bafta,
    Emmys,
    Crunchyroll,
    Berlinale,
    Venice,
    Sundance,
    Spirit,
    Cesar,
    Choice,
    Imdb,
    Letterboxd,
    Metacritic,
    Rotten,
    Netflix,
}

impl AwardToken {
    /// Most-to-least prestigious.
    pub const PRIORITY: [AwardToken; 17] = [
        AwardToken::Oscars,
        AwardToken::Cannes,
        AwardToken::Golden,
        AwardToken::Bafta,
        AwardToken::Emmys,
        AwardToken::Crunchyroll,
        AwardToken::Berlinale,
        AwardToken::Venice,
        AwardToken::Sundance,
        AwardToken::Spirit,
        AwardToken::Cesar,
        AwardToken::Choice,
        AwardToken::Imdb,
        AwardToken::Letterboxd,
        AwardToken::Metacritic,
        AwardToken::Rotten,
        AwardToken::Netflix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AwardToken::Oscars => "oscars",
            AwardToken::Cannes => "cannes",
            AwardToken::Golden => "golden",
            AwardToken::Bafta => "bafta",
            AwardToken::Emmys => "emmys",
            AwardToken::Crunchyroll => "crunchyroll",
            AwardToken::Berlinale => "berlinale",
            AwardToken::Venice => "venice",
            AwardToken::Sundance => "sundance",
            AwardToken::Spirit => "spirit",
            AwardToken::Cesar => "cesar",
            AwardToken::Choice => "choice",
            AwardToken::Imdb => "imdb",
            AwardToken::Letterboxd => "letterboxd",
            AwardToken::Metacritic => "metacritic",
            AwardToken::Rotten => "rotten",
            AwardToken::Netflix => "netflix",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::PRIORITY.into_iter().find(|t| t.as_str() == s.trim().to_ascii_lowercase())
    }
}

impl fmt::Display for AwardToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the single highest-priority token out of a detected set.
pub fn select_award(detected: &[AwardToken]) -> Option<AwardToken> {
    AwardToken::PRIORITY
        .into_iter()
        .find(|candidate| detected.contains(candidate))
}
