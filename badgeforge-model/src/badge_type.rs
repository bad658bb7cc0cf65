use std::fmt;

/// One of the four badge processors a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BadgeType {
    Audio,
    Resolution,
    Review,
    Awards,
}

impl BadgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeType::Audio => "audio",
            BadgeType::Resolution => "resolution",
            BadgeType::Review => "review",
            BadgeType::Awards => "awards",
        }
    }
}

impl fmt::Display for BadgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
