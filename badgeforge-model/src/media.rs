use crate::ids::MediaItemId;

/// The kind of library item a [`MediaRef`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaKind {
    Movie,
    Series,
    Season,
    Episode,
}

impl MediaKind {
    pub fn is_series_like(self) -> bool {
        matches!(self, MediaKind::Series | MediaKind::Season)
    }
}

/// Opaque server-assigned reference to a library item, plus its cached
/// kind. Immutable once looked up; discarded after a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaRef {
    pub id: MediaItemId,
    pub kind: MediaKind,
}

impl MediaRef {
    pub fn new(id: MediaItemId, kind: MediaKind) -> Self {
        Self { id, kind }
    }
}
