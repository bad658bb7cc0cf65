//! Settings Store Gateway (C1) — read-only typed access to badge/source
//! configuration and API credentials, with per-key caching and forced
//! reloads.
//!
//! The store itself (file layout, write path, migrations) is an external
//! collaborator; this gateway only knows how to resolve a fixed list of
//! candidate keys to a parsed, validated [`BadgeSettings`] document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use badgeforge_model::{required_sections, BadgeSettings, BadgeType};
use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no settings document found for badge type {0}")]
    NotFound(BadgeType),

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no api_keys / settings.yaml document found under {0}")]
    ApiKeysNotFound(PathBuf),
}

/// Per-service API credentials parsed from the `api_keys` / `settings.yaml`
/// key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub jellyfin: Vec<JellyfinCredential>,
    #[serde(default)]
    pub omdb: Vec<OmdbCredential>,
    #[serde(default)]
    pub tmdb: Vec<TmdbCredential>,
    #[serde(default)]
    pub anidb: Vec<AniDbCredential>,
}

impl ApiKeys {
    pub fn jellyfin(&self) -> Option<&JellyfinCredential> {
        self.jellyfin.first()
    }

    pub fn omdb(&self) -> Option<&OmdbCredential> {
        self.omdb.first()
    }

    pub fn tmdb(&self) -> Option<&TmdbCredential> {
        self.tmdb.first()
    }

    pub fn anidb(&self) -> Option<&AniDbCredential> {
        self.anidb.first()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JellyfinCredential {
    pub url: String,
    pub api_key: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbCredential {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredential {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AniDbCredential {
    pub client_name: String,
    pub version: String,
}

/// Options controlling a single [`SettingsGateway::get_badge_settings`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsLoadOptions {
    pub force_reload: bool,
}

impl SettingsLoadOptions {
    pub fn forced() -> Self {
        Self { force_reload: true }
    }
}

/// Typed, caching facade over the badge-settings documents.
///
/// `root` is the directory the settings store exposes to readers; this
/// gateway never writes to it. Each badge type's parsed document is cached
/// by type name until a forced reload is requested.
#[derive(Debug)]
pub struct SettingsGateway {
    root: PathBuf,
    badge_cache: DashMap<&'static str, Arc<BadgeSettings>>,
    api_keys_cache: DashMap<(), Arc<ApiKeys>>,
}

impl SettingsGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            badge_cache: DashMap::new(),
            api_keys_cache: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve candidate filenames for a badge type, in priority order
    /// (primary `.yml` first, then the three fallback spellings).
    fn candidate_filenames(badge_type: BadgeType) -> [String; 4] {
        let t = badge_type.as_str();
        [
            format!("badge_settings_{t}.yml"),
            format!("badge_settings_{t}"),
            format!("{t}_badge_settings"),
            format!("{t}_settings"),
        ]
    }

    pub fn get_badge_settings(
        &self,
        badge_type: BadgeType,
        opts: SettingsLoadOptions,
    ) -> Result<Arc<BadgeSettings>, SettingsError> {
        let cache_key = badge_type.as_str();
        if !opts.force_reload {
            if let Some(hit) = self.badge_cache.get(cache_key) {
                return Ok(hit.clone());
            }
        }

        let settings = Arc::new(self.load_badge_settings_from_disk(badge_type)?);
        self.badge_cache.insert(cache_key, settings.clone());
        Ok(settings)
    }

    fn load_badge_settings_from_disk(
        &self,
        badge_type: BadgeType,
    ) -> Result<BadgeSettings, SettingsError> {
        let candidates = Self::candidate_filenames(badge_type);
        let mut found = None;
        for name in &candidates {
            let path = self.root.join(name);
            if path.is_file() {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| SettingsError::Read { path: path.clone(), source })?;
                found = Some((path, text));
                break;
            }
        }

        let (path, text) = found.ok_or(SettingsError::NotFound(badge_type))?;
        let value: serde_yaml::Value = serde_yaml::from_str(&text)
            .map_err(|source| SettingsError::Parse { path: path.clone(), source })?;

        // Required section names are written in
        // PascalCase (`General`, `ImageBadges`) while the YAML documents
        // themselves use the struct's snake_case field names; compare
        // case- and separator-insensitively.
        let present: HashSet<String> = value
            .as_mapping()
            .map(|m| {
                m.keys()
                    .filter_map(|k| k.as_str())
                    .map(|k| k.replace('_', "").to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        let missing: Vec<&str> = required_sections(badge_type)
            .iter()
            .filter(|section| !present.contains(&section.replace('_', "").to_lowercase()))
            .copied()
            .collect();

        if !missing.is_empty() {
            warn!(
                ?badge_type,
                ?missing,
                path = %path.display(),
                "settings document missing required section(s), substituting defaults"
            );
        }

        // Unknown/extra sections are ignored by `serde(default)` on
        // `BadgeSettings`; a document missing a whole section just leaves
        // that section at its `Default` value.
        let settings: BadgeSettings = serde_yaml::from_value(value).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "failed to deserialize settings document, using defaults");
            BadgeSettings::default()
        });

        debug!(?badge_type, path = %path.display(), "loaded badge settings");
        Ok(settings)
    }

    pub fn get_api_keys(&self, opts: SettingsLoadOptions) -> Result<Arc<ApiKeys>, SettingsError> {
        if !opts.force_reload {
            if let Some(hit) = self.api_keys_cache.get(&()) {
                return Ok(hit.clone());
            }
        }

        let candidates = ["api_keys.yml", "api_keys", "settings.yaml", "settings.yml"];
        let mut found = None;
        for name in candidates {
            let path = self.root.join(name);
            if path.is_file() {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| SettingsError::Read { path: path.clone(), source })?;
                found = Some((path, text));
                break;
            }
        }

        let (path, text) = found.ok_or_else(|| SettingsError::ApiKeysNotFound(self.root.clone()))?;
        let keys: ApiKeys = serde_yaml::from_str(&text)
            .map_err(|source| SettingsError::Parse { path: path.clone(), source })?;
        let keys = Arc::new(keys);
        self.api_keys_cache.insert((), keys.clone());
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn resolves_primary_key_first() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "badge_settings_audio.yml",
            "general:\n  general_badge_size: 64\n  general_text_padding: 4\ntext: {}\nbackground: {}\nborder: {}\nimage_badges: {}\n",
        );
        let gateway = SettingsGateway::new(dir.path());
        let settings = gateway
            .get_badge_settings(BadgeType::Audio, SettingsLoadOptions::default())
            .unwrap();
        assert_eq!(settings.general.general_badge_size, 64);
    }

    #[test]
    fn caches_until_forced_reload() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "badge_settings_audio.yml",
            "general:\n  general_badge_size: 10\n  general_text_padding: 2\n",
        );
        let gateway = SettingsGateway::new(dir.path());
        let first = gateway
            .get_badge_settings(BadgeType::Audio, SettingsLoadOptions::default())
            .unwrap();
        write(
            dir.path(),
            "badge_settings_audio.yml",
            "general:\n  general_badge_size: 99\n  general_text_padding: 2\n",
        );
        let cached = gateway
            .get_badge_settings(BadgeType::Audio, SettingsLoadOptions::default())
            .unwrap();
        assert_eq!(first.general.general_badge_size, cached.general.general_badge_size);

        let reloaded = gateway
            .get_badge_settings(BadgeType::Audio, SettingsLoadOptions::forced())
            .unwrap();
        assert_eq!(reloaded.general.general_badge_size, 99);
    }

    #[test]
    fn missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = SettingsGateway::new(dir.path());
        let err = gateway
            .get_badge_settings(BadgeType::Awards, SettingsLoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(BadgeType::Awards)));
    }
}
