//! TV Dominant-Value Analyzer (C6) — samples N episodes concurrently,
//! tallies audio-codec and resolution, returns the modal value.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use badgeforge_model::{AudioInfo, MediaRef, ResolutionInfo};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::media_client::{EpisodeRef, MediaMetadataClient};

const DEFAULT_SAMPLE_SIZE: usize = 5;
const DEFAULT_PER_EPISODE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_CONCURRENCY: usize = 5;
const SERIES_CACHE_TTL: Duration = badgeforge_model::cache::ttl::SERIES_DOMINANT_VALUE;
const PERSIST_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Tunables for a single analysis run.
#[derive(Debug, Clone, Copy)]
pub struct DominantValueConfig {
    pub sample_size: usize,
    pub per_episode_timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for DominantValueConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            per_episode_timeout: DEFAULT_PER_EPISODE_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Strategic episode sample: endpoints + middle for `sample_size >= 2`.
/// Returns indices into `episodes`, deduplicated and
/// sorted, capped at `sample_size`.
pub fn sample_indices(total: usize, sample_size: usize) -> Vec<usize> {
    if total == 0 || sample_size == 0 {
        return Vec::new();
    }
    if total <= sample_size {
        return (0..total).collect();
    }
    if sample_size == 1 {
        return vec![0];
    }

    let mut picks = vec![0usize, total - 1];
    let remaining = sample_size - 2;
    if remaining > 0 {
        for i in 1..=remaining {
            let pos = (i * (total - 1)) / (remaining + 1);
            picks.push(pos);
        }
    }
    picks.sort_unstable();
    picks.dedup();
    picks.truncate(sample_size);
    picks
}

/// Tally a multiset of string-keyed samples, first-seen order preserved
/// for tie-breaking.
pub fn tally_mode<T: Clone>(samples: Vec<(String, T)>) -> Option<T> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen_order: Vec<String> = Vec::new();
    let mut first_value: HashMap<String, T> = HashMap::new();

    for (key, value) in samples {
        if !counts.contains_key(&key) {
            first_seen_order.push(key.clone());
            first_value.insert(key.clone(), value);
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    // `Iterator::max_by_key` keeps the *last* element on a tie, which
    // would break ties by last-seen rather than first-seen — fold
    // manually so the earliest key with the highest count wins.
    let winner = first_seen_order.into_iter().fold(None::<(String, usize)>, |best, key| {
        let count = counts[&key];
        match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((key, count)),
        }
    });
    winner.and_then(|(key, _)| first_value.remove(&key))
}

/// On-disk persisted form of one series' dominant-value results. Cached
/// for 24h, persisted to disk as JSON at hourly intervals and reloaded
/// on start, dropping expired entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedEntry {
    series_id: String,
    audio: Option<AudioInfo>,
    resolution: Option<ResolutionInfo>,
    inserted_at_unix: u64,
}

#[derive(Debug, Clone, Default)]
struct SeriesCacheState {
    audio: HashMap<String, (AudioInfo, std::time::Instant)>,
    resolution: HashMap<String, (ResolutionInfo, std::time::Instant)>,
}

/// Process-wide cache of per-series dominant values, persisted to a
/// single JSON file under an exclusive lock for the duration of each
/// write.
pub struct SeriesDominantCache {
    path: PathBuf,
    state: Mutex<SeriesCacheState>,
}

impl SeriesDominantCache {
    pub fn new(path: impl Into<PathBuf>) -> Arc<Self> {
        let cache = Arc::new(Self {
            path: path.into(),
            state: Mutex::new(SeriesCacheState::default()),
        });
        cache.clone().load_from_disk_blocking();
        cache
    }

    fn load_from_disk_blocking(self: Arc<Self>) {
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return;
        };
        let Ok(entries) = serde_json::from_str::<Vec<PersistedEntry>>(&text) else {
            warn!(path = %self.path.display(), "series dominant-value cache file did not parse, starting empty");
            return;
        };
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut state = SeriesCacheState::default();
        for entry in entries {
            if now.saturating_sub(entry.inserted_at_unix) >= SERIES_CACHE_TTL.as_secs() {
                continue;
            }
            let age = Duration::from_secs(now.saturating_sub(entry.inserted_at_unix));
            let inserted_instant = std::time::Instant::now().checked_sub(age).unwrap_or_else(std::time::Instant::now);
            if let Some(audio) = entry.audio {
                state.audio.insert(entry.series_id.clone(), (audio, inserted_instant));
            }
            if let Some(resolution) = entry.resolution {
                state.resolution.insert(entry.series_id.clone(), (resolution, inserted_instant));
            }
        }
        debug!(path = %self.path.display(), "loaded series dominant-value cache from disk");
        // SAFETY: construction-time only, no concurrent readers yet.
        if let Ok(mut guard) = self.state.try_lock() {
            *guard = state;
        }
    }

    pub async fn get_audio(&self, series_id: &str) -> Option<AudioInfo> {
        let state = self.state.lock().await;
        state
            .audio
            .get(series_id)
            .filter(|(_, inserted)| inserted.elapsed() < SERIES_CACHE_TTL)
            .map(|(value, _)| value.clone())
    }

    pub async fn get_resolution(&self, series_id: &str) -> Option<ResolutionInfo> {
        let state = self.state.lock().await;
        state
            .resolution
            .get(series_id)
            .filter(|(_, inserted)| inserted.elapsed() < SERIES_CACHE_TTL)
            .map(|(value, _)| value.clone())
    }

    pub async fn put_audio(&self, series_id: &str, value: AudioInfo) {
        let mut state = self.state.lock().await;
        state.audio.insert(series_id.to_string(), (value, std::time::Instant::now()));
    }

    pub async fn put_resolution(&self, series_id: &str, value: ResolutionInfo) {
        let mut state = self.state.lock().await;
        state.resolution.insert(series_id.to_string(), (value, std::time::Instant::now()));
    }

    /// Serialize the full cache to disk under an exclusive lock.
    pub async fn persist(&self) -> std::io::Result<()> {
        let state = self.state.lock().await;
        let now = std::time::Instant::now();
        let mut ids: std::collections::HashSet<&String> = state.audio.keys().collect();
        ids.extend(state.resolution.keys());

        let entries: Vec<PersistedEntry> = ids
            .into_iter()
            .map(|id| {
                let audio_age = state.audio.get(id).map(|(_, t)| now.duration_since(*t));
                let res_age = state.resolution.get(id).map(|(_, t)| now.duration_since(*t));
                let age = audio_age.or(res_age).unwrap_or_default();
                let inserted_at_unix = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs().saturating_sub(age.as_secs()))
                    .unwrap_or(0);
                PersistedEntry {
                    series_id: id.clone(),
                    audio: state.audio.get(id).map(|(v, _)| v.clone()),
                    resolution: state.resolution.get(id).map(|(v, _)| v.clone()),
                    inserted_at_unix,
                }
            })
            .collect();

        let text = serde_json::to_string(&entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)
    }

    /// Spawn the hourly persistence task.
    pub fn spawn_persistence_task(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PERSIST_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(err) = self.persist().await {
                    warn!(%err, "failed to persist series dominant-value cache");
                }
            }
        })
    }
}

/// Sample episodes, resolve each one's streams under a concurrency cap
/// and per-episode timeout, classify each, and return the modal value
/// with a sensible default on total failure.
pub async fn dominant_audio(
    client: &Arc<dyn MediaMetadataClient>,
    episodes: &[EpisodeRef],
    config: DominantValueConfig,
) -> AudioInfo {
    let samples = collect_samples(client, episodes, config, |streams| {
        streams.first_audio().map(crate::processors::audio::classify)
    })
    .await;

    tally_mode(
        samples
            .into_iter()
            .map(|info| (info.to_string_form(), info))
            .collect(),
    )
    .unwrap_or_else(default_audio)
}

pub async fn dominant_resolution(
    client: &Arc<dyn MediaMetadataClient>,
    episodes: &[EpisodeRef],
    config: DominantValueConfig,
) -> ResolutionInfo {
    let samples = collect_samples(client, episodes, config, |streams| {
        streams.first_video().map(crate::resolution::classify)
    })
    .await;

    tally_mode(
        samples
            .into_iter()
            .map(|info| (info.to_string_form(), info))
            .collect(),
    )
    .unwrap_or_else(default_resolution)
}

async fn collect_samples<T, F>(
    client: &Arc<dyn MediaMetadataClient>,
    episodes: &[EpisodeRef],
    config: DominantValueConfig,
    classify: F,
) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&badgeforge_model::MediaStreams) -> Option<T> + Send + Sync + Copy + 'static,
{
    let indices = sample_indices(episodes.len(), config.sample_size);
    let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
    let mut handles = Vec::with_capacity(indices.len());

    for &idx in &indices {
        let episode = episodes[idx].clone();
        let client = Arc::clone(client);
        let semaphore = Arc::clone(&semaphore);
        let per_episode_timeout = config.per_episode_timeout;
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            let fetch = client.media_streams(&episode.media_ref);
            match timeout(per_episode_timeout, fetch).await {
                Ok(Ok(streams)) => classify(&streams),
                Ok(Err(err)) => {
                    warn!(episode = ?episode.media_ref, %err, "episode stream fetch failed, discarding sample");
                    None
                }
                Err(_) => {
                    warn!(episode = ?episode.media_ref, "episode stream fetch timed out, discarding sample");
                    None
                }
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(Some(value)) = handle.await {
            results.push(value);
        }
    }
    results
}

fn default_audio() -> AudioInfo {
    badgeforge_model::AudioInfo {
        codec_family: badgeforge_model::AudioCodecFamily::DolbyDigitalPlus,
        channel_layout: "6.0".to_string(),
        is_atmos: false,
        is_dts_x: false,
        display_label: "EAC3 6.0".to_string(),
    }
}

fn default_resolution() -> ResolutionInfo {
    badgeforge_model::ResolutionInfo {
        height: 1080,
        width: 1920,
        base_resolution: badgeforge_model::BaseResolution::P1080,
        is_hdr: false,
        is_dv: false,
        is_hdr_plus: false,
        codec: "unknown".to_string(),
        color_space: None,
        video_range: None,
        bit_depth: None,
        bitrate: None,
        profile: None,
    }
}

/// Resolve the series ref for a cache key.
pub fn series_cache_key(series_ref: &MediaRef) -> &str {
    series_ref.id.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_indices_picks_endpoints_and_middle() {
        let picks = sample_indices(24, 5);
        assert_eq!(picks.first(), Some(&0));
        assert_eq!(picks.last(), Some(&23));
        assert_eq!(picks.len(), 5);
    }

    #[test]
    fn sample_indices_with_fewer_episodes_than_sample_size_takes_all() {
        assert_eq!(sample_indices(3, 5), vec![0, 1, 2]);
    }

    #[test]
    fn tally_mode_breaks_ties_by_first_seen() {
        let samples = vec![
            ("a".to_string(), "a"),
            ("b".to_string(), "b"),
            ("a".to_string(), "a"),
            ("b".to_string(), "b"),
        ];
        assert_eq!(tally_mode(samples), Some("a"));
    }

    #[test]
    fn tally_mode_picks_strict_majority() {
        let samples = vec![
            ("eac3".to_string(), 1),
            ("eac3".to_string(), 1),
            ("eac3".to_string(), 1),
            ("aac".to_string(), 2),
        ];
        assert_eq!(tally_mode(samples), Some(1));
    }

    #[test]
    fn empty_samples_yield_no_mode() {
        assert_eq!(tally_mode::<u8>(Vec::new()), None);
    }
}
