//! Image Discovery & Fallback (C8) — enumerates available badge images
//! and chooses the best match by priority and fallback rules.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use badgeforge_model::{AudioCodecFamily, ResolutionInfo};
use tracing::{debug, warn};

/// Ordered (suffix, needs_dv, needs_hdr, needs_plus) candidate table:
/// `<base>dvhdrplus, <base>dvhdr, <base>dvplus, <base>hdrplus,
/// <base>dv, <base>hdr, <base>plus, <base>`. A suffix is only offered
/// when every enhancement it names is actually present on the record —
/// otherwise it would overstate what the content has.
const RESOLUTION_SUFFIXES: &[(&str, bool, bool, bool)] = &[
    ("dvhdrplus", true, true, true),
    ("dvhdr", true, true, false),
    ("dvplus", true, false, true),
    ("hdrplus", false, true, true),
    ("dv", true, false, false),
    ("hdr", false, true, false),
    ("plus", false, false, true),
    ("", false, false, false),
];

const GENERIC_FALLBACKS: &[&str] = &["resolution-generic", "unknown", "1080p", "720p"];

/// In-memory index of badge-image stems (filename minus `.png`) found in
/// the configured image directory. Scanned lazily on first use, or on
/// demand via [`ImageIndex::refresh`].
#[derive(Debug)]
pub struct ImageIndex {
    root: PathBuf,
    stems: RwLock<HashSet<String>>,
}

impl ImageIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stems: RwLock::new(HashSet::new()),
        }
    }

    pub fn scan(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let index = Self::new(root);
        index.refresh()?;
        Ok(index)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-scan the image directory for `*.png` files, replacing the
    /// in-memory stem set.
    pub fn refresh(&self) -> std::io::Result<()> {
        let mut found = HashSet::new();
        match fs::read_dir(&self.root) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) == Some("png") {
                        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                            found.insert(stem.to_string());
                        }
                    }
                }
            }
            Err(err) => {
                warn!(root = %self.root.display(), %err, "failed to scan badge image directory");
            }
        }
        *self.stems.write().expect("image index lock poisoned") = found;
        Ok(())
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.stems.read().expect("image index lock poisoned").contains(stem)
    }

    fn path_for_stem(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.png"))
    }

    /// Simple `image_mapping[source] -> filename` lookup for non-resolution
    /// badge types.
    pub fn resolve_mapped(&self, source_key: &str, mapping: &HashMap<String, String>) -> Option<PathBuf> {
        mapping.get(source_key).map(|filename| self.root.join(filename))
    }

    /// Resolve an audio badge image, walking the codec family's one-step
    /// fallback chain when the preferred stem is unavailable.
    pub fn resolve_audio(
        &self,
        family: AudioCodecFamily,
        mapping: &HashMap<String, String>,
    ) -> Option<PathBuf> {
        if let Some(mapped) = mapping.get(family.image_stem()) {
            return Some(self.root.join(mapped));
        }
        let mut current = Some(family);
        while let Some(f) = current {
            let stem = f.image_stem();
            if self.contains(stem) {
                return Some(self.path_for_stem(stem));
            }
            current = f.fallback();
        }
        None
    }

    /// Resolve a resolution badge image through the full fallback
    /// ladder: user mapping, enhancement-aware candidates, one-step
    /// base fallback, then a fixed generic fallback chain.
    pub fn resolve_resolution(
        &self,
        info: &ResolutionInfo,
        mapping: &HashMap<String, String>,
    ) -> Option<PathBuf> {
        let full = info.to_string_form();
        let base = info.base_resolution.as_str();

        if let Some(mapped) = mapping.get(&full).or_else(|| mapping.get(base)) {
            return Some(self.root.join(mapped));
        }

        if let Some(path) = self.best_candidate(base, info.is_dv, info.is_hdr, info.is_hdr_plus) {
            return Some(path);
        }

        if let Some(fallback_base) = info.base_resolution.fallback() {
            if let Some(path) =
                self.best_candidate(fallback_base.as_str(), info.is_dv, info.is_hdr, info.is_hdr_plus)
            {
                return Some(path);
            }
        }

        for stem in GENERIC_FALLBACKS {
            if self.contains(stem) {
                debug!(stem, "falling back to generic resolution image");
                return Some(self.path_for_stem(stem));
            }
        }

        None
    }

    fn best_candidate(&self, base: &str, is_dv: bool, is_hdr: bool, is_plus: bool) -> Option<PathBuf> {
        RESOLUTION_SUFFIXES
            .iter()
            .filter(|(_, needs_dv, needs_hdr, needs_plus)| {
                (!needs_dv || is_dv) && (!needs_hdr || is_hdr) && (!needs_plus || is_plus)
            })
            .map(|(suffix, ..)| format!("{base}{suffix}"))
            .find(|stem| self.contains(stem))
            .map(|stem| self.path_for_stem(&stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badgeforge_model::BaseResolution;

    fn write_stub(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"png").unwrap();
    }

    fn info(is_dv: bool, is_hdr: bool, is_hdr_plus: bool) -> ResolutionInfo {
        ResolutionInfo {
            height: 2160,
            width: 3840,
            base_resolution: BaseResolution::P1080,
            is_hdr,
            is_dv,
            is_hdr_plus,
            codec: "hevc".into(),
            color_space: None,
            video_range: None,
            bit_depth: None,
            bitrate: None,
            profile: None,
        }
    }

    #[test]
    fn picks_dvhdr_when_plus_is_absent_but_both_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "1080pdvhdrplus.png");
        write_stub(dir.path(), "1080pdvhdr.png");
        let index = ImageIndex::scan(dir.path()).unwrap();
        let resolved = index
            .resolve_resolution(&info(true, true, false), &HashMap::new())
            .unwrap();
        assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), "1080pdvhdr.png");
    }

    #[test]
    fn falls_back_to_generic_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "unknown.png");
        let index = ImageIndex::scan(dir.path()).unwrap();
        let resolved = index
            .resolve_resolution(&info(false, false, false), &HashMap::new())
            .unwrap();
        assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), "unknown.png");
    }

    #[test]
    fn audio_falls_back_one_step_from_atmos_to_truehd() {
        let dir = tempfile::tempdir().unwrap();
        write_stub(dir.path(), "truehd.png");
        let index = ImageIndex::scan(dir.path()).unwrap();
        let resolved = index
            .resolve_audio(AudioCodecFamily::DolbyAtmos, &HashMap::new())
            .unwrap();
        assert_eq!(resolved.file_name().unwrap().to_str().unwrap(), "truehd.png");
    }
}
