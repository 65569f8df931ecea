use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::PathBuf,
};

use crate::types::{Highlight, HighlightKind};

/// Local highlight cache: a synchronous, always-available shadow of
/// the remote store, keyed by resource key and highlight kind.
///
/// Failures never propagate. An unreadable or malformed payload is
/// treated as no data; a failed write is logged and dropped.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Cache under the platform cache directory.
    pub fn in_default_root() -> Self {
        Self::new(
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join("zakladka"),
        )
    }

    /// Directory for one resource key.
    fn resource_dir(&self, resource_key: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        resource_key.hash(&mut hasher);
        self.root.join(hasher.finish().to_string())
    }

    fn highlights_path(&self, resource_key: &str, kind: HighlightKind) -> PathBuf {
        self.resource_dir(resource_key)
            .join(format!("{}-highlights.json", kind.as_str()))
    }

    /// The last-known highlight set for a resource and kind, if any.
    pub fn load(&self, resource_key: &str, kind: HighlightKind) -> Option<Vec<Highlight>> {
        let path = self.highlights_path(resource_key, kind);
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(highlights) => Some(highlights),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "discarding malformed highlight cache payload"
                );
                None
            }
        }
    }

    /// Write-through on every toggle.
    pub fn save(&self, resource_key: &str, kind: HighlightKind, highlights: &[Highlight]) {
        let dir = self.resource_dir(resource_key);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to create highlight cache dir");
            return;
        }

        let path = self.highlights_path(resource_key, kind);
        match serde_json::to_string(highlights) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to write highlight cache");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize highlights"),
        }
    }
}
