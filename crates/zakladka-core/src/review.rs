use std::path::Path;

use tokio::fs;

use crate::error::{Result, ZakladkaError};
use crate::highlight::Toggle;
use crate::outline::{flatten_outline, synthesize};
use crate::projection::{RenderedSection, render_outline};
use crate::segments::render_segments;
use crate::selection::ReportedSelection;
use crate::store::AnnotationStore;
use crate::types::{Fragment, HighlightKind, OutlineSection};

/// Read a flat transcript from a text file.
pub async fn load_transcript(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| ZakladkaError::TranscriptRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// One transcript-review session: the canonical transcript plus the
/// annotation store mediating both highlight sets.
///
/// The transcript is immutable for the lifetime of the session once
/// adopted; the outline and its flattened string are re-derived from
/// it on every access so projected positions always match.
pub struct ReviewSession {
    transcript: Option<String>,
    store: AnnotationStore,
}

impl ReviewSession {
    pub fn new(transcript: Option<String>, store: AnnotationStore) -> Self {
        Self { transcript, store }
    }

    /// Initialize the store and, when the caller supplied no
    /// transcript, adopt the remotely stored one.
    pub async fn load(&mut self) {
        self.store.initialize().await;
        if self.transcript.is_none() {
            self.transcript = self.store.stored_transcript();
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// The transcript split into plain and highlighted runs.
    pub fn transcript_fragments(&self) -> Vec<Fragment> {
        let Some(transcript) = self.transcript.as_deref() else {
            return Vec::new();
        };
        let highlights = self.store.highlights(HighlightKind::Transcript);
        render_segments(transcript, &highlights)
    }

    /// Outline derived from the transcript.
    pub fn outline(&self) -> Vec<OutlineSection> {
        self.transcript.as_deref().map(synthesize).unwrap_or_default()
    }

    /// The flattened outline string: the canonical string outline
    /// highlights are anchored to.
    pub fn outline_text(&self) -> String {
        flatten_outline(&self.outline())
    }

    /// Outline sections with highlights projected onto each heading
    /// and bullet.
    pub fn outline_render(&self) -> Vec<RenderedSection> {
        let sections = self.outline();
        let highlights = self.store.highlights(HighlightKind::Outline);
        render_outline(&sections, &highlights)
    }

    /// Handle a selection reported by the presentation layer: resolve
    /// it against the right canonical string and toggle. `None` means
    /// the selection was silently dropped.
    pub fn select(&self, kind: HighlightKind, selection: &ReportedSelection) -> Option<Toggle> {
        match kind {
            HighlightKind::Transcript => {
                let canonical = self.transcript.as_deref()?;
                self.store.apply_selection(kind, canonical, selection)
            }
            HighlightKind::Outline => {
                let canonical = self.outline_text();
                self.store.apply_selection(kind, &canonical, selection)
            }
        }
    }

    /// Remove a highlight by id (a click on a highlighted run).
    pub fn remove(&self, id: &str) -> Option<HighlightKind> {
        self.store.remove_highlight(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCache;
    use crate::store::StoreConfig;

    const TRANSCRIPT: &str =
        "What is osmosis?\nOsmosis is diffusion of water.\nIt occurs across membranes.";

    fn session() -> ReviewSession {
        let cache = LocalCache::new(
            std::env::temp_dir().join(format!("zakladka-review-test-{}", uuid::Uuid::new_v4())),
        );
        let store = AnnotationStore::new(
            StoreConfig {
                resource_key: "review-test".into(),
                resource_id: None,
                acting_user_id: None,
            },
            cache,
            None,
        );
        ReviewSession::new(Some(TRANSCRIPT.to_string()), store)
    }

    #[tokio::test]
    async fn selecting_transcript_text_produces_a_highlighted_run() {
        let session = session();
        let selection = ReportedSelection::new(0, "What is osmosis?");
        let outcome = session.select(HighlightKind::Transcript, &selection);
        assert!(matches!(outcome, Some(Toggle::Added(_))));

        let fragments = session.transcript_fragments();
        assert_eq!(fragments[0].text, "What is osmosis?");
        assert!(fragments[0].is_highlighted());
    }

    #[tokio::test]
    async fn outline_selection_is_anchored_to_the_flattened_string() {
        let session = session();
        let flat = session.outline_text();
        assert_eq!(flat, TRANSCRIPT);

        // "Osmosis" inside the first bullet of the flattened outline.
        let selection = ReportedSelection::new(17, "Osmosis is diffusion of water.");
        let outcome = session.select(HighlightKind::Outline, &selection);
        assert!(matches!(outcome, Some(Toggle::Added(_))));

        let rendered = session.outline_render();
        assert_eq!(rendered.len(), 1);
        let bullet = &rendered[0].bullets[0];
        assert_eq!(bullet.len(), 1);
        assert!(bullet[0].is_highlighted());
    }

    #[tokio::test]
    async fn clicking_a_highlighted_fragment_removes_it_by_id() {
        let session = session();
        session.select(
            HighlightKind::Transcript,
            &ReportedSelection::new(0, "What is osmosis?"),
        );
        let fragments = session.transcript_fragments();
        let id = fragments[0].highlight_id.clone().unwrap();

        assert_eq!(session.remove(&id), Some(HighlightKind::Transcript));
        let fragments = session.transcript_fragments();
        assert_eq!(fragments.len(), 1);
        assert!(!fragments[0].is_highlighted());
    }

    #[tokio::test]
    async fn unresolvable_selection_is_a_silent_no_op() {
        let session = session();
        let outcome = session.select(
            HighlightKind::Transcript,
            &ReportedSelection::new(3, "text that never appears"),
        );
        assert_eq!(outcome, None);
        assert!(session.store().highlights(HighlightKind::Transcript).is_empty());
    }

    #[tokio::test]
    async fn session_without_a_transcript_renders_nothing() {
        let cache = LocalCache::new(
            std::env::temp_dir().join(format!("zakladka-review-test-{}", uuid::Uuid::new_v4())),
        );
        let store = AnnotationStore::new(
            StoreConfig {
                resource_key: "empty".into(),
                resource_id: None,
                acting_user_id: None,
            },
            cache,
            None,
        );
        let session = ReviewSession::new(None, store);
        assert!(session.transcript_fragments().is_empty());
        assert!(session.outline().is_empty());
    }
}
