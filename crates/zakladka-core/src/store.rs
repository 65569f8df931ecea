use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::cache::LocalCache;
use crate::error::Result;
use crate::highlight::{self, Toggle};
use crate::remote::{FetchedAnnotations, PushRequest, RemoteAnnotations};
use crate::selection::{ReportedSelection, resolve_selection};
use crate::types::{Highlight, HighlightKind};

/// How long a pending remote fetch is trusted over the local cache.
pub const GRACE_DELAY: Duration = Duration::from_millis(500);

/// Where a kind's currently adopted highlight set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    RemoteLoaded,
    LocalFallback,
    Dirty,
}

#[derive(Debug)]
struct SetState {
    phase: Phase,
    highlights: Vec<Highlight>,
    mutations: u64,
}

impl SetState {
    fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            highlights: Vec::new(),
            mutations: 0,
        }
    }
}

struct State {
    transcript: SetState,
    outline: SetState,
    remote_transcript: Option<String>,
}

impl State {
    fn set_mut(&mut self, kind: HighlightKind) -> &mut SetState {
        match kind {
            HighlightKind::Transcript => &mut self.transcript,
            HighlightKind::Outline => &mut self.outline,
        }
    }

    fn set(&self, kind: HighlightKind) -> &SetState {
        match kind {
            HighlightKind::Transcript => &self.transcript,
            HighlightKind::Outline => &self.outline,
        }
    }
}

/// Identity configuration for one store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Cache key: the resource id when known, otherwise a
    /// caller-chosen fallback identifier such as the media URL.
    pub resource_key: String,
    /// Remote resource identity; without it the store runs cache-only.
    pub resource_id: Option<String>,
    /// Acting user; remote pushes require both this and the resource id.
    pub acting_user_id: Option<String>,
}

struct StoreInner {
    config: StoreConfig,
    cache: LocalCache,
    remote: Option<Arc<dyn RemoteAnnotations>>,
    state: Mutex<State>,
    pending_pushes: Mutex<Vec<JoinHandle<()>>>,
}

/// Owner of both highlight sets and the local/remote arbitration.
///
/// Cheap to clone; all clones share one state. There is exactly one
/// logical mutator (the user's toggle action), so a plain mutex
/// serializes mutations while suspension happens only at remote calls
/// and the grace timer.
#[derive(Clone)]
pub struct AnnotationStore {
    inner: Arc<StoreInner>,
}

impl AnnotationStore {
    pub fn new(
        config: StoreConfig,
        cache: LocalCache,
        remote: Option<Arc<dyn RemoteAnnotations>>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                cache,
                remote,
                state: Mutex::new(State {
                    transcript: SetState::new(),
                    outline: SetState::new(),
                    remote_transcript: None,
                }),
                pending_pushes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Run the adoption state machine.
    ///
    /// The remote fetch races the grace delay: a result arriving in
    /// time is adopted per kind (non-empty sets only), otherwise the
    /// local cache is adopted for kinds still uninitialized and a late
    /// remote result is applied only if the kind has not been touched
    /// since the fetch was issued. Returns once the fetch has settled,
    /// or immediately for a cache-only store.
    pub async fn initialize(&self) {
        let Some((remote, resource_id)) = self.remote_identity() else {
            self.adopt_local();
            return;
        };

        let snapshot = self.mutation_snapshot();
        let fetch = remote.fetch(&resource_id);
        tokio::pin!(fetch);

        tokio::select! {
            result = &mut fetch => {
                self.adopt_remote(result, snapshot);
                self.adopt_local();
            }
            _ = sleep(GRACE_DELAY) => {
                self.adopt_local();
                let result = fetch.await;
                self.adopt_remote(result, snapshot);
            }
        }
    }

    /// Snapshot of the currently adopted set for a kind.
    pub fn highlights(&self, kind: HighlightKind) -> Vec<Highlight> {
        self.lock().set(kind).highlights.clone()
    }

    /// Transcript text the remote store returned during
    /// initialization, if any.
    pub fn stored_transcript(&self) -> Option<String> {
        self.lock().remote_transcript.clone()
    }

    /// Toggle a candidate interval against one kind's set, write the
    /// result through the local cache, and push it remotely
    /// best-effort.
    pub fn toggle(&self, kind: HighlightKind, start: usize, end: usize) -> Option<Toggle> {
        let (outcome, highlights) = {
            let mut state = self.lock();
            let set = state.set_mut(kind);
            let outcome = highlight::toggle(&mut set.highlights, start, end)?;
            set.phase = Phase::Dirty;
            set.mutations += 1;
            (outcome, set.highlights.clone())
        };

        self.persist(kind, highlights);
        Some(outcome)
    }

    /// Resolve a reported selection against a canonical string and
    /// toggle the result. An unresolvable selection is a silent no-op.
    pub fn apply_selection(
        &self,
        kind: HighlightKind,
        canonical: &str,
        selection: &ReportedSelection,
    ) -> Option<Toggle> {
        let (start, end) = resolve_selection(canonical, selection)?;
        self.toggle(kind, start, end)
    }

    /// Remove a highlight by id, from whichever set holds it. This is
    /// the path behind a click on a highlighted fragment.
    pub fn remove_highlight(&self, id: &str) -> Option<HighlightKind> {
        let (kind, highlights) = {
            let mut state = self.lock();
            let found = [HighlightKind::Transcript, HighlightKind::Outline]
                .into_iter()
                .find(|&kind| {
                    state
                        .set(kind)
                        .highlights
                        .iter()
                        .any(|h| h.id == id)
                })?;
            let set = state.set_mut(found);
            set.highlights.retain(|h| h.id != id);
            set.phase = Phase::Dirty;
            set.mutations += 1;
            (found, set.highlights.clone())
        };

        self.persist(kind, highlights);
        Some(kind)
    }

    /// Wait for in-flight remote pushes. For callers about to exit;
    /// pushes remain best-effort either way.
    pub async fn flush(&self) {
        let handles: Vec<_> = {
            let mut pending = self
                .inner
                .pending_pushes
                .lock()
                .expect("annotation store poisoned");
            pending.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().expect("annotation store poisoned")
    }

    fn remote_identity(&self) -> Option<(Arc<dyn RemoteAnnotations>, String)> {
        let remote = self.inner.remote.clone()?;
        let resource_id = self.inner.config.resource_id.clone()?;
        Some((remote, resource_id))
    }

    fn mutation_snapshot(&self) -> (u64, u64) {
        let state = self.lock();
        (state.transcript.mutations, state.outline.mutations)
    }

    /// Adopt the local cache for kinds still uninitialized.
    fn adopt_local(&self) {
        let mut state = self.lock();
        for kind in [HighlightKind::Transcript, HighlightKind::Outline] {
            if state.set(kind).phase != Phase::Uninitialized {
                continue;
            }
            let cached = self
                .inner
                .cache
                .load(&self.inner.config.resource_key, kind);
            let set = state.set_mut(kind);
            if let Some(highlights) = cached {
                if !highlights.is_empty() {
                    set.highlights = highlights;
                }
            }
            set.phase = Phase::LocalFallback;
        }
    }

    /// Adopt a remote fetch result. Empty sets and failures are
    /// treated alike as "remote has nothing"; a set the user has
    /// mutated, whether before or after the fetch was issued, is
    /// never overwritten.
    fn adopt_remote(
        &self,
        result: Result<Option<FetchedAnnotations>>,
        snapshot: (u64, u64),
    ) {
        let fetched = match result {
            Ok(Some(fetched)) => fetched,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "annotation fetch failed; relying on local cache");
                return;
            }
        };

        let mut state = self.lock();
        if state.remote_transcript.is_none() {
            state.remote_transcript = fetched.transcript;
        }
        Self::adopt_remote_set(
            state.set_mut(HighlightKind::Transcript),
            fetched.transcript_highlights,
            snapshot.0,
        );
        Self::adopt_remote_set(
            state.set_mut(HighlightKind::Outline),
            fetched.outline_highlights,
            snapshot.1,
        );
    }

    fn adopt_remote_set(set: &mut SetState, highlights: Vec<Highlight>, snapshot: u64) {
        if highlights.is_empty() {
            return;
        }
        if set.mutations != snapshot || set.phase == Phase::Dirty || set.phase == Phase::RemoteLoaded
        {
            tracing::warn!("discarding remote highlights for an already-mutated set");
            return;
        }
        set.highlights = highlights;
        set.phase = Phase::RemoteLoaded;
    }

    /// Local write-through plus a fire-and-forget remote push.
    fn persist(&self, kind: HighlightKind, highlights: Vec<Highlight>) {
        self.inner
            .cache
            .save(&self.inner.config.resource_key, kind, &highlights);

        let Some((remote, resource_id)) = self.remote_identity() else {
            return;
        };
        let Some(acting_user_id) = self.inner.config.acting_user_id.clone() else {
            return;
        };

        let handle = tokio::spawn(async move {
            let request = PushRequest {
                acting_user_id,
                kind,
                highlights,
            };
            if let Err(e) = remote.push(&resource_id, &request).await {
                tracing::warn!(error = %e, "annotation push failed");
            }
        });
        self.inner
            .pending_pushes
            .lock()
            .expect("annotation store poisoned")
            .push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeRemote {
        delay: Duration,
        fetched: Option<FetchedAnnotations>,
        pushes: Mutex<Vec<(String, PushRequest)>>,
    }

    impl FakeRemote {
        fn new(delay: Duration, fetched: Option<FetchedAnnotations>) -> Arc<Self> {
            Arc::new(Self {
                delay,
                fetched,
                pushes: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RemoteAnnotations for FakeRemote {
        async fn fetch(&self, _resource_id: &str) -> Result<Option<FetchedAnnotations>> {
            sleep(self.delay).await;
            Ok(self.fetched.clone())
        }

        async fn push(&self, resource_id: &str, request: &PushRequest) -> Result<()> {
            self.pushes
                .lock()
                .expect("pushes poisoned")
                .push((resource_id.to_string(), request.clone()));
            Ok(())
        }
    }

    fn temp_cache() -> LocalCache {
        LocalCache::new(
            std::env::temp_dir().join(format!("zakladka-store-test-{}", uuid::Uuid::new_v4())),
        )
    }

    fn config(resource_id: Option<&str>, user: Option<&str>) -> StoreConfig {
        StoreConfig {
            resource_key: "resource-key".into(),
            resource_id: resource_id.map(Into::into),
            acting_user_id: user.map(Into::into),
        }
    }

    fn mark(id: &str, start: usize, end: usize) -> Highlight {
        Highlight {
            id: id.into(),
            start,
            end,
        }
    }

    fn intervals(highlights: &[Highlight]) -> Vec<(usize, usize)> {
        highlights.iter().map(|h| (h.start, h.end)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn remote_arriving_within_grace_beats_the_local_cache() {
        let cache = temp_cache();
        cache.save("resource-key", HighlightKind::Transcript, &[mark("stale", 100, 110)]);

        let remote = FakeRemote::new(
            Duration::from_millis(50),
            Some(FetchedAnnotations {
                transcript: None,
                transcript_highlights: vec![mark("fresh", 0, 5)],
                outline_highlights: Vec::new(),
            }),
        );
        let store = AnnotationStore::new(config(Some("42"), None), cache, Some(remote as Arc<dyn RemoteAnnotations>));

        store.initialize().await;
        assert_eq!(
            intervals(&store.highlights(HighlightKind::Transcript)),
            vec![(0, 5)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_loses_to_the_cache_and_late_result_applies_when_untouched() {
        let cache = temp_cache();
        cache.save("resource-key", HighlightKind::Transcript, &[mark("local", 100, 110)]);

        let remote = FakeRemote::new(
            Duration::from_millis(800),
            Some(FetchedAnnotations {
                transcript: None,
                transcript_highlights: vec![mark("remote", 0, 5)],
                outline_highlights: Vec::new(),
            }),
        );
        let store = AnnotationStore::new(config(Some("42"), None), cache, Some(remote as Arc<dyn RemoteAnnotations>));

        let init = tokio::spawn({
            let store = store.clone();
            async move { store.initialize().await }
        });

        // Past the grace delay but before the fetch settles: the
        // local cache has been adopted.
        sleep(Duration::from_millis(600)).await;
        assert_eq!(
            intervals(&store.highlights(HighlightKind::Transcript)),
            vec![(100, 110)]
        );

        // The set was never mutated, so the late remote result still
        // replaces the fallback.
        init.await.unwrap();
        assert_eq!(
            intervals(&store.highlights(HighlightKind::Transcript)),
            vec![(0, 5)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_remote_result_never_overwrites_a_user_toggle() {
        let cache = temp_cache();
        let remote = FakeRemote::new(
            Duration::from_millis(800),
            Some(FetchedAnnotations {
                transcript: None,
                transcript_highlights: vec![mark("remote", 0, 5)],
                outline_highlights: Vec::new(),
            }),
        );
        let store = AnnotationStore::new(config(Some("42"), None), cache, Some(remote as Arc<dyn RemoteAnnotations>));

        let init = tokio::spawn({
            let store = store.clone();
            async move { store.initialize().await }
        });

        sleep(Duration::from_millis(600)).await;
        store.toggle(HighlightKind::Transcript, 20, 30);

        init.await.unwrap();
        assert_eq!(
            intervals(&store.highlights(HighlightKind::Transcript)),
            vec![(20, 30)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_issued_before_initialization_survives_remote_adoption() {
        let cache = temp_cache();
        let remote = FakeRemote::new(
            Duration::from_millis(50),
            Some(FetchedAnnotations {
                transcript: None,
                transcript_highlights: vec![mark("remote", 0, 5)],
                outline_highlights: Vec::new(),
            }),
        );
        let store = AnnotationStore::new(config(Some("42"), None), cache, Some(remote as Arc<dyn RemoteAnnotations>));

        store.toggle(HighlightKind::Transcript, 20, 30);
        store.initialize().await;
        assert_eq!(
            intervals(&store.highlights(HighlightKind::Transcript)),
            vec![(20, 30)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_remote_result_falls_back_to_the_cache() {
        let cache = temp_cache();
        cache.save("resource-key", HighlightKind::Outline, &[mark("local", 7, 9)]);

        let remote = FakeRemote::new(Duration::from_millis(10), Some(FetchedAnnotations::default()));
        let store = AnnotationStore::new(config(Some("42"), None), cache, Some(remote as Arc<dyn RemoteAnnotations>));

        store.initialize().await;
        assert_eq!(
            intervals(&store.highlights(HighlightKind::Outline)),
            vec![(7, 9)]
        );
    }

    #[tokio::test]
    async fn cache_only_store_initializes_immediately() {
        let cache = temp_cache();
        cache.save("resource-key", HighlightKind::Transcript, &[mark("local", 1, 4)]);

        let store = AnnotationStore::new(config(None, None), cache, None);
        store.initialize().await;
        assert_eq!(
            intervals(&store.highlights(HighlightKind::Transcript)),
            vec![(1, 4)]
        );
    }

    #[tokio::test]
    async fn toggle_writes_through_the_local_cache() {
        let cache = temp_cache();
        let store = AnnotationStore::new(config(None, None), cache.clone(), None);
        store.initialize().await;
        store.toggle(HighlightKind::Transcript, 10, 20);

        let reopened = AnnotationStore::new(config(None, None), cache, None);
        reopened.initialize().await;
        assert_eq!(
            intervals(&reopened.highlights(HighlightKind::Transcript)),
            vec![(10, 20)]
        );
    }

    #[tokio::test]
    async fn toggle_pushes_remotely_when_identities_are_known() {
        let cache = temp_cache();
        let remote = FakeRemote::new(Duration::ZERO, None);
        let store = AnnotationStore::new(
            config(Some("42"), Some("user-7")),
            cache,
            Some(remote.clone() as Arc<dyn RemoteAnnotations>),
        );

        store.initialize().await;
        store.toggle(HighlightKind::Outline, 3, 8);
        store.flush().await;

        let pushes = remote.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        let (resource_id, request) = &pushes[0];
        assert_eq!(resource_id, "42");
        assert_eq!(request.acting_user_id, "user-7");
        assert_eq!(request.kind, HighlightKind::Outline);
        assert_eq!(intervals(&request.highlights), vec![(3, 8)]);
    }

    #[tokio::test]
    async fn no_push_without_an_acting_user() {
        let cache = temp_cache();
        let remote = FakeRemote::new(Duration::ZERO, None);
        let store =
            AnnotationStore::new(config(Some("42"), None), cache, Some(remote.clone() as Arc<dyn RemoteAnnotations>));

        store.initialize().await;
        store.toggle(HighlightKind::Transcript, 0, 3);
        store.flush().await;
        assert!(remote.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_highlight_finds_the_owning_kind() {
        let cache = temp_cache();
        let store = AnnotationStore::new(config(None, None), cache, None);
        store.initialize().await;
        store.toggle(HighlightKind::Transcript, 0, 5);
        let outcome = store.toggle(HighlightKind::Outline, 10, 15).unwrap();

        assert_eq!(
            store.remove_highlight(outcome.id()),
            Some(HighlightKind::Outline)
        );
        assert!(store.highlights(HighlightKind::Outline).is_empty());
        assert_eq!(store.highlights(HighlightKind::Transcript).len(), 1);
        assert_eq!(store.remove_highlight("no-such-id"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stored_transcript_is_exposed_after_initialization() {
        let cache = temp_cache();
        let remote = FakeRemote::new(
            Duration::from_millis(10),
            Some(FetchedAnnotations {
                transcript: Some("stored text".into()),
                transcript_highlights: Vec::new(),
                outline_highlights: Vec::new(),
            }),
        );
        let store = AnnotationStore::new(config(Some("42"), None), cache, Some(remote as Arc<dyn RemoteAnnotations>));

        store.initialize().await;
        assert_eq!(store.stored_transcript().as_deref(), Some("stored text"));
    }
}

