//! The link resolver session.
//!
//! A [`LinkResolver`] owns the state of one user session: the current query,
//! the metadata or error it produced, and the derived direct link. State is
//! kept behind a mutex that is never held across an `.await`, so the session
//! can be shared by reference between concurrent tasks.
//!
//! # State machine
//!
//! ```text
//! Idle ──submit(valid)──▶ Loading ──ok──▶ Success ──download──▶ (InFlight) ──▶ Success
//!   │                        │
//!   └──submit(invalid)──┐    └──error──▶ Failed
//!                       ▼
//!                     Failed
//! ```
//!
//! Every submission clears metadata, error and direct link before loading.
//! While a lookup is outstanding further submissions are ignored, even after
//! a [`LinkResolver::reset`] has returned the session to `Idle`.
//!
//! Each submission and each reset starts a new generation. A response that
//! arrives for an older generation is discarded.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::direct_link::DirectLink;
use crate::download::{DownloadError, DownloadTrigger, Navigator, TriggerOutcome};
use crate::error::ResolveError;
use crate::link::{LinkQuery, validate_link};
use crate::metadata::{FileMetadata, MetadataService};
use crate::sync::lock;

/// Lifecycle of the current lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Nothing submitted yet, or the session was reset.
    Idle,
    /// A metadata lookup is outstanding.
    Loading,
    /// Metadata and direct link are available.
    Success,
    /// The last submission produced an error.
    Failed,
}

/// Result of a [`LinkResolver::submit`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Lookup succeeded.
    Resolved {
        /// File details from the metadata service
        metadata: FileMetadata,
        /// Derived direct link
        direct_link: DirectLink,
    },
    /// Validation or lookup failed; the session is in `Failed`.
    Failed(ResolveError),
    /// Ignored because a lookup was already outstanding.
    Busy,
    /// The response arrived after the session moved on and was dropped.
    Stale,
}

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current request state.
    pub request: RequestState,
    /// Query of the latest accepted submission.
    pub query: Option<LinkQuery>,
    /// Metadata, present only in `Success`.
    pub metadata: Option<FileMetadata>,
    /// Direct link, present only in `Success`.
    pub direct_link: Option<DirectLink>,
    /// Error, present only in `Failed`.
    pub error: Option<ResolveError>,
    /// Generation counter of the latest submission or reset.
    pub generation: u64,
}

#[derive(Debug)]
struct SessionState {
    request: RequestState,
    query: Option<LinkQuery>,
    metadata: Option<FileMetadata>,
    direct_link: Option<DirectLink>,
    error: Option<ResolveError>,
    generation: u64,
    /// A metadata request is outstanding, whichever generation it belongs to.
    in_flight: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            request: RequestState::Idle,
            query: None,
            metadata: None,
            direct_link: None,
            error: None,
            generation: 0,
            in_flight: false,
        }
    }

    /// Clears all results and starts a new generation.
    fn advance(&mut self, request: RequestState) {
        self.generation += 1;
        self.request = request;
        self.query = None;
        self.metadata = None;
        self.direct_link = None;
        self.error = None;
    }

    fn succeed(&mut self, metadata: FileMetadata, direct_link: DirectLink) {
        self.request = RequestState::Success;
        self.metadata = Some(metadata);
        self.direct_link = Some(direct_link);
        self.error = None;
    }

    fn fail(&mut self, error: ResolveError) {
        self.request = RequestState::Failed;
        self.metadata = None;
        self.direct_link = None;
        self.error = Some(error);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            request: self.request,
            query: self.query.clone(),
            metadata: self.metadata.clone(),
            direct_link: self.direct_link.clone(),
            error: self.error.clone(),
            generation: self.generation,
        }
    }
}

/// Resolves source links into metadata and direct links, one lookup at a time.
pub struct LinkResolver {
    service: Arc<dyn MetadataService>,
    trigger: DownloadTrigger,
    download_base_url: String,
    state: Arc<Mutex<SessionState>>,
}

impl LinkResolver {
    /// Creates a session from its collaborators.
    #[must_use]
    pub fn new(
        service: Arc<dyn MetadataService>,
        trigger: DownloadTrigger,
        download_base_url: impl Into<String>,
    ) -> Self {
        Self {
            service,
            trigger,
            download_base_url: download_base_url.into(),
            state: Arc::new(Mutex::new(SessionState::new())),
        }
    }

    /// Creates a session whose trigger timing and redirect base come from `config`.
    #[must_use]
    pub fn from_config(
        service: Arc<dyn MetadataService>,
        navigator: Arc<dyn Navigator>,
        config: &ResolverConfig,
    ) -> Self {
        Self::new(
            service,
            DownloadTrigger::from_config(navigator, config),
            config.download_base_url.clone(),
        )
    }

    /// Validates `raw` and, if accepted, looks up its metadata.
    ///
    /// Returns [`SubmitOutcome::Busy`] without touching state while another
    /// lookup is outstanding, including one orphaned by [`reset`](Self::reset).
    /// The loading flag is cleared on every exit path, including when this
    /// future is dropped.
    #[tracing::instrument(skip_all)]
    pub async fn submit(&self, raw: &str) -> SubmitOutcome {
        let (query, generation) = {
            let mut state = lock(&self.state);
            if state.in_flight {
                debug!("submission ignored while a lookup is outstanding");
                return SubmitOutcome::Busy;
            }
            state.advance(RequestState::Loading);
            match validate_link(raw) {
                Ok(query) => {
                    state.query = Some(query.clone());
                    state.in_flight = true;
                    (query, state.generation)
                }
                Err(error) => {
                    let error = ResolveError::from(error);
                    state.fail(error.clone());
                    return SubmitOutcome::Failed(error);
                }
            }
        };

        let loading = LoadingGuard::new(Arc::clone(&self.state), generation);
        let result = self.service.fetch(&query).await;
        loading.finish();

        let mut state = lock(&self.state);
        if state.generation != generation {
            warn!(
                generation,
                current = state.generation,
                "discarding stale metadata response"
            );
            return SubmitOutcome::Stale;
        }

        match result {
            Ok(metadata) => {
                let direct_link = DirectLink::build(&self.download_base_url, &query);
                state.succeed(metadata.clone(), direct_link.clone());
                SubmitOutcome::Resolved {
                    metadata,
                    direct_link,
                }
            }
            Err(error) => {
                debug!(kind = error.kind(), error = %error, "lookup failed");
                state.fail(error.clone());
                SubmitOutcome::Failed(error)
            }
        }
    }

    /// Triggers navigation to the current direct link.
    ///
    /// # Errors
    ///
    /// Returns the navigator's [`DownloadError`]; session state is unaffected.
    pub async fn download(&self) -> Result<TriggerOutcome, DownloadError> {
        let (direct_link, metadata) = {
            let state = lock(&self.state);
            match (&state.direct_link, &state.metadata) {
                (Some(direct_link), Some(metadata)) => (direct_link.clone(), metadata.clone()),
                _ => return Ok(TriggerOutcome::NoLink),
            }
        };
        self.trigger.trigger(&direct_link, &metadata).await
    }

    /// Returns the session to `Idle`, orphaning any outstanding lookup.
    ///
    /// The orphaned lookup still blocks new submissions until it settles; its
    /// response is then discarded.
    pub fn reset(&self) {
        lock(&self.state).advance(RequestState::Idle);
        debug!("session reset");
    }

    /// Copies the current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).snapshot()
    }

    /// Whether the current submission is loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        lock(&self.state).request == RequestState::Loading
    }

    /// Whether any metadata request is outstanding, including an orphaned one.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        lock(&self.state).in_flight
    }
}

impl std::fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkResolver")
            .field("download_base_url", &self.download_base_url)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag when the lookup settles or its future is dropped.
///
/// A dropped lookup also leaves `Loading` for `Idle` if its generation is
/// still current.
struct LoadingGuard {
    state: Arc<Mutex<SessionState>>,
    generation: u64,
    armed: bool,
}

impl LoadingGuard {
    fn new(state: Arc<Mutex<SessionState>>, generation: u64) -> Self {
        Self {
            state,
            generation,
            armed: true,
        }
    }

    /// Marks the lookup as completed and releases the in-flight flag.
    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.in_flight = false;
        if !self.armed {
            return;
        }
        if state.generation == self.generation && state.request == RequestState::Loading {
            state.request = RequestState::Idle;
            debug!(generation = self.generation, "lookup cancelled");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tokio::sync::Notify;

    use super::*;
    use crate::download::{DownloadState, Navigated};
    use crate::format::format_bytes;

    const BASE: &str = "https://redirect.test/download";
    const URL: &str = "https://mega.nz/file/xyz";

    struct Scripted {
        result: Result<FileMetadata, ResolveError>,
        gated: bool,
    }

    /// Replays scripted results; gated calls wait for `release`.
    #[derive(Default)]
    struct ScriptedService {
        script: Mutex<VecDeque<Scripted>>,
        calls: AtomicUsize,
        gate: Notify,
    }

    impl ScriptedService {
        fn push(&self, result: Result<FileMetadata, ResolveError>, gated: bool) {
            self.script
                .lock()
                .unwrap()
                .push_back(Scripted { result, gated });
        }

        fn release(&self) {
            self.gate.notify_one();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetadataService for ScriptedService {
        async fn fetch(&self, _query: &LinkQuery) -> Result<FileMetadata, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front().unwrap();
            if next.gated {
                self.gate.notified().await;
            }
            next.result
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Navigator for RecordingNavigator {
        async fn navigate(
            &self,
            link: &DirectLink,
            _metadata: &FileMetadata,
        ) -> Result<Navigated, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Navigated {
                link: link.clone(),
                path: None,
                bytes_written: 0,
            })
        }
    }

    fn meta(name: &str, size: u64) -> FileMetadata {
        FileMetadata {
            file_name: name.to_string(),
            file_size: size,
        }
    }

    fn resolver_with(
        service: &Arc<ScriptedService>,
        navigator: &Arc<RecordingNavigator>,
    ) -> LinkResolver {
        let service: Arc<dyn MetadataService> = Arc::clone(service) as Arc<dyn MetadataService>;
        let navigator: Arc<dyn Navigator> = Arc::clone(navigator) as Arc<dyn Navigator>;
        let trigger = DownloadTrigger::new(navigator, Duration::ZERO, Duration::from_secs(5));
        LinkResolver::new(service, trigger, BASE)
    }

    fn setup() -> (Arc<ScriptedService>, Arc<RecordingNavigator>, LinkResolver) {
        let service = Arc::new(ScriptedService::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let resolver = resolver_with(&service, &navigator);
        (service, navigator, resolver)
    }

    #[tokio::test]
    async fn test_invalid_link_fails_without_network_call() {
        let (service, _, resolver) = setup();

        for input in ["", "https://mega.nz/folder/abc", "http://example.com/file"] {
            let outcome = resolver.submit(input).await;
            assert!(
                matches!(outcome, SubmitOutcome::Failed(ResolveError::Validation(_))),
                "{input}: {outcome:?}"
            );
        }

        assert_eq!(service.calls(), 0);
        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.request, RequestState::Failed);
        assert!(snapshot.error.is_some());
        assert!(snapshot.metadata.is_none());
        assert!(snapshot.query.is_none());
    }

    #[tokio::test]
    async fn test_successful_lookup_sets_metadata_and_direct_link() {
        let (service, _, resolver) = setup();
        service.push(Ok(meta("a.txt", 2048)), false);

        let outcome = resolver.submit(URL).await;

        let expected_link = format!("{BASE}?url={}", STANDARD.encode(URL));
        match outcome {
            SubmitOutcome::Resolved {
                metadata,
                direct_link,
            } => {
                assert_eq!(metadata.file_name, "a.txt");
                assert_eq!(format_bytes(metadata.file_size), "2 KB");
                assert_eq!(direct_link.as_str(), expected_link);
            }
            other => panic!("expected Resolved, got {other:?}"),
        }

        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.request, RequestState::Success);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.query.unwrap().as_str(), URL);
        assert_eq!(snapshot.direct_link.unwrap().as_str(), expected_link);
    }

    #[tokio::test]
    async fn test_submission_while_loading_is_ignored() {
        let (service, _, resolver) = setup();
        service.push(Ok(meta("a.txt", 1)), true);

        let (first, second) = tokio::join!(resolver.submit(URL), async {
            tokio::task::yield_now().await;
            assert!(resolver.is_loading());
            let outcome = resolver.submit(URL).await;
            service.release();
            outcome
        });

        assert!(matches!(first, SubmitOutcome::Resolved { .. }));
        assert_eq!(second, SubmitOutcome::Busy);
        assert_eq!(service.calls(), 1);

        service.push(Ok(meta("b.txt", 1)), false);
        assert!(matches!(
            resolver.submit(URL).await,
            SubmitOutcome::Resolved { .. }
        ));
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_sets_error_and_clears_loading() {
        let (service, _, resolver) = setup();
        service.push(Err(ResolveError::transport("connection refused")), false);

        let outcome = resolver.submit(URL).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Failed(ResolveError::transport("connection refused"))
        );
        assert!(!resolver.is_loading());
        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.request, RequestState::Failed);
        assert_eq!(snapshot.error.unwrap().to_string(), "connection refused");
    }

    #[tokio::test]
    async fn test_new_submission_clears_previous_success() {
        let (service, _, resolver) = setup();
        service.push(Ok(meta("a.txt", 1)), false);
        resolver.submit(URL).await;

        resolver.submit("https://mega.nz/folder/nope").await;

        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.request, RequestState::Failed);
        assert!(snapshot.metadata.is_none());
        assert!(snapshot.direct_link.is_none());
    }

    #[tokio::test]
    async fn test_retry_after_failure_clears_error() {
        let (service, _, resolver) = setup();
        service.push(Err(ResolveError::application(None)), false);
        service.push(Ok(meta("a.txt", 1)), false);

        resolver.submit(URL).await;
        assert_eq!(resolver.snapshot().request, RequestState::Failed);

        resolver.submit(URL).await;
        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.request, RequestState::Success);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_response_from_superseded_generation_is_discarded() {
        let (service, _, resolver) = setup();
        service.push(Ok(meta("old.txt", 1)), true);

        let (first, ()) = tokio::join!(resolver.submit(URL), async {
            tokio::task::yield_now().await;
            resolver.reset();
            service.release();
        });

        assert_eq!(first, SubmitOutcome::Stale);
        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.request, RequestState::Idle);
        assert!(snapshot.metadata.is_none());
        assert!(snapshot.query.is_none());
        assert!(!resolver.is_busy());
    }

    #[tokio::test]
    async fn test_submission_after_reset_waits_for_orphaned_lookup() {
        let (service, _, resolver) = setup();
        service.push(Ok(meta("old.txt", 1)), true);

        let (first, second) = tokio::join!(resolver.submit(URL), async {
            tokio::task::yield_now().await;
            resolver.reset();
            assert!(!resolver.is_loading());
            assert!(resolver.is_busy());
            let outcome = resolver.submit("https://mega.nz/file/other").await;
            service.release();
            outcome
        });

        assert_eq!(first, SubmitOutcome::Stale);
        assert_eq!(second, SubmitOutcome::Busy);
        assert_eq!(service.calls(), 1);
        assert_eq!(resolver.snapshot().request, RequestState::Idle);

        service.push(Ok(meta("new.txt", 2)), false);
        assert!(matches!(
            resolver.submit("https://mega.nz/file/other").await,
            SubmitOutcome::Resolved { .. }
        ));
        assert_eq!(service.calls(), 2);
        assert_eq!(resolver.snapshot().metadata.unwrap().file_name, "new.txt");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_submission_clears_loading() {
        let (service, _, resolver) = setup();
        service.push(Ok(meta("a.txt", 1)), true);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), resolver.submit(URL)).await;

        assert!(timed_out.is_err());
        assert!(!resolver.is_loading());
        assert!(!resolver.is_busy());
        assert_eq!(resolver.snapshot().request, RequestState::Idle);

        service.push(Ok(meta("b.txt", 1)), false);
        assert!(matches!(
            resolver.submit(URL).await,
            SubmitOutcome::Resolved { .. }
        ));
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let (service, _, resolver) = setup();
        service.push(Ok(meta("a.txt", 1)), false);
        resolver.submit(URL).await;
        let before = resolver.snapshot().generation;

        resolver.reset();

        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.request, RequestState::Idle);
        assert!(snapshot.metadata.is_none());
        assert!(snapshot.direct_link.is_none());
        assert!(snapshot.generation > before);
    }

    #[tokio::test]
    async fn test_download_without_link_is_no_op() {
        let (_, navigator, resolver) = setup();

        assert_eq!(resolver.download().await.unwrap(), TriggerOutcome::NoLink);
        assert_eq!(navigator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_twice_navigates_once() {
        let (service, navigator, resolver) = setup();
        service.push(Ok(meta("a.txt", 1)), false);
        resolver.submit(URL).await;

        let first = resolver.download().await.unwrap();
        let second = resolver.download().await.unwrap();

        assert!(matches!(first, TriggerOutcome::Navigated(_)));
        assert_eq!(second, TriggerOutcome::Busy(DownloadState::InFlight));
        assert_eq!(navigator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.snapshot().request, RequestState::Success);
    }
}
