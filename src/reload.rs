//! Reload without reset
//!
//! Swaps the displayed document for a freshly fetched copy of the same path
//! while keeping the user's scroll position. Two things make this work:
//!
//! - the viewer runs with [`ResetPolicy::PreserveViewport`] for the duration of
//!   the swap, so it clears its pages without recentring the viewport;
//! - the new handle's fingerprint is pinned to the configured path, so the
//!   engine's position-restore heuristics treat it as the same document.
//!
//! The policy is restored by [`ReloadScope`]'s `Drop`, which covers success,
//! fetch failure and a dropped future alike.

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use thiserror::Error;

use crate::engine::{fetch_pinned_document, EngineError, LoadOptions, ResetPolicy, ViewerHandle};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReloadError {
    #[error("Reload failed: {0}")]
    DocumentLoad(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    Idle,
    /// The initial document is still being opened
    InitialLoad,
    OverrideInstalled,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The document was swapped (including any coalesced follow-up)
    Reloaded,
    /// Another reload was in flight; it will run once more when it finishes
    Coalesced,
}

pub struct ReloadCoordinator<V: ViewerHandle> {
    viewer: Rc<V>,
    options: LoadOptions,
    state: Cell<ReloadState>,
    pending: Cell<bool>,
}

impl<V: ViewerHandle> ReloadCoordinator<V> {
    pub fn new(viewer: Rc<V>, options: LoadOptions) -> Self {
        Self {
            viewer,
            options,
            state: Cell::new(ReloadState::Idle),
            pending: Cell::new(false),
        }
    }

    pub fn state(&self) -> ReloadState {
        self.state.get()
    }

    /// Run the first document load with the coordinator held busy
    ///
    /// Reload signals that arrive meanwhile are coalesced exactly as they are
    /// during a reload; [`resume`](Self::resume) runs the owed cycle. A failed
    /// initial load discards them.
    pub async fn initial_load<F, T, E>(&self, load: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let result = {
            let _busy = InitialLoadScope::enter(&self.state);
            load.await
        };
        if result.is_err() {
            self.pending.set(false);
        }
        result
    }

    /// Run the reload owed to signals coalesced during the initial load
    pub async fn resume(&self) -> Result<Option<ReloadOutcome>, ReloadError> {
        if !self.pending.get() {
            return Ok(None);
        }
        tracing::debug!("Reload signalled during initial load");
        self.request_reload().await.map(Some)
    }

    /// Handle one reload signal
    ///
    /// Signals arriving while a reload is in flight are folded into a single
    /// follow-up cycle run by the in-flight call.
    pub async fn request_reload(&self) -> Result<ReloadOutcome, ReloadError> {
        if self.state.get() != ReloadState::Idle {
            self.pending.set(true);
            tracing::debug!("Reload already in flight, coalescing");
            return Ok(ReloadOutcome::Coalesced);
        }

        loop {
            self.pending.set(false);
            let result = self.reload_once().await;

            if !self.pending.get() {
                return result.map(|()| ReloadOutcome::Reloaded);
            }
            if let Err(e) = result {
                tracing::warn!("Reload failed, retrying for coalesced signal: {}", e);
            }
        }
    }

    async fn reload_once(&self) -> Result<(), ReloadError> {
        let _scope = ReloadScope::enter(self.viewer.as_ref(), &self.state);

        self.state.set(ReloadState::Loading);
        let document = fetch_pinned_document(self.viewer.as_ref(), &self.options).await?;
        self.viewer.load(document);

        tracing::info!(path = %self.options.url, "Document reloaded");
        Ok(())
    }
}

struct InitialLoadScope<'a> {
    state: &'a Cell<ReloadState>,
}

impl<'a> InitialLoadScope<'a> {
    fn enter(state: &'a Cell<ReloadState>) -> Self {
        state.set(ReloadState::InitialLoad);
        Self { state }
    }
}

impl Drop for InitialLoadScope<'_> {
    fn drop(&mut self) {
        self.state.set(ReloadState::Idle);
    }
}

/// Holds the preserve-viewport override for as long as it lives
struct ReloadScope<'a, V: ViewerHandle + ?Sized> {
    viewer: &'a V,
    state: &'a Cell<ReloadState>,
    original: ResetPolicy,
}

impl<'a, V: ViewerHandle + ?Sized> ReloadScope<'a, V> {
    fn enter(viewer: &'a V, state: &'a Cell<ReloadState>) -> Self {
        let original = viewer.reset_policy();
        viewer.set_reset_policy(ResetPolicy::PreserveViewport);
        state.set(ReloadState::OverrideInstalled);
        Self {
            viewer,
            state,
            original,
        }
    }
}

impl<V: ViewerHandle + ?Sized> Drop for ReloadScope<'_, V> {
    fn drop(&mut self) {
        self.viewer.set_reset_policy(self.original);
        self.state.set(ReloadState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::ViewerBootstrapper;
    use crate::config::Configuration;
    use crate::engine::fake::FakeViewer;
    use crate::engine::DocumentHandle;

    fn options() -> LoadOptions {
        LoadOptions {
            url: "doc.pdf".to_string(),
            use_worker_fetch: false,
            c_map_url: "cmaps/".to_string(),
            c_map_packed: true,
            standard_font_data_url: "fonts/".to_string(),
        }
    }

    fn coordinator() -> (Rc<FakeViewer>, ReloadCoordinator<FakeViewer>) {
        let viewer = Rc::new(FakeViewer::new());
        let coordinator = ReloadCoordinator::new(Rc::clone(&viewer), options());
        (viewer, coordinator)
    }

    #[tokio::test]
    async fn test_reload_loads_under_preserve_viewport() {
        let (viewer, coordinator) = coordinator();

        let outcome = coordinator.request_reload().await.unwrap();

        assert_eq!(outcome, ReloadOutcome::Reloaded);
        assert_eq!(
            *viewer.policy_at_fetch.borrow(),
            vec![ResetPolicy::PreserveViewport]
        );
        assert_eq!(
            *viewer.policy_at_load.borrow(),
            vec![ResetPolicy::PreserveViewport]
        );
        assert_eq!(viewer.reset_policy(), ResetPolicy::Full);
        assert_eq!(coordinator.state(), ReloadState::Idle);
    }

    #[tokio::test]
    async fn test_policy_restored_after_failed_fetch() {
        let (viewer, coordinator) = coordinator();
        viewer.fail_fetches.set(1);

        let err = coordinator.request_reload().await.unwrap_err();

        assert!(matches!(err, ReloadError::DocumentLoad(EngineError::DocumentLoad(_))));
        assert_eq!(viewer.reset_policy(), ResetPolicy::Full);
        assert_eq!(coordinator.state(), ReloadState::Idle);
        assert!(viewer.loaded.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_restores_whatever_policy_was_installed() {
        let (viewer, coordinator) = coordinator();
        viewer.set_reset_policy(ResetPolicy::PreserveViewport);

        coordinator.request_reload().await.unwrap();

        assert_eq!(viewer.reset_policy(), ResetPolicy::PreserveViewport);
    }

    #[tokio::test]
    async fn test_reload_keeps_fingerprint_identity() {
        let (viewer, coordinator) = coordinator();

        coordinator.request_reload().await.unwrap();
        coordinator.request_reload().await.unwrap();

        let loaded = viewer.loaded.borrow();
        assert_eq!(loaded.len(), 2);
        for document in loaded.iter() {
            assert_eq!(document.fingerprints(), vec!["doc.pdf".to_string()]);
        }
    }

    #[tokio::test]
    async fn test_reload_preserves_scroll_offset() {
        let (viewer, coordinator) = coordinator();
        viewer.scroll_offset.set(1842.5);

        coordinator.request_reload().await.unwrap();

        assert!((viewer.scroll_offset.get() - 1842.5).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_plain_load_still_resets_after_reload() {
        let (viewer, coordinator) = coordinator();
        viewer.scroll_offset.set(500.0);
        coordinator.request_reload().await.unwrap();

        let document = fetch_pinned_document(viewer.as_ref(), &options()).await.unwrap();
        viewer.load(document);

        assert_eq!(viewer.scroll_offset.get(), 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_signals_are_coalesced() {
        let (viewer, coordinator) = coordinator();

        let (first, second, third) = tokio::join!(
            coordinator.request_reload(),
            coordinator.request_reload(),
            coordinator.request_reload(),
        );

        assert_eq!(first.unwrap(), ReloadOutcome::Reloaded);
        assert_eq!(second.unwrap(), ReloadOutcome::Coalesced);
        assert_eq!(third.unwrap(), ReloadOutcome::Coalesced);
        // the in-flight reload plus exactly one follow-up
        assert_eq!(viewer.fetch_count.get(), 2);
        assert_eq!(viewer.loaded.borrow().len(), 2);
        assert_eq!(viewer.reset_policy(), ResetPolicy::Full);
        assert_eq!(coordinator.state(), ReloadState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_reload_restores_policy() {
        use std::future::Future;
        use std::task::{Context, Waker};

        let (viewer, coordinator) = coordinator();

        {
            let mut reload = Box::pin(coordinator.request_reload());
            // past the override install, parked inside the fetch
            let mut cx = Context::from_waker(Waker::noop());
            assert!(reload.as_mut().poll(&mut cx).is_pending());
            assert_eq!(viewer.reset_policy(), ResetPolicy::PreserveViewport);
            assert_eq!(coordinator.state(), ReloadState::Loading);
        }

        assert_eq!(viewer.reset_policy(), ResetPolicy::Full);
        assert_eq!(coordinator.state(), ReloadState::Idle);
    }

    fn bootstrap_config() -> Rc<Configuration> {
        Rc::new(
            Configuration::from_json(
                r#"{"path": "doc.pdf", "cMapUrl": "cmaps/", "standardFontDataUrl": "fonts/"}"#,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_signal_during_initial_load_runs_one_follow_up() {
        let (viewer, coordinator) = coordinator();
        let bootstrapper = ViewerBootstrapper::new(Rc::clone(&viewer), bootstrap_config());

        let (initial, first, second) = tokio::join!(
            coordinator.initial_load(bootstrapper.run()),
            coordinator.request_reload(),
            coordinator.request_reload(),
        );

        initial.unwrap();
        assert_eq!(first.unwrap(), ReloadOutcome::Coalesced);
        assert_eq!(second.unwrap(), ReloadOutcome::Coalesced);
        assert_eq!(coordinator.state(), ReloadState::Idle);
        assert_eq!(viewer.fetch_count.get(), 1);

        let follow_up = coordinator.resume().await.unwrap();

        assert_eq!(follow_up, Some(ReloadOutcome::Reloaded));
        assert_eq!(viewer.fetch_count.get(), 2);
        assert_eq!(
            *viewer.policy_at_load.borrow(),
            vec![ResetPolicy::Full, ResetPolicy::PreserveViewport]
        );
        assert_eq!(viewer.reset_policy(), ResetPolicy::Full);
        assert_eq!(coordinator.resume().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_nothing_owed_without_signal_during_initial_load() {
        let (viewer, coordinator) = coordinator();
        let bootstrapper = ViewerBootstrapper::new(Rc::clone(&viewer), bootstrap_config());

        coordinator.initial_load(bootstrapper.run()).await.unwrap();

        assert_eq!(coordinator.resume().await.unwrap(), None);
        assert_eq!(viewer.fetch_count.get(), 1);
    }

    #[tokio::test]
    async fn test_failed_initial_load_discards_signals() {
        let (viewer, coordinator) = coordinator();
        viewer.fail_fetches.set(1);
        let bootstrapper = ViewerBootstrapper::new(Rc::clone(&viewer), bootstrap_config());

        let (initial, signal) = tokio::join!(
            coordinator.initial_load(bootstrapper.run()),
            coordinator.request_reload(),
        );

        assert!(initial.is_err());
        assert_eq!(signal.unwrap(), ReloadOutcome::Coalesced);
        assert_eq!(coordinator.state(), ReloadState::Idle);
        assert_eq!(coordinator.resume().await.unwrap(), None);
        assert!(viewer.loaded.borrow().is_empty());
    }
}
