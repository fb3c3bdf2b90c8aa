//! In-memory engine used by unit tests

use async_trait::async_trait;
use std::cell::{Cell, RefCell};

use super::{
    DocumentHandle, EngineError, EventHandler, ListenerId, LoadOptions, ResetPolicy,
    ViewerHandle, DOCUMENT_LOADED,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeDocument {
    pub url: String,
    pub fingerprints: Vec<String>,
}

impl DocumentHandle for FakeDocument {
    fn fingerprints(&self) -> Vec<String> {
        self.fingerprints.clone()
    }

    fn set_fingerprints(&mut self, fingerprints: Vec<String>) {
        self.fingerprints = fingerprints;
    }
}

/// Records every call and models the one piece of engine behaviour the
/// reload protocol cares about: a full reset scrolls back to the top.
#[derive(Default)]
pub struct FakeViewer {
    pub calls: RefCell<Vec<String>>,
    pub options: RefCell<Vec<(String, String)>>,
    pub opened: RefCell<Vec<String>>,
    pub loaded: RefCell<Vec<FakeDocument>>,
    pub policy_at_load: RefCell<Vec<ResetPolicy>>,
    pub policy_at_fetch: RefCell<Vec<ResetPolicy>>,
    pub scroll_offset: Cell<f64>,
    pub fetch_count: Cell<usize>,
    pub fail_fetches: Cell<usize>,
    pub fail_initialization: Cell<bool>,
    listeners: RefCell<Vec<(String, ListenerId, EventHandler)>>,
    next_listener: Cell<ListenerId>,
    policy: Cell<ResetPolicy>,
}

impl FakeViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `event` on every handler currently registered for it
    pub fn emit(&self, event: &str) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(name, _, _)| name == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(name, _, _)| name == event)
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl ViewerHandle for FakeViewer {
    type Document = FakeDocument;

    fn set_option(&self, key: &str, value: &str) {
        self.options
            .borrow_mut()
            .push((key.to_string(), value.to_string()));
    }

    async fn initialized(&self) -> Result<(), EngineError> {
        tokio::task::yield_now().await;
        if self.fail_initialization.get() {
            return Err(EngineError::Initialization("viewer script missing".into()));
        }
        Ok(())
    }

    async fn open(&self, path: &str) -> Result<(), EngineError> {
        self.opened.borrow_mut().push(path.to_string());
        Ok(())
    }

    async fn get_document(&self, options: &LoadOptions) -> Result<FakeDocument, EngineError> {
        self.policy_at_fetch.borrow_mut().push(self.policy.get());
        tokio::task::yield_now().await;

        let attempt = self.fetch_count.get() + 1;
        self.fetch_count.set(attempt);
        if self.fail_fetches.get() > 0 {
            self.fail_fetches.set(self.fail_fetches.get() - 1);
            return Err(EngineError::DocumentLoad(format!(
                "Unexpected server response (404) while retrieving {}",
                options.url
            )));
        }

        Ok(FakeDocument {
            url: options.url.clone(),
            fingerprints: vec![format!("sha-{}", attempt)],
        })
    }

    fn load(&self, document: FakeDocument) {
        let policy = self.policy.get();
        if policy == ResetPolicy::Full {
            self.scroll_offset.set(0.0);
        }
        self.policy_at_load.borrow_mut().push(policy);
        self.loaded.borrow_mut().push(document);
        self.emit(DOCUMENT_LOADED);
    }

    fn on(&self, event: &str, handler: EventHandler) -> ListenerId {
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        self.listeners
            .borrow_mut()
            .push((event.to_string(), id, handler));
        id
    }

    fn off(&self, event: &str, id: ListenerId) {
        self.listeners
            .borrow_mut()
            .retain(|(name, listener, _)| !(name == event && *listener == id));
    }

    fn switch_cursor_tool(&self, code: i32) {
        self.record(format!("cursor:{}", code));
    }

    fn set_current_scale_value(&self, scale: &str) {
        self.record(format!("scale:{}", scale));
    }

    fn set_scroll_mode(&self, code: i32) {
        self.record(format!("scroll:{}", code));
    }

    fn set_spread_mode(&self, code: i32) {
        self.record(format!("spread:{}", code));
    }

    fn open_sidebar(&self) {
        self.record("sidebar:open".to_string());
    }

    fn close_sidebar(&self) {
        self.record("sidebar:close".to_string());
    }

    fn reset_policy(&self) -> ResetPolicy {
        self.policy.get()
    }

    fn set_reset_policy(&self, policy: ResetPolicy) {
        self.policy.set(policy);
    }
}
