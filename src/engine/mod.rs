//! Rendering engine capability surface
//!
//! Everything this crate needs from PDF.js, expressed as one injected handle.
//! The browser implementation lives in `crate::web::pdfjs`; tests drive a fake.

use async_trait::async_trait;
use serde::Serialize;
use std::rc::Rc;
use thiserror::Error;

use crate::config::Configuration;

pub mod events;

#[cfg(test)]
pub(crate) mod fake;

/// Event fired by the engine once a document is fully loaded
pub const DOCUMENT_LOADED: &str = "documentloaded";

/// Identifies a handler registered with [`ViewerHandle::on`]
pub type ListenerId = u64;

/// Handler invoked by the engine's event bus
pub type EventHandler = Rc<dyn Fn()>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    #[error("Failed to open document: {0}")]
    Open(String),

    #[error("Failed to load document: {0}")]
    DocumentLoad(String),

    #[error("Engine binding unavailable: {0}")]
    Binding(String),
}

/// How the viewer clears itself before rendering a new document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPolicy {
    /// Full teardown: readiness signals, page container, scroll and layout
    #[default]
    Full,
    /// Readiness signals and page container only; scroll and layout survive
    PreserveViewport,
}

/// Options for fetching a document handle
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    pub url: String,
    pub use_worker_fetch: bool,
    pub c_map_url: String,
    pub c_map_packed: bool,
    pub standard_font_data_url: String,
}

impl LoadOptions {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            url: config.path.clone(),
            use_worker_fetch: false,
            c_map_url: config.c_map_url.clone(),
            c_map_packed: true,
            standard_font_data_url: config.standard_font_data_url.clone(),
        }
    }
}

/// A parsed document owned by the engine
pub trait DocumentHandle {
    fn fingerprints(&self) -> Vec<String>;

    /// Overwrite the identity the engine uses to recognise "the same" document
    fn set_fingerprints(&mut self, fingerprints: Vec<String>);
}

/// The engine instance shared by the bootstrapper and the reload coordinator
#[async_trait(?Send)]
pub trait ViewerHandle {
    type Document: DocumentHandle;

    /// Write to the engine's global option store
    fn set_option(&self, key: &str, value: &str);

    /// Resolves once the engine's own initialization has finished
    async fn initialized(&self) -> Result<(), EngineError>;

    async fn open(&self, path: &str) -> Result<(), EngineError>;

    async fn get_document(&self, options: &LoadOptions) -> Result<Self::Document, EngineError>;

    /// Hand a fetched document to the viewer. Resets the view per the current policy.
    fn load(&self, document: Self::Document);

    fn on(&self, event: &str, handler: EventHandler) -> ListenerId;

    fn off(&self, event: &str, id: ListenerId);

    fn switch_cursor_tool(&self, code: i32);

    fn set_current_scale_value(&self, scale: &str);

    fn set_scroll_mode(&self, code: i32);

    fn set_spread_mode(&self, code: i32);

    fn open_sidebar(&self);

    fn close_sidebar(&self);

    fn reset_policy(&self) -> ResetPolicy;

    fn set_reset_policy(&self, policy: ResetPolicy);
}

/// Fetch a document and pin its identity to `options.url`
///
/// Both the initial load and every reload go through here so that the engine
/// always sees the same fingerprint for the same logical path.
pub async fn fetch_pinned_document<V>(
    viewer: &V,
    options: &LoadOptions,
) -> Result<V::Document, EngineError>
where
    V: ViewerHandle + ?Sized,
{
    let mut document = viewer.get_document(options).await?;
    document.set_fingerprints(vec![options.url.clone()]);
    Ok(document)
}
