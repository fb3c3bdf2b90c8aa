//! Initial viewer setup
//!
//! Pushes resource URLs into the engine, opens the configured document and
//! applies the display defaults once the first load completes.

use std::rc::Rc;

use crate::config::{Configuration, Defaults};
use crate::engine::{
    events, fetch_pinned_document, EngineError, LoadOptions, ViewerHandle, DOCUMENT_LOADED,
};
use crate::options::{cursor_tool_code, scroll_mode_code, spread_mode_code};

pub struct ViewerBootstrapper<V: ViewerHandle> {
    viewer: Rc<V>,
    config: Rc<Configuration>,
}

impl<V: ViewerHandle + 'static> ViewerBootstrapper<V> {
    pub fn new(viewer: Rc<V>, config: Rc<Configuration>) -> Self {
        Self { viewer, config }
    }

    /// Run the startup sequence. Any error here is fatal for the session.
    pub async fn run(&self) -> Result<(), EngineError> {
        self.viewer.set_option("cMapUrl", &self.config.c_map_url);
        self.viewer
            .set_option("standardFontDataUrl", &self.config.standard_font_data_url);

        self.viewer.initialized().await?;
        tracing::debug!("Engine initialized");

        let defaults = self.config.defaults.clone();
        let weak_viewer = Rc::downgrade(&self.viewer);
        events::once(&self.viewer, DOCUMENT_LOADED, move || {
            if let Some(viewer) = weak_viewer.upgrade() {
                apply_defaults(viewer.as_ref(), &defaults);
            }
        });

        // load() is only safe once open() has settled
        self.viewer.open(&self.config.path).await?;

        let options = LoadOptions::from_config(&self.config);
        let document = fetch_pinned_document(self.viewer.as_ref(), &options).await?;
        self.viewer.load(document);

        tracing::info!(path = %self.config.path, "Document handed to viewer");
        Ok(())
    }
}

/// Apply display defaults in engine order: cursor, zoom, scroll, spread, sidebar
pub fn apply_defaults<V: ViewerHandle + ?Sized>(viewer: &V, defaults: &Defaults) {
    viewer.switch_cursor_tool(cursor_tool_code(&defaults.cursor));
    viewer.set_current_scale_value(&defaults.scale);
    viewer.set_scroll_mode(scroll_mode_code(&defaults.scroll_mode));
    viewer.set_spread_mode(spread_mode_code(&defaults.spread_mode));
    if defaults.sidebar {
        viewer.open_sidebar();
    } else {
        viewer.close_sidebar();
    }

    tracing::debug!(
        cursor = %defaults.cursor,
        scale = %defaults.scale,
        scroll = %defaults.scroll_mode,
        spread = %defaults.spread_mode,
        sidebar = defaults.sidebar,
        "Applied display defaults"
    );
}
