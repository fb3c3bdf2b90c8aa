//! PDF Preview
//!
//! A WASM layer in front of the PDF.js viewer that provides:
//! - Configuration read from the host page
//! - Display defaults applied once after the first load
//! - Reloading the document without losing the scroll position
//! - A text-selection context menu that sends the selected word to a lookup service
//!
//! The protocol logic is platform-independent and runs against the
//! [`engine::ViewerHandle`] capability; the browser glue lives in `web`.

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod options;
pub mod reload;
pub mod selection;

#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-export common types
pub use bootstrap::ViewerBootstrapper;
pub use config::{ConfigError, Configuration, Defaults};
pub use engine::{ResetPolicy, ViewerHandle};
pub use error::{PreviewError, Severity};
pub use lookup::{LookupClient, LookupOutcome};
pub use reload::{ReloadCoordinator, ReloadOutcome};
pub use selection::SelectionMenuController;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Initialize the WASM module
/// Runs automatically on instantiation and defers the real work to `window.onload`
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    // Set up better panic messages in debug mode
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    web::start()
}
