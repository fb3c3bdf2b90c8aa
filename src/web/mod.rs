//! Browser entry point
//!
//! Wires the components to the page once `window` has loaded: configuration,
//! logging, the selection menu, the initial document, and the reload channel.

use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{AddEventListenerOptions, Window};

pub mod dom;
pub mod pdfjs;

use crate::bootstrap::ViewerBootstrapper;
use crate::config::Configuration;
use crate::engine::LoadOptions;
use crate::error::{PreviewError, Result, Severity};
use crate::logging;
use crate::reload::ReloadCoordinator;
use dom::DomConfigSource;
use pdfjs::JsViewer;

/// Human-readable text for a thrown JS value
pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

pub(crate) fn js_error(value: JsValue) -> anyhow::Error {
    anyhow::anyhow!(describe_js(&value))
}

/// Register the startup sequence to run on the window `load` event
pub fn start() -> std::result::Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    dom::install_error_handler(&window);

    let on_load = {
        let window = window.clone();
        Closure::once_into_js(move || {
            spawn_local(async move {
                if let Err(e) = run(window.clone()).await {
                    report(&window, e);
                }
            });
        })
    };

    let options = AddEventListenerOptions::new();
    options.set_once(true);
    window.add_event_listener_with_callback_and_add_event_listener_options(
        "load",
        on_load.unchecked_ref(),
        &options,
    )
}

async fn run(window: Window) -> Result<()> {
    let document = window
        .document()
        .ok_or_else(|| PreviewError::Uncaught("no document".to_string()))?;

    let config = match Configuration::load(&DomConfigSource::new(&document)) {
        Ok(config) => Rc::new(config),
        Err(e) => {
            logging::init(logging::DEFAULT_DIRECTIVE);
            return Err(e.into());
        }
    };
    logging::init(&config.log_level);
    tracing::info!(path = %config.path, "Starting PDF preview");

    if let Err(e) = dom::install_selection_menu(&window, &document, &config.defaults) {
        tracing::warn!("Selection menu unavailable: {:#}", e);
    }

    let viewer = Rc::new(JsViewer::from_globals()?);
    let coordinator = Rc::new(ReloadCoordinator::new(
        Rc::clone(&viewer),
        LoadOptions::from_config(&config),
    ));
    listen_for_reloads(&window, Rc::clone(&coordinator))
        .map_err(|e| PreviewError::Uncaught(format!("{:#}", e)))?;

    let bootstrapper = ViewerBootstrapper::new(viewer, Rc::clone(&config));
    coordinator.initial_load(bootstrapper.run()).await?;

    if let Err(e) = coordinator.resume().await {
        report(&window, e.into());
    }
    Ok(())
}

/// Any `message` on the window triggers one reload cycle
fn listen_for_reloads(window: &Window, coordinator: Rc<ReloadCoordinator<JsViewer>>) -> anyhow::Result<()> {
    let on_message = {
        let window = window.clone();
        Closure::<dyn Fn()>::new(move || {
            let coordinator = Rc::clone(&coordinator);
            let window = window.clone();
            spawn_local(async move {
                if let Err(e) = coordinator.request_reload().await {
                    report(&window, e.into());
                }
            });
        })
    };
    window
        .add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())
        .map_err(js_error)?;
    on_message.forget();
    Ok(())
}

fn report(window: &Window, error: PreviewError) {
    match error.severity() {
        Severity::Fatal => {
            tracing::error!("{}", error);
            if let Some(document) = window.document() {
                dom::show_fatal_message(&document);
            }
        }
        Severity::Transient => {
            tracing::error!("{}; keeping the current document", error);
        }
    }
}
