//! DOM glue: configuration carrier, context menu and the fatal error page

use anyhow::{Context, Result};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Document, HtmlElement, MouseEvent, Window};

use super::{describe_js, js_error};
use crate::config::{ConfigSource, Defaults, CONFIG_ATTRIBUTE, CONFIG_ELEMENT_ID};
use crate::error::FATAL_MESSAGE;
use crate::lookup::LookupClient;
use crate::selection::{
    MenuPosition, MenuSurface, SelectionMenuController, SelectionSnapshot, TEXT_LAYER_CLASS,
};

pub const VIEWER_CONTAINER_ID: &str = "viewerContainer";
pub const MENU_CONTAINER_ID: &str = "contextMenuContainer";
pub const MENU_ID: &str = "customContextMenu";

const MENU_HTML: &str = r#"<div id="customContextMenu" style="display:none; position:absolute; background:white; border:1px solid #ccc; z-index:1000; box-shadow:0px 2px 5px rgba(0,0,0,0.2);">
    <div class="menu-item">LookUp</div>
</div>"#;

/// Reads the configuration from `#pdf-preview-config[data-config]`
pub struct DomConfigSource<'a> {
    document: &'a Document,
}

impl<'a> DomConfigSource<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }
}

impl ConfigSource for DomConfigSource<'_> {
    fn raw_config(&self) -> Option<String> {
        self.document
            .get_element_by_id(CONFIG_ELEMENT_ID)?
            .get_attribute(CONFIG_ATTRIBUTE)
    }
}

/// The current selection, if any, and whether it lies in the text layer
pub fn selection_snapshot(window: &Window) -> Option<SelectionSnapshot> {
    let selection = window.get_selection().ok()??;
    if selection.range_count() == 0 {
        return None;
    }
    let range = selection.get_range_at(0).ok()?;
    let in_text_layer = range
        .common_ancestor_container()
        .ok()
        .and_then(|node| node.parent_element())
        .and_then(|parent| parent.closest(&format!(".{}", TEXT_LAYER_CLASS)).ok().flatten())
        .is_some();

    Some(SelectionSnapshot {
        text: String::from(selection.to_string()),
        in_text_layer,
    })
}

/// `#customContextMenu`, positioned absolutely at the pointer
pub struct DomMenu {
    document: Document,
}

impl DomMenu {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element(&self) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(MENU_ID)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }
}

fn set_style(menu: &HtmlElement, property: &str, value: &str) {
    if let Err(e) = menu.style().set_property(property, value) {
        tracing::warn!(property, value, "Failed to style menu: {}", describe_js(&e));
    }
}

fn hide_menu(document: &Document) {
    if let Some(menu) = document
        .get_element_by_id(MENU_ID)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        set_style(&menu, "display", "none");
    }
}

impl MenuSurface for DomMenu {
    fn show_at(&self, position: MenuPosition) {
        let Some(menu) = self.element() else {
            return;
        };
        set_style(&menu, "top", &format!("{}px", position.y));
        set_style(&menu, "left", &format!("{}px", position.x));
        set_style(&menu, "display", "block");
    }

    fn hide(&self) {
        hide_menu(&self.document);
    }

    fn arm_dismiss(&self) {
        let document = self.document.clone();
        let on_click = Closure::once_into_js(move || hide_menu(&document));

        let options = AddEventListenerOptions::new();
        options.set_once(true);
        if let Err(e) = self
            .document
            .add_event_listener_with_callback_and_add_event_listener_options(
                "click",
                on_click.unchecked_ref(),
                &options,
            )
        {
            tracing::warn!("Failed to arm menu dismissal: {:?}", e);
        }
    }
}

/// Inject the menu markup and wire right-click and lookup handlers
pub fn install_selection_menu(window: &Window, document: &Document, defaults: &Defaults) -> Result<()> {
    document
        .get_element_by_id(MENU_CONTAINER_ID)
        .with_context(|| format!("missing #{}", MENU_CONTAINER_ID))?
        .set_inner_html(MENU_HTML);

    let controller = SelectionMenuController::new(
        DomMenu::new(document.clone()),
        LookupClient::from_defaults(defaults),
    );

    let viewer_container = document
        .get_element_by_id(VIEWER_CONTAINER_ID)
        .with_context(|| format!("missing #{}", VIEWER_CONTAINER_ID))?;
    let on_context_menu = {
        let controller = Rc::clone(&controller);
        let window = window.clone();
        Closure::<dyn Fn(MouseEvent)>::new(move |event: MouseEvent| {
            event.prevent_default();
            let position = MenuPosition {
                x: event.client_x(),
                y: event.client_y(),
            };
            controller.open_at(position, selection_snapshot(&window));
        })
    };
    viewer_container
        .add_event_listener_with_callback("contextmenu", on_context_menu.as_ref().unchecked_ref())
        .map_err(js_error)
        .context("registering contextmenu listener")?;
    on_context_menu.forget();

    let item = document
        .query_selector(&format!("#{} .menu-item", MENU_ID))
        .map_err(js_error)?
        .context("menu item missing from injected markup")?;
    let on_lookup = Closure::<dyn Fn()>::new(move || {
        let controller = Rc::clone(&controller);
        wasm_bindgen_futures::spawn_local(async move {
            controller.lookup_selection().await;
        });
    });
    item.add_event_listener_with_callback("click", on_lookup.as_ref().unchecked_ref())
        .map_err(js_error)
        .context("registering lookup listener")?;
    on_lookup.forget();

    Ok(())
}

/// Replace the page body with the fatal message
pub fn show_fatal_message(document: &Document) {
    let body = match document
        .create_element("body")
        .map(|el| el.unchecked_into::<HtmlElement>())
    {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Cannot build error page: {:?}", e);
            return;
        }
    };
    body.set_inner_text(FATAL_MESSAGE);
    document.set_body(Some(&body));
}

/// Route uncaught script errors to the fatal page
pub fn install_error_handler(window: &Window) {
    let document = window.document();
    let on_error = Closure::<dyn Fn()>::new(move || {
        tracing::error!("Uncaught script error");
        if let Some(document) = &document {
            show_fatal_message(document);
        }
    });
    window.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    on_error.forget();
}
