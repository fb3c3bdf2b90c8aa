//! PDF.js bindings
//!
//! `JsViewer` implements [`ViewerHandle`] over the globals the PDF.js viewer
//! page exposes. The reset policy is the one place that touches viewer
//! internals: switching to `PreserveViewport` swaps `_resetView` for a cached
//! reduced version, switching back reinstalls the saved original.

use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::describe_js;
use crate::engine::{
    DocumentHandle, EngineError, EventHandler, ListenerId, LoadOptions, ResetPolicy, ViewerHandle,
};

const RESET_VIEW: &str = "_resetView";

/// Readiness signals the viewer awaits before it starts rendering
const READINESS_CAPABILITIES: [&str; 3] = [
    "_firstPageCapability",
    "_onePageRenderedCapability",
    "_pagesCapability",
];

#[wasm_bindgen]
extern "C" {
    pub type PdfViewerApplication;

    #[wasm_bindgen(method, getter, js_name = initializedPromise)]
    fn initialized_promise(this: &PdfViewerApplication) -> Promise;

    #[wasm_bindgen(method, catch)]
    fn open(this: &PdfViewerApplication, path: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn load(this: &PdfViewerApplication, document: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, getter, js_name = eventBus)]
    fn event_bus(this: &PdfViewerApplication) -> EventBus;

    #[wasm_bindgen(method, getter, js_name = pdfViewer)]
    fn pdf_viewer(this: &PdfViewerApplication) -> PdfViewer;

    #[wasm_bindgen(method, getter, js_name = pdfCursorTools)]
    fn pdf_cursor_tools(this: &PdfViewerApplication) -> PdfCursorTools;

    #[wasm_bindgen(method, getter, js_name = pdfSidebar)]
    fn pdf_sidebar(this: &PdfViewerApplication) -> PdfSidebar;

    pub type PdfViewerApplicationOptions;

    #[wasm_bindgen(method)]
    fn set(this: &PdfViewerApplicationOptions, key: &str, value: &JsValue);

    pub type EventBus;

    #[wasm_bindgen(method)]
    fn on(this: &EventBus, name: &str, listener: &Function);

    #[wasm_bindgen(method)]
    fn off(this: &EventBus, name: &str, listener: &Function);

    pub type PdfViewer;

    #[wasm_bindgen(method, setter, js_name = currentScaleValue)]
    fn set_current_scale_value(this: &PdfViewer, value: &str);

    #[wasm_bindgen(method, setter, js_name = scrollMode)]
    fn set_scroll_mode(this: &PdfViewer, mode: i32);

    #[wasm_bindgen(method, setter, js_name = spreadMode)]
    fn set_spread_mode(this: &PdfViewer, mode: i32);

    pub type PdfCursorTools;

    #[wasm_bindgen(method, js_name = switchTool)]
    fn switch_tool(this: &PdfCursorTools, tool: i32);

    pub type PdfSidebar;

    #[wasm_bindgen(method)]
    fn open(this: &PdfSidebar);

    #[wasm_bindgen(method)]
    fn close(this: &PdfSidebar);

    pub type PdfJsLib;

    #[wasm_bindgen(method, catch, js_name = getDocument)]
    fn get_document(this: &PdfJsLib, options: &JsValue) -> Result<LoadingTask, JsValue>;

    pub type LoadingTask;

    #[wasm_bindgen(method, getter)]
    fn promise(this: &LoadingTask) -> Promise;
}

/// Look up a global installed by the PDF.js viewer scripts
fn global<T: JsCast>(name: &str) -> Result<T, EngineError> {
    let value = Reflect::get(&js_sys::global(), &JsValue::from_str(name))
        .map_err(|e| EngineError::Binding(format!("{}: {}", name, describe_js(&e))))?;
    if value.is_undefined() || value.is_null() {
        return Err(EngineError::Binding(format!("{} is not defined", name)));
    }
    Ok(value.unchecked_into())
}

/// A `PDFDocumentProxy`
pub struct JsDocument(JsValue);

impl JsDocument {
    fn pdf_info(&self) -> Option<JsValue> {
        Reflect::get(&self.0, &JsValue::from_str("_pdfInfo"))
            .ok()
            .filter(|info| info.is_object())
    }
}

impl DocumentHandle for JsDocument {
    fn fingerprints(&self) -> Vec<String> {
        self.pdf_info()
            .and_then(|info| Reflect::get(&info, &JsValue::from_str("fingerprints")).ok())
            .and_then(|list| list.dyn_into::<Array>().ok())
            .map(|list| list.iter().filter_map(|value| value.as_string()).collect())
            .unwrap_or_default()
    }

    fn set_fingerprints(&mut self, fingerprints: Vec<String>) {
        let Some(info) = self.pdf_info() else {
            tracing::warn!("Document has no _pdfInfo, fingerprint left unchanged");
            return;
        };
        let list: Array = fingerprints.iter().map(|f| JsValue::from_str(f)).collect();
        if let Err(e) = Reflect::set(&info, &JsValue::from_str("fingerprints"), &list) {
            tracing::warn!("Failed to pin document fingerprint: {}", describe_js(&e));
        }
    }
}

pub struct JsViewer {
    app: PdfViewerApplication,
    options: PdfViewerApplicationOptions,
    pdfjs: PdfJsLib,
    listeners: RefCell<HashMap<ListenerId, Closure<dyn Fn()>>>,
    next_listener: Cell<ListenerId>,
    policy: Cell<ResetPolicy>,
    original_reset: RefCell<Option<JsValue>>,
    preserve_reset: RefCell<Option<Closure<dyn Fn()>>>,
}

impl JsViewer {
    /// Bind to `PDFViewerApplication`, `PDFViewerApplicationOptions` and `pdfjsLib`
    pub fn from_globals() -> Result<Self, EngineError> {
        Ok(Self {
            app: global("PDFViewerApplication")?,
            options: global("PDFViewerApplicationOptions")?,
            pdfjs: global("pdfjsLib")?,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
            policy: Cell::new(ResetPolicy::Full),
            original_reset: RefCell::new(None),
            preserve_reset: RefCell::new(None),
        })
    }

    fn preserve_reset_function(&self, viewer: &PdfViewer) -> JsValue {
        let mut slot = self.preserve_reset.borrow_mut();
        let closure = slot.get_or_insert_with(|| {
            let viewer: JsValue = viewer.clone().into();
            let pdfjs: JsValue = self.pdfjs.clone().into();
            Closure::new(move || {
                if let Err(e) = reset_readiness(&viewer, &pdfjs) {
                    tracing::warn!("Viewport-preserving reset failed: {}", describe_js(&e));
                }
            })
        });
        closure.as_ref().clone()
    }
}

/// Fresh readiness signals and an empty page container; scroll state untouched
fn reset_readiness(viewer: &JsValue, pdfjs: &JsValue) -> Result<(), JsValue> {
    for field in READINESS_CAPABILITIES {
        Reflect::set(viewer, &JsValue::from_str(field), &new_capability(pdfjs)?)?;
    }

    let container = Reflect::get(viewer, &JsValue::from_str("viewer"))?;
    if let Some(node) = container.dyn_ref::<web_sys::Node>() {
        node.set_text_content(Some(""));
    }
    Ok(())
}

fn new_capability(pdfjs: &JsValue) -> Result<JsValue, JsValue> {
    let factory = Reflect::get(pdfjs, &JsValue::from_str("createPromiseCapability"))?;
    if let Some(factory) = factory.dyn_ref::<Function>() {
        return factory.call0(pdfjs);
    }

    // newer builds export the class instead of the factory
    let class = Reflect::get(pdfjs, &JsValue::from_str("PromiseCapability"))?.dyn_into::<Function>()?;
    Reflect::construct(&class, &Array::new())
}

#[async_trait(?Send)]
impl ViewerHandle for JsViewer {
    type Document = JsDocument;

    fn set_option(&self, key: &str, value: &str) {
        self.options.set(key, &JsValue::from_str(value));
    }

    async fn initialized(&self) -> Result<(), EngineError> {
        JsFuture::from(self.app.initialized_promise())
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Initialization(describe_js(&e)))
    }

    async fn open(&self, path: &str) -> Result<(), EngineError> {
        let promise = self
            .app
            .open(path)
            .map_err(|e| EngineError::Open(describe_js(&e)))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Open(describe_js(&e)))
    }

    async fn get_document(&self, options: &LoadOptions) -> Result<JsDocument, EngineError> {
        let options = serde_wasm_bindgen::to_value(options)
            .map_err(|e| EngineError::DocumentLoad(e.to_string()))?;
        let task = self
            .pdfjs
            .get_document(&options)
            .map_err(|e| EngineError::DocumentLoad(describe_js(&e)))?;
        JsFuture::from(task.promise())
            .await
            .map(JsDocument)
            .map_err(|e| EngineError::DocumentLoad(describe_js(&e)))
    }

    fn load(&self, document: JsDocument) {
        if let Err(e) = self.app.load(&document.0) {
            tracing::error!("PDFViewerApplication.load threw: {}", describe_js(&e));
        }
    }

    fn on(&self, event: &str, handler: EventHandler) -> ListenerId {
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);

        let closure = Closure::<dyn Fn()>::new(move || handler());
        self.app.event_bus().on(event, closure.as_ref().unchecked_ref());
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn off(&self, event: &str, id: ListenerId) {
        let Some(closure) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };
        self.app.event_bus().off(event, closure.as_ref().unchecked_ref());
        // the listener may be the one currently running; free it after this turn
        wasm_bindgen_futures::spawn_local(async move { drop(closure) });
    }

    fn switch_cursor_tool(&self, code: i32) {
        self.app.pdf_cursor_tools().switch_tool(code);
    }

    fn set_current_scale_value(&self, scale: &str) {
        self.app.pdf_viewer().set_current_scale_value(scale);
    }

    fn set_scroll_mode(&self, code: i32) {
        self.app.pdf_viewer().set_scroll_mode(code);
    }

    fn set_spread_mode(&self, code: i32) {
        self.app.pdf_viewer().set_spread_mode(code);
    }

    fn open_sidebar(&self) {
        self.app.pdf_sidebar().open();
    }

    fn close_sidebar(&self) {
        self.app.pdf_sidebar().close();
    }

    fn reset_policy(&self) -> ResetPolicy {
        self.policy.get()
    }

    fn set_reset_policy(&self, policy: ResetPolicy) {
        if self.policy.get() == policy {
            return;
        }
        let viewer = self.app.pdf_viewer();
        let key = JsValue::from_str(RESET_VIEW);

        let replacement = match policy {
            ResetPolicy::PreserveViewport => match Reflect::get(&viewer, &key) {
                Ok(original) => {
                    *self.original_reset.borrow_mut() = Some(original);
                    self.preserve_reset_function(&viewer)
                }
                Err(e) => {
                    tracing::warn!("Cannot read {}: {}", RESET_VIEW, describe_js(&e));
                    return;
                }
            },
            ResetPolicy::Full => match self.original_reset.borrow_mut().take() {
                Some(original) => original,
                None => return,
            },
        };

        match Reflect::set(&viewer, &key, &replacement) {
            Ok(_) => self.policy.set(policy),
            Err(e) => tracing::warn!("Cannot replace {}: {}", RESET_VIEW, describe_js(&e)),
        }
    }
}
