//! Text-selection context menu
//!
//! A right-click in the viewer captures the current selection (only if it lies
//! inside the engine's text layer), shows a single "LookUp" item at the
//! pointer, and the next click anywhere hides it again.

use std::cell::RefCell;
use std::rc::Rc;

use crate::lookup::{HttpTransport, LookupClient, LookupOutcome, LookupTransport};

/// Class of the engine's selectable text overlay
pub const TEXT_LAYER_CLASS: &str = "textLayer";

/// Pointer position in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MenuPosition {
    pub x: i32,
    pub y: i32,
}

/// The selection as seen at the moment of the right-click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub text: String,
    /// Whether the selection's common ancestor sits inside the text layer
    pub in_text_layer: bool,
}

impl SelectionSnapshot {
    /// Text worth looking up, or empty when the selection is outside the text layer
    pub fn captured_text(&self) -> String {
        if self.in_text_layer {
            self.text.trim().to_string()
        } else {
            String::new()
        }
    }
}

/// Where the menu is drawn
pub trait MenuSurface {
    fn show_at(&self, position: MenuPosition);

    fn hide(&self);

    /// Hide the menu on the next click anywhere in the document
    fn arm_dismiss(&self);
}

pub struct SelectionMenuController<S: MenuSurface, T: LookupTransport = HttpTransport> {
    surface: S,
    lookup: LookupClient<T>,
    buffer: RefCell<String>,
}

impl<S: MenuSurface, T: LookupTransport> SelectionMenuController<S, T> {
    pub fn new(surface: S, lookup: LookupClient<T>) -> Rc<Self> {
        Rc::new(Self {
            surface,
            lookup,
            buffer: RefCell::new(String::new()),
        })
    }

    /// Handle a right-click; `selection` is `None` when nothing is selected
    pub fn open_at(&self, position: MenuPosition, selection: Option<SelectionSnapshot>) {
        let captured = selection
            .map(|snapshot| snapshot.captured_text())
            .unwrap_or_default();
        tracing::debug!(x = position.x, y = position.y, selection = %captured, "Context menu opened");

        *self.buffer.borrow_mut() = captured;
        self.surface.show_at(position);
        self.surface.arm_dismiss();
    }

    pub fn dismiss(&self) {
        self.surface.hide();
    }

    pub fn selection(&self) -> String {
        self.buffer.borrow().clone()
    }

    /// Handle a click on the menu item
    pub async fn lookup_selection(&self) -> LookupOutcome {
        let word = self.selection();
        self.lookup.lookup(&word).await
    }
}
