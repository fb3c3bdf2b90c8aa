//! One-shot event subscriptions

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{ListenerId, ViewerHandle};

/// Run `handler` on the first `event` only
///
/// The listener deregisters itself before the handler runs, so a handler that
/// triggers the same event again cannot re-enter, and later emissions are
/// ignored. Returns the listener id in case the caller wants to cancel early.
pub fn once<V, F>(viewer: &Rc<V>, event: &str, handler: F) -> ListenerId
where
    V: ViewerHandle + 'static,
    F: FnOnce() + 'static,
{
    let handler = RefCell::new(Some(handler));
    let own_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
    let weak_viewer = Rc::downgrade(viewer);
    let event_name = event.to_string();

    let id = {
        let own_id = Rc::clone(&own_id);
        viewer.on(
            event,
            Rc::new(move || {
                let Some(handler) = handler.borrow_mut().take() else {
                    return;
                };
                if let (Some(viewer), Some(id)) = (weak_viewer.upgrade(), own_id.get()) {
                    viewer.off(&event_name, id);
                }
                handler();
            }),
        )
    };
    own_id.set(Some(id));
    id
}
