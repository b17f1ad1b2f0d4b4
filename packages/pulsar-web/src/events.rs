//! Event delegation.
//!
//! One [`EventDelegator`] exists per application root. Instead of attaching
//! a listener to every element, a single listener per event type is attached
//! to the root element; on dispatch, the delegator walks from the event
//! target up to the root and invokes the handlers registered for each
//! element id it encounters. Registration and removal are O(1) per element.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::utils::element_id_of;

/// Events that bypass delegation and bind directly on the element. Drop
/// eligibility requires a synchronous `preventDefault` before the browser's
/// next hit test, which a delegated dispatch cannot guarantee.
pub(crate) const DRAG_EVENTS: [&str; 7] = [
    "dragstart",
    "drag",
    "dragenter",
    "dragover",
    "dragleave",
    "drop",
    "dragend",
];

/// Whether `event_type` is one of the drag events that must bind directly.
pub fn is_drag_event(event_type: &str) -> bool {
    DRAG_EVENTS.contains(&event_type)
}

/// Derive the DOM event type from an `on*` attribute key: `onClick` becomes
/// `click`. Returns `None` if the key does not name an event.
pub fn event_name_from_attr(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    if rest.is_empty() || !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    Some(rest.to_lowercase())
}

/// Listener options for a delegated or direct event handler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventOptions {
    /// Dispatch in the capture phase.
    pub capture: bool,
    /// Deregister after the first call.
    pub once: bool,
    /// Mark the listener passive (never calls `preventDefault`).
    pub passive: bool,
}

type SharedHandler = Rc<RefCell<dyn FnMut(web_sys::Event)>>;

struct HandlerEntry {
    id: u64,
    handler: SharedHandler,
    once: bool,
}

/// Per-element handler registrations: element id -> event type -> entries.
type HandlerMap = HashMap<String, HashMap<String, Vec<HandlerEntry>>>;

/// The per-root event delegator.
pub struct EventDelegator {
    root: web_sys::Element,
    handlers: Rc<RefCell<HandlerMap>>,
    /// One root listener per event type.
    listeners: RefCell<HashMap<String, Closure<dyn FnMut(web_sys::Event)>>>,
    next_id: Cell<u64>,
    destroyed: Cell<bool>,
}

impl EventDelegator {
    /// Create a delegator rooted at `root`.
    pub fn new(root: web_sys::Element) -> Self {
        Self {
            root,
            handlers: Rc::new(RefCell::new(HashMap::new())),
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            destroyed: Cell::new(false),
        }
    }

    /// Register a handler for `(element_id, event_type)`. The first
    /// registration for a given event type installs the root listener.
    pub fn register_handler(
        &self,
        element_id: &str,
        event_type: &str,
        handler: Box<dyn FnMut(web_sys::Event)>,
        options: EventOptions,
    ) {
        debug_assert!(
            !is_drag_event(event_type),
            "drag events must bind directly on the element"
        );
        if self.destroyed.get() {
            return;
        }
        self.ensure_root_listener(event_type);
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers
            .borrow_mut()
            .entry(element_id.to_string())
            .or_default()
            .entry(event_type.to_string())
            .or_default()
            .push(HandlerEntry {
                id,
                handler: Rc::new(RefCell::new(handler)),
                once: options.once,
            });
    }

    /// Remove every handler registered for `element_id`.
    pub fn unregister_element(&self, element_id: &str) {
        self.handlers.borrow_mut().remove(element_id);
    }

    /// Number of elements with at least one registered handler.
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Detach every root listener and drop all registrations.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        for (event_type, listener) in self.listeners.borrow_mut().drain() {
            let _ = self
                .root
                .remove_event_listener_with_callback(&event_type, listener.as_ref().unchecked_ref());
        }
        self.handlers.borrow_mut().clear();
    }

    fn ensure_root_listener(&self, event_type: &str) {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.contains_key(event_type) {
            return;
        }
        let handlers = Rc::clone(&self.handlers);
        let root = self.root.clone();
        let listener = Closure::wrap(Box::new(move |event: web_sys::Event| {
            dispatch(&root, &handlers, &event);
        }) as Box<dyn FnMut(web_sys::Event)>);
        self.root
            .add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())
            .unwrap_throw();
        listeners.insert(event_type.to_string(), listener);
    }
}

impl Drop for EventDelegator {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Walk from the event target up to the delegation root, invoking the
/// handlers registered for every element id on the way.
fn dispatch(root: &web_sys::Element, handlers: &Rc<RefCell<HandlerMap>>, event: &web_sys::Event) {
    let event_type = event.type_();
    let root_node: &web_sys::Node = root.as_ref();
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<web_sys::Element>().ok());

    while let Some(el) = current {
        if let Some(element_id) = element_id_of(&el) {
            // Collect matching handlers first so that a handler mutating the
            // registration table does not deadlock the RefCell.
            let matched: Vec<(u64, SharedHandler, bool)> = handlers
                .borrow()
                .get(&element_id)
                .and_then(|by_type| by_type.get(&event_type))
                .map(|entries| {
                    entries
                        .iter()
                        .map(|e| (e.id, Rc::clone(&e.handler), e.once))
                        .collect()
                })
                .unwrap_or_default();

            for (id, handler, once) in matched {
                if once {
                    remove_entry(handlers, &element_id, &event_type, id);
                }
                handler.borrow_mut()(event.clone());
            }
        }
        // Honour stopPropagation by halting the walk.
        if event.cancel_bubble() {
            break;
        }
        if el.is_same_node(Some(root_node)) {
            break;
        }
        current = el.parent_element();
    }
}

fn remove_entry(
    handlers: &Rc<RefCell<HandlerMap>>,
    element_id: &str,
    event_type: &str,
    id: u64,
) {
    let mut handlers = handlers.borrow_mut();
    if let Some(by_type) = handlers.get_mut(element_id) {
        if let Some(entries) = by_type.get_mut(event_type) {
            entries.retain(|e| e.id != id);
        }
    }
}
