//! Reactive DOM bindings.
//!
//! A *wire* attaches a reactive expression to a single (node, property path)
//! pair. The expression is re-evaluated whenever a signal it reads changes
//! and the result is written into the node through a routing decision that
//! is resolved once, at wire creation.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pulsar_reactive::{create_effect, NodeHandle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::element::is_svg_attribute;
use crate::utils::{js_value_to_string, node_key};
use crate::*;

/// The SVG namespace URI.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// How a wire writes its value into the target node.
///
/// The decision depends only on the node's namespace and the property path,
/// so it is computed once when the wire is created and the hot path is a
/// direct dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `className` on an SVG element maps to `setAttribute("class", v)`.
    ClassAttribute,
    /// A dotted path such as `style.left`: assign through the property
    /// chain.
    PropertyPath(Vec<String>),
    /// An SVG presentation attribute: `setAttribute(path, v)`. Writing
    /// `null`/`undefined` is refused.
    SvgAttribute(String),
    /// `data-*`, `aria-*` and `role` always go through `setAttribute`.
    Attribute(String),
    /// Everything else is a property assignment (`textContent`, `value`,
    /// `checked`, `innerHTML`, ...).
    Property(String),
}

/// Resolve the write route for a (namespace, property path) pair.
pub fn resolve_route(namespace: Option<&str>, path: &str) -> Route {
    let svg = namespace == Some(SVG_NAMESPACE);
    if svg && path == "className" {
        return Route::ClassAttribute;
    }
    if path.contains('.') {
        return Route::PropertyPath(path.split('.').map(str::to_string).collect());
    }
    if svg && is_svg_attribute(path) {
        return Route::SvgAttribute(path.to_string());
    }
    if path.starts_with("data-") || path.starts_with("aria-") || path == "role" {
        return Route::Attribute(path.to_string());
    }
    Route::Property(path.to_string())
}

/// The namespace of the node, if it is an element.
pub(crate) fn node_namespace(node: &web_sys::Node) -> Option<String> {
    node.dyn_ref::<web_sys::Element>()
        .and_then(|el| el.namespace_uri())
}

/// Write `value` into `node` following `route`. Returns whether the write
/// was performed; a refused write (`null`/`undefined` on an SVG attribute)
/// leaves the target untouched.
pub(crate) fn write_routed(node: &web_sys::Node, route: &Route, value: &JsValue) -> bool {
    match route {
        Route::ClassAttribute => {
            if let Some(el) = node.dyn_ref::<web_sys::Element>() {
                el.set_attribute("class", &js_value_to_string(value))
                    .unwrap_throw();
            }
            true
        }
        Route::PropertyPath(segments) => {
            let mut target: JsValue = node.clone().into();
            for segment in &segments[..segments.len() - 1] {
                target = js_sys::Reflect::get(&target, &JsValue::from_str(segment))
                    .unwrap_or(JsValue::UNDEFINED);
                if target.is_undefined() || target.is_null() {
                    console_warn!(
                        "wire: property chain `{}` is broken at `{segment}`",
                        segments.join(".")
                    );
                    return false;
                }
            }
            let last = segments.last().unwrap();
            let _ = js_sys::Reflect::set(&target, &JsValue::from_str(last), value);
            true
        }
        Route::SvgAttribute(name) => {
            if value.is_null() || value.is_undefined() {
                console_warn!("wire: refusing to write null/undefined to SVG attribute `{name}`");
                return false;
            }
            if let Some(el) = node.dyn_ref::<web_sys::Element>() {
                el.set_attribute(name, &js_value_to_string(value))
                    .unwrap_throw();
            }
            true
        }
        Route::Attribute(name) => {
            if let Some(el) = node.dyn_ref::<web_sys::Element>() {
                el.set_attribute(name, &js_value_to_string(value))
                    .unwrap_throw();
            }
            true
        }
        Route::Property(name) => {
            let _ = js_sys::Reflect::set(node, &JsValue::from_str(name), value);
            true
        }
    }
}

thread_local! {
    /// Wire records indexed by the numeric node key. The node watcher
    /// disposes a node's whole set when the node leaves the document.
    static WIRE_TABLE: RefCell<HashMap<usize, Vec<WireRecord>>> = RefCell::new(HashMap::new());

    static NEXT_WIRE_ID: Cell<u64> = const { Cell::new(0) };
}

struct WireRecord {
    id: u64,
    effect: NodeHandle,
}

/// A handle to an active wire. Dropping the handle does nothing; call
/// [`dispose`](WireHandle::dispose) to tear the binding down before its
/// owner is disposed.
pub struct WireHandle {
    id: u64,
    node_key: Option<usize>,
    effect: Option<NodeHandle>,
    disposed: Rc<Cell<bool>>,
}

impl WireHandle {
    fn static_binding() -> Self {
        Self {
            id: 0,
            node_key: None,
            effect: None,
            disposed: Rc::new(Cell::new(true)),
        }
    }

    /// Dispose the wire: the underlying effect is destroyed and the record
    /// is removed from the node's wire set. Disposing twice is a no-op.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(effect) = self.effect {
            if effect.is_alive() {
                effect.dispose();
            }
        }
        if let Some(key) = self.node_key {
            WIRE_TABLE.with(|table| {
                if let Some(records) = table.borrow_mut().get_mut(&key) {
                    records.retain(|r| r.id != self.id);
                }
            });
        }
    }
}

/// Bind a reactive expression to a (node, property path) pair.
///
/// A plain value is written once. A closure is wrapped in an effect owned by
/// the current scope: whenever a signal read inside the closure changes, the
/// closure is re-evaluated and its result written to the node.
///
/// Re-evaluations that produce a value equal (`Object.is`) to the previous
/// one perform no DOM write.
///
/// # Example
/// ```no_run
/// # use pulsar_web::*;
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let count = create_signal(0);
/// let el = document().create_element("p").unwrap();
/// wire(&el, "textContent", move || format!("Count: {}", count.get()));
/// # });
/// ```
pub fn wire(
    node: impl AsRef<web_sys::Node>,
    path: &str,
    expr: impl Into<MaybeDynJsValue>,
) -> WireHandle {
    let node = node.as_ref();
    let route = resolve_route(node_namespace(node).as_deref(), path);
    match expr.into() {
        MaybeDyn::Static(value) => {
            write_routed(node, &route, &value);
            WireHandle::static_binding()
        }
        MaybeDyn::Dynamic(mut f) => {
            let id = NEXT_WIRE_ID.with(|cell| {
                let id = cell.get();
                cell.set(id + 1);
                id
            });
            let key = node_key(node);
            let disposed = Rc::new(Cell::new(false));

            let target = node.clone();
            let mut last_value: Option<JsValue> = None;
            let effect = create_effect(move || {
                let value = f();
                if let Some(prev) = &last_value {
                    if js_sys::Object::is(prev, &value) {
                        return;
                    }
                }
                if write_routed(&target, &route, &value) {
                    last_value = Some(value);
                }
            });

            WIRE_TABLE.with(|table| {
                table
                    .borrow_mut()
                    .entry(key)
                    .or_default()
                    .push(WireRecord { id, effect });
            });

            WireHandle {
                id,
                node_key: Some(key),
                effect: Some(effect),
                disposed,
            }
        }
    }
}

/// Convenience for wiring a string-producing closure. Equivalent to
/// `wire(node, path, move || JsValue::from(f()))`.
pub fn wire_text(
    node: impl AsRef<web_sys::Node>,
    path: &str,
    mut f: impl FnMut() -> String + 'static,
) -> WireHandle {
    wire(node, path, move || JsValue::from_str(&f()))
}

/// Dispose every wire attached to `node`. Used by the node watcher when the
/// node leaves the document; disposal is idempotent.
pub(crate) fn dispose_wires(node: &web_sys::Node) {
    let Some(key) = crate::utils::existing_node_key(node) else {
        return;
    };
    let records = WIRE_TABLE.with(|table| table.borrow_mut().remove(&key));
    if let Some(records) = records {
        for record in records {
            if record.effect.is_alive() {
                record.effect.dispose();
            }
        }
    }
}

/// Number of live wires attached to `node`. Exposed for tests and dev
/// tooling; do not mutate DOM based on this.
pub fn wire_count(node: &web_sys::Node) -> usize {
    crate::utils::existing_node_key(node)
        .and_then(|key| WIRE_TABLE.with(|table| table.borrow().get(&key).map(Vec::len)))
        .unwrap_or(0)
}
