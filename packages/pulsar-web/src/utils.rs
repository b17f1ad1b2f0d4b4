//! Utility functions. Intended for internal use only.

use std::cell::Cell;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::*;

#[wasm_bindgen]
extern "C" {
    /// Extend the [`web_sys::Node`] type with the expando fields Pulsar
    /// stores directly on DOM nodes: a numeric key used to index the wire
    /// table and the hierarchical element id used by the registry and the
    /// event delegator.
    #[wasm_bindgen(extends = web_sys::Node)]
    pub(crate) type PulsarNode;

    #[wasm_bindgen(method, getter, js_name = "__pulsarKey")]
    pub(crate) fn pulsar_key(this: &PulsarNode) -> Option<usize>;
    #[wasm_bindgen(method, setter, js_name = "__pulsarKey")]
    pub(crate) fn set_pulsar_key(this: &PulsarNode, key: usize);

    #[wasm_bindgen(method, getter, js_name = "__elementId")]
    pub(crate) fn element_id(this: &PulsarNode) -> Option<String>;
    #[wasm_bindgen(method, setter, js_name = "__elementId")]
    pub(crate) fn set_element_id(this: &PulsarNode, id: &str);

    #[wasm_bindgen(method, getter, js_name = "__pulsarParked")]
    pub(crate) fn parked(this: &PulsarNode) -> Option<bool>;
    #[wasm_bindgen(method, setter, js_name = "__pulsarParked")]
    pub(crate) fn set_parked_flag(this: &PulsarNode, parked: bool);
}

thread_local! {
    static NEXT_NODE_KEY: Cell<usize> = const { Cell::new(0) };
}

/// Get the stable numeric key of a node, assigning one on first use.
pub(crate) fn node_key(node: &web_sys::Node) -> usize {
    let node = node.unchecked_ref::<PulsarNode>();
    if let Some(key) = node.pulsar_key() {
        key
    } else {
        NEXT_NODE_KEY.with(|cell| {
            let key = cell.get();
            cell.set(key + 1);
            node.set_pulsar_key(key);
            key
        })
    }
}

/// Get the stable numeric key of a node if one was assigned.
pub(crate) fn existing_node_key(node: &web_sys::Node) -> Option<usize> {
    node.unchecked_ref::<PulsarNode>().pulsar_key()
}

/// Read the hierarchical element id stored on a node, if any.
pub fn element_id_of(node: &web_sys::Node) -> Option<String> {
    node.unchecked_ref::<PulsarNode>().element_id()
}

/// Mark a node as deliberately detached. The node watcher leaves parked
/// subtrees alone: a hidden `Show` branch is out of the document but still
/// logically owned, and its wires must survive until it is re-attached.
pub(crate) fn set_parked(node: &web_sys::Node, parked: bool) {
    node.unchecked_ref::<PulsarNode>().set_parked_flag(parked);
}

/// Whether the node is parked.
pub(crate) fn is_parked(node: &web_sys::Node) -> bool {
    node.unchecked_ref::<PulsarNode>()
        .parked()
        .unwrap_or(false)
}

/// Stamp a hierarchical element id onto a node.
pub(crate) fn set_element_id_of(node: &web_sys::Node, id: &str) {
    node.unchecked_ref::<PulsarNode>().set_element_id(id);
}

/// Get all nodes between `start` and `end`.
///
/// If `end` is before `start`, all nodes after `start` will be returned.
///
/// The range is exclusive, so `start` and `end` are not included.
#[must_use]
pub fn get_nodes_between(start: &web_sys::Node, end: &web_sys::Node) -> Vec<web_sys::Node> {
    let parent = start.parent_node().unwrap();
    debug_assert_eq!(
        parent,
        end.parent_node().unwrap(),
        "parents of `start` and `end` do not match"
    );

    let mut nodes = Vec::new();

    let mut next = start.next_sibling();
    while let Some(current) = next {
        let tmp = current.next_sibling();
        if &current == end {
            break;
        } else {
            nodes.push(current);
        }
        next = tmp;
    }

    nodes
}

/// Remove every child of `node`.
pub(crate) fn clear_children(node: &web_sys::Node) {
    while let Some(child) = node.first_child() {
        node.remove_child(&child).unwrap();
    }
}

/// Create an invisible wrapper element. The wrapper participates in the DOM
/// tree but not in layout (`display: contents`), so grouping nodes under it
/// does not affect rendering.
pub(crate) fn contents_wrapper(tag: &str) -> web_sys::Element {
    let el = document().create_element(tag).unwrap_throw();
    let _ = el.set_attribute("style", "display: contents");
    el
}

/// Convert a [`JsValue`] to the string form the DOM would use for it.
pub(crate) fn js_value_to_string(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        s
    } else if let Some(n) = value.as_f64() {
        if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
            format!("{}", n as i64)
        } else {
            n.to_string()
        }
    } else if let Some(b) = value.as_bool() {
        b.to_string()
    } else if value.is_null() {
        "null".to_string()
    } else if value.is_undefined() {
        "undefined".to_string()
    } else {
        format!("{value:?}")
    }
}
