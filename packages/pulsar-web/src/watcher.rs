//! MutationObserver-driven disposal.
//!
//! The node watcher ties wire lifetime to DOM attachment: when a node (or a
//! subtree) is removed from the observed root, every wire on it is disposed,
//! its registry entry is released and its delegated event handlers are
//! detached. Disposal happens one microtask after the mutation; a node that
//! is connected again by the time the microtask runs is left alone, so a
//! synchronous detach/re-attach pair does not tear anything down.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::app::current_app;
use crate::utils::element_id_of;
use crate::*;

/// Watches an application root for removed nodes.
pub struct NodeWatcher {
    observer: web_sys::MutationObserver,
    /// Kept alive for as long as the observer is connected.
    _callback: Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>,
}

impl NodeWatcher {
    /// Attach a watcher to `root`, observing child list changes in the
    /// whole subtree.
    pub fn attach(root: &web_sys::Element) -> Self {
        let callback = Closure::wrap(Box::new(
            move |records: js_sys::Array, _observer: web_sys::MutationObserver| {
                for record in records.iter() {
                    let record = record.unchecked_into::<web_sys::MutationRecord>();
                    let removed = record.removed_nodes();
                    for i in 0..removed.length() {
                        if let Some(node) = removed.get(i) {
                            schedule_disposal(node);
                        }
                    }
                }
            },
        )
            as Box<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>);

        let observer = web_sys::MutationObserver::new(callback.as_ref().unchecked_ref())
            .unwrap_throw();
        let mut init = web_sys::MutationObserverInit::new();
        init.child_list(true);
        init.subtree(true);
        observer.observe_with_options(root, &init).unwrap_throw();

        Self {
            observer,
            _callback: callback,
        }
    }

    /// Stop observing. Pending microtask disposals still run.
    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

/// Queue the disposal of `node` for the next microtask. If the node has been
/// reconnected by then, nothing happens.
fn schedule_disposal(node: web_sys::Node) {
    queue_microtask(move || {
        if node.is_connected() {
            return;
        }
        dispose_subtree(&node);
    });
}

/// Dispose the wires, registry entry and delegated handlers of `node` and
/// every descendant. Idempotent.
///
/// Parked subtrees (deliberately detached by `Show` and friends) are left
/// alone; their owner is responsible for them.
pub(crate) fn dispose_subtree(node: &web_sys::Node) {
    if crate::utils::is_parked(node) {
        return;
    }
    release_node(node);
    let children = node.child_nodes();
    for i in 0..children.length() {
        if let Some(child) = children.get(i) {
            dispose_subtree(&child);
        }
    }
}

fn release_node(node: &web_sys::Node) {
    crate::wire::dispose_wires(node);
    if let Some(id) = element_id_of(node) {
        if let Some(app) = current_app() {
            app.registry.unregister(&id);
            app.delegator.unregister_element(&id);
        }
    }
}
