//! Keyed list rendering.

#![allow(non_snake_case)]

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use pulsar_reactive::{
    create_child_scope, create_effect, create_signal, untrack, use_current_scope, NodeHandle,
    ReadSignal, Signal,
};
use wasm_bindgen::UnwrapThrowExt;

use crate::utils::contents_wrapper;
use crate::*;

/// Props for [`For`].
///
/// Keys must be `Display` because an item's key is baked into its
/// hierarchical element id (`.../k=<key>/...`).
pub struct ForProps<T: 'static, K: Hash + Eq + Clone + Display + 'static> {
    each: MaybeDyn<Vec<T>>,
    key: Box<dyn Fn(&T, usize) -> K>,
    children: Box<dyn Fn(&T, ReadSignal<usize>) -> web_sys::Node>,
    fallback: Option<Box<dyn FnMut() -> View>>,
}

impl<T: 'static, K: Hash + Eq + Clone + Display + 'static> ForProps<T, K> {
    /// Build props from the sequence, the identity function and the item
    /// renderer.
    ///
    /// The renderer receives the item and an accessor for the item's
    /// *current* index in the latest sequence; the accessor keeps reporting
    /// the up-to-date position after reorders.
    pub fn new(
        each: impl Into<MaybeDyn<Vec<T>>>,
        key: impl Fn(&T, usize) -> K + 'static,
        children: impl Fn(&T, ReadSignal<usize>) -> web_sys::Node + 'static,
    ) -> Self {
        Self {
            each: each.into(),
            key: Box::new(key),
            children: Box::new(children),
            fallback: None,
        }
    }

    /// Add a lazy fallback shown while the sequence is empty.
    pub fn fallback(mut self, fallback: impl FnMut() -> View + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

impl<T: 'static> ForProps<T, usize> {
    /// Build props keyed by index. Reordering is invisible to index-keyed
    /// lists; prefer [`ForProps::new`] with a stable key when items move.
    pub fn indexed(
        each: impl Into<MaybeDyn<Vec<T>>>,
        children: impl Fn(&T, ReadSignal<usize>) -> web_sys::Node + 'static,
    ) -> Self {
        Self::new(each, |_, index| index, children)
    }
}

struct TrackedItem {
    node: web_sys::Node,
    scope: NodeHandle,
    index: Signal<usize>,
}

/// Keyed list rendering.
///
/// Reconciles an ordered sequence against the DOM children of an invisible
/// container. Identity is decided by the key function: an item whose key
/// survives an update keeps its DOM node (pointer-equal) across any
/// permutation; items whose keys disappear are removed and their scopes
/// disposed; new keys are rendered under fresh scopes. Duplicate keys are
/// coalesced silently, last occurrence wins.
pub fn For<T: Clone + 'static, K: Hash + Eq + Clone + Display + 'static>(
    props: ForProps<T, K>,
) -> web_sys::Element {
    let wrapper = contents_wrapper("pulsar-for");
    // Items are scoped under the list's id; each entry's subtree is keyed
    // (`<list>/k=<key>/...`) so reordering does not change identity.
    let list_id = crate::element::register_in_current_app(&wrapper, ElementKind::Dynamic);

    let ForProps {
        mut each,
        key,
        children,
        mut fallback,
    } = props;

    let container: web_sys::Node = wrapper.clone().into();
    let mut tracked: HashMap<K, TrackedItem> = HashMap::new();
    let mut order: Vec<K> = Vec::new();
    let mut fallback_view: Option<View> = None;

    // Item scopes must outlive individual reconciliations, so they are
    // created under the outer scope rather than the reconcile effect.
    let scope = use_current_scope();

    create_effect(move || {
        let items = each.get_clone();

        if items.is_empty() {
            for key in order.drain(..) {
                if let Some(item) = tracked.remove(&key) {
                    remove_item(&container, item);
                }
            }
            if let Some(fallback) = &mut fallback {
                if fallback_view.is_none() {
                    let view = crate::app::with_id_scope(list_id.as_deref(), || {
                        scope.run_in(|| untrack(fallback))
                    });
                    view.append_to(&container);
                    fallback_view = Some(view);
                }
            }
            return;
        }

        if let Some(view) = fallback_view.take() {
            view.remove_from(&container);
        }

        // Build the new order, coalescing duplicate keys: the last item
        // with a given key wins, earlier ones are discarded silently.
        let mut seen: HashSet<K> = HashSet::new();
        let mut new_order: Vec<(K, T)> = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate().rev() {
            let k = key(&item, index);
            if seen.insert(k.clone()) {
                new_order.push((k, item));
            }
        }
        new_order.reverse();

        // Remove phase: drop every tracked key absent from the new set.
        let new_keys: HashSet<&K> = new_order.iter().map(|(k, _)| k).collect();
        for key in order.drain(..) {
            if !new_keys.contains(&key) {
                if let Some(item) = tracked.remove(&key) {
                    remove_item(&container, item);
                }
            }
        }
        drop(new_keys);

        // Reorder phase: walk the new order by target position, creating
        // missing items and moving survivors whose position changed.
        let child_nodes = container.child_nodes();
        for (position, (k, item)) in new_order.iter().enumerate() {
            match tracked.get(k) {
                Some(existing) => {
                    if existing.index.get_untracked() != position {
                        existing.index.set(position);
                    }
                    let at_position = child_nodes.get(position as u32);
                    if at_position.as_ref() != Some(&existing.node) {
                        container
                            .insert_before(&existing.node, at_position.as_ref())
                            .unwrap_throw();
                    }
                }
                None => {
                    let mut created: Option<(web_sys::Node, Signal<usize>)> = None;
                    let mut build = || {
                        scope.run_in(|| {
                            create_child_scope(|| {
                                let index = create_signal(position);
                                let node = untrack(|| children(item, *index));
                                created = Some((node, index));
                            })
                        })
                    };
                    let item_scope = match (crate::app::current_app(), &list_id) {
                        (Some(app), Some(list_id)) => app.id_context.run_scoped(list_id, || {
                            let item_id = app.id_context.keyed_child_id(&k.to_string());
                            app.id_context.run_scoped(&item_id, build)
                        }),
                        _ => build(),
                    };
                    let (node, index) = created.expect("children did not run");
                    if let Some(app) = crate::app::current_app() {
                        if let Some(id) = crate::utils::element_id_of(&node) {
                            if let Some(mut entry) = app.registry.get(&id) {
                                entry.kind = ElementKind::ArrayItem;
                                app.registry.register(id, entry);
                            }
                        }
                    }
                    let at_position = child_nodes.get(position as u32);
                    container
                        .insert_before(&node, at_position.as_ref())
                        .unwrap_throw();
                    tracked.insert(
                        k.clone(),
                        TrackedItem {
                            node,
                            scope: item_scope,
                            index,
                        },
                    );
                }
            }
        }

        order = new_order.into_iter().map(|(k, _)| k).collect();
    });

    wrapper
}

fn remove_item(container: &web_sys::Node, item: TrackedItem) {
    if item.node.parent_node().as_ref() == Some(container) {
        container.remove_child(&item.node).unwrap_throw();
    }
    item.scope.dispose();
}
