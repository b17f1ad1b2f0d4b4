//! The per-root element registry and hierarchical id generation.
//!
//! Every element constructed while an application root is current is
//! registered here under a hierarchical string id. Ids encode the logical
//! path through the application's scoping containers: the control-flow
//! components open a segment for their content (`Show` branches render
//! under the wrapper's id, `For` items under a keyed
//! `<list>/k=<key>` segment, portal slots under `k=<name>`), and plain
//! elements number themselves within the innermost open segment. Keyed
//! segments are stable across reorders, which makes the ids usable as
//! reconciliation keys; all ids double as the address used by the event
//! delegator.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexSet;

/// What kind of thing an element entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// The root node of a component.
    Component,
    /// An element with only static attributes.
    Static,
    /// An element with at least one wired attribute.
    Dynamic,
    /// An item produced by a keyed list.
    ArrayItem,
    /// Content mounted through a portal.
    PortalContent,
}

/// A registry entry for a single element.
#[derive(Debug, Clone)]
pub struct ElementEntry {
    /// The DOM node.
    pub element: web_sys::Node,
    /// What kind of entry this is.
    pub kind: ElementKind,
    /// The id of the logical parent, if any.
    pub parent_id: Option<String>,
    /// For portal content: the id of the container the content was
    /// physically mounted into, when that container is registered.
    pub physical_parent_id: Option<String>,
    /// Whether this entry is portal content (its physical location differs
    /// from its logical one).
    pub is_portal_content: bool,
}

/// Maps hierarchical element ids to DOM nodes and metadata. One per
/// application root.
#[derive(Default)]
pub struct ElementRegistry {
    entries: RefCell<HashMap<String, ElementEntry>>,
    /// Insertion-ordered children index: parent id -> child ids.
    children: RefCell<HashMap<String, IndexSet<String>>>,
}

impl ElementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under `id`, indexing it under its parent.
    pub fn register(&self, id: String, entry: ElementEntry) {
        if let Some(parent) = &entry.parent_id {
            self.children
                .borrow_mut()
                .entry(parent.clone())
                .or_default()
                .insert(id.clone());
        }
        self.entries.borrow_mut().insert(id, entry);
    }

    /// Remove the entry for `id`. Unknown ids are ignored.
    pub fn unregister(&self, id: &str) {
        let entry = self.entries.borrow_mut().remove(id);
        if let Some(entry) = entry {
            if let Some(parent) = &entry.parent_id {
                if let Some(children) = self.children.borrow_mut().get_mut(parent) {
                    children.shift_remove(id);
                }
            }
        }
        self.children.borrow_mut().remove(id);
    }

    /// Look up the entry for `id`.
    pub fn get(&self, id: &str) -> Option<ElementEntry> {
        self.entries.borrow().get(id).cloned()
    }

    /// Whether an entry exists for `id`.
    pub fn has(&self, id: &str) -> bool {
        self.entries.borrow().contains_key(id)
    }

    /// The ids of the children registered under `parent_id`, in
    /// registration order.
    pub fn get_children(&self, parent_id: &str) -> Vec<String> {
        self.children
            .borrow()
            .get(parent_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of registered entries.
    pub fn size(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.children.borrow_mut().clear();
    }
}

/// Generates hierarchical element ids.
///
/// Ids encode the path from the root through the open scopes: `root/0/2`
/// is the third element created inside the scope of element `root/0`.
/// Scopes are opened with [`run_scoped`](IdContext::run_scoped) — the
/// control-flow components do this for their content — and keyed segments
/// (`root/0/k=abc`) give list items an identity that survives reordering.
pub struct IdContext {
    stack: RefCell<Vec<String>>,
    counters: RefCell<HashMap<String, usize>>,
}

impl Default for IdContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IdContext {
    /// Create a context rooted at `root`.
    pub fn new() -> Self {
        Self {
            stack: RefCell::new(vec!["root".to_string()]),
            counters: RefCell::new(HashMap::new()),
        }
    }

    /// The id currently at the top of the stack.
    pub fn current(&self) -> String {
        self.stack.borrow().last().cloned().unwrap_or_default()
    }

    /// Generate the next positional child id under the current parent.
    pub fn next_child_id(&self) -> String {
        let parent = self.current();
        let mut counters = self.counters.borrow_mut();
        let counter = counters.entry(parent.clone()).or_insert(0);
        let id = format!("{parent}/{counter}");
        *counter += 1;
        id
    }

    /// Generate a keyed child id under the current parent. Two calls with
    /// the same key yield the same id regardless of ordering.
    pub fn keyed_child_id(&self, key: &str) -> String {
        format!("{}/k={key}", self.current())
    }

    /// Run `f` with `id` as the current parent.
    pub fn run_scoped<T>(&self, id: &str, f: impl FnOnce() -> T) -> T {
        self.stack.borrow_mut().push(id.to_string());
        let ret = f();
        self.stack.borrow_mut().pop();
        ret
    }

    /// Reset the context to its initial state.
    pub fn reset(&self) {
        *self.stack.borrow_mut() = vec!["root".to_string()];
        self.counters.borrow_mut().clear();
    }
}
