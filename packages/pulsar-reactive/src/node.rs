//! Reactive nodes.

use std::any::Any;

use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::{untrack_in, Root};

new_key_type! {
    /// Id of a node in the reactive graph.
    pub struct NodeId;
}

/// A node inside the reactive graph.
///
/// Signals, memos, effects and plain scopes all share this representation.
/// A signal is a node with a value and no callback; a memo/effect is a node
/// with both; a scope is a node with neither that only owns children.
pub(crate) struct ReactiveNode {
    /// Value of the node, if any. If this node is a signal, this has a value.
    pub value: Option<Box<dyn Any>>,
    /// Callback that recomputes the value. Returns whether the value changed.
    pub callback: Option<Box<dyn FnMut(&mut Box<dyn Any>) -> bool>>,
    /// Nodes owned by this node: disposing this node disposes them too.
    pub children: Vec<NodeId>,
    /// The owner of this node, or the "null" key at the top level.
    pub parent: NodeId,
    /// Computations that read this node during their last run.
    pub subscribers: Vec<NodeId>,
    /// The read set: nodes this computation read during its last run.
    /// Severed wholesale before every re-run; `subscribers` and `reads` are
    /// two views of the same edges and are always mutated together.
    pub reads: SmallVec<[NodeId; 1]>,
    /// Optional equality gate for writes. When set, a replacement write
    /// whose new value compares equal to the current one does not notify
    /// subscribers.
    pub equals: Option<Box<dyn Fn(&dyn Any, &dyn Any) -> bool>>,
    /// Callbacks invoked when the node is disposed or before it re-runs.
    pub cleanups: Vec<Box<dyn FnOnce()>>,
    /// Whether the cached value is still current.
    pub state: NodeState,
    /// Traversal mark for the topological sort.
    pub mark: Mark,
    /// Keep track of where the node was created for diagnostics.
    #[cfg(debug_assertions)]
    pub created_at: &'static std::panic::Location<'static>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    /// The cached value reflects the current inputs.
    Clean,
    /// An input changed; the value must be recomputed.
    Stale,
}

/// Traversal mark for the topological sort of the reactive graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    /// Not reached yet.
    Unvisited,
    /// On the traversal stack. Seeing this again means a dependency cycle.
    Visiting,
    /// Fully processed.
    Done,
}

/// A handle to a reactive node. This can be used to dispose the node or to
/// run a closure with the node as the current owner.
#[derive(Clone, Copy)]
pub struct NodeHandle(pub(crate) NodeId, pub(crate) &'static Root);

impl NodeHandle {
    /// Returns `true` if the node has not yet been disposed.
    pub fn is_alive(self) -> bool {
        self.1.nodes.borrow().get(self.0).is_some()
    }

    /// Dispose the node: children first, then this node's cleanups, then
    /// every subscription edge, so that the node can never run again and is
    /// unreachable from any subscriber list.
    ///
    /// Disposing an already disposed node does nothing.
    pub fn dispose(self) {
        let root = self.1;
        self.dispose_children();
        let node = root.nodes.borrow_mut().remove(self.0);
        if let Some(node) = node {
            for read in node.reads {
                if let Some(read) = root.nodes.borrow_mut().get_mut(read) {
                    read.subscribers.retain(|&subscriber| subscriber != self.0);
                }
            }
        }
    }

    /// Dispose everything created in the node's last run: child nodes are
    /// disposed recursively, then the node's own cleanups run in reverse
    /// registration order, untracked.
    pub(crate) fn dispose_children(self) {
        let root = self.1;
        if root.nodes.borrow().get(self.0).is_none() {
            return;
        }
        let children = std::mem::take(&mut root.nodes.borrow_mut()[self.0].children);
        let cleanups = std::mem::take(&mut root.nodes.borrow_mut()[self.0].cleanups);
        for child in children {
            NodeHandle(child, root).dispose();
        }
        untrack_in(
            move || {
                for cleanup in cleanups.into_iter().rev() {
                    cleanup();
                }
            },
            root,
        );
    }

    /// Run the closure with this node as the current owner. Anything created
    /// inside is owned by this node and any cleanup registered inside runs
    /// when this node is disposed.
    pub fn run_in<T>(&self, f: impl FnOnce() -> T) -> T {
        let root = self.1;
        let prev_root = Root::set_global(Some(root));
        let prev_owner = root.owner.replace(self.0);
        let ret = f();
        root.owner.set(prev_owner);
        Root::set_global(prev_root);
        ret
    }
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeHandle").field(&self.0).finish()
    }
}
