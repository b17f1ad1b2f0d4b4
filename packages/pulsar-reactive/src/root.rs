//! The reactive root and the owner tree.

use std::cell::{Cell, RefCell};

use slotmap::{Key, SlotMap};
use smallvec::SmallVec;

use crate::*;

/// All the state of one reactive system. An application has exactly one.
///
/// The root is leaked on creation so that `&'static Root` handles can be
/// stored inside `Copy` signal handles. Leaking is not a resource problem:
/// [`RootHandle::dispose`] releases everything allocated *inside* the root,
/// and the empty shell is expected to live as long as the program anyway.
pub(crate) struct Root {
    /// While `Some`, signal reads are recorded into this read set.
    pub capture: RefCell<Option<ReadSet>>,
    /// Scratch buffer for the topological sort, reused across flushes.
    pub sort_buf: RefCell<Vec<NodeId>>,
    /// The node that owns whatever is created right now. Null only while no
    /// root scope exists.
    pub owner: Cell<NodeId>,
    /// The top of the owner tree. Disposing it empties the root.
    pub root_scope: Cell<NodeId>,
    /// Every live node of the graph.
    pub nodes: RefCell<SlotMap<NodeId, ReactiveNode>>,
    /// Writes waiting for the outermost batch to end.
    pub pending: RefCell<Vec<NodeId>>,
    /// Batch nesting depth. While non-zero, writes queue instead of flush.
    pub batch_depth: Cell<u32>,
}

thread_local! {
    /// The reactive root owning whatever is currently executing.
    static GLOBAL_ROOT: Cell<Option<&'static Root>> = const { Cell::new(None) };
}

impl Root {
    /// The current reactive root. Panics outside of one.
    #[cfg_attr(debug_assertions, track_caller)]
    pub fn global() -> &'static Root {
        GLOBAL_ROOT.with(Cell::get).expect("no root found")
    }

    /// The current reactive root, if any.
    pub fn try_global() -> Option<&'static Root> {
        GLOBAL_ROOT.with(Cell::get)
    }

    /// Install `root` as the current one, handing back the previous value
    /// so callers can restore it.
    pub fn set_global(root: Option<&'static Root>) -> Option<&'static Root> {
        GLOBAL_ROOT.with(|cell| cell.replace(root))
    }

    /// Allocate a fresh root and leak it.
    pub fn new_leaked() -> &'static Self {
        let root = Box::leak(Box::new(Self {
            capture: RefCell::new(None),
            sort_buf: RefCell::new(Vec::new()),
            owner: Cell::new(NodeId::null()),
            root_scope: Cell::new(NodeId::null()),
            nodes: RefCell::new(SlotMap::default()),
            pending: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
        }));
        root.reset();
        root
    }

    /// Tear down everything allocated in this root and start over with a
    /// fresh, empty root scope.
    pub fn reset(&'static self) {
        NodeHandle(self.root_scope.get(), self).dispose();

        self.capture.take();
        self.sort_buf.take();
        self.pending.take();
        self.owner.take();
        self.root_scope.take();
        self.nodes.take();
        self.batch_depth.set(0);

        // Recreate the root scope. The owner cell points at it from now on,
        // so top-level signals, effects and cleanups are owned by it and
        // released on the next reset.
        let prev = Root::set_global(Some(self));
        let scope = create_child_scope(|| {});
        Root::set_global(prev);
        self.root_scope.set(scope.0);
        self.owner.set(scope.0);
    }

    /// Implementation of [`create_child_scope`]: a bare node that exists
    /// only to own what `f` creates.
    pub fn create_child_scope(&'static self, f: impl FnOnce()) -> NodeHandle {
        let id = create_signal(()).id;
        let prev = self.owner.replace(id);
        f();
        self.owner.set(prev);
        NodeHandle(id, self)
    }

    /// Run `f` while recording every signal it reads. Returns the closure's
    /// result together with the captured read set.
    pub fn capture_reads<T>(&self, f: impl FnOnce() -> T) -> (T, ReadSet) {
        let outer = self.capture.replace(Some(ReadSet::default()));
        let ret = f();
        let reads = self.capture.replace(outer).unwrap();
        (ret, reads)
    }

    /// Re-run a stale computation and rebuild its dependency edges from
    /// whatever it reads this time.
    ///
    /// The old read set is severed *before* the body runs. While the body
    /// executes there is no edge leading back to this node, which is what
    /// stops a computation that writes a signal it also reads from
    /// re-queueing itself within the current flush.
    #[cfg_attr(feature = "trace", tracing::instrument(skip(self)))]
    fn recompute(&'static self, id: NodeId) {
        debug_assert_eq!(
            self.nodes.borrow()[id].state,
            NodeState::Stale,
            "recompute on a clean node"
        );
        let severed = std::mem::take(&mut self.nodes.borrow_mut()[id].reads);
        for read in severed {
            self.nodes.borrow_mut()[read]
                .subscribers
                .retain(|&subscriber| subscriber != id);
        }
        // The callback and value move out of the arena for the duration of
        // the call; holding a borrow across user code would deadlock on
        // re-entrant reads.
        let mut nodes = self.nodes.borrow_mut();
        let mut body = nodes[id].callback.take().unwrap();
        let mut slot = nodes[id].value.take().unwrap();
        drop(nodes);

        // Whatever the previous run created is torn down first.
        NodeHandle(id, self).dispose_children();

        let prev_owner = self.owner.replace(id);
        let (changed, reads) = self.capture_reads(|| body(&mut slot));
        self.owner.set(prev_owner);

        reads.link(self, id);

        let mut nodes = self.nodes.borrow_mut();
        nodes[id].callback = Some(body);
        nodes[id].value = Some(slot);
        nodes[id].state = NodeState::Clean;
        drop(nodes);

        if changed {
            self.mark_subscribers_stale(id);
        }
    }

    /// Flag every subscriber of `id` as needing a recomputation.
    fn mark_subscribers_stale(&self, id: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        let subscribers = std::mem::take(&mut nodes[id].subscribers);
        for &subscriber in &subscribers {
            if let Some(subscriber) = nodes.get_mut(subscriber) {
                subscriber.state = NodeState::Stale;
            }
        }
        nodes[id].subscribers = subscribers;
    }

    /// Run one update wave starting from the given written signals.
    ///
    /// An acyclic graph admits a topological order, so a DFS sorts every
    /// reachable node and a single pass recomputes exactly those that went
    /// stale, dependencies before dependents, each at most once.
    fn flush(&'static self, written: &[NodeId]) {
        // Reuse the shared sort buffer unless a re-entrant flush (a write
        // inside a recomputation) is already holding it.
        let mut local = Vec::new();
        let mut shared = self.sort_buf.try_borrow_mut();
        let sorted = match shared.as_mut() {
            Ok(buf) => {
                buf.clear();
                &mut **buf
            }
            Err(_) => &mut local,
        };

        for &id in written {
            Self::sort_visit(id, &mut self.nodes.borrow_mut(), sorted);
            self.mark_subscribers_stale(id);
        }
        #[cfg(feature = "trace")]
        tracing::trace!("flushing {} nodes", sorted.len());

        for &id in sorted.iter().rev() {
            let mut nodes = self.nodes.borrow_mut();
            // The node may have been disposed earlier in this very wave.
            let Some(node) = nodes.get_mut(id) else {
                continue;
            };
            node.mark = Mark::Unvisited;
            let stale = node.state == NodeState::Stale;
            drop(nodes);
            // A node whose owner is also due in this wave is skipped: the
            // owner's re-run disposes it and builds a replacement, so the
            // stale body would run once for nothing.
            if stale && !self.has_stale_owner(id) {
                self.recompute(id);
            }
        }
    }

    /// Whether any node on the ownership chain of `id` is itself stale.
    fn has_stale_owner(&self, id: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut ancestor = nodes.get(id).map(|node| node.parent);
        while let Some(owner_id) = ancestor {
            if owner_id.is_null() {
                return false;
            }
            match nodes.get(owner_id) {
                Some(owner) if owner.state == NodeState::Stale => return true,
                Some(owner) => ancestor = Some(owner.parent),
                None => return false,
            }
        }
        false
    }

    /// React to a write on `id`: queue it while batching, flush immediately
    /// otherwise.
    #[cfg_attr(debug_assertions, track_caller)]
    pub fn notify(&'static self, id: NodeId) {
        if self.batch_depth.get() > 0 {
            self.pending.borrow_mut().push(id);
        } else {
            let prev = Root::set_global(Some(self));
            self.flush(&[id]);
            Root::set_global(prev);
        }
    }

    /// DFS step of the topological sort. Pushes `id` after all of its
    /// transitive subscribers, so reversing the output yields dependencies
    /// before dependents.
    fn sort_visit(id: NodeId, nodes: &mut SlotMap<NodeId, ReactiveNode>, out: &mut Vec<NodeId>) {
        let Some(node) = nodes.get_mut(id) else {
            // Dead nodes are not worth visiting.
            return;
        };

        match node.mark {
            Mark::Visiting => panic!("cyclic reactive dependency"),
            Mark::Done => return,
            Mark::Unvisited => {}
        }
        node.mark = Mark::Visiting;

        // The subscriber list moves out during recursion to appease the
        // borrow checker. Subscribers are walked back-to-front so that the
        // reversed output runs siblings in subscription order.
        let subscribers = std::mem::take(&mut node.subscribers);
        for &subscriber in subscribers.iter().rev() {
            Self::sort_visit(subscriber, nodes, out);
        }
        nodes[id].subscribers = subscribers;

        nodes[id].mark = Mark::Done;
        out.push(id);
    }

    /// Open a batch. Batches nest.
    fn enter_batch(&self) {
        self.batch_depth.set(self.batch_depth.get() + 1);
    }

    /// Close a batch. Only the outermost exit flushes the queued writes,
    /// each affected computation at most once.
    fn leave_batch(&'static self) {
        let depth = self.batch_depth.get();
        debug_assert!(depth > 0, "leave_batch without a matching enter_batch");
        self.batch_depth.set(depth - 1);
        if depth == 1 {
            let pending = self.pending.take();
            self.flush(&pending);
        }
    }
}

/// A handle to a reactive root, obtained from [`create_root`]. Lets you run
/// code inside the root and dispose it when the application shuts down.
#[derive(Clone, Copy)]
pub struct RootHandle {
    root: &'static Root,
}

impl RootHandle {
    /// Release everything that was created in this root.
    pub fn dispose(&self) {
        self.root.reset();
    }

    /// Run `f` inside this root's scope.
    pub fn run_in<T>(&self, f: impl FnOnce() -> T) -> T {
        let prev = Root::set_global(Some(self.root));
        let ret = f();
        Root::set_global(prev);
        ret
    }
}

/// The signals a computation read during one run.
#[derive(Default)]
pub(crate) struct ReadSet {
    /// Ids of the signals that were read, in first-read order.
    pub signals: SmallVec<[NodeId; 1]>,
}

impl ReadSet {
    /// Install the captured reads as graph edges: `reader` subscribes to
    /// every signal in the set, and the set becomes the reader's `reads`.
    pub fn link(self, root: &Root, reader: NodeId) {
        for &signal in &self.signals {
            root.nodes.borrow_mut()[signal].subscribers.push(reader);
        }
        root.nodes.borrow_mut()[reader].reads = self.signals;
    }
}

/// Create a reactive root, the top of an owner tree.
///
/// Everything reactive lives under some root; the returned [`RootHandle`]
/// disposes it all at once.
///
/// # Example
/// ```rust
/// # use pulsar_reactive::*;
/// let root = create_root(|| {
///     let greeting = create_signal("hi");
///     // ... build the app ...
/// });
/// // Later, on shutdown:
/// root.dispose();
/// ```
#[must_use = "root should be disposed"]
pub fn create_root(f: impl FnOnce()) -> RootHandle {
    let root = Root::new_leaked();
    #[cfg(not(target_arch = "wasm32"))]
    {
        /// Wrapper promising that the pointer is only held, never touched.
        #[allow(dead_code)]
        struct RawRoot(*const Root);
        unsafe impl Send for RawRoot {}

        /// Keeps a live reference to every leaked `Root` so that leak
        /// checkers do not report them.
        static ROOTS: std::sync::Mutex<Vec<RawRoot>> = std::sync::Mutex::new(Vec::new());
        ROOTS.lock().unwrap().push(RawRoot(root as *const Root));
    }

    let prev = Root::set_global(Some(root));
    f();
    Root::set_global(prev);
    RootHandle { root }
}

/// Create a child scope: an owner node under the current one.
///
/// The scope is disposed together with its owner, or earlier through the
/// returned [`NodeHandle`].
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_child_scope(f: impl FnOnce()) -> NodeHandle {
    Root::global().create_child_scope(f)
}

/// Register a callback on the current owner, to run when the owner is
/// disposed or just before the owning computation re-runs. Callbacks on the
/// same owner run in reverse registration order, untracked.
///
/// Outside of any computation the callback lands on the root scope and runs
/// when the root is disposed.
///
/// # Example
/// ```rust
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let scope = create_child_scope(|| {
///     on_cleanup(|| println!("scope torn down"));
/// });
/// scope.dispose(); // prints
/// # });
/// ```
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    let root = Root::global();
    let mut target = root.owner.get();
    if target.is_null() {
        target = root.root_scope.get();
    }
    if !target.is_null() {
        root.nodes.borrow_mut()[target].cleanups.push(Box::new(f));
    }
}

/// Defer subscriber updates until the end of the closure.
///
/// Writes inside the batch accumulate; when the outermost batch exits, each
/// affected computation runs at most once and observes the final value of
/// every cell that was written. Re-entrant batches simply nest.
///
/// # Example
///
/// ```
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let x = create_signal(1);
/// let y = create_signal(2);
/// let sum = create_memo(move || x.get() + y.get());
/// batch(move || {
///     x.set(10);
///     y.set(20);
///     // Not recomputed yet:
///     assert_eq!(sum.get(), 3);
/// });
/// assert_eq!(sum.get(), 30);
/// # });
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    let root = Root::global();
    root.enter_batch();
    let ret = f();
    root.leave_batch();
    ret
}

/// Suppress dependency capture for the duration of the closure: signals
/// read inside do not subscribe the enclosing computation.
///
/// # Example
///
/// ```
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let name = create_signal("world");
/// let frozen = create_memo(move || untrack(|| format!("hello {}", name.get())));
/// assert_eq!(frozen.get_clone(), "hello world");
///
/// name.set("moon");
/// // The memo never subscribed, so it still holds the old output.
/// assert_eq!(frozen.get_clone(), "hello world");
/// # });
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    untrack_in(f, Root::global())
}

/// [`untrack`] against an explicit root, for callers that already hold one.
pub(crate) fn untrack_in<T>(f: impl FnOnce() -> T, root: &'static Root) -> T {
    let outer = root.capture.replace(None);
    let ret = f();
    root.capture.replace(outer);
    ret
}

/// A handle to the current owner, for deferred callbacks that want to
/// re-enter the same ownership scope later.
pub fn use_current_scope() -> NodeHandle {
    let root = Root::global();
    NodeHandle(root.owner.get(), root)
}

/// Like [`use_current_scope`], but returns `None` when called outside of a
/// reactive root instead of panicking.
pub fn try_use_current_scope() -> Option<NodeHandle> {
    let root = Root::try_global()?;
    let owner = root.owner.get();
    if owner.is_null() {
        None
    } else {
        Some(NodeHandle(owner, root))
    }
}

/// A handle to the root scope itself.
pub fn use_global_scope() -> NodeHandle {
    let root = Root::global();
    NodeHandle(root.root_scope.get(), root)
}
