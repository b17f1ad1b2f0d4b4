//! Side effects!

use crate::{create_empty_signal, create_memo, NodeHandle, Root};

/// Creates an effect on signals used inside the effect closure.
///
/// Returns a [`NodeHandle`] that can be used to dispose the effect before
/// its owner is disposed.
///
/// # Example
/// ```
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let level = create_signal(1);
///
/// create_effect(move || {
///     println!("level is now {}", level.get());
/// });
/// // Prints "level is now 1"
///
/// level.set(2);
/// // Prints "level is now 2"
/// # });
/// ```
///
/// `create_effect` should only be used for creating **side-effects**. It is
/// generally not recommended to update signal states inside an effect. You
/// probably should be using a [`create_memo`](crate::create_memo) instead.
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_effect(f: impl FnMut() + 'static) -> NodeHandle {
    let cell = create_memo(f);
    NodeHandle(cell.id, Root::global())
}

/// Creates an effect whose first run also produces a value.
///
/// The closure runs once, tracked, and returns a pair of the continuation
/// that should run on every input change and the value handed back to the
/// caller. This is the primitive the DOM bindings are built on: the first
/// run creates the nodes, the continuation patches them.
///
/// # Example
/// ```
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let level = create_signal(0);
/// let first_seen = create_effect_initial(move || {
///     let first = level.get();
///     (
///         Box::new(move || {
///             let _ = level.get();
///         }) as Box<dyn FnMut()>,
///         first,
///     )
/// });
/// assert_eq!(first_seen, 0);
/// # });
/// ```
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_effect_initial<T>(
    initial: impl FnOnce() -> (Box<dyn FnMut() + 'static>, T) + 'static,
) -> T {
    let root = Root::global();
    let cell = create_empty_signal::<()>();

    let outer = root.owner.replace(cell.id);
    let ((mut rerun, result), reads) = root.capture_reads(initial);
    root.owner.set(outer);
    reads.link(root, cell.id);

    {
        let mut node = cell.get_mut();
        node.value = Some(Box::new(()));
        node.callback = Some(Box::new(move |_| {
            rerun();
            true
        }));
    }

    result
}
