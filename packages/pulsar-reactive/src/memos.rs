//! Memos: eagerly cached derived values.

use std::cell::RefCell;

use crate::{create_empty_signal, create_signal, ReadSignal, Root};

/// Creates a cached derived value with a custom change gate.
///
/// After every recomputation, `unchanged(&new, &old)` decides whether
/// subscribers are notified: `true` means the output is considered the same
/// and the wave stops here. [`create_selector`] is the [`PartialEq`]
/// shorthand; [`create_memo`] never stops the wave.
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_selector_with<T>(
    mut compute: impl FnMut() -> T + 'static,
    mut unchanged: impl FnMut(&T, &T) -> bool + 'static,
) -> ReadSignal<T> {
    let root = Root::global();
    let cell = create_empty_signal();

    // The first run is tracked with the memo itself as the owner so that
    // anything it creates lands under it in the owner tree.
    let outer = root.owner.replace(cell.id);
    let (first, reads) = root.capture_reads(&mut compute);
    root.owner.set(outer);
    reads.link(root, cell.id);

    {
        let mut node = cell.get_mut();
        node.value = Some(Box::new(first));
        node.callback = Some(Box::new(move |slot| {
            let cached = slot.downcast_mut().expect("wrong memo type");
            let next = compute();
            if unchanged(&next, cached) {
                false
            } else {
                *cached = next;
                true
            }
        }));
    }

    *cell
}

/// Creates a cached value derived from other signals.
///
/// Every signal read inside the closure becomes an input; when any of them
/// changes, the memo recomputes eagerly and its subscribers follow.
///
/// # Difference from derived closures
///
/// A plain closure reading signals is lazy and forgets its result: calling
/// it twice computes twice. A memo computes once per input change and hands
/// out the cached value on every read, at the cost of a node in the graph.
///
/// # Example
/// ```
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let radius = create_signal(2.0_f64);
/// let area = create_memo(move || radius.get() * radius.get() * std::f64::consts::PI);
///
/// radius.set(3.0);
/// assert!((area.get() - 28.27).abs() < 0.01);
/// # });
/// ```
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_memo<T>(f: impl FnMut() -> T + 'static) -> ReadSignal<T> {
    create_selector_with(f, |_, _| false)
}

/// Creates a cached derived value that notifies subscribers only when the
/// output actually changes, judged by [`PartialEq`].
///
/// Use this over [`create_memo`] when the computation often collapses many
/// input states onto the same output (a parity, a threshold, a selection
/// flag) and downstream work is worth skipping.
///
/// For a custom comparison, use [`create_selector_with`].
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_selector<T>(f: impl FnMut() -> T + 'static) -> ReadSignal<T>
where
    T: PartialEq,
{
    create_selector_with(f, |new, old| new == old)
}

/// State driven by messages through a reducer function.
///
/// `step` folds each dispatched message into the previous state. Returns
/// the read handle and the dispatch function.
///
/// # Example
/// ```
/// # use pulsar_reactive::*;
/// enum Volume {
///     Up,
///     Down,
/// }
///
/// # let _ = create_root(|| {
/// let (level, send) = create_reducer(5, |&level, msg: Volume| match msg {
///     Volume::Up => level + 1,
///     Volume::Down => level - 1,
/// });
///
/// send(Volume::Up);
/// send(Volume::Up);
/// send(Volume::Down);
/// assert_eq!(level.get(), 6);
/// # });
/// ```
#[cfg_attr(debug_assertions, track_caller)]
pub fn create_reducer<T, Msg>(
    initial: T,
    step: impl FnMut(&T, Msg) -> T,
) -> (ReadSignal<T>, impl Fn(Msg)) {
    let step = RefCell::new(step);
    let state = create_signal(initial);
    (*state, move |msg| {
        state.update(|value| *value = step.borrow_mut()(value, msg));
    })
}
