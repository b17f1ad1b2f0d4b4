//! The frame scheduler.
//!
//! [`schedule_frame`] coalesces per-frame DOM work under caller-supplied
//! keys: scheduling the same key again before the flush replaces the prior
//! task, so a 60Hz drag loop performs one write per frame no matter how many
//! pointer events arrived in between. Tasks run in key-insertion order when
//! the queue is flushed, either by the next animation frame or explicitly
//! through [`flush_frames`].

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use pulsar_reactive::{on_cleanup, try_use_current_scope};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::window;

thread_local! {
    static FRAME_QUEUE: RefCell<IndexMap<Cow<'static, str>, Box<dyn FnOnce()>>> =
        RefCell::new(IndexMap::new());

    static RAF_PENDING: Cell<bool> = const { Cell::new(false) };
}

/// Schedule `task` to run at the next frame boundary under `key`.
///
/// Re-scheduling an existing key before the flush replaces the prior task
/// (last writer wins) while keeping the key's original position in the
/// flush order.
///
/// A task whose registering scope is disposed before the flush is dropped
/// without running.
pub fn schedule_frame(task: impl FnOnce() + 'static, key: impl Into<Cow<'static, str>>) {
    // Guard the task on the liveness of the scheduling scope.
    let task: Box<dyn FnOnce()> = if try_use_current_scope().is_some() {
        let alive = Rc::new(Cell::new(true));
        on_cleanup({
            let alive = Rc::clone(&alive);
            move || alive.set(false)
        });
        Box::new(move || {
            if alive.get() {
                task();
            }
        })
    } else {
        Box::new(task)
    };

    FRAME_QUEUE.with(|queue| {
        queue.borrow_mut().insert(key.into(), task);
    });
    request_frame_flush();
}

/// Run every scheduled frame task in key-insertion order and clear the
/// queue. Tasks scheduled while the flush runs go to the next flush.
pub fn flush_frames() {
    let tasks: Vec<(Cow<'static, str>, Box<dyn FnOnce()>)> =
        FRAME_QUEUE.with(|queue| queue.borrow_mut().drain(..).collect());
    for (_key, task) in tasks {
        task();
    }
}

/// Number of tasks currently queued. Exposed for tests.
pub fn pending_frame_tasks() -> usize {
    FRAME_QUEUE.with(|queue| queue.borrow().len())
}

/// Arrange for [`flush_frames`] to run on the next animation frame. Only one
/// callback is in flight at a time. On non-wasm targets the flush must be
/// triggered explicitly.
fn request_frame_flush() {
    if !cfg!(target_arch = "wasm32") {
        return;
    }
    if RAF_PENDING.with(|pending| pending.replace(true)) {
        return;
    }
    let cb = Closure::once_into_js(move || {
        RAF_PENDING.with(|pending| pending.set(false));
        flush_frames();
    });
    window()
        .request_animation_frame(cb.unchecked_ref())
        .unwrap_throw();
}
