//! # `pulsar-web`
//!
//! Browser DOM bindings for [`pulsar`](https://docs.rs/pulsar). This is
//! already re-exported in the main `pulsar` crate, so you should rarely need
//! to use this crate directly.
//!
//! The binding model is deliberately thin: [`t_element`] creates real DOM
//! nodes, [`wire`] attaches a reactive expression to a single
//! (node, property path) pair, and the control-flow components
//! ([`For`], [`Show`], [`Portal`], [`Tryer`]) are ordinary functions built
//! from the same two primitives. There is no virtual DOM.

use std::cell::Cell;
use std::rc::Rc;

use pulsar_reactive::*;
use wasm_bindgen::prelude::*;

#[macro_use]
mod macros;

mod app;
mod element;
mod events;
mod frame;
mod iter;
mod maybe_dyn;
mod portal;
mod registry;
mod show;
mod tryer;
mod view;
mod watcher;
mod wire;

#[doc(hidden)]
pub mod utils;

pub use self::app::*;
pub use self::element::*;
pub use self::events::*;
pub use self::frame::*;
pub use self::iter::*;
pub use self::maybe_dyn::*;
pub use self::portal::*;
pub use self::registry::*;
pub use self::show::*;
pub use self::tryer::*;
pub use self::utils::{element_id_of, get_nodes_between};
pub use self::view::*;
pub use self::watcher::*;
pub use self::wire::*;

/// Re-export of `js-sys` and `wasm-bindgen` for convenience.
pub use {js_sys, wasm_bindgen, web_sys};

/// Queue up a callback to be executed once the component has been mounted
/// and the first effect pass is over.
///
/// The callback is skipped if the registering scope is disposed before the
/// microtask runs.
pub fn on_mount(f: impl FnOnce() + 'static) {
    if cfg!(target_arch = "wasm32") {
        let is_alive = Rc::new(Cell::new(true));
        on_cleanup({
            let is_alive = Rc::clone(&is_alive);
            move || is_alive.set(false)
        });

        let scope = use_current_scope();
        let cb = move || {
            if is_alive.get() {
                scope.run_in(f);
            }
        };
        queue_microtask(cb);
    }
}

/// Alias for `queueMicrotask`.
pub fn queue_microtask(f: impl FnOnce() + 'static) {
    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_name = "queueMicrotask")]
        fn queue_microtask_js(f: &wasm_bindgen::JsValue);
    }
    queue_microtask_js(&Closure::once_into_js(f));
}

/// Utility function for accessing the global [`web_sys::Window`] object.
pub fn window() -> web_sys::Window {
    web_sys::window().expect("no global `window` exists")
}

/// Utility function for accessing the global [`web_sys::Document`] object.
pub fn document() -> web_sys::Document {
    thread_local! {
        /// Cache for a small performance improvement by preventing repeated
        /// calls to `window().document()`.
        static DOCUMENT: web_sys::Document = window().document().expect("no `document` exists");
    }
    DOCUMENT.with(Clone::clone)
}
