//! # Pulsar
//!
//! A library for building reactive web apps in Rust and WebAssembly.
//!
//! Pulsar binds a fine-grained reactive computation graph directly to live
//! DOM nodes. Components are plain functions producing DOM subtrees;
//! updating a signal re-runs only the leaf computations whose outputs it
//! feeds, touching the DOM at exactly the attributes and text nodes that
//! depend on it. There is no virtual DOM.
//!
//! This crate is a facade over:
//!
//! * [`pulsar_reactive`] — signals, memos, effects, owner tree, batching.
//! * [`pulsar_web`] — `wire`, `t_element`, event delegation, `For`/`Show`/
//!   `Portal`/`Tryer` and application bootstrap.
//!
//! Most applications only need the [`prelude`].

pub use pulsar_reactive as reactive;
pub use pulsar_web as web;

pub use pulsar_reactive::*;
pub use pulsar_web::*;

/// The Pulsar prelude: the API surface a typical component file uses.
pub mod prelude {
    pub use pulsar_reactive::{
        batch, create_effect, create_memo, create_selector, create_signal, create_signal_eq,
        on_cleanup, untrack, Accessor, ReadSignal, Signal,
    };
    pub use pulsar_web::{
        attrs, bootstrap_app, document, flush_frames, handler, on_mount, pulse, schedule_frame,
        style_dyn, style_props, style_text, t_element, use_service, window, wire, wire_text,
        AttrValue, EventOptions, For, ForProps, MaybeDyn, Portal, PortalMount, PortalProps,
        RenderError, Show, ShowProps, Tryer, TryerProps, View,
    };
}
