//! Reactive primitives for Pulsar.
//!
//! This crate is the reactivity kernel: signals, memos, effects, the owner
//! tree and write batching. It knows nothing about the DOM; the bindings
//! that put these primitives to work live in `pulsar-web`.

#![warn(missing_docs)]

mod effects;
mod memos;
mod node;
mod root;
mod signals;
mod utils;

pub use effects::*;
pub use memos::*;
pub use node::*;
pub use root::*;
pub use signals::*;
pub use utils::*;
