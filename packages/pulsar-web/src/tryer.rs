//! Error boundaries.

#![allow(non_snake_case)]

use std::rc::Rc;

use pulsar_reactive::{create_effect, create_signal};
use thiserror::Error;
use wasm_bindgen::UnwrapThrowExt;

use crate::utils::{clear_children, contents_wrapper};
use crate::*;

/// An error produced while rendering a subtree.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A component-reported failure with a message.
    #[error("{0}")]
    Message(String),
    /// A value that is not a renderable node was produced where a node was
    /// required.
    #[error("value is not a renderable node")]
    NotANode,
}

impl From<String> for RenderError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}
impl From<&str> for RenderError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// The reset callback handed to a [`Tryer`] fallback. Calling it re-runs
/// the boundary's children.
pub type ResetFn = Rc<dyn Fn()>;

/// Props for [`Tryer`].
pub struct TryerProps {
    children: Box<dyn FnMut() -> Result<View, RenderError>>,
    fallback: Option<Box<dyn FnMut(&RenderError, ResetFn) -> View>>,
}

impl TryerProps {
    /// Build props from a fallible children factory.
    pub fn new(children: impl FnMut() -> Result<View, RenderError> + 'static) -> Self {
        Self {
            children: Box::new(children),
            fallback: None,
        }
    }

    /// Provide a fallback renderer. It receives the error and a reset
    /// callback; calling the callback re-runs the children factory, which
    /// typically keeps failing until external state has changed.
    pub fn fallback(
        mut self,
        fallback: impl FnMut(&RenderError, ResetFn) -> View + 'static,
    ) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

/// An error boundary.
///
/// Renders its children into an invisible container; if the children
/// factory fails, the container shows the fallback instead. The boundary
/// re-renders whenever a signal read by the children factory changes or
/// when the fallback's reset callback is invoked.
///
/// Only synchronous failures during render are caught here; asynchronous
/// errors are routed through the application root's `on_error` by whoever
/// awaits them.
pub fn Tryer(props: TryerProps) -> web_sys::Element {
    let wrapper = contents_wrapper("pulsar-tryer");

    let TryerProps {
        mut children,
        mut fallback,
    } = props;

    let retry_token = create_signal(0u32);
    let reset: ResetFn = Rc::new(move || {
        retry_token.set(retry_token.get_untracked() + 1);
    });

    let container: web_sys::Node = wrapper.clone().into();
    create_effect(move || {
        retry_token.track();
        clear_children(&container);
        match children() {
            Ok(view) => view.append_to(&container),
            Err(error) => {
                // The error is caught here: rendering the fallback consumes
                // it, and the app root's `on_error` never hears about it.
                let view = match &mut fallback {
                    Some(fallback) => fallback(&error, Rc::clone(&reset)),
                    None => default_fallback(&error),
                };
                view.append_to(&container);
            }
        }
    });

    wrapper
}

/// The fallback used when none is supplied: the error message as text.
fn default_fallback(error: &RenderError) -> View {
    let el = document().create_element("div").unwrap_throw();
    el.set_text_content(Some(&format!("error: {error}")));
    el.into()
}
