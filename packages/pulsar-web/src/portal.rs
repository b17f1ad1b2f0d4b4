//! Portals.
//!
//! A portal renders its children into a DOM container outside its logical
//! parent while remaining a logical child of its creator: when the creating
//! scope is disposed (or the placeholder leaves the document), the portal
//! content is torn down with it.

#![allow(non_snake_case)]

use std::cell::Cell;
use std::rc::Rc;

use pulsar_reactive::on_cleanup;
use wasm_bindgen::{JsCast, UnwrapThrowExt};

use crate::app::current_app;
use crate::utils::{contents_wrapper, element_id_of, set_element_id_of};
use crate::*;

/// Where a portal mounts its content.
pub enum PortalMount {
    /// The first element matching a CSS selector.
    Selector(String),
    /// A container element held directly.
    Node(web_sys::Element),
    /// The document body.
    Body,
    /// A registered slot: the element whose hierarchical id is `target`
    /// receives the content; `id` names this portal for the registry.
    Slot {
        /// The portal's own registry name.
        id: String,
        /// The element id of the slot container.
        target: String,
    },
}

impl From<&str> for PortalMount {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}
impl From<String> for PortalMount {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}
impl From<web_sys::Element> for PortalMount {
    fn from(node: web_sys::Element) -> Self {
        Self::Node(node)
    }
}

/// Props for [`Portal`].
pub struct PortalProps {
    mount: PortalMount,
    children: View,
}

impl PortalProps {
    /// Build props from a mount target and the content to teleport.
    pub fn new(mount: impl Into<PortalMount>, children: impl Into<View>) -> Self {
        Self {
            mount: mount.into(),
            children: children.into(),
        }
    }
}

/// Render children into a container elsewhere in the document.
///
/// Returns a placeholder comment node that stands in for the portal at its
/// logical position; tearing down the creating scope removes the teleported
/// content from its container.
///
/// If the mount target cannot be resolved yet (e.g. a slot that has not
/// been registered), resolution is retried once on the next microtask and a
/// warning is logged if it still fails; the portal then renders nothing.
pub fn Portal(props: PortalProps) -> web_sys::Node {
    let PortalProps { mount, children } = props;

    let placeholder: web_sys::Node = document().create_comment("portal").into();

    // Normalise the children into a single node: a lone node passes
    // through, anything else is grouped under an invisible wrapper.
    let content: web_sys::Node = match children.as_single_node() {
        Some(node) => node.clone(),
        None => {
            let wrapper = contents_wrapper("pulsar-portal");
            children.append_to(&wrapper);
            wrapper.into()
        }
    };

    let cancelled = Rc::new(Cell::new(false));

    {
        let content = content.clone();
        let cancelled = Rc::clone(&cancelled);
        on_cleanup(move || {
            cancelled.set(true);
            if let Some(parent) = content.parent_node() {
                parent.remove_child(&content).unwrap_throw();
            }
            if let Some(app) = current_app() {
                if let Some(id) = element_id_of(&content) {
                    app.portal_stack.borrow_mut().retain(|open| *open != id);
                    app.registry.unregister(&id);
                }
            }
        });
    }

    match resolve_container(&mount) {
        Some(container) => mount_content(&mount, &container, &content, &placeholder),
        None => {
            // The target may simply not be in the DOM yet. Retry once on
            // the next microtask.
            let placeholder = placeholder.clone();
            let content = content.clone();
            queue_microtask(move || {
                if cancelled.get() {
                    return;
                }
                match resolve_container(&mount) {
                    Some(container) => {
                        mount_content(&mount, &container, &content, &placeholder)
                    }
                    None => console_warn!("portal: mount target not found; content dropped"),
                }
            });
        }
    }

    placeholder
}

/// Resolve the physical container for a mount target.
fn resolve_container(mount: &PortalMount) -> Option<web_sys::Element> {
    match mount {
        PortalMount::Selector(selector) => document().query_selector(selector).ok().flatten(),
        PortalMount::Node(node) => Some(node.clone()),
        PortalMount::Body => document().body().map(Into::into),
        PortalMount::Slot { target, .. } => current_app()?
            .registry
            .get(target)
            .and_then(|entry| entry.element.dyn_into().ok()),
    }
}

fn mount_content(
    mount: &PortalMount,
    container: &web_sys::Element,
    content: &web_sys::Node,
    placeholder: &web_sys::Node,
) {
    container.append_child(content).unwrap_throw();

    // Register the content with both parents: the logical one (nearest
    // registered ancestor of the placeholder) and the physical one (the
    // container, when it is registered).
    if let Some(app) = current_app() {
        let id = match mount {
            PortalMount::Slot { id, .. } => app.id_context.keyed_child_id(id),
            _ => app.id_context.next_child_id(),
        };
        set_element_id_of(content, &id);
        app.registry.register(
            id.clone(),
            ElementEntry {
                element: content.clone(),
                kind: ElementKind::PortalContent,
                parent_id: logical_parent_id(placeholder).or_else(|| Some(app.id_context.current())),
                physical_parent_id: element_id_of(container),
                is_portal_content: true,
            },
        );
        app.portal_stack.borrow_mut().push(id);
    }
}

/// The element id of the nearest registered DOM ancestor.
fn logical_parent_id(node: &web_sys::Node) -> Option<String> {
    let mut current = node.parent_node();
    while let Some(ancestor) = current {
        if let Some(id) = element_id_of(&ancestor) {
            return Some(id);
        }
        current = ancestor.parent_node();
    }
    None
}
