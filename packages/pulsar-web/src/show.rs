//! Conditional rendering.

#![allow(non_snake_case)]

use pulsar_reactive::{create_effect, untrack, use_current_scope};

use crate::utils::{contents_wrapper, set_parked};
use crate::*;

/// Props for [`Show`].
pub struct ShowProps {
    when: MaybeDyn<bool>,
    children: Box<dyn FnMut() -> View>,
    fallback: Option<Box<dyn FnMut() -> View>>,
}

impl ShowProps {
    /// Build props from a condition and a lazy children factory.
    ///
    /// The factory is not called until the branch first becomes active.
    pub fn new(when: impl Into<MaybeDyn<bool>>, children: impl FnMut() -> View + 'static) -> Self {
        Self {
            when: when.into(),
            children: Box::new(children),
            fallback: None,
        }
    }

    /// Add a lazy fallback branch, shown while the condition is false.
    pub fn fallback(mut self, fallback: impl FnMut() -> View + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Branch {
    None,
    Children,
    Fallback,
}

/// A component that renders its children only while a condition holds.
///
/// Both branches are materialised lazily, at most once, and are detached
/// rather than destroyed when inactive: toggling the condition back and
/// forth re-attaches the *same* nodes, preserving their identity and any
/// state wired onto them.
pub fn Show(props: ShowProps) -> web_sys::Element {
    let wrapper = contents_wrapper("pulsar-show");
    // Branch content is scoped under the wrapper's id so its elements get
    // hierarchical ids of their own.
    let wrapper_id = crate::element::register_in_current_app(&wrapper, ElementKind::Dynamic);

    let ShowProps {
        mut when,
        mut children,
        mut fallback,
    } = props;

    let container: web_sys::Node = wrapper.clone().into();
    let mut children_view: Option<View> = None;
    let mut fallback_view: Option<View> = None;
    let mut current = Branch::None;

    // Branches are materialised under the outer scope, not the effect
    // scope: anything reactive they create must survive later toggles.
    let scope = use_current_scope();

    create_effect(move || {
        let target = if when.get() {
            Branch::Children
        } else if fallback.is_some() {
            Branch::Fallback
        } else {
            Branch::None
        };
        if target == current {
            return;
        }

        // Detach whatever is showing. Detached branches are parked so that
        // the node watcher does not tear their wires down.
        match current {
            Branch::Children => {
                if let Some(view) = &children_view {
                    park(view, true);
                    view.remove_from(&container);
                }
            }
            Branch::Fallback => {
                if let Some(view) = &fallback_view {
                    park(view, true);
                    view.remove_from(&container);
                }
            }
            Branch::None => {}
        }

        // Attach the new branch, materialising it on first use.
        match target {
            Branch::Children => {
                let view = children_view.get_or_insert_with(|| {
                    crate::app::with_id_scope(wrapper_id.as_deref(), || {
                        scope.run_in(|| untrack(&mut children))
                    })
                });
                park(view, false);
                view.append_to(&container);
            }
            Branch::Fallback => {
                let fallback = fallback.as_mut().expect("checked above");
                let view = fallback_view.get_or_insert_with(|| {
                    crate::app::with_id_scope(wrapper_id.as_deref(), || {
                        scope.run_in(|| untrack(fallback))
                    })
                });
                park(view, false);
                view.append_to(&container);
            }
            Branch::None => {}
        }
        current = target;
    });

    wrapper
}

fn park(view: &View, parked: bool) {
    for node in view.nodes() {
        set_parked(node, parked);
    }
}
