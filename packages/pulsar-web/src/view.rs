//! This module contains the [`View`] struct which represents a rendered
//! DOM fragment.

use std::borrow::Cow;
use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::*;

/// A list of real DOM nodes produced by a component.
///
/// Most components produce exactly one node; `View` is a thin wrapper that
/// also lets a component return nothing or a fragment of siblings without
/// inventing a container element.
pub struct View {
    pub(crate) nodes: SmallVec<[web_sys::Node; 1]>,
}

impl View {
    /// Create a new blank view.
    pub fn new() -> Self {
        Self {
            nodes: SmallVec::new(),
        }
    }

    /// Create a new view with a single node.
    pub fn from_node(node: impl Into<web_sys::Node>) -> Self {
        Self {
            nodes: smallvec![node.into()],
        }
    }

    /// Create a new view from a list of nodes.
    pub fn from_nodes(nodes: Vec<web_sys::Node>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Create a view that re-renders itself whenever a signal read inside
    /// `f` changes. The nodes are anchored between two marker comments so
    /// that the dynamic part can be swapped in place.
    pub fn from_dynamic(mut f: impl FnMut() -> View + 'static) -> Self {
        let start: web_sys::Node = document().create_comment("").into();
        let end: web_sys::Node = document().create_comment("").into();

        let start_node = start.clone();
        let end_node = end.clone();
        let inner = pulsar_reactive::create_effect_initial(move || {
            let view = f();
            (
                Box::new(move || {
                    let new = f();
                    if let Some(parent) = start_node.parent_node() {
                        // Clear the old nodes away.
                        let old = utils::get_nodes_between(&start_node, &end_node);
                        for node in old {
                            parent.remove_child(&node).unwrap();
                        }
                        // Insert the new nodes in their place.
                        for node in &new.nodes {
                            parent.insert_before(node, Some(&end_node)).unwrap();
                        }
                    }
                }) as Box<dyn FnMut()>,
                view,
            )
        });

        let mut nodes = SmallVec::with_capacity(inner.nodes.len() + 2);
        nodes.push(start);
        nodes.extend(inner.nodes);
        nodes.push(end);
        Self { nodes }
    }

    /// The nodes in this view.
    pub fn nodes(&self) -> &[web_sys::Node] {
        &self.nodes
    }

    /// Whether the view contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// If the view consists of exactly one node, return it.
    pub fn as_single_node(&self) -> Option<&web_sys::Node> {
        if self.nodes.len() == 1 {
            Some(&self.nodes[0])
        } else {
            None
        }
    }

    /// Append every node in the view to `parent`.
    pub fn append_to(&self, parent: &web_sys::Node) {
        for node in &self.nodes {
            parent.append_child(node).unwrap();
        }
    }

    /// Remove every node in the view from `parent`. Nodes that are not
    /// children of `parent` are left alone.
    pub fn remove_from(&self, parent: &web_sys::Node) {
        for node in &self.nodes {
            if node.parent_node().as_ref() == Some(parent) {
                parent.remove_child(node).unwrap();
            }
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("len", &self.nodes.len())
            .finish()
    }
}

impl From<web_sys::Node> for View {
    fn from(node: web_sys::Node) -> Self {
        Self::from_node(node)
    }
}

impl From<web_sys::Element> for View {
    fn from(node: web_sys::Element) -> Self {
        Self::from_node(node)
    }
}

impl From<web_sys::Text> for View {
    fn from(node: web_sys::Text) -> Self {
        Self::from_node(node)
    }
}

impl From<web_sys::Comment> for View {
    fn from(node: web_sys::Comment) -> Self {
        Self::from_node(node)
    }
}

impl<T: Into<View>> From<Option<T>> for View {
    fn from(node: Option<T>) -> Self {
        node.map(Into::into).unwrap_or_default()
    }
}

impl<T: Into<View>> From<Vec<T>> for View {
    fn from(nodes: Vec<T>) -> Self {
        View {
            nodes: nodes.into_iter().flat_map(|v| v.into().nodes).collect(),
        }
    }
}

macro_rules! impl_view_from_text {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for View {
                fn from(t: $ty) -> Self {
                    View::from_node(document().create_text_node(&t.to_string()))
                }
            }
        )*
    }
}

impl_view_from_text!(
    &str, String, Cow<'_, str>, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64
);

// Implement `From` for all tuples of types that implement `Into<View>`.
macro_rules! impl_from_tuple {
    ($($name:ident),*) => {
        paste::paste! {
            impl<$($name),*> From<($($name,)*)> for View
            where
                $($name: Into<View>),*
            {
                fn from(t: ($($name,)*)) -> Self {
                    let ($([<$name:lower>]),*) = t;
                    #[allow(unused_mut)]
                    let mut nodes = SmallVec::new();
                    $(
                        nodes.extend([<$name:lower>].into().nodes);
                    )*
                    View { nodes }
                }
            }
        }
    };
}

impl_from_tuple!(A, B);
impl_from_tuple!(A, B, C);
impl_from_tuple!(A, B, C, D);
impl_from_tuple!(A, B, C, D, E);
impl_from_tuple!(A, B, C, D, E, F);
