//! Element construction.
//!
//! [`t_element`] is the single entry point component code (or a JSX-style
//! transform) uses to create DOM nodes: it picks the right namespace,
//! applies static attributes, wires dynamic ones, registers event handlers
//! through the application's delegator and registers the element in the
//! per-root registry.

use std::borrow::Cow;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use pulsar_reactive::{on_cleanup, try_use_current_scope};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::app::current_app;
use crate::utils::{js_value_to_string, set_element_id_of};
use crate::wire::{write_routed, SVG_NAMESPACE};
use crate::*;

/// Tags that must be created in the SVG namespace.
static SVG_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "svg",
        "animate",
        "animateMotion",
        "animateTransform",
        "circle",
        "clipPath",
        "defs",
        "desc",
        "ellipse",
        "feBlend",
        "feColorMatrix",
        "feGaussianBlur",
        "feOffset",
        "filter",
        "foreignObject",
        "g",
        "image",
        "line",
        "linearGradient",
        "marker",
        "mask",
        "path",
        "pattern",
        "polygon",
        "polyline",
        "radialGradient",
        "rect",
        "stop",
        "symbol",
        "text",
        "textPath",
        "tspan",
        "use",
    ]
    .into_iter()
    .collect()
});

/// SVG presentation attributes that must be written with `setAttribute`
/// rather than property assignment.
static SVG_ATTRIBUTES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "cx",
        "cy",
        "r",
        "rx",
        "ry",
        "x",
        "y",
        "x1",
        "y1",
        "x2",
        "y2",
        "dx",
        "dy",
        "width",
        "height",
        "d",
        "points",
        "fill",
        "fill-opacity",
        "fill-rule",
        "stroke",
        "stroke-width",
        "stroke-opacity",
        "stroke-linecap",
        "stroke-linejoin",
        "stroke-dasharray",
        "stroke-dashoffset",
        "opacity",
        "transform",
        "viewBox",
        "preserveAspectRatio",
        "pathLength",
        "offset",
        "stop-color",
        "stop-opacity",
        "gradientUnits",
        "gradientTransform",
        "markerWidth",
        "markerHeight",
        "refX",
        "refY",
        "orient",
        "text-anchor",
        "dominant-baseline",
        "font-size",
        "font-family",
        "font-weight",
        "href",
        "clip-path",
        "mask",
        "filter",
    ]
    .into_iter()
    .collect()
});

/// DOM properties that are set by property assignment when given a static
/// value; everything not in this set falls through to `setAttribute`.
static DOM_PROPERTIES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "textContent",
        "innerHTML",
        "value",
        "checked",
        "className",
        "id",
        "title",
        "hidden",
        "disabled",
        "selected",
        "readOnly",
        "multiple",
        "required",
        "autofocus",
        "open",
        "placeholder",
        "src",
        "href",
        "alt",
        "tabIndex",
        "htmlFor",
    ]
    .into_iter()
    .collect()
});

/// Whether `tag` is an SVG tag.
pub fn is_svg_tag(tag: &str) -> bool {
    SVG_TAGS.contains(tag)
}

/// Whether `name` is a known SVG presentation attribute.
pub fn is_svg_attribute(name: &str) -> bool {
    SVG_ATTRIBUTES.contains(name)
}

/// Whether `name` is a known DOM property.
pub fn is_dom_property(name: &str) -> bool {
    DOM_PROPERTIES.contains(name)
}

/// A value assigned to an attribute in [`t_element`].
pub enum AttrValue {
    /// A static string.
    Str(Cow<'static, str>),
    /// A static boolean. Known DOM properties are assigned directly; for
    /// plain attributes `true` sets an empty attribute and `false` removes
    /// it.
    Bool(bool),
    /// A static number.
    Number(f64),
    /// A reactive value: wired on the attribute's path.
    Dyn(Box<dyn FnMut() -> JsValue>),
    /// A `style` value: a string or a map of sub-properties.
    Style(StyleValue),
    /// An event handler. The key decides the event type: `onClick` listens
    /// for `click`.
    Handler(HandlerAttr),
}

/// The value of a `style` attribute.
pub enum StyleValue {
    /// The full inline style text.
    Text(Cow<'static, str>),
    /// Individual style properties; each may be static or wired.
    Props(Vec<(Cow<'static, str>, StyleProp)>),
}

/// A single style sub-property.
pub enum StyleProp {
    /// A static value.
    Static(Cow<'static, str>),
    /// A reactive value, wired on `style.<name>`.
    Dynamic(Box<dyn FnMut() -> JsValue>),
}

/// An event handler attribute value.
pub struct HandlerAttr {
    pub(crate) handler: Box<dyn FnMut(web_sys::Event)>,
    pub(crate) options: EventOptions,
}

impl From<&'static str> for AttrValue {
    fn from(value: &'static str) -> Self {
        Self::Str(value.into())
    }
}
impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}
impl From<Cow<'static, str>> for AttrValue {
    fn from(value: Cow<'static, str>) -> Self {
        Self::Str(value)
    }
}
impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
macro_rules! impl_attr_value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttrValue {
                fn from(value: $ty) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}
impl_attr_value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<F: FnMut() -> V + 'static, V: Into<JsValue>> From<F> for AttrValue {
    fn from(mut f: F) -> Self {
        Self::Dyn(Box::new(move || f().into()))
    }
}

/// Create an event handler attribute value.
pub fn handler(f: impl FnMut(web_sys::Event) + 'static) -> AttrValue {
    AttrValue::Handler(HandlerAttr {
        handler: Box::new(f),
        options: EventOptions::default(),
    })
}

/// Create an event handler attribute value with explicit listener options.
pub fn handler_with_options(
    f: impl FnMut(web_sys::Event) + 'static,
    options: EventOptions,
) -> AttrValue {
    AttrValue::Handler(HandlerAttr {
        handler: Box::new(f),
        options,
    })
}

/// Create a `style` attribute value from inline style text.
pub fn style_text(text: impl Into<Cow<'static, str>>) -> AttrValue {
    AttrValue::Style(StyleValue::Text(text.into()))
}

/// Create a `style` attribute value from a list of sub-properties.
pub fn style_props(
    props: impl IntoIterator<Item = (Cow<'static, str>, StyleProp)>,
) -> AttrValue {
    AttrValue::Style(StyleValue::Props(props.into_iter().collect()))
}

/// A static style sub-property.
pub fn style_prop(value: impl Into<Cow<'static, str>>) -> StyleProp {
    StyleProp::Static(value.into())
}

/// A reactive style sub-property.
pub fn style_dyn<V: Into<JsValue>>(mut f: impl FnMut() -> V + 'static) -> StyleProp {
    StyleProp::Dynamic(Box::new(move || f().into()))
}

/// An ordered list of attributes for [`t_element`].
pub type Attributes = Vec<(Cow<'static, str>, AttrValue)>;

/// Build an [`Attributes`] list.
///
/// ```no_run
/// # use pulsar_web::*;
/// # use pulsar_reactive::*;
/// # let _ = create_root(|| {
/// let count = create_signal(0);
/// let el = t_element("button", attrs! {
///     "className" => "counter",
///     "onClick" => handler(move |_| count.set(count.get() + 1)),
/// });
/// # });
/// ```
#[macro_export]
macro_rules! attrs {
    ($($name:literal => $value:expr),* $(,)?) => {
        ::std::vec![$(($name.into(), $crate::AttrValue::from($value))),*]
    };
}

/// Create a DOM or SVG element and apply its attributes.
///
/// See the module documentation for the attribute policy. If a static
/// `data-hid` attribute is present and a matching server-rendered element
/// already exists in the document, that element is adopted instead of
/// creating a fresh one; static attributes are re-applied unconditionally
/// and reactive ones wire on top.
pub fn t_element(tag: &str, attrs: Attributes) -> web_sys::Element {
    let svg = is_svg_tag(tag);
    let el = create_or_adopt(tag, svg, &attrs);

    let kind = if attrs.iter().any(|(_, v)| {
        matches!(v, AttrValue::Dyn(_))
            || matches!(v, AttrValue::Style(StyleValue::Props(props))
                if props.iter().any(|(_, p)| matches!(p, StyleProp::Dynamic(_))))
    }) {
        ElementKind::Dynamic
    } else {
        ElementKind::Static
    };
    register_in_current_app(&el, kind);

    for (name, value) in attrs {
        apply_attribute(&el, svg, name.as_ref(), value);
    }
    el
}

/// Register `el` in the current application's registry under a fresh id
/// generated below the current parent, and stamp the id onto the node.
/// Returns the id, or `None` when no application is mounted.
pub(crate) fn register_in_current_app(
    el: &web_sys::Element,
    kind: ElementKind,
) -> Option<String> {
    let app = current_app()?;
    let parent_id = app.id_context.current();
    let id = app.id_context.next_child_id();
    set_element_id_of(el, &id);
    app.registry.register(
        id.clone(),
        ElementEntry {
            element: el.clone().into(),
            kind,
            parent_id: Some(parent_id),
            physical_parent_id: None,
            is_portal_content: false,
        },
    );
    Some(id)
}

/// Either adopt a server-rendered element carrying a matching `data-hid` or
/// create a fresh one.
fn create_or_adopt(tag: &str, svg: bool, attrs: &Attributes) -> web_sys::Element {
    let hid = attrs.iter().find_map(|(name, value)| match (name.as_ref(), value) {
        ("data-hid", AttrValue::Str(s)) => Some(s.clone()),
        _ => None,
    });

    if let Some(hid) = hid {
        let selector = format!("[data-hid=\"{hid}\"]");
        if let Ok(Some(existing)) = document().query_selector(&selector) {
            if existing.tag_name().eq_ignore_ascii_case(tag) {
                return existing;
            }
            console_warn!(
                "hydration: element with data-hid `{hid}` is a <{}>, expected <{tag}>; creating fresh",
                existing.tag_name().to_lowercase()
            );
        } else {
            console_warn!("hydration: no element with data-hid `{hid}` found; creating fresh");
        }
    }

    if svg {
        document()
            .create_element_ns(Some(SVG_NAMESPACE), tag)
            .unwrap_throw()
    } else {
        document().create_element(tag).unwrap_throw()
    }
}

fn apply_attribute(el: &web_sys::Element, svg: bool, name: &str, value: AttrValue) {
    match value {
        AttrValue::Handler(attr) => {
            if let Some(event_type) = event_name_from_attr(name) {
                bind_event(el, &event_type, attr);
            } else {
                console_warn!("`{name}` does not name an event; handler ignored");
            }
        }
        AttrValue::Style(style) => apply_style(el, style),
        AttrValue::Dyn(f) => {
            // Reactive values become wires on the attribute's path.
            wire(el, name, MaybeDyn::Dynamic(f));
        }
        AttrValue::Str(s) => apply_static(el, svg, name, &JsValue::from_str(&s)),
        AttrValue::Number(n) => apply_static(el, svg, name, &JsValue::from_f64(n)),
        AttrValue::Bool(b) => {
            if is_dom_property(name) {
                let _ = js_sys::Reflect::set(el, &JsValue::from_str(name), &JsValue::from_bool(b));
            } else if b {
                el.set_attribute(name, "").unwrap_throw();
            } else {
                let _ = el.remove_attribute(name);
            }
        }
    }
}

fn apply_static(el: &web_sys::Element, svg: bool, name: &str, value: &JsValue) {
    if name == "className" {
        if svg {
            el.set_attribute("class", &js_value_to_string(value))
                .unwrap_throw();
        } else {
            let _ = js_sys::Reflect::set(el, &JsValue::from_str("className"), value);
        }
    } else if name.starts_with("data-") || name.starts_with("aria-") || name == "role" {
        el.set_attribute(name, &js_value_to_string(value))
            .unwrap_throw();
    } else if svg && is_svg_attribute(name) {
        el.set_attribute(name, &js_value_to_string(value))
            .unwrap_throw();
    } else if is_dom_property(name) {
        let _ = js_sys::Reflect::set(el, &JsValue::from_str(name), value);
    } else {
        el.set_attribute(name, &js_value_to_string(value))
            .unwrap_throw();
    }
}

fn apply_style(el: &web_sys::Element, style: StyleValue) {
    match style {
        StyleValue::Text(text) => {
            el.set_attribute("style", &text).unwrap_throw();
        }
        StyleValue::Props(props) => {
            for (prop, value) in props {
                match value {
                    StyleProp::Static(v) => {
                        let route = crate::wire::Route::PropertyPath(vec![
                            "style".to_string(),
                            prop.to_string(),
                        ]);
                        write_routed(el, &route, &JsValue::from_str(&v));
                    }
                    StyleProp::Dynamic(f) => {
                        wire(el, &format!("style.{prop}"), MaybeDyn::Dynamic(f));
                    }
                }
            }
        }
    }
}

/// Attach an event handler to an element, through the current application's
/// delegator when possible.
///
/// Drag events always bind directly on the element: drop eligibility must be
/// established with a synchronous `preventDefault` before the browser's next
/// hit test, which delegated dispatch cannot guarantee.
fn bind_event(el: &web_sys::Element, event_type: &str, attr: HandlerAttr) {
    let delegated = !is_drag_event(event_type)
        && !attr.options.capture
        && current_app().is_some()
        && crate::utils::element_id_of(el).is_some();

    if delegated {
        let app = current_app().unwrap();
        let id = crate::utils::element_id_of(el).unwrap();
        app.delegator
            .register_handler(&id, event_type, attr.handler, attr.options);
    } else {
        let cb = Closure::wrap(attr.handler);
        if attr.options.capture || attr.options.once || attr.options.passive {
            let mut options = web_sys::AddEventListenerOptions::new();
            options.capture(attr.options.capture);
            options.once(attr.options.once);
            options.passive(attr.options.passive);
            el.add_event_listener_with_callback_and_add_event_listener_options(
                event_type,
                cb.as_ref().unchecked_ref(),
                &options,
            )
            .unwrap_throw();
        } else {
            el.add_event_listener_with_callback(event_type, cb.as_ref().unchecked_ref())
                .unwrap_throw();
        }
        if try_use_current_scope().is_some() {
            on_cleanup(move || drop(cb));
        } else {
            cb.forget();
        }
    }
}
