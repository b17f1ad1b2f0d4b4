use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

use super::test_container;

#[wasm_bindgen_test]
fn wire_writes_properties_and_attributes() {
    let container = test_container();
    let _ = create_root(|| {
        let el = t_element("input", attrs![]);
        container.append_child(&el).unwrap();

        wire(&el, "value", || "typed");
        wire(&el, "data-state", || "ready");
        wire(&el, "aria-label", || "field");

        let input = el.unchecked_ref::<web_sys::HtmlInputElement>();
        assert_eq!(input.value(), "typed");
        assert_eq!(el.get_attribute("data-state").as_deref(), Some("ready"));
        assert_eq!(el.get_attribute("aria-label").as_deref(), Some("field"));
        // data-*/aria-* go through setAttribute, not property assignment.
        assert!(el.has_attribute("data-state"));
    });
}

#[wasm_bindgen_test]
fn wire_property_chain_writes_styles() {
    let container = test_container();
    let _ = create_root(|| {
        let left = create_signal(10);
        let el = t_element("div", attrs![]);
        container.append_child(&el).unwrap();

        wire(&el, "style.left", move || format!("{}px", left.get()));
        let html = el.unchecked_ref::<web_sys::HtmlElement>();
        assert_eq!(html.style().get_property_value("left").unwrap(), "10px");

        left.set(25);
        assert_eq!(html.style().get_property_value("left").unwrap(), "25px");
    });
}

#[wasm_bindgen_test]
fn wire_svg_attribute_updates() {
    let container = test_container();
    let _ = create_root(|| {
        let r = create_signal(10);
        let svg = t_element("svg", attrs![]);
        let circle = t_element("circle", attrs![]);
        svg.append_child(&circle).unwrap();
        container.append_child(&svg).unwrap();

        wire(&circle, "r", move || r.get());
        assert_eq!(circle.get_attribute("r").as_deref(), Some("10"));

        r.set(50);
        assert_eq!(circle.get_attribute("r").as_deref(), Some("50"));
    });
}

#[wasm_bindgen_test]
fn wire_refuses_null_on_svg_attribute() {
    let container = test_container();
    let _ = create_root(|| {
        let broken = create_signal(false);
        let circle = t_element("circle", attrs![]);
        container.append_child(&circle).unwrap();

        wire(&circle, "cx", move || {
            if broken.get() {
                wasm_bindgen::JsValue::NULL
            } else {
                wasm_bindgen::JsValue::from_f64(30.0)
            }
        });
        assert_eq!(circle.get_attribute("cx").as_deref(), Some("30"));

        // The null write is refused: the attribute keeps its prior value.
        broken.set(true);
        assert_eq!(circle.get_attribute("cx").as_deref(), Some("30"));

        // A later real value goes through.
        broken.set(false);
        assert_eq!(circle.get_attribute("cx").as_deref(), Some("30"));
    });
}

#[wasm_bindgen_test]
fn wire_skips_write_when_value_is_unchanged() {
    let container = test_container();
    let _ = create_root(|| {
        let trigger = create_signal(0);
        let el = t_element("div", attrs![]);
        container.append_child(&el).unwrap();

        // The expression re-runs on every trigger write but always produces
        // the same string.
        wire(&el, "style.left", move || {
            trigger.track();
            "42px"
        });
        let html = el.unchecked_ref::<web_sys::HtmlElement>();
        assert_eq!(html.style().get_property_value("left").unwrap(), "42px");

        // Clobber the property behind the wire's back. If the wire wrote on
        // the next evaluation, the clobbered value would be overwritten;
        // change detection must skip the write instead.
        html.style().set_property("left", "999px").unwrap();
        trigger.set(1);
        assert_eq!(html.style().get_property_value("left").unwrap(), "999px");
    });
}

#[wasm_bindgen_test]
fn wire_dispose_detaches_the_binding() {
    let container = test_container();
    let _ = create_root(|| {
        let count = create_signal(0);
        let el = t_element("p", attrs![]);
        container.append_child(&el).unwrap();

        let handle = wire_text(&el, "textContent", move || count.get().to_string());
        assert_eq!(el.text_content().as_deref(), Some("0"));
        assert_eq!(wire_count(&el), 1);

        handle.dispose();
        handle.dispose(); // idempotent
        assert_eq!(wire_count(&el), 0);

        count.set(5);
        assert_eq!(el.text_content().as_deref(), Some("0"));
    });
}

#[wasm_bindgen_test]
fn wires_die_with_their_owner() {
    let container = test_container();
    let _ = create_root(|| {
        let count = create_signal(0);
        let el = t_element("p", attrs![]);
        container.append_child(&el).unwrap();

        let scope = create_child_scope(|| {
            wire_text(&el, "textContent", move || count.get().to_string());
        });
        assert_eq!(el.text_content().as_deref(), Some("0"));

        scope.dispose();
        count.set(7);
        // The wire's effect was owned by the disposed scope.
        assert_eq!(el.text_content().as_deref(), Some("0"));
    });
}

#[wasm_bindgen_test]
fn dynamic_attribute_in_t_element_is_wired() {
    let container = test_container();
    let _ = create_root(|| {
        let cls = create_signal("a");
        let el = t_element("div", attrs! {
            "className" => move || cls.get(),
        });
        container.append_child(&el).unwrap();

        assert_eq!(el.class_name(), "a");
        cls.set("b");
        assert_eq!(el.class_name(), "b");
    });
}

#[wasm_bindgen_test]
fn style_props_mix_static_and_dynamic() {
    let container = test_container();
    let _ = create_root(|| {
        let top = create_signal(1);
        let el = t_element("div", attrs! {
            "style" => style_props([
                ("position".into(), style_prop("absolute")),
                ("top".into(), style_dyn(move || format!("{}px", top.get()))),
            ]),
        });
        container.append_child(&el).unwrap();

        let html = el.unchecked_ref::<web_sys::HtmlElement>();
        assert_eq!(
            html.style().get_property_value("position").unwrap(),
            "absolute"
        );
        assert_eq!(html.style().get_property_value("top").unwrap(), "1px");

        top.set(9);
        assert_eq!(html.style().get_property_value("top").unwrap(), "9px");
    });
}
