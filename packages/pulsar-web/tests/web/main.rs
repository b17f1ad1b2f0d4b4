#![cfg(target_arch = "wasm32")]

pub mod frame_batch;
pub mod keyed;
pub mod portal;
pub mod show;
pub mod tryer;
pub mod watcher;
pub mod wires;

use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

/// Returns an [`web_sys::Element`] referencing the test container with the
/// contents cleared.
fn test_container() -> web_sys::Element {
    if document()
        .query_selector("test-container#test-container")
        .unwrap()
        .is_none()
    {
        document()
            .body()
            .unwrap()
            .insert_adjacent_html(
                "beforeend",
                r#"<test-container id="test-container"></test-container>"#,
            )
            .unwrap();
    }

    let container = document()
        .query_selector("test-container#test-container")
        .unwrap()
        .unwrap();

    container.set_inner_html(""); // erase contents from previous test runs

    container
}

/// Wait for `n` microtask checkpoints.
async fn next_microtasks(n: usize) {
    for _ in 0..n {
        let promise = js_sys::Promise::resolve(&wasm_bindgen::JsValue::NULL);
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}

#[wasm_bindgen_test]
fn static_element_with_attributes() {
    let _ = create_root(|| {
        let el = t_element("div", attrs! {
            "className" => "box",
            "id" => "static-el",
            "data-test" => "yes",
            "role" => "note",
        });
        assert_eq!(el.class_name(), "box");
        assert_eq!(el.id(), "static-el");
        assert_eq!(el.get_attribute("data-test").as_deref(), Some("yes"));
        assert_eq!(el.get_attribute("role").as_deref(), Some("note"));
    });
}

#[wasm_bindgen_test]
fn svg_element_uses_namespace() {
    let _ = create_root(|| {
        let el = t_element("circle", attrs! {
            "cx" => 100,
            "className" => "dot",
        });
        assert_eq!(
            el.namespace_uri().as_deref(),
            Some("http://www.w3.org/2000/svg")
        );
        // SVG routes className to the class attribute.
        assert_eq!(el.get_attribute("class").as_deref(), Some("dot"));
        assert_eq!(el.get_attribute("cx").as_deref(), Some("100"));
    });
}

#[wasm_bindgen_test]
fn counter_updates_text_content() {
    let container = test_container();
    let _ = create_root(|| {
        let count = create_signal(0);
        let el = t_element("p", attrs![]);
        container.append_child(&el).unwrap();
        wire(&el, "textContent", move || {
            format!("Count: {}", count.get())
        });
        assert_eq!(el.text_content().as_deref(), Some("Count: 0"));

        count.set(1);
        count.set(2);
        assert_eq!(el.text_content().as_deref(), Some("Count: 2"));
    });
}

#[wasm_bindgen_test]
fn mount_and_unmount_lifecycle() {
    let container = test_container();

    let app = bootstrap_app()
        .root(container.clone())
        .build()
        .unwrap();
    app.mount(|| {
        let el = t_element("p", attrs! { "textContent" => "hello" });
        View::from(el)
    })
    .unwrap();

    assert!(app.is_mounted());
    assert_eq!(container.inner_html(), r#"<p>hello</p>"#);

    app.unmount();
    assert!(!app.is_mounted());
    assert_eq!(container.inner_html(), "");
}

#[wasm_bindgen_test]
fn duplicate_mount_is_an_error() {
    let container = test_container();
    let app = bootstrap_app().root(container).build().unwrap();
    app.mount(View::new).unwrap();
    assert!(matches!(
        app.mount(View::new),
        Err(ConfigError::AlreadyMounted)
    ));
    app.unmount();
}

#[wasm_bindgen_test]
fn missing_root_selector_is_an_error() {
    assert!(matches!(
        bootstrap_app().root("#does-not-exist").build(),
        Err(ConfigError::RootNotFound(_))
    ));
    assert!(matches!(
        bootstrap_app().build(),
        Err(ConfigError::MissingRoot)
    ));
}

#[wasm_bindgen_test]
fn use_service_downcasts_the_container() {
    use std::rc::Rc;

    struct Api {
        base: &'static str,
    }

    let container = test_container();
    let app = bootstrap_app()
        .root(container)
        .services(Rc::new(Api { base: "/api" }))
        .build()
        .unwrap();
    app.mount(View::new).unwrap();

    let api = use_service::<Api>().expect("service available");
    assert_eq!(api.base, "/api");
    assert!(use_service::<String>().is_none());

    app.unmount();
    assert!(use_service::<Api>().is_none());
}

#[wasm_bindgen_test]
fn hydration_adopts_matching_element() {
    let container = test_container();
    container.set_inner_html(r#"<button data-hid="b1" class="old">server</button>"#);
    let server_rendered = container.first_element_child().unwrap();

    let _ = create_root(|| {
        let el = t_element("button", attrs! {
            "data-hid" => "b1",
            "className" => "fresh",
        });
        // The pre-rendered element is adopted, not recreated.
        assert_eq!(el, server_rendered);
        // Static attributes are re-applied on top.
        assert_eq!(el.class_name(), "fresh");
    });
}

#[wasm_bindgen_test]
fn hydration_falls_back_to_fresh_element() {
    let container = test_container();
    container.set_inner_html("");

    let _ = create_root(|| {
        let el = t_element("button", attrs! { "data-hid" => "missing" });
        assert_eq!(el.tag_name().to_lowercase(), "button");
        assert!(el.parent_node().is_none());
    });
}
