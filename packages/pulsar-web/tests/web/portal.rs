use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen_test::*;

use super::{next_microtasks, test_container};

fn portal_target() -> web_sys::Element {
    if document().query_selector("#portal-target").unwrap().is_none() {
        document()
            .body()
            .unwrap()
            .insert_adjacent_html("beforeend", r#"<div id="portal-target"></div>"#)
            .unwrap();
    }
    let target = document().query_selector("#portal-target").unwrap().unwrap();
    target.set_inner_html("");
    target
}

#[wasm_bindgen_test]
fn mounts_children_into_selector_target() {
    let _container = test_container();
    let target = portal_target();

    let _ = create_root(|| {
        let placeholder = Portal(PortalProps::new(
            "#portal-target",
            t_element("p", attrs! { "textContent" => "teleported" }),
        ));
        // The placeholder stands in at the logical position.
        assert_eq!(placeholder.node_type(), web_sys::Node::COMMENT_NODE);
        assert_eq!(target.text_content().as_deref(), Some("teleported"));
    });
}

#[wasm_bindgen_test]
fn scope_disposal_tears_the_portal_down() {
    let _container = test_container();
    let target = portal_target();

    let _ = create_root(|| {
        let scope = create_child_scope(|| {
            let _ = Portal(PortalProps::new(
                "#portal-target",
                t_element("p", attrs! { "textContent" => "ephemeral" }),
            ));
        });
        assert_eq!(target.text_content().as_deref(), Some("ephemeral"));

        scope.dispose();
        assert_eq!(target.child_nodes().length(), 0);
    });
}

#[wasm_bindgen_test]
fn multiple_children_are_grouped_in_a_contents_wrapper() {
    let _container = test_container();
    let target = portal_target();

    let _ = create_root(|| {
        let a = t_element("p", attrs! { "textContent" => "a" });
        let b = t_element("p", attrs! { "textContent" => "b" });
        let _ = Portal(PortalProps::new("#portal-target", View::from((a, b))));

        // One wrapper child holding both nodes.
        assert_eq!(target.child_nodes().length(), 1);
        let wrapper = target.first_element_child().unwrap();
        assert_eq!(wrapper.child_nodes().length(), 2);
        assert_eq!(
            wrapper.get_attribute("style").as_deref(),
            Some("display: contents")
        );
    });
}

#[wasm_bindgen_test]
async fn missing_target_retries_on_the_next_microtask() {
    let _container = test_container();
    // No element matches yet.
    if let Some(stale) = document().query_selector("#late-target").unwrap() {
        stale.remove();
    }

    let root = create_root(|| {
        let _ = Portal(PortalProps::new(
            "#late-target",
            t_element("p", attrs! { "textContent" => "late" }),
        ));
    });

    // The target appears after creation but before the microtask retry.
    document()
        .body()
        .unwrap()
        .insert_adjacent_html("beforeend", r#"<div id="late-target"></div>"#)
        .unwrap();

    next_microtasks(2).await;

    let target = document().query_selector("#late-target").unwrap().unwrap();
    assert_eq!(target.text_content().as_deref(), Some("late"));

    root.dispose();
    target.remove();
}

#[wasm_bindgen_test]
fn body_mount_appends_to_document_body() {
    let _container = test_container();
    let root = create_root(|| {
        let marker = t_element("div", attrs! { "id" => "body-portal-content" });
        let _ = Portal(PortalProps::new(PortalMount::Body, marker));
        assert!(document()
            .query_selector("#body-portal-content")
            .unwrap()
            .is_some());
    });
    root.dispose();
    assert!(document()
        .query_selector("#body-portal-content")
        .unwrap()
        .is_none());
}
