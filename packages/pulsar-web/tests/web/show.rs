use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen_test::*;

use super::{next_microtasks, test_container};

#[wasm_bindgen_test]
fn toggling_preserves_node_identity() {
    let container = test_container();
    let _ = create_root(|| {
        let visible = create_signal(true);
        let show = Show(ShowProps::new(move || visible.get(), || {
            t_element("p", attrs! { "textContent" => "content" }).into()
        }));
        container.append_child(&show).unwrap();

        let n1 = show.first_child().expect("children attached");

        visible.set(false);
        assert!(show.first_child().is_none());

        visible.set(true);
        // The same node is re-attached, not a fresh copy.
        assert_eq!(show.first_child().unwrap(), n1);

        visible.set(false);
        visible.set(true);
        assert_eq!(show.first_child().unwrap(), n1);
    });
}

#[wasm_bindgen_test]
fn fallback_swaps_with_children() {
    let container = test_container();
    let _ = create_root(|| {
        let visible = create_signal(false);
        let show = Show(
            ShowProps::new(move || visible.get(), || {
                t_element("p", attrs! { "textContent" => "on" }).into()
            })
            .fallback(|| t_element("p", attrs! { "textContent" => "off" }).into()),
        );
        container.append_child(&show).unwrap();

        assert_eq!(show.text_content().as_deref(), Some("off"));

        visible.set(true);
        assert_eq!(show.text_content().as_deref(), Some("on"));

        visible.set(false);
        assert_eq!(show.text_content().as_deref(), Some("off"));
    });
}

#[wasm_bindgen_test]
fn branches_are_materialised_lazily() {
    let container = test_container();
    let _ = create_root(|| {
        let visible = create_signal(false);
        let children_built = create_signal(0);
        let fallback_built = create_signal(0);

        let show = Show(
            ShowProps::new(move || visible.get(), move || {
                children_built.set(children_built.get_untracked() + 1);
                t_element("p", attrs![]).into()
            })
            .fallback(move || {
                fallback_built.set(fallback_built.get_untracked() + 1);
                t_element("p", attrs![]).into()
            }),
        );
        container.append_child(&show).unwrap();

        // Only the active branch has been built.
        assert_eq!(children_built.get(), 0);
        assert_eq!(fallback_built.get(), 1);

        visible.set(true);
        assert_eq!(children_built.get(), 1);

        // Toggling back re-attaches; factories are never called again.
        visible.set(false);
        visible.set(true);
        assert_eq!(children_built.get(), 1);
        assert_eq!(fallback_built.get(), 1);
    });
}

#[wasm_bindgen_test]
async fn hidden_branch_survives_the_node_watcher() {
    let container = test_container();

    let app = bootstrap_app().root(container.clone()).build().unwrap();
    let state = std::rc::Rc::new(std::cell::RefCell::new(None));
    app.mount({
        let state = std::rc::Rc::clone(&state);
        move || {
            let visible = create_signal(true);
            let label = create_signal("a");
            let show = Show(ShowProps::new(move || visible.get(), move || {
                let el = t_element("p", attrs![]);
                wire_text(&el, "textContent", move || label.get().to_string());
                el.into()
            }));
            *state.borrow_mut() = Some((visible, label, show.clone()));
            View::from(show)
        }
    })
    .unwrap();

    let (visible, label, show) = state.borrow().clone().unwrap();
    let p = show.first_child().unwrap();
    assert_eq!(wire_count(&p), 1);

    // Hide the branch and give the watcher's disposal microtask a chance
    // to run: the parked subtree must keep its wires.
    visible.set(false);
    next_microtasks(3).await;
    assert_eq!(wire_count(&p), 1);

    label.set("b");
    visible.set(true);
    assert_eq!(show.text_content().as_deref(), Some("b"));

    app.unmount();
}

#[wasm_bindgen_test]
fn wires_in_hidden_branch_survive() {
    let container = test_container();
    let _ = create_root(|| {
        let visible = create_signal(true);
        let label = create_signal("a");
        let show = Show(ShowProps::new(move || visible.get(), move || {
            let el = t_element("p", attrs![]);
            wire_text(&el, "textContent", move || label.get().to_string());
            el.into()
        }));
        container.append_child(&show).unwrap();

        assert_eq!(show.text_content().as_deref(), Some("a"));

        // Update the signal while the branch is detached.
        visible.set(false);
        label.set("b");
        visible.set(true);
        assert_eq!(show.text_content().as_deref(), Some("b"));
    });
}
