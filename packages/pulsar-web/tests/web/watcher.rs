use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen_test::*;

use super::{next_microtasks, test_container};

#[wasm_bindgen_test]
async fn removing_a_node_disposes_its_wires() {
    let container = test_container();
    let count = std::rc::Rc::new(std::cell::Cell::new(0));

    let app = bootstrap_app().root(container.clone()).build().unwrap();
    let p_holder = std::rc::Rc::new(std::cell::RefCell::new(None));
    app.mount({
        let count = std::rc::Rc::clone(&count);
        let p_holder = std::rc::Rc::clone(&p_holder);
        move || {
            let p = t_element("p", attrs![]);
            wire(&p, "textContent", {
                let count = std::rc::Rc::clone(&count);
                move || {
                    count.set(count.get() + 1);
                    "watched"
                }
            });
            *p_holder.borrow_mut() = Some(p.clone());
            View::from(p)
        }
    })
    .unwrap();

    let p = p_holder.borrow().clone().unwrap();
    assert_eq!(wire_count(&p), 1);

    // Remove the node; the watcher disposes the wire one microtask after
    // the mutation record is delivered.
    container.remove_child(&p).unwrap();
    next_microtasks(3).await;

    assert_eq!(wire_count(&p), 0);
    app.unmount();
}

#[wasm_bindgen_test]
async fn descendants_are_disposed_with_the_subtree() {
    let container = test_container();

    let app = bootstrap_app().root(container.clone()).build().unwrap();
    let nodes = std::rc::Rc::new(std::cell::RefCell::new(None));
    app.mount({
        let nodes = std::rc::Rc::clone(&nodes);
        move || {
            let outer = t_element("div", attrs![]);
            let inner = t_element("span", attrs![]);
            wire(&inner, "textContent", || "deep");
            outer.append_child(&inner).unwrap();
            *nodes.borrow_mut() = Some((outer.clone(), inner.clone()));
            View::from(outer)
        }
    })
    .unwrap();

    let (outer, inner) = nodes.borrow().clone().unwrap();
    assert_eq!(wire_count(&inner), 1);

    container.remove_child(&outer).unwrap();
    next_microtasks(3).await;

    assert_eq!(wire_count(&inner), 0);
    app.unmount();
}

#[wasm_bindgen_test]
async fn reattached_nodes_keep_their_wires() {
    let container = test_container();

    let app = bootstrap_app().root(container.clone()).build().unwrap();
    let p_holder = std::rc::Rc::new(std::cell::RefCell::new(None));
    app.mount({
        let p_holder = std::rc::Rc::clone(&p_holder);
        move || {
            let p = t_element("p", attrs![]);
            wire(&p, "textContent", || "still here");
            *p_holder.borrow_mut() = Some(p.clone());
            View::from(p)
        }
    })
    .unwrap();

    let p = p_holder.borrow().clone().unwrap();
    assert_eq!(wire_count(&p), 1);

    // Detach and reattach synchronously: by the time the disposal
    // microtask runs, the node is connected again and is left alone.
    container.remove_child(&p).unwrap();
    container.append_child(&p).unwrap();
    next_microtasks(3).await;

    assert_eq!(wire_count(&p), 1);
    app.unmount();
}

#[wasm_bindgen_test]
async fn registry_entry_is_released_on_removal() {
    let container = test_container();

    let app = bootstrap_app().root(container.clone()).build().unwrap();
    let p_holder = std::rc::Rc::new(std::cell::RefCell::new(None));
    app.mount({
        let p_holder = std::rc::Rc::clone(&p_holder);
        move || {
            let p = t_element("p", attrs![]);
            *p_holder.borrow_mut() = Some(p.clone());
            View::from(p)
        }
    })
    .unwrap();

    let p = p_holder.borrow().clone().unwrap();
    let id = element_id_of(&p).expect("registered element carries an id");
    assert!(with_current_registry(|registry| registry.has(&id)).unwrap());

    container.remove_child(&p).unwrap();
    next_microtasks(3).await;

    // The registry no longer knows the id.
    assert!(!with_current_registry(|registry| registry.has(&id)).unwrap());
    app.unmount();
}
