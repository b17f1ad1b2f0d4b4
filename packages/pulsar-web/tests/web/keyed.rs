use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen_test::*;

use super::test_container;

#[derive(Clone, PartialEq)]
struct Item {
    id: u32,
    label: &'static str,
}

fn item(id: u32, label: &'static str) -> Item {
    Item { id, label }
}

fn render_items(each: impl Into<MaybeDyn<Vec<Item>>>) -> web_sys::Element {
    For(ForProps::new(
        each,
        |item: &Item, _| item.id,
        |item, _| {
            let el = t_element("li", attrs! { "textContent" => item.label });
            el.into()
        },
    ))
}

fn labels(container: &web_sys::Element) -> Vec<String> {
    let children = container.child_nodes();
    (0..children.length())
        .filter_map(|i| children.get(i))
        .filter_map(|n| n.text_content())
        .collect()
}

#[wasm_bindgen_test]
fn initial_render() {
    let container = test_container();
    let _ = create_root(|| {
        let list = render_items(vec![item(1, "a"), item(2, "b"), item(3, "c")]);
        container.append_child(&list).unwrap();
        assert_eq!(labels(&list), ["a", "b", "c"]);
    });
}

#[wasm_bindgen_test]
fn reorder_preserves_node_identity() {
    let container = test_container();
    let _ = create_root(|| {
        let items = create_signal(vec![item(1, "a"), item(2, "b"), item(3, "c")]);
        let list = render_items(move || items.get_clone());
        container.append_child(&list).unwrap();

        let children = list.child_nodes();
        let n1 = children.get(0).unwrap();
        let n2 = children.get(1).unwrap();
        let n3 = children.get(2).unwrap();

        items.set(vec![item(2, "b"), item(1, "a"), item(3, "c")]);

        // Same nodes, new order.
        assert_eq!(labels(&list), ["b", "a", "c"]);
        assert_eq!(children.get(0).unwrap(), n2);
        assert_eq!(children.get(1).unwrap(), n1);
        assert_eq!(children.get(2).unwrap(), n3);
    });
}

#[wasm_bindgen_test]
fn single_item_stays_in_place() {
    let container = test_container();
    let _ = create_root(|| {
        let items = create_signal(vec![item(1, "a")]);
        let list = render_items(move || items.get_clone());
        container.append_child(&list).unwrap();

        let original = list.child_nodes().get(0).unwrap();
        items.set(vec![item(1, "a")]);
        assert_eq!(list.child_nodes().get(0).unwrap(), original);
        assert_eq!(list.child_nodes().length(), 1);
    });
}

#[wasm_bindgen_test]
fn removed_keys_drop_nodes_and_scopes() {
    let container = test_container();
    let _ = create_root(|| {
        let cleanups = create_signal(0);
        let items = create_signal(vec![item(1, "a"), item(2, "b")]);
        let list = For(ForProps::new(
            move || items.get_clone(),
            |item: &Item, _| item.id,
            move |item, _| {
                on_cleanup(move || cleanups.set(cleanups.get_untracked() + 1));
                t_element("li", attrs! { "textContent" => item.label }).into()
            },
        ));
        container.append_child(&list).unwrap();
        assert_eq!(list.child_nodes().length(), 2);

        items.set(vec![item(2, "b")]);
        assert_eq!(labels(&list), ["b"]);
        assert_eq!(cleanups.get(), 1);

        items.set(vec![]);
        assert_eq!(list.child_nodes().length(), 0);
        assert_eq!(cleanups.get(), 2);
    });
}

#[wasm_bindgen_test]
fn empty_list_shows_fallback() {
    let container = test_container();
    let _ = create_root(|| {
        let items = create_signal(Vec::<Item>::new());
        let list = For(ForProps::new(
            move || items.get_clone(),
            |item: &Item, _| item.id,
            |item, _| t_element("li", attrs! { "textContent" => item.label }).into(),
        )
        .fallback(|| t_element("p", attrs! { "textContent" => "empty" }).into()));
        container.append_child(&list).unwrap();

        assert_eq!(labels(&list), ["empty"]);

        items.set(vec![item(1, "a")]);
        assert_eq!(labels(&list), ["a"]);

        items.set(vec![]);
        assert_eq!(labels(&list), ["empty"]);
    });
}

#[wasm_bindgen_test]
fn duplicate_keys_last_wins() {
    let container = test_container();
    let _ = create_root(|| {
        let list = render_items(vec![item(1, "first"), item(2, "b"), item(1, "last")]);
        container.append_child(&list).unwrap();
        // The earlier item with the duplicate key is discarded silently.
        assert_eq!(labels(&list), ["b", "last"]);
    });
}

#[wasm_bindgen_test]
fn item_ids_are_keyed_under_the_list() {
    let container = test_container();

    let app = bootstrap_app().root(container.clone()).build().unwrap();
    app.mount(|| {
        let list = render_items(vec![item(1, "a"), item(2, "b")]);
        View::from(list)
    })
    .unwrap();

    let first = container.query_selector("li").unwrap().unwrap();
    let id = element_id_of(&first).expect("list items are registered");
    // The item subtree is scoped under the list with a keyed segment.
    assert!(id.contains("/k=1/"), "unexpected item id: {id}");

    let list = container.query_selector("pulsar-for").unwrap().unwrap();
    let list_id = element_id_of(&list).expect("list wrapper is registered");
    assert!(id.starts_with(&format!("{list_id}/k=1/")), "item id {id} not under {list_id}");

    app.unmount();
}

#[wasm_bindgen_test]
fn index_accessor_reports_current_position() {
    let container = test_container();
    let _ = create_root(|| {
        let items = create_signal(vec![item(1, "a"), item(2, "b")]);
        let list = For(ForProps::new(
            move || items.get_clone(),
            |item: &Item, _| item.id,
            |_, index| {
                let el = t_element("li", attrs![]);
                wire_text(&el, "textContent", move || index.get().to_string());
                el.into()
            },
        ));
        container.append_child(&list).unwrap();
        assert_eq!(labels(&list), ["0", "1"]);

        items.set(vec![item(2, "b"), item(1, "a")]);
        // The index accessors report the positions in the *current* array.
        assert_eq!(labels(&list), ["0", "1"]);
    });
}
