use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen_test::*;

use super::test_container;

#[wasm_bindgen_test]
fn batched_geometry_runs_each_wire_once() {
    let container = test_container();
    let _ = create_root(|| {
        let cx = create_signal(0);
        let cy = create_signal(0);
        let r = create_signal(1);
        let runs = create_signal(0);

        let circle = t_element("circle", attrs![]);
        container.append_child(&circle).unwrap();

        wire(&circle, "cx", move || {
            runs.set_silent(runs.get_untracked() + 1);
            cx.get()
        });
        wire(&circle, "cy", move || {
            runs.set_silent(runs.get_untracked() + 1);
            cy.get()
        });
        wire(&circle, "r", move || {
            runs.set_silent(runs.get_untracked() + 1);
            r.get()
        });
        assert_eq!(runs.get_untracked(), 3); // one initial run each

        batch(move || {
            cx.set(200);
            cy.set(300);
            r.set(50);
        });

        // One run per wire, not one per write.
        assert_eq!(runs.get_untracked(), 6);
        assert_eq!(circle.get_attribute("cx").as_deref(), Some("200"));
        assert_eq!(circle.get_attribute("cy").as_deref(), Some("300"));
        assert_eq!(circle.get_attribute("r").as_deref(), Some("50"));
    });
}

#[wasm_bindgen_test]
fn frame_coalescing_runs_only_the_last_task_per_key() {
    let container = test_container();
    let _ = create_root(|| {
        let cx = create_signal(0);
        let cy = create_signal(0);

        let circle = t_element("circle", attrs![]);
        container.append_child(&circle).unwrap();
        wire(&circle, "cx", move || cx.get());
        wire(&circle, "cy", move || cy.get());

        for i in 0..=50 {
            schedule_frame(
                move || {
                    cx.set(i * 5);
                    cy.set(i * 3);
                },
                "drag",
            );
        }
        // Nothing has been written yet.
        assert_eq!(circle.get_attribute("cx").as_deref(), Some("0"));

        flush_frames();
        assert_eq!(circle.get_attribute("cx").as_deref(), Some("250"));
        assert_eq!(circle.get_attribute("cy").as_deref(), Some("150"));
    });
}

#[wasm_bindgen_test]
fn writes_inside_a_frame_task_propagate_synchronously() {
    let container = test_container();
    let _ = create_root(|| {
        let x = create_signal(0);
        let el = t_element("p", attrs![]);
        container.append_child(&el).unwrap();
        wire_text(&el, "textContent", move || x.get().to_string());

        schedule_frame(move || x.set(7), "move");
        flush_frames();
        assert_eq!(el.text_content().as_deref(), Some("7"));
    });
}
