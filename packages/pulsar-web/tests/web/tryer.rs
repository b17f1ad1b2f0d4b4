use pulsar_reactive::*;
use pulsar_web::*;
use wasm_bindgen_test::*;

use super::test_container;

#[wasm_bindgen_test]
fn renders_children_when_nothing_fails() {
    let container = test_container();
    let _ = create_root(|| {
        let boundary = Tryer(TryerProps::new(|| {
            Ok(t_element("p", attrs! { "textContent" => "fine" }).into())
        }));
        container.append_child(&boundary).unwrap();
        assert_eq!(boundary.text_content().as_deref(), Some("fine"));
    });
}

#[wasm_bindgen_test]
fn default_fallback_renders_the_error_message() {
    let container = test_container();
    let _ = create_root(|| {
        let boundary = Tryer(TryerProps::new(|| Err(RenderError::from("boom"))));
        container.append_child(&boundary).unwrap();
        assert_eq!(boundary.text_content().as_deref(), Some("error: boom"));
    });
}

#[wasm_bindgen_test]
fn reset_recovers_once_external_state_changes() {
    let container = test_container();
    let _ = create_root(|| {
        let healthy = create_signal(false);
        let resets = create_signal(Vec::new());

        let boundary = Tryer(
            TryerProps::new(move || {
                // Reading through untracked: only `reset` re-runs us.
                if healthy.get_untracked() {
                    Ok(t_element("p", attrs! { "textContent" => "recovered" }).into())
                } else {
                    Err(RenderError::from("broken: X"))
                }
            })
            .fallback(move |error, reset| {
                resets.update(|r| r.push(reset));
                t_element("p", attrs! { "textContent" => format!("error: {error}") }).into()
            }),
        );
        container.append_child(&boundary).unwrap();
        assert_eq!(
            boundary.text_content().as_deref(),
            Some("error: broken: X")
        );

        // Resetting while the failure persists re-renders the fallback.
        let reset = resets.with_untracked(|r| r[0].clone());
        reset();
        assert_eq!(
            boundary.text_content().as_deref(),
            Some("error: broken: X")
        );

        // Flip the external flag, then reset: the real children render.
        healthy.set(true);
        let reset = resets.with_untracked(|r| r.last().unwrap().clone());
        reset();
        assert_eq!(boundary.text_content().as_deref(), Some("recovered"));
    });
}

#[wasm_bindgen_test]
fn caught_errors_do_not_reach_on_error() {
    let container = test_container();
    let reported = std::rc::Rc::new(std::cell::Cell::new(0));

    let app = bootstrap_app()
        .root(container.clone())
        .on_error({
            let reported = std::rc::Rc::clone(&reported);
            move |_| reported.set(reported.get() + 1)
        })
        .build()
        .unwrap();
    app.mount(|| {
        Tryer(
            TryerProps::new(|| Err(RenderError::from("contained")))
                .fallback(|error, _| {
                    t_element("p", attrs! { "textContent" => format!("error: {error}") }).into()
                }),
        )
        .into()
    })
    .unwrap();

    assert_eq!(
        container.text_content().as_deref(),
        Some("error: contained")
    );
    // The boundary caught and rendered the error; the app-level handler
    // must stay quiet.
    assert_eq!(reported.get(), 0);

    app.unmount();
}

#[wasm_bindgen_test]
fn default_fallback_also_counts_as_caught() {
    let container = test_container();
    let reported = std::rc::Rc::new(std::cell::Cell::new(0));

    let app = bootstrap_app()
        .root(container.clone())
        .on_error({
            let reported = std::rc::Rc::clone(&reported);
            move |_| reported.set(reported.get() + 1)
        })
        .build()
        .unwrap();
    app.mount(|| Tryer(TryerProps::new(|| Err(RenderError::from("quiet")))).into())
        .unwrap();

    assert_eq!(container.text_content().as_deref(), Some("error: quiet"));
    assert_eq!(reported.get(), 0);

    app.unmount();
}

#[wasm_bindgen_test]
fn boundary_rerenders_when_tracked_state_changes() {
    let container = test_container();
    let _ = create_root(|| {
        let healthy = create_signal(false);

        let boundary = Tryer(TryerProps::new(move || {
            if healthy.get() {
                Ok(t_element("p", attrs! { "textContent" => "ok" }).into())
            } else {
                Err(RenderError::from("nope"))
            }
        }));
        container.append_child(&boundary).unwrap();
        assert_eq!(boundary.text_content().as_deref(), Some("error: nope"));

        // The tracked signal re-runs the boundary without an explicit reset.
        healthy.set(true);
        assert_eq!(boundary.text_content().as_deref(), Some("ok"));
    });
}
