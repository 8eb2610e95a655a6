//! Counter app rendered into an in-memory document.
//!
//! Run with `RUST_LOG=debug cargo run --example counter` to see each pass.

use slotview::prelude::*;

#[component]
fn counter_app(cx: &mut RenderContext) -> Element {
    let (count, set_count) = cx.use_state(0);
    let reset = set_count.clone();

    element("div")
        .class_name("app")
        .style("padding", "2rem")
        .child(element!("h1", "slotview"))
        .child(element!("p", "Count: ", count))
        .child(element!("button", "Increment").on("click", move |_| set_count.update(|c| c + 1)))
        .child(element!("button", "Reset").on("click", move |_| reset.set(0)))
        .child(element!("p", "Every click rebuilds the whole tree.").class_name("footer"))
}

fn main() {
    let host = MemoryHost::new();
    let container = host.create_container("root");

    let Some(root) = App::new().start(host.clone(), host.get_element_by_id("root"), CounterApp)
    else {
        return;
    };

    println!("{}", host.inner_html(container));

    // Buttons are recreated on every pass, so look them up before each click.
    let button = |index: usize| host.find_by_tag(root.container(), "button")[index];

    let first_increment = button(0);
    for _ in 0..3 {
        host.dispatch(button(0), "click");
    }
    assert!(!host.contains(first_increment));
    println!("{}", host.inner_html(container));

    host.dispatch(button(1), "click");
    println!("{}", host.inner_html(container));

    let stats = root.stats();
    println!(
        "{} passes, {} elements created in total",
        stats.passes, stats.elements_created
    );
}
