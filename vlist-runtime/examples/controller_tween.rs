use vlist_runtime::{Controller, Easing};

fn main() {
    // Example: TanStack-like controller driving tween scrolling without holding any UI objects.
    //
    // An adapter would:
    // - start a tween (e.g. in response to "scroll to index" command)
    // - call tick(now_ms) in a frame loop / timer
    // - apply the returned offset to the real scroll container (if any)
    // - render using the viewport state
    let mut c = Controller::new(vlist::ViewportOptions::new(10_000, |_| 1));
    c.viewport_mut().set_viewport_size(20);
    c.viewport_mut().set_scroll_offset(0);

    let target = c.start_tween_to_index(
        2_000,
        vlist::Align::Center,
        0,
        240,
        Easing::SmoothStep,
    );
    println!("target_offset={target}");

    let mut now_ms = 0u64;
    loop {
        now_ms += 16;
        if let Some(off) = c.tick(now_ms) {
            if now_ms.is_multiple_of(80) {
                println!(
                    "t={now_ms} off={off} visible={:?}",
                    c.viewport().visible_range()
                );
            }
        } else {
            break;
        }
    }

    println!(
        "done: off={} range={:?}",
        c.viewport().scroll_offset(),
        c.viewport().virtual_range()
    );
}
