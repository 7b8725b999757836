// Example: a synthetic scrollbar for a dataset whose virtual length would exceed what most
// host scroll containers can represent, plus velocity-aware load cancellation.
use vlist::{ScrollbarOptions, SyntheticScrollbar, Viewport, ViewportOptions};

fn main() {
    let mut v = Viewport::new(
        ViewportOptions::new(50_000_000, |_| 24).with_default_virtual_size_cap(),
    );
    v.set_viewport_and_scroll_clamped(600, 0);

    println!(
        "real_total={} reported_total={} compressed={}",
        v.total_size(),
        v.reported_total_size(),
        v.is_compressed()
    );

    let bar = SyntheticScrollbar::new(ScrollbarOptions::default());
    let items_per_viewport = (v.viewport_size() / 24).max(1) as usize;

    // Drag the thumb to the middle of the track.
    let ratio = 0.5;
    let target_index = bar.ratio_to_start_index(ratio, v.count(), items_per_viewport);
    v.scroll_to_index(target_index, vlist::Align::Start);
    println!("dragged to ratio={ratio} -> start_index={target_index}");

    // Simulate a fast fling: two scroll events 500px apart within 10ms.
    v.apply_scroll_offset_event_clamped(v.scroll_offset(), 0);
    v.apply_scroll_offset_event_clamped(v.scroll_offset() + 50_000, 10);
    println!(
        "velocity={:?} should_cancel_loads={}",
        v.velocity(),
        v.should_cancel_loads()
    );

    let geometry = bar.geometry(
        v.reported_total_size(),
        v.viewport_size(),
        v.scroll_offset_in_list(),
        v.max_scroll_offset(),
        400,
        v.is_compressed(),
    );
    println!("{geometry:?}");
}
