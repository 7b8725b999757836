use std::sync::Arc;

use vlist::{VelocitySnapshot, VirtualRange};

use crate::error::ListError;

/// Every state transition the system can notify subscribers about.
///
/// `emit` delivers these to subscribers synchronously, in registration order, matching the
/// single-event-loop model: there is never more than one `Event` "in flight" at a time.
#[derive(Clone, Debug)]
pub enum Event {
    /// Fired by `Viewport::notify` after `scroll_offset` changes, always before
    /// `VirtualRangeChanged` in the same notify.
    ScrollPositionChanged { offset: u64 },
    /// Fired after `ScrollPositionChanged`, always before `ViewportRendered`.
    VirtualRangeChanged { range: VirtualRange },
    /// Fired once the render pool has synced to the new range.
    ViewportRendered { range: VirtualRange },
    /// A paging key's read completed and was merged into the store.
    RangeLoaded { key_debug: Arc<str> },
    /// A paging key's read failed; the range is retried on the next overlapping `ensure_range`.
    RangeFailed { key_debug: Arc<str>, message: Arc<str> },
    /// The render pool failed to instantiate or recycle a handle for an index.
    RenderError { index: usize },
    /// Fired by `total_items` changing (drives `enhancers::stats`).
    TotalItemsChanged { total: u64 },
    /// A page of items was merged into the store for the first time (items went from empty to
    /// non-empty). Distinct from `TotalItemsChanged`, which fires on every count revision.
    ItemsSet { total: u64 },
    /// Velocity tracker update (windowed + smoothed speed, direction, acceleration).
    Velocity(VelocitySnapshot),
    /// Velocity has decayed to zero and scrolling has settled.
    Idle,
    /// `enhancers::stats` recomputed `(count, position, progress)` and it actually changed.
    StatsChanged { count: u64, position: u64, progress: f32 },
    /// The selection set changed (any click, toggle, or range extend).
    SelectionChanged { selected_count: usize },
    /// One item's selected state flipped.
    ItemSelectionChanged { index: usize, selected: bool },
    /// The search control (toggle button) opened.
    SearchOpen,
    /// The search control closed.
    SearchClose,
    /// The debounced query took effect with a non-empty, accepted value.
    SearchChange { query: String },
    /// The debounced query resolved to nothing (cleared, or below `min_length`).
    SearchClear,
    /// The filter panel (toggle button) opened.
    FilterOpen,
    /// The filter panel closed.
    FilterClose,
    /// A named filter control took a new, non-empty value.
    FilterChange { name: String },
    /// A named filter control was cleared (including by setting an empty value).
    FilterClear { name: String },
    /// A scroll position (or lookup) was queued for restoration on the next reload.
    ScrollRestorePending,
    /// A pending scroll was resolved and applied after a reload.
    ScrollRestoreApplied { position: u64, select_id: Option<String> },
    /// Pending scroll state was cleared without being applied (or auto-cleared after apply).
    ScrollRestoreCleared,
    /// A `reload()` call started, before any state is cleared.
    ReloadStart,
    /// `List::destroy` ran for the first time. Idempotent: a second call emits nothing.
    Destroyed,
    /// A hard misconfiguration was detected; the list continues in degraded mode.
    Degraded(Arc<ListError>),
}

/// A synchronous multi-subscriber broadcaster.
///
/// Generalizes the teacher's single `on_change: Option<Arc<dyn Fn(..) + Send + Sync>>` hook to
/// many subscribers over one closed `Event` enum.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Vec<Arc<dyn Fn(&Event) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber. Returns its index, usable for documentation/debugging only —
    /// there is no `unsubscribe`, matching the teacher's append-only callback registration style.
    pub fn subscribe(&mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> usize {
        self.subscribers.push(Arc::new(f));
        self.subscribers.len() - 1
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Calls every subscriber synchronously, in registration order.
    pub fn emit(&self, event: &Event) {
        for subscriber in &self.subscribers {
            subscriber(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
