use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use vlist::{Align, RenderPool, ScrollbarGeometry, ScrollbarOptions, SyncPlan, SyntheticScrollbar, Viewport, ViewportOptions};

use crate::adapter::{Adapter, FilterValue};
use crate::collection::{CollectionCoordinator, CollectionOptions};
use crate::enhancers::{
    Filters, PendingScrollTarget, ScrollRestore, Search, SearchOptions, Selection, SelectionOptions,
    Stats, StatsTracker, VelocityDisplay, VelocityDisplayOptions,
};
use crate::error::ListError;
use crate::event::{Event, EventBus};
use crate::feature::{Capability, CoreCapability, Pipeline};
use crate::key::ViewportKey;
use crate::layout::{LayoutNode, LayoutRegistry};

/// All typed option groups for one list instance, composed into a single constructor argument
/// rather than a stringly-typed config map.
pub struct ListOptions<T, K> {
    pub viewport: ViewportOptions<K>,
    pub collection: CollectionOptions<T>,
    pub selection: SelectionOptions,
    pub search: SearchOptions,
    pub velocity_display: VelocityDisplayOptions,
    pub scroll_restore_auto_clear: bool,
    pub layout: LayoutNode,
    pub rendering_maintain_dom_order: bool,
    pub scrollbar: ScrollbarOptions,
}

/// The lean composition this implementation settled on: one `Viewport` + one
/// `CollectionCoordinator` + one `RenderPool` + one `Pipeline` of enhancers over a shared
/// `EventBus`, rather than a separate list-manager plugin layer (see the repo's design notes).
///
/// `H` is the opaque rendered-element handle type a host's `RenderPool` recycles (see
/// [`Self::sync_render`]).
///
/// Enhancer state lives behind `Rc<RefCell<_>>` rather than plain fields: the same instance is
/// both mutated directly by this type's wiring methods (`click_item`, `set_filter`, ...) and
/// registered with `pipeline` as a real `Capability`, matching spec's single-threaded
/// cooperative concurrency model (no shared-memory threads, so no need for `Arc`/`Mutex`).
pub struct List<T, K: ViewportKey, H> {
    viewport: Viewport<K>,
    collection: CollectionCoordinator<T>,
    bus: EventBus,
    layout: Result<LayoutRegistry, ListError>,
    pipeline: Pipeline,
    selection: Rc<RefCell<Selection<K>>>,
    search: Rc<RefCell<Search>>,
    filters: Rc<RefCell<Filters>>,
    stats: Rc<RefCell<StatsTracker>>,
    velocity_display: Rc<RefCell<VelocityDisplay>>,
    scroll_restore: Rc<RefCell<ScrollRestore>>,
    render_pool: RenderPool<H>,
    scrollbar: SyntheticScrollbar,
    search_open: bool,
    filter_panel_open: bool,
    destroyed: bool,
}

impl<T, K, H> List<T, K, H>
where
    T: Send + Sync + 'static,
    K: ViewportKey + Clone + Ord + core::fmt::Debug + 'static,
    H: Clone,
{
    pub fn new(adapter: Arc<dyn Adapter<T>>, options: ListOptions<T, K>) -> Self {
        let layout = LayoutRegistry::compile(&options.layout);
        if let Err(err) = &layout {
            vwarn!("layout compilation failed: {err}");
        }

        let selection = Rc::new(RefCell::new(Selection::new(options.selection)));
        let search = Rc::new(RefCell::new(Search::new(options.search)));
        let filters = Rc::new(RefCell::new(Filters::new()));
        let stats = Rc::new(RefCell::new(StatsTracker::new()));
        let velocity_display = Rc::new(RefCell::new(VelocityDisplay::new(options.velocity_display)));
        let scroll_restore = Rc::new(RefCell::new(ScrollRestore::new(options.scroll_restore_auto_clear)));

        let mut pipeline = Pipeline::new();
        pipeline.register(Rc::new(CoreCapability));
        pipeline.register(Rc::clone(&selection) as Rc<dyn Capability>);
        pipeline.register(Rc::clone(&search) as Rc<dyn Capability>);
        pipeline.register(Rc::clone(&filters) as Rc<dyn Capability>);
        pipeline.register(Rc::clone(&stats) as Rc<dyn Capability>);
        pipeline.register(Rc::clone(&velocity_display) as Rc<dyn Capability>);
        pipeline.register(Rc::clone(&scroll_restore) as Rc<dyn Capability>);

        let bus = EventBus::new();
        if let Err(err) = layout.clone() {
            bus.emit(&Event::Degraded(Arc::new(err)));
        }

        Self {
            viewport: Viewport::new(options.viewport),
            collection: CollectionCoordinator::new(adapter, options.collection),
            bus,
            layout,
            pipeline,
            selection,
            search,
            filters,
            stats,
            velocity_display,
            scroll_restore,
            render_pool: RenderPool::new(options.rendering_maintain_dom_order),
            scrollbar: SyntheticScrollbar::new(options.scrollbar),
            search_open: false,
            filter_panel_open: false,
            destroyed: false,
        }
    }

    pub fn viewport(&self) -> &Viewport<K> {
        &self.viewport
    }

    /// Direct measurement access (`measure`, `resize_item`, ...). Scroll position changes made
    /// here bypass event wiring — prefer [`Self::scroll_to`]/[`Self::scroll_to_index`] for any
    /// mutation that should emit `ScrollPositionChanged`/`VirtualRangeChanged`.
    pub fn viewport_mut(&mut self) -> &mut Viewport<K> {
        &mut self.viewport
    }

    pub fn collection(&self) -> &CollectionCoordinator<T> {
        &self.collection
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn layout(&self) -> Result<&LayoutRegistry, &ListError> {
        self.layout.as_ref()
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Runs every registered capability in fixed stage order. Call once after construction,
    /// before the first `ensure_visible_range_loaded`.
    pub async fn run_pipeline(&mut self) -> Result<(), ListError> {
        self.pipeline.run(&self.bus).await
    }

    // --- scrolling -------------------------------------------------------------------------

    /// Scrolls to an absolute offset, emitting `ScrollPositionChanged` then
    /// `VirtualRangeChanged` in that order, matching spec's per-input-event ordering guarantee.
    pub fn scroll_to(&mut self, offset: u64, now_ms: u64) {
        self.viewport.apply_scroll_offset_event_clamped(offset, now_ms);
        self.notify_scroll_changed();
    }

    /// Scrolls so `index` is aligned per `align`, returning the resulting offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> u64 {
        let offset = self.viewport.scroll_to_index(index, align);
        self.notify_scroll_changed();
        offset
    }

    fn notify_scroll_changed(&mut self) {
        self.bus.emit(&Event::ScrollPositionChanged { offset: self.viewport.scroll_offset() });
        self.bus.emit(&Event::VirtualRangeChanged { range: self.viewport.virtual_range() });
    }

    /// Computes this frame's scrollbar thumb/track geometry from the current viewport state.
    pub fn scrollbar_geometry(&self, track_size: u32) -> ScrollbarGeometry {
        self.scrollbar.geometry(
            self.viewport.reported_total_size(),
            self.viewport.viewport_size(),
            self.viewport.scroll_offset(),
            self.viewport.max_scroll_offset(),
            track_size,
            self.viewport.is_compressed(),
        )
    }

    // --- selection ---------------------------------------------------------------------------

    pub fn selection(&self) -> Ref<'_, Selection<K>> {
        self.selection.borrow()
    }

    /// Handles a click on `key` at `index`, routing through `Selection::click` and emitting
    /// `SelectionChanged`/`ItemSelectionChanged` at the actual mutation site.
    pub fn click_item(&mut self, key: K, index: usize, ctrl_or_cmd: bool, shift: bool) -> Result<(), ListError> {
        let viewport = &self.viewport;
        self.selection
            .borrow_mut()
            .click(key.clone(), index, ctrl_or_cmd, shift, |i| viewport.key_for(i))?;

        let selected = self.selection.borrow().is_selected(&key);
        let selected_count = self.selection.borrow().len();
        self.bus.emit(&Event::SelectionChanged { selected_count });
        self.bus.emit(&Event::ItemSelectionChanged { index, selected });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selection.borrow().is_empty() {
            return;
        }
        self.selection.borrow_mut().clear();
        self.bus.emit(&Event::SelectionChanged { selected_count: 0 });
    }

    // --- search --------------------------------------------------------------------------------

    pub fn search(&self) -> Ref<'_, Search> {
        self.search.borrow()
    }

    pub fn is_search_open(&self) -> bool {
        self.search_open
    }

    pub fn open_search(&mut self) {
        if !self.search_open {
            self.search_open = true;
            self.bus.emit(&Event::SearchOpen);
        }
    }

    pub fn close_search(&mut self) {
        if self.search_open {
            self.search_open = false;
            self.bus.emit(&Event::SearchClose);
        }
    }

    pub fn set_search_query(&mut self, raw: impl Into<String>, now_ms: u64) {
        self.search.borrow_mut().set_raw_query(raw, now_ms);
    }

    /// Advances the search debounce timer. On an actual debounce-elapsed decision, pushes the
    /// resolved query into `CollectionCoordinator` and emits `SearchChange`/`SearchClear`.
    pub fn tick_search(&mut self, now_ms: u64) {
        let applied = self.search.borrow_mut().tick(now_ms);
        match applied {
            Some(Some(query)) => {
                self.collection.set_search(Some(query.clone()));
                self.bus.emit(&Event::SearchChange { query });
            }
            Some(None) => {
                self.collection.set_search(None);
                self.bus.emit(&Event::SearchClear);
            }
            None => {}
        }
    }

    // --- filters -------------------------------------------------------------------------------

    pub fn filters(&self) -> Ref<'_, Filters> {
        self.filters.borrow()
    }

    pub fn is_filter_panel_open(&self) -> bool {
        self.filter_panel_open
    }

    pub fn open_filter_panel(&mut self) {
        if !self.filter_panel_open {
            self.filter_panel_open = true;
            self.bus.emit(&Event::FilterOpen);
        }
    }

    pub fn close_filter_panel(&mut self) {
        if self.filter_panel_open {
            self.filter_panel_open = false;
            self.bus.emit(&Event::FilterClose);
        }
    }

    /// Sets a named filter control, normalizing empty values to a clear (`Filters::set`'s own
    /// contract), and pushes the effective value through to `CollectionCoordinator`.
    pub fn set_filter(&mut self, name: impl Into<String>, value: FilterValue) {
        let name = name.into();
        self.filters.borrow_mut().set(name.clone(), value.clone());
        let cleared = self.filters.borrow().get(&name).is_none();
        self.collection.set_filter(name.clone(), if cleared { None } else { Some(value) });
        if cleared {
            self.bus.emit(&Event::FilterClear { name });
        } else {
            self.bus.emit(&Event::FilterChange { name });
        }
    }

    pub fn clear_filter(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.filters.borrow_mut().clear(&name);
        self.collection.set_filter(name.clone(), None);
        self.bus.emit(&Event::FilterClear { name });
    }

    pub fn clear_all_filters(&mut self) {
        let names: Vec<String> = self.filters.borrow().as_map().keys().cloned().collect();
        self.filters.borrow_mut().clear_all();
        for name in names {
            self.collection.set_filter(name.clone(), None);
            self.bus.emit(&Event::FilterClear { name });
        }
    }

    // --- collection / loading --------------------------------------------------------------

    /// Ensures the current virtual range is loaded, respecting the scrolling manager's
    /// velocity-driven cancellation predicate, and emits `ItemsSet`/`TotalItemsChanged` plus
    /// `RangeLoaded`/`RangeFailed` for the range this call covered.
    pub async fn ensure_visible_range_loaded(&mut self) -> Result<(), ListError> {
        let range = self.viewport.virtual_range();
        let should_cancel = self.viewport.should_cancel_loads();
        let had_items = self.collection.total_items() > 0;

        let result = self.collection.ensure_range(range, should_cancel).await;

        let total = self.collection.total_items();
        self.bus.emit(&Event::TotalItemsChanged { total });
        if !had_items && total > 0 {
            self.bus.emit(&Event::ItemsSet { total });
        }

        let key_debug: Arc<str> = Arc::from(format!("{}..{}", range.start_index, range.end_index));
        match &result {
            Ok(()) => self.bus.emit(&Event::RangeLoaded { key_debug }),
            Err(err) => self.bus.emit(&Event::RangeFailed { key_debug, message: Arc::from(err.to_string()) }),
        }
        result
    }

    /// Recomputes `(count, position, progress)` and emits `Event::StatsChanged` on an actual
    /// diff, matching `enhancers::stats`'s no-spurious-emit contract.
    pub fn refresh_stats(&mut self) {
        let visible = self.viewport.visible_range();
        let recomputed = self
            .stats
            .borrow_mut()
            .recompute(self.collection.total_items(), visible.start_index);
        if let Some(stats) = recomputed {
            self.bus.emit(&Event::StatsChanged {
                count: stats.count,
                position: stats.position,
                progress: stats.progress,
            });
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats.borrow().current()
    }

    /// Feeds a velocity snapshot to the display enhancer and the event bus together, since both
    /// observe the same tick.
    pub fn on_velocity_tick(&mut self) {
        let snapshot = self.viewport.velocity();
        self.velocity_display.borrow_mut().on_velocity(snapshot);
        self.bus.emit(&Event::Velocity(snapshot));
        if snapshot.is_idle {
            self.velocity_display.borrow_mut().on_idle();
            self.bus.emit(&Event::Idle);
        }
    }

    pub fn velocity_display(&self) -> Ref<'_, VelocityDisplay> {
        self.velocity_display.borrow()
    }

    // --- scroll restore / reload -------------------------------------------------------------

    pub fn set_pending_scroll(&mut self, position: u64, select_id: Option<String>) {
        self.scroll_restore.borrow_mut().set_pending_scroll(position, select_id);
        self.bus.emit(&Event::ScrollRestorePending);
    }

    pub fn set_pending_scroll_with_lookup(
        &mut self,
        id: impl Into<String>,
        alt_id: Option<String>,
        fallback_position: Option<u64>,
        lookup: futures::future::LocalBoxFuture<'static, Option<usize>>,
    ) {
        self.scroll_restore
            .borrow_mut()
            .set_pending_scroll_with_lookup(id, alt_id, fallback_position, lookup);
        self.bus.emit(&Event::ScrollRestorePending);
    }

    /// Reloads the collection from scratch. Emits `ReloadStart`, then resolves any pending
    /// scroll-restore target (awaiting a lookup future if one is queued) and applies it,
    /// emitting `ScrollRestoreApplied`/`ScrollRestoreCleared` to match spec's reload-override
    /// contract.
    pub async fn reload(&mut self) -> Result<(), ListError> {
        self.bus.emit(&Event::ReloadStart);

        let had_pending = self.scroll_restore.borrow().has_pending();
        let target = self.scroll_restore.borrow_mut().resolve().await;
        self.collection.reload();

        match target {
            Some(PendingScrollTarget::Offset { offset, select_id }) => {
                self.apply_scroll_restore(offset, select_id);
            }
            Some(PendingScrollTarget::Index { index, select_id }) => {
                let offset = self.viewport.scroll_to_index(index, Align::Start);
                self.apply_scroll_restore(offset, select_id);
            }
            None => {
                if had_pending {
                    self.bus.emit(&Event::ScrollRestoreCleared);
                }
            }
        }
        Ok(())
    }

    fn apply_scroll_restore(&mut self, offset: u64, select_id: Option<String>) {
        self.viewport.set_scroll_offset_clamped(offset);
        self.bus.emit(&Event::ScrollRestoreApplied { position: offset, select_id });
        if self.scroll_restore.borrow().auto_clear() && !self.scroll_restore.borrow().has_pending() {
            self.bus.emit(&Event::ScrollRestoreCleared);
        }
    }

    // --- lifecycle -----------------------------------------------------------------------------

    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.bus.emit(&Event::Destroyed);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl<T, K, H> List<T, K, H>
where
    T: Send + Sync + 'static,
    K: ViewportKey + Clone + Ord + core::fmt::Debug + 'static,
    H: Clone + Default,
{
    /// Syncs the render pool to the current virtual range, emitting `RenderError` for any index
    /// whose `instantiate`/`recycle` callback fails (the element keeps a default placeholder
    /// handle rather than leaving a gap), then `ViewportRendered` for the whole range.
    pub fn sync_render(
        &mut self,
        mut instantiate: impl FnMut(usize) -> Result<H, String>,
        mut recycle: impl FnMut(H, usize) -> Result<H, String>,
    ) -> SyncPlan<H> {
        let range = self.viewport.virtual_range();
        let bus = &self.bus;
        let plan = self.render_pool.sync(
            range,
            true,
            |i| {
                instantiate(i).unwrap_or_else(|message| {
                    bus.emit(&Event::RenderError { index: i });
                    vwarn!("instantiate failed for index {i}: {message}");
                    H::default()
                })
            },
            |h, i| {
                recycle(h, i).unwrap_or_else(|message| {
                    bus.emit(&Event::RenderError { index: i });
                    vwarn!("recycle failed for index {i}: {message}");
                    H::default()
                })
            },
        );
        self.bus.emit(&Event::ViewportRendered { range });
        plan
    }

    pub fn render_pool(&self) -> &RenderPool<H> {
        &self.render_pool
    }
}
