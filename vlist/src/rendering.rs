use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::VirtualRange;

/// The result of one [`RenderPool::sync`] call: what a host must do to its DOM/scene-graph to
/// match the new render range.
///
/// Apply in order: `retired` first (detach), then `entered` (attach/recycle), then `reorders`
/// (reposition), so a host can fold this into a single pass over its element tree.
#[derive(Clone, Debug, Default)]
pub struct SyncPlan<H> {
    /// Handles that left the render range and were not kept in the internal free list.
    pub retired: Vec<H>,
    /// `(index, handle)` pairs newly instantiated or recycled into the render range.
    pub entered: Vec<(usize, H)>,
    /// Present only when `maintain_dom_order` is enabled: `(index, after)` pairs describing the
    /// index that should now be positioned immediately after `after` (or at the front, if
    /// `None`), covering the full render range in order.
    pub reorders: Vec<(usize, Option<usize>)>,
}

/// A recycling pool of rendered-element handles, keyed by item index.
///
/// `RenderPool` never constructs or destroys UI objects itself -- it only decides which index
/// keeps its existing handle, which index should reuse a handle retired by a previous sync, and
/// which indexes must be freshly instantiated. `H` is any cheaply-clonable handle your host
/// chooses to represent a mounted element (a DOM node id, a `NodeId` in a retained-mode GUI tree,
/// a row index into a TUI cell buffer, etc) -- the pool only ever moves these values around, it
/// never inspects or owns the element the handle refers to.
pub struct RenderPool<H> {
    mounted: BTreeMap<usize, H>,
    free: Vec<H>,
    maintain_dom_order: bool,
}

impl<H> Default for RenderPool<H> {
    fn default() -> Self {
        Self {
            mounted: BTreeMap::new(),
            free: Vec::new(),
            maintain_dom_order: true,
        }
    }
}

impl<H: Clone> RenderPool<H> {
    pub fn new(maintain_dom_order: bool) -> Self {
        Self {
            mounted: BTreeMap::new(),
            free: Vec::new(),
            maintain_dom_order,
        }
    }

    pub fn maintain_dom_order(&self) -> bool {
        self.maintain_dom_order
    }

    pub fn set_maintain_dom_order(&mut self, maintain: bool) {
        self.maintain_dom_order = maintain;
    }

    /// Number of handles currently mounted (inside the last synced range).
    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    /// Number of retired handles sitting in the free list, available for reuse.
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    pub fn handle_for(&self, index: usize) -> Option<&H> {
        self.mounted.get(&index)
    }

    /// Drops every mounted handle into the free list (or returns them as retired, if
    /// `keep_in_free_list` is `false`). Use when tearing down a list entirely.
    pub fn clear(&mut self, keep_in_free_list: bool) -> Vec<H> {
        let mounted = core::mem::take(&mut self.mounted);
        if keep_in_free_list {
            self.free.extend(mounted.into_values());
            Vec::new()
        } else {
            mounted.into_values().collect()
        }
    }

    /// Reconciles the pool against a new render range.
    ///
    /// - Indexes already mounted keep their handle (no-op, not reported in the plan).
    /// - Indexes newly entering the range reuse a handle from the free list via `recycle`, or
    ///   call `instantiate` if the free list is empty.
    /// - Indexes leaving the range are retired: kept in the internal free list (available to
    ///   `recycle` on a later call) when `keep_in_free_list` is `true`, otherwise returned via
    ///   [`SyncPlan::retired`] for the caller to dispose of.
    pub fn sync(
        &mut self,
        render_range: VirtualRange,
        keep_in_free_list: bool,
        mut instantiate: impl FnMut(usize) -> H,
        mut recycle: impl FnMut(H, usize) -> H,
    ) -> SyncPlan<H> {
        let mut plan = SyncPlan::default();

        let stale: Vec<usize> = self
            .mounted
            .keys()
            .copied()
            .filter(|i| *i < render_range.start_index || *i >= render_range.end_index)
            .collect();
        for index in stale {
            let handle = self
                .mounted
                .remove(&index)
                .expect("index came from mounted.keys()");
            if keep_in_free_list {
                self.free.push(handle);
            } else {
                plan.retired.push(handle);
            }
        }

        if render_range.is_empty() {
            return plan;
        }

        let mut prev: Option<usize> = None;
        for index in render_range.start_index..render_range.end_index {
            if !self.mounted.contains_key(&index) {
                let handle = match self.free.pop() {
                    Some(reused) => recycle(reused, index),
                    None => instantiate(index),
                };
                self.mounted.insert(index, handle.clone());
                plan.entered.push((index, handle));
            }
            if self.maintain_dom_order {
                plan.reorders.push((index, prev));
            }
            prev = Some(index);
        }

        plan
    }
}
