use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use vlist::VirtualRange;

use crate::adapter::{Adapter, AdapterRequest, FilterValue, SortKey};
use crate::error::ListError;
use crate::paging::{LoadedRangeSet, PagingKey};

/// Which paging strategy a coordinator speaks to its adapter with. Exactly one is active per
/// coordinator; a coordinator never mixes offset, page, and cursor requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PagingStrategy {
    Offset { limit: u32 },
    Page { limit: u32 },
    Cursor,
}

/// Extracts a stable removal-tracking ID from an item, trying `id` then `_id` for
/// `serde_json`-shaped items (spec's "accept either field name" resolution).
pub type IdExtractor<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

#[cfg(feature = "serde_json")]
pub fn json_id_extractor() -> IdExtractor<serde_json::Value> {
    Arc::new(|value: &serde_json::Value| {
        value
            .get("id")
            .or_else(|| value.get("_id"))
            .and_then(|v| v.as_str().map(str::to_owned).or_else(|| Some(v.to_string())))
    })
}

#[derive(Clone)]
pub struct CollectionOptions<T> {
    pub strategy: PagingStrategy,
    pub max_concurrent_requests: usize,
    pub pending_timeout_ms: u64,
    pub id_of: Option<IdExtractor<T>>,
}

impl<T> Default for CollectionOptions<T> {
    fn default() -> Self {
        Self {
            strategy: PagingStrategy::Offset { limit: 50 },
            max_concurrent_requests: 4,
            pending_timeout_ms: 5_000,
            id_of: None,
        }
    }
}

/// Coordinates async paged loads against an [`Adapter`], merging results into an index-keyed
/// store and exposing the total item count the virtual manager sizes itself from.
///
/// Never owns a `Viewport`; callers pass in whatever viewport state it needs
/// (`should_cancel_loads`) rather than this type reaching up into the scrolling layer.
pub struct CollectionCoordinator<T> {
    adapter: Arc<dyn Adapter<T>>,
    options: CollectionOptions<T>,
    loaded: LoadedRangeSet,
    items: BTreeMap<usize, T>,
    total_items: Option<u64>,
    search: Option<String>,
    filters: BTreeMap<String, FilterValue>,
    sort: Vec<SortKey>,
    generation: u64,
    next_cursor: Option<String>,
    cursor_exhausted: bool,
    pending_removals: BTreeMap<String, u64>,
}

impl<T: Send + Sync + 'static> CollectionCoordinator<T> {
    pub fn new(adapter: Arc<dyn Adapter<T>>, options: CollectionOptions<T>) -> Self {
        Self {
            adapter,
            options,
            loaded: LoadedRangeSet::new(),
            items: BTreeMap::new(),
            total_items: None,
            search: None,
            filters: BTreeMap::new(),
            sort: Vec::new(),
            generation: 0,
            next_cursor: None,
            cursor_exhausted: false,
            pending_removals: BTreeMap::new(),
        }
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
            .unwrap_or_else(|| self.items.keys().next_back().map_or(0, |i| *i as u64 + 1))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(&index)
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.items.contains_key(&index)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn request(&self) -> AdapterRequest {
        AdapterRequest {
            page: None,
            offset: None,
            limit: match self.options.strategy {
                PagingStrategy::Offset { limit } | PagingStrategy::Page { limit } => limit,
                PagingStrategy::Cursor => 50,
            },
            cursor: None,
            search: self.search.clone(),
            filters: self.filters.clone(),
            sort: self.sort.clone(),
        }
    }

    fn missing_keys(&self, range: VirtualRange) -> Vec<PagingKey> {
        let mut keys = Vec::new();
        match self.options.strategy {
            PagingStrategy::Offset { limit } => {
                let limit = limit.max(1);
                let mut offset = (range.start_index as u64 / limit as u64) * limit as u64;
                while offset < range.end_index as u64 {
                    let key = PagingKey::Offset { offset, limit };
                    if self.loaded.needs_request(&key) {
                        keys.push(key);
                    }
                    offset += limit as u64;
                }
            }
            PagingStrategy::Page { limit } => {
                let limit = limit.max(1) as usize;
                let first_page = (range.start_index / limit) as u32 + 1;
                let last_page = (range.end_index.saturating_sub(1) / limit) as u32 + 1;
                for page in first_page..=last_page {
                    let key = PagingKey::Page { page, limit: limit as u32 };
                    if self.loaded.needs_request(&key) {
                        keys.push(key);
                    }
                }
            }
            PagingStrategy::Cursor => {
                // Cursor mode has no random-access key space; readiness is driven by
                // `self.items.len()` against `range.end_index` in `ensure_range`.
            }
        }
        keys
    }

    /// Ensures items in `range` are loaded (or already in flight), issuing the minimal covering
    /// set of adapter reads. No-ops while `should_cancel_loads` is true, per the scrolling
    /// manager's velocity predicate.
    pub async fn ensure_range(&mut self, range: VirtualRange, should_cancel_loads: bool) -> Result<(), ListError> {
        if should_cancel_loads {
            return Ok(());
        }

        match self.options.strategy {
            PagingStrategy::Offset { .. } | PagingStrategy::Page { .. } => {
                self.ensure_range_concurrent(range).await
            }
            PagingStrategy::Cursor => self.ensure_range_cursor(range.end_index).await,
        }
    }

    async fn ensure_range_concurrent(&mut self, range: VirtualRange) -> Result<(), ListError> {
        let keys = self.missing_keys(range);
        if keys.is_empty() {
            return Ok(());
        }

        let generation = self.generation;
        let mut in_flight = FuturesUnordered::new();
        let mut remaining = keys.into_iter();
        let max_concurrent = self.options.max_concurrent_requests.max(1);

        for key in remaining.by_ref().take(max_concurrent) {
            self.loaded.mark_in_flight(key.clone());
            in_flight.push(self.dispatch(key));
        }

        let mut first_error = None;
        while let Some((key, result)) = in_flight.next().await {
            if generation != self.generation {
                // An explicit reload superseded this batch; discard rather than merge.
                self.loaded.mark_failed(&key);
                continue;
            }
            match result {
                Ok((items, offset, meta_total)) => {
                    self.merge_page(offset, items, meta_total);
                    self.loaded.mark_loaded(&key);
                }
                Err(err) => {
                    self.loaded.mark_failed(&key);
                    first_error.get_or_insert(err);
                }
            }

            if let Some(next_key) = remaining.next() {
                self.loaded.mark_in_flight(next_key.clone());
                in_flight.push(self.dispatch(next_key));
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn ensure_range_cursor(&mut self, end_index: usize) -> Result<(), ListError> {
        let generation = self.generation;
        while self.items.len() < end_index && !self.cursor_exhausted {
            let mut request = self.request();
            request.cursor = self.next_cursor.clone();
            let response = self.adapter.read(request).await?;

            if generation != self.generation {
                return Ok(());
            }

            let offset = self.items.len();
            self.next_cursor = response.cursor.clone();
            if response.cursor.is_none() {
                self.cursor_exhausted = true;
            }
            let meta_total = response.meta.and_then(|m| m.total);
            if response.items.is_empty() {
                self.cursor_exhausted = true;
            }
            self.merge_page(offset as u64, response.items, meta_total);
        }
        Ok(())
    }

    fn dispatch(
        &self,
        key: PagingKey,
    ) -> impl std::future::Future<Output = (PagingKey, Result<(Vec<T>, u64, Option<u64>), ListError>)> + use<T>
    {
        let adapter = Arc::clone(&self.adapter);
        let mut request = self.request();
        let offset = match &key {
            PagingKey::Offset { offset, limit } => {
                request.offset = Some(*offset);
                request.limit = *limit;
                *offset
            }
            PagingKey::Page { page, limit } => {
                request.page = Some(*page);
                request.limit = *limit;
                (*page as u64 - 1) * *limit as u64
            }
            PagingKey::Cursor { cursor } => {
                request.cursor = Some(cursor.clone());
                0
            }
        };
        let key_for_result = key.clone();
        async move {
            let result = adapter
                .read(request)
                .await
                .map(|response| (response.items, offset, response.meta.and_then(|m| m.total)));
            (key_for_result, result)
        }
    }

    fn merge_page(&mut self, offset: u64, items: Vec<T>, meta_total: Option<u64>) {
        for (i, item) in items.into_iter().enumerate() {
            if let Some(id_of) = &self.options.id_of {
                if let Some(id) = id_of(&item) {
                    if self.pending_removals.contains_key(&id) {
                        continue;
                    }
                }
            }
            let index = offset as usize + i;
            self.items.insert(index, item);
        }
        if let Some(total) = meta_total {
            self.total_items = Some(total);
        } else {
            let implied = self.items.keys().next_back().map_or(0, |i| *i as u64 + 1);
            self.total_items = Some(self.total_items.unwrap_or(0).max(implied));
        }
    }

    /// Full reset: cancels in-flight loads (via generation bump, discarding their results on
    /// arrival), clears loaded/item state, and re-issues an offset-0 load with the new query.
    pub fn set_search(&mut self, query: Option<String>) {
        self.search = query;
        self.reset_session();
    }

    pub fn set_filter(&mut self, name: impl Into<String>, value: Option<FilterValue>) {
        let name = name.into();
        match value {
            Some(v) if !v.is_empty() => {
                self.filters.insert(name, v);
            }
            _ => {
                self.filters.remove(&name);
            }
        }
        self.reset_session();
    }

    pub fn set_sort(&mut self, sort: Vec<SortKey>) {
        self.sort = sort;
        self.reset_session();
    }

    /// Explicit reload: bumps the generation so any still-in-flight batch from before this call
    /// is discarded on arrival instead of merged, then clears loaded state.
    pub fn reload(&mut self) {
        self.reset_session();
    }

    fn reset_session(&mut self) {
        self.generation += 1;
        self.loaded.clear();
        self.items.clear();
        self.total_items = None;
        self.next_cursor = None;
        self.cursor_exhausted = false;
    }

    /// Marks an item as pending removal (e.g. optimistic delete). It stays visible until
    /// `pending_timeout_ms` elapses or `confirm_removed` is called, whichever first.
    pub fn mark_pending_removal(&mut self, id: String, now_ms: u64) {
        self.pending_removals.insert(id, now_ms);
    }

    pub fn confirm_removed(&mut self, id: &str) {
        self.pending_removals.remove(id);
    }

    /// Expires pending removals older than `pending_timeout_ms`, given the host's current clock.
    pub fn expire_pending_removals(&mut self, now_ms: u64) {
        let timeout = self.options.pending_timeout_ms;
        self.pending_removals
            .retain(|_, removed_at| now_ms.saturating_sub(*removed_at) < timeout);
    }

    pub fn is_pending_removal(&self, id: &str) -> bool {
        self.pending_removals.contains_key(id)
    }
}
