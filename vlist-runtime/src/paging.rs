use std::collections::BTreeSet;

/// One unit of work for an [`crate::adapter::Adapter`]: exactly one paging strategy is active
/// per coordinator (offset, page, or cursor), never a mix.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PagingKey {
    Offset { offset: u64, limit: u32 },
    Page { page: u32, limit: u32 },
    Cursor { cursor: String },
}

/// Tracks which paging keys have completed and which are currently in flight.
///
/// Invariant: a key is in at most one of `loaded` / `in_flight` at a time.
#[derive(Debug, Default, Clone)]
pub struct LoadedRangeSet {
    loaded: BTreeSet<PagingKey>,
    in_flight: BTreeSet<PagingKey>,
}

impl LoadedRangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, key: &PagingKey) -> bool {
        self.loaded.contains(key)
    }

    pub fn is_in_flight(&self, key: &PagingKey) -> bool {
        self.in_flight.contains(key)
    }

    /// Returns `true` if `key` needs a request issued (not loaded, not already in flight).
    pub fn needs_request(&self, key: &PagingKey) -> bool {
        !self.loaded.contains(key) && !self.in_flight.contains(key)
    }

    pub fn mark_in_flight(&mut self, key: PagingKey) {
        self.in_flight.insert(key);
    }

    pub fn mark_loaded(&mut self, key: &PagingKey) {
        self.in_flight.remove(key);
        self.loaded.insert(key.clone());
    }

    pub fn mark_failed(&mut self, key: &PagingKey) {
        self.in_flight.remove(key);
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
        self.in_flight.clear();
    }

    pub fn loaded_len(&self) -> usize {
        self.loaded.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}
