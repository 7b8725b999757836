use std::cell::RefCell;

use crate::error::ListError;
use crate::event::EventBus;
use crate::feature::Capability;

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOptions {
    pub debounce_ms: u64,
    pub min_length: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_length: 1,
        }
    }
}

/// Debounced query state. The coordinator reads [`Search::query`] on every adapter read, so a
/// keystroke only takes effect once `tick` has let `debounce_ms` elapse since the last change.
#[derive(Clone, Debug, Default)]
pub struct Search {
    options: SearchOptions,
    pending: Option<String>,
    last_change_ms: u64,
    applied: Option<String>,
}

impl Search {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            pending: None,
            last_change_ms: 0,
            applied: None,
        }
    }

    /// Records a new raw query value at `now_ms`. Does not take effect until `tick` observes
    /// `debounce_ms` of quiet time.
    pub fn set_raw_query(&mut self, raw: impl Into<String>, now_ms: u64) {
        self.pending = Some(raw.into());
        self.last_change_ms = now_ms;
    }

    /// Advances the debounce timer. Returns `Some(query)` exactly once, the moment a pending
    /// query becomes applied.
    pub fn tick(&mut self, now_ms: u64) -> Option<Option<String>> {
        let pending = self.pending.as_ref()?;
        if now_ms.saturating_sub(self.last_change_ms) < self.options.debounce_ms {
            return None;
        }
        let normalized = if pending.len() >= self.options.min_length {
            Some(pending.clone())
        } else {
            None
        };
        self.pending = None;
        self.applied = normalized.clone();
        Some(normalized)
    }

    pub fn query(&self) -> Option<&str> {
        self.applied.as_deref()
    }
}

#[async_trait::async_trait(?Send)]
impl Capability for RefCell<Search> {
    fn stage(&self) -> &'static str {
        "search"
    }
    fn provides(&self) -> &'static [&'static str] {
        &["search"]
    }
    fn requires(&self) -> &'static [&'static str] {
        &["selection"]
    }
    async fn init(&self, _bus: &EventBus) -> Result<(), ListError> {
        Ok(())
    }
}
