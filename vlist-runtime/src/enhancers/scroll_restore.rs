use std::cell::RefCell;

use futures::future::LocalBoxFuture;

use crate::error::ListError;
use crate::event::EventBus;
use crate::feature::Capability;

/// A scroll position to restore once a condition is met, optionally resolved by looking up an
/// ID's current index (e.g. "restore to wherever item X ended up after a reload").
pub enum PendingScroll {
    Offset {
        offset: u64,
        select_id: Option<String>,
    },
    Lookup {
        id: String,
        alt_id: Option<String>,
        fallback_position: Option<u64>,
        lookup: LocalBoxFuture<'static, Option<usize>>,
    },
}

/// Captures a scroll position before a reload and restores it after, instead of the coordinator
/// snapping back to the top.
#[derive(Default)]
pub struct ScrollRestore {
    pending: Option<PendingScroll>,
    auto_clear: bool,
}

impl ScrollRestore {
    pub fn new(auto_clear: bool) -> Self {
        Self {
            pending: None,
            auto_clear,
        }
    }

    /// `setPendingScroll({position, selectId?})`.
    pub fn set_pending_scroll(&mut self, position: u64, select_id: Option<String>) {
        self.pending = Some(PendingScroll::Offset { offset: position, select_id });
    }

    /// `setPendingScrollWithLookup({id, altId?, lookupPosition, fallbackPosition?})`. The caller
    /// has already called `lookupPosition(id)`; this stores the resulting future to await once,
    /// in [`Self::resolve`] — the one suspension point scroll-restore needs.
    pub fn set_pending_scroll_with_lookup(
        &mut self,
        id: impl Into<String>,
        alt_id: Option<String>,
        fallback_position: Option<u64>,
        lookup: LocalBoxFuture<'static, Option<usize>>,
    ) {
        self.pending = Some(PendingScroll::Lookup {
            id: id.into(),
            alt_id,
            fallback_position,
            lookup,
        });
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Resolves any pending scroll to a concrete target.
    ///
    /// `Offset` targets resolve synchronously and, when `auto_clear` is `false`, are re-armed so
    /// a later reload reapplies the same position. `Lookup` targets await the stored future once
    /// — since a future can't be replayed, a lookup is always consumed here regardless of
    /// `auto_clear`, falling back to `fallback_position` when the lookup resolves to `None`.
    pub async fn resolve(&mut self) -> Option<PendingScrollTarget> {
        match self.pending.take()? {
            PendingScroll::Offset { offset, select_id } => {
                if !self.auto_clear {
                    self.pending = Some(PendingScroll::Offset {
                        offset,
                        select_id: select_id.clone(),
                    });
                }
                Some(PendingScrollTarget::Offset { offset, select_id })
            }
            PendingScroll::Lookup { id, alt_id, fallback_position, lookup } => match lookup.await {
                Some(index) => Some(PendingScrollTarget::Index {
                    index,
                    select_id: Some(id),
                }),
                None => fallback_position.map(|offset| PendingScrollTarget::Offset {
                    offset,
                    select_id: alt_id.or(Some(id)),
                }),
            },
        }
    }

    pub fn auto_clear(&self) -> bool {
        self.auto_clear
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingScrollTarget {
    Offset { offset: u64, select_id: Option<String> },
    Index { index: usize, select_id: Option<String> },
}

#[async_trait::async_trait(?Send)]
impl Capability for RefCell<ScrollRestore> {
    fn stage(&self) -> &'static str {
        "scroll-restore"
    }
    fn provides(&self) -> &'static [&'static str] {
        &["scroll-restore"]
    }
    fn requires(&self) -> &'static [&'static str] {
        &["velocity"]
    }
    async fn init(&self, _bus: &EventBus) -> Result<(), ListError> {
        vdebug!("scroll-restore enhancer initialized, auto_clear={}", self.borrow().auto_clear());
        Ok(())
    }
}
