use std::cell::RefCell;

use crate::error::ListError;
use crate::event::EventBus;
use crate::feature::Capability;

/// `(count, position, progress)`, recomputed whenever total items, loaded items, or the render
/// range change. Emits `Event::StatsChanged` only on an actual diff, never on every recompute.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    pub count: u64,
    pub position: u64,
    pub progress: f32,
}

#[derive(Clone, Debug, Default)]
pub struct StatsTracker {
    current: Stats,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Stats {
        self.current
    }

    /// Recomputes stats from the coordinator/viewport state. Returns `Some(new_stats)` only when
    /// the result differs from what was last reported.
    pub fn recompute(&mut self, total_items: u64, visible_start_index: usize) -> Option<Stats> {
        let position = visible_start_index as u64;
        let progress = if total_items == 0 {
            0.0
        } else {
            (position as f32 / total_items as f32).clamp(0.0, 1.0)
        };
        let next = Stats {
            count: total_items,
            position,
            progress,
        };
        if next == self.current {
            None
        } else {
            self.current = next;
            Some(next)
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Capability for RefCell<StatsTracker> {
    fn stage(&self) -> &'static str {
        "stats"
    }
    fn provides(&self) -> &'static [&'static str] {
        &["stats"]
    }
    fn requires(&self) -> &'static [&'static str] {
        &["filter"]
    }
    async fn init(&self, _bus: &EventBus) -> Result<(), ListError> {
        Ok(())
    }
}
