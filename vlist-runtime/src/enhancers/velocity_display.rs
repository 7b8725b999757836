use std::cell::RefCell;
use std::collections::VecDeque;

use vlist::VelocitySnapshot;

use crate::error::ListError;
use crate::event::EventBus;
use crate::feature::Capability;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityDisplayOptions {
    /// When set, `average_speed` drops samples outside `[min_for_average, max_for_average]`
    /// before averaging, filtering out scrollbar-drag outliers.
    pub min_for_average: Option<f32>,
    pub max_for_average: Option<f32>,
    pub window_len: usize,
}

impl Default for VelocityDisplayOptions {
    fn default() -> Self {
        Self {
            min_for_average: None,
            max_for_average: None,
            window_len: 10,
        }
    }
}

/// Subscribes to `Event::Velocity`/`Event::Idle` and exposes a display-friendly windowed average,
/// separate from `vlist`'s own smoothing (which optimizes for cancellation decisions, not UI).
#[derive(Clone, Debug, Default)]
pub struct VelocityDisplay {
    options: VelocityDisplayOptions,
    samples: VecDeque<f32>,
    latest: Option<VelocitySnapshot>,
}

impl VelocityDisplay {
    pub fn new(options: VelocityDisplayOptions) -> Self {
        Self {
            options,
            samples: VecDeque::new(),
            latest: None,
        }
    }

    pub fn on_velocity(&mut self, snapshot: VelocitySnapshot) {
        let speed = snapshot.smoothed_speed;
        let in_range = self.options.min_for_average.is_none_or(|min| speed >= min)
            && self.options.max_for_average.is_none_or(|max| speed <= max);
        if in_range {
            self.samples.push_back(speed);
            while self.samples.len() > self.options.window_len {
                self.samples.pop_front();
            }
        }
        self.latest = Some(snapshot);
    }

    pub fn on_idle(&mut self) {
        self.samples.clear();
        self.latest = None;
    }

    pub fn latest(&self) -> Option<VelocitySnapshot> {
        self.latest
    }

    pub fn average_speed(&self) -> f32 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f32>() / self.samples.len() as f32
        }
    }
}

#[async_trait::async_trait(?Send)]
impl Capability for RefCell<VelocityDisplay> {
    fn stage(&self) -> &'static str {
        "velocity"
    }
    fn provides(&self) -> &'static [&'static str] {
        &["velocity"]
    }
    fn requires(&self) -> &'static [&'static str] {
        &["stats"]
    }
    async fn init(&self, _bus: &EventBus) -> Result<(), ListError> {
        Ok(())
    }
}
