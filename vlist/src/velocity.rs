use alloc::collections::VecDeque;

/// Configuration for the scrolling manager's velocity tracker.
///
/// Velocity is not used by the range math itself; it exists so a collection coordinator can
/// decide whether to cancel in-flight loads for ranges that are about to scroll past before they
/// would ever be rendered (see [`crate::Viewport::should_cancel_loads`]).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VelocityOptions {
    /// Size of the sliding sample window, in milliseconds.
    pub window_ms: u64,
    /// Smoothing factor in `(0.0, 1.0]` applied to the windowed speed on every sample.
    ///
    /// `1.0` disables smoothing (the smoothed speed always equals the windowed speed).
    pub smoothing: f32,
    /// Per-tick multiplicative decay applied to the smoothed speed when no new sample arrives.
    pub idle_decay: f32,
    /// Speed (px/ms) above which [`crate::Viewport::should_cancel_loads`] returns `true`.
    pub cancel_load_threshold: f32,
}

impl Default for VelocityOptions {
    fn default() -> Self {
        Self {
            window_ms: 100,
            smoothing: 0.35,
            idle_decay: 0.90,
            cancel_load_threshold: 2.0,
        }
    }
}

/// A snapshot of the scrolling manager's current velocity state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VelocitySnapshot {
    /// Instantaneous speed over the sliding window, in pixels/ms. Always non-negative.
    pub windowed_speed: f32,
    /// Exponentially-smoothed speed, in pixels/ms. Always non-negative.
    pub smoothed_speed: f32,
    /// `true` if the most recent samples moved the offset forward (increasing).
    pub direction_forward: Option<bool>,
    /// `true` if `smoothed_speed` increased since the previous sample, `false` if it decreased.
    pub accelerating: Option<bool>,
    pub is_idle: bool,
}

#[derive(Clone, Debug)]
struct Sample {
    at_ms: u64,
    position: u64,
}

/// Tracks scroll velocity over a sliding time window.
///
/// Fed by [`crate::Viewport::notify_scroll_event`] and decayed by
/// [`crate::Viewport::update_scrolling`]; not a public construction point on its own, but exposed
/// so a host can read `Viewport::velocity()` every frame.
#[derive(Clone, Debug)]
pub struct VelocityTracker {
    options: VelocityOptions,
    samples: VecDeque<Sample>,
    smoothed_speed: f32,
    prev_smoothed_speed: f32,
    direction_forward: Option<bool>,
    last_tick_ms: Option<u64>,
}

impl VelocityTracker {
    pub(crate) fn new(options: VelocityOptions) -> Self {
        Self {
            options,
            samples: VecDeque::new(),
            smoothed_speed: 0.0,
            prev_smoothed_speed: 0.0,
            direction_forward: None,
            last_tick_ms: None,
        }
    }

    pub(crate) fn set_options(&mut self, options: VelocityOptions) {
        self.options = options;
    }

    /// Records a new `(time, position)` sample and recomputes windowed + smoothed speed.
    pub(crate) fn record(&mut self, now_ms: u64, position: u64) {
        if let Some(prev) = self.samples.back() {
            if now_ms > prev.at_ms {
                self.direction_forward = Some(position > prev.position);
            }
        }
        self.samples.push_back(Sample {
            at_ms: now_ms,
            position,
        });
        self.last_tick_ms = Some(now_ms);
        self.prune(now_ms);
        self.recompute();
    }

    /// Applies idle decay when no new sample has arrived since the last tick.
    pub(crate) fn tick(&mut self, now_ms: u64) {
        self.prune(now_ms);
        if self.samples.len() <= 1 {
            self.prev_smoothed_speed = self.smoothed_speed;
            self.smoothed_speed *= self.options.idle_decay;
            if self.smoothed_speed < 0.001 {
                self.smoothed_speed = 0.0;
                self.direction_forward = None;
            }
        }
        self.last_tick_ms = Some(now_ms);
    }

    fn prune(&mut self, now_ms: u64) {
        let window = self.options.window_ms;
        while let Some(front) = self.samples.front() {
            if now_ms.saturating_sub(front.at_ms) > window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    fn recompute(&mut self) {
        self.prev_smoothed_speed = self.smoothed_speed;
        let windowed = self.windowed_speed();
        let alpha = self.options.smoothing.clamp(0.0, 1.0);
        self.smoothed_speed = alpha * windowed + (1.0 - alpha) * self.smoothed_speed;
    }

    fn windowed_speed(&self) -> f32 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        if first.at_ms == last.at_ms {
            return 0.0;
        }
        let dt = (last.at_ms - first.at_ms) as f32;
        let dp = (last.position as i128 - first.position as i128).unsigned_abs() as f32;
        dp / dt
    }

    fn acceleration_sign(&self) -> Option<bool> {
        if self.smoothed_speed > self.prev_smoothed_speed {
            Some(true)
        } else if self.smoothed_speed < self.prev_smoothed_speed {
            Some(false)
        } else {
            None
        }
    }

    pub(crate) fn snapshot(&self) -> VelocitySnapshot {
        VelocitySnapshot {
            windowed_speed: self.windowed_speed(),
            smoothed_speed: self.smoothed_speed,
            direction_forward: self.direction_forward,
            accelerating: self.acceleration_sign(),
            is_idle: self.smoothed_speed <= 0.0,
        }
    }

    pub(crate) fn should_cancel_loads(&self) -> bool {
        self.smoothed_speed >= self.options.cancel_load_threshold
    }
}
