/// Configuration for [`SyntheticScrollbar`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollbarOptions {
    /// Minimum thumb length, in track pixels, regardless of how small `viewport/total` is.
    pub min_thumb_size: u32,
    /// Scroll ratio (`[0.0, 1.0]`) above which the thumb snaps to the end of the track.
    ///
    /// This absorbs floating point error in compressed mode, where `total_size()` may exceed
    /// the platform's reliable scroll-offset precision.
    pub end_snap_threshold: f64,
}

impl Default for ScrollbarOptions {
    fn default() -> Self {
        Self {
            min_thumb_size: 16,
            end_snap_threshold: 0.999,
        }
    }
}

/// The thumb/track geometry for one frame, in track pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollbarGeometry {
    pub track_size: u32,
    pub thumb_size: u32,
    pub thumb_offset: u32,
    /// `true` when the reported total size is capped (`Viewport::is_compressed()`), i.e. when
    /// `ratio_to_start_index`/`index_to_ratio` must be used instead of pixel offsets.
    pub compressed: bool,
}

/// Where a track click landed relative to the thumb.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackClick {
    Before,
    After,
}

/// A synthetic scrollbar for datasets whose virtual length may exceed what a host scroll
/// container can represent.
///
/// This type is pure geometry/ratio math; it does not own a `Viewport` or any UI handle. Feed it
/// `(total_size, reported_total_size, viewport_size, scroll_offset, track_size)` read from a
/// `Viewport` each frame, and read back track-pixel geometry or (in compressed mode) a
/// ratio-to-index mapping.
///
/// Grounded on the thumb/track ratio math used by pixel-based scrollbars with oversized content:
/// the thumb size is proportional to `viewport / reported_total`, and the thumb's *offset* is
/// proportional to `scroll_offset / max_scroll_offset` -- exactly as for an uncompressed
/// scrollbar, except `max_scroll_offset` here is computed from the reported (capped) total so the
/// thumb never runs out of track before the user reaches the real end of the list.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntheticScrollbar {
    options: ScrollbarOptions,
}

impl SyntheticScrollbar {
    pub fn new(options: ScrollbarOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ScrollbarOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ScrollbarOptions) {
        self.options = options;
    }

    /// Computes thumb/track geometry in track pixels.
    ///
    /// `reported_total` is `Viewport::reported_total_size()`; `compressed` is
    /// `Viewport::is_compressed()`.
    pub fn geometry(
        &self,
        reported_total: u64,
        viewport_size: u32,
        scroll_offset: u64,
        max_scroll_offset: u64,
        track_size: u32,
        compressed: bool,
    ) -> ScrollbarGeometry {
        if reported_total == 0 || track_size == 0 || viewport_size as u64 >= reported_total {
            return ScrollbarGeometry {
                track_size,
                thumb_size: track_size,
                thumb_offset: 0,
                compressed,
            };
        }

        let visible_ratio = (viewport_size as f64 / reported_total as f64).min(1.0);
        let thumb_size = ((visible_ratio * track_size as f64).round() as u32)
            .max(self.options.min_thumb_size)
            .min(track_size);

        let usable_track = track_size.saturating_sub(thumb_size);
        let ratio = if max_scroll_offset == 0 {
            0.0
        } else {
            (scroll_offset as f64 / max_scroll_offset as f64).clamp(0.0, 1.0)
        };
        let thumb_offset = (ratio * usable_track as f64).round() as u32;

        ScrollbarGeometry {
            track_size,
            thumb_size,
            thumb_offset: thumb_offset.min(usable_track),
            compressed,
        }
    }

    /// Converts a drag/track-click position (in track pixels) back into a scroll ratio in
    /// `[0.0, 1.0]`.
    pub fn offset_to_ratio(&self, pointer_offset: u32, thumb_size: u32, track_size: u32) -> f64 {
        let usable_track = track_size.saturating_sub(thumb_size);
        if usable_track == 0 {
            return 0.0;
        }
        (pointer_offset.min(usable_track) as f64 / usable_track as f64).clamp(0.0, 1.0)
    }

    /// Converts a scroll ratio back into an absolute scroll offset.
    ///
    /// For uncompressed scrollbars this is the only conversion you need: the returned offset can
    /// be passed directly to `Viewport::set_scroll_offset_clamped`.
    pub fn ratio_to_offset(&self, ratio: f64, max_scroll_offset: u64) -> u64 {
        let ratio = self.snap(ratio);
        (ratio * max_scroll_offset as f64).round() as u64
    }

    /// In compressed mode, converts a scroll ratio directly into a target start index.
    ///
    /// `count` is `Viewport::count()`; `items_per_viewport` is an estimate of how many items fit
    /// in one viewport (e.g. `viewport_size / estimated_item_size`). The returned index should be
    /// passed to `Viewport::scroll_to_index(index, Align::Start)` rather than to a pixel offset,
    /// since pixel offsets lose precision once the real total exceeds the reported cap.
    pub fn ratio_to_start_index(&self, ratio: f64, count: usize, items_per_viewport: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let ratio = self.snap(ratio);
        let max_start_index = count.saturating_sub(items_per_viewport.max(1));
        ((ratio * max_start_index as f64).round() as usize).min(max_start_index)
    }

    /// In compressed mode, converts a current start index back into a scroll ratio (e.g. to
    /// position the thumb after an index-based scroll, such as `scroll_to_index`).
    pub fn start_index_to_ratio(&self, start_index: usize, count: usize, items_per_viewport: usize) -> f64 {
        let max_start_index = count.saturating_sub(items_per_viewport.max(1));
        if max_start_index == 0 {
            return 0.0;
        }
        (start_index as f64 / max_start_index as f64).clamp(0.0, 1.0)
    }

    fn snap(&self, ratio: f64) -> f64 {
        let ratio = ratio.clamp(0.0, 1.0);
        if ratio >= self.options.end_snap_threshold {
            1.0
        } else {
            ratio
        }
    }

    /// Classifies a track click at `pointer_offset` relative to the current thumb.
    pub fn classify_track_click(&self, pointer_offset: u32, thumb_offset: u32, thumb_size: u32) -> TrackClick {
        if pointer_offset < thumb_offset {
            TrackClick::Before
        } else if pointer_offset >= thumb_offset.saturating_add(thumb_size) {
            TrackClick::After
        } else {
            // Inside the thumb: callers normally start a drag rather than treat this as a click.
            TrackClick::After
        }
    }
}
