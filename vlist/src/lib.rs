//! A headless virtual list engine: range math, scrolling, a synthetic scrollbar, and a
//! recycling render pool.
//!
//! For collection coordination, placeholders, and composable feature enhancers, see the
//! `vlist-runtime` crate.
//!
//! This crate focuses on the core algorithms needed to render massive lists at interactive
//! frame rates: prefix sums over item sizes, fast offset → index lookup, overscanned visible
//! ranges, optional dynamic measurement, velocity-aware scrolling, and a thumb/track model for
//! datasets whose virtual length would exceed a host scroll container's usable range.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - viewport size (height/width)
//! - scroll offset
//! - item size estimates and (optionally) dynamic measurements
//! - opaque element handles for [`RenderPool`] to recycle
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod emitter;
mod fenwick;
mod key;
mod options;
mod rendering;
mod scrolling;
mod state;
mod types;
mod velocity;

// Floating-point rounding (`f64::round`) needs `std`'s libm bindings; the rest of this crate is
// integer-only and stays no_std-compatible.
#[cfg(feature = "std")]
mod scrollbar;

#[cfg(test)]
mod tests;

pub use emitter::IndexEmitter;
pub use options::{
    InitialOffset, OnChangeCallback, RangeExtractor,
    ShouldAdjustScrollPositionOnItemSizeChangeCallback, ViewportOptions,
};
pub use rendering::{RenderPool, SyncPlan};
#[cfg(feature = "std")]
pub use scrollbar::{ScrollbarGeometry, ScrollbarOptions, SyntheticScrollbar, TrackClick};
pub use scrolling::Viewport;
pub use state::{FrameState, ScrollState, ViewportState};
pub use types::{
    Align, ItemKey, Range, Rect, ScrollDirection, VirtualItem, VirtualItemKeyed, VirtualRange,
};
pub use velocity::{VelocitySnapshot, VelocityTracker};

#[doc(hidden)]
pub use key::KeyCacheKey;
