//! Collection coordination, placeholders, and composable feature enhancers for the `vlist`
//! crate.
//!
//! `vlist` is UI-agnostic and focuses on the core math and state; it never awaits anything. This
//! crate is the `std`-only layer above it that does the things a real list needs and `vlist`
//! deliberately does not: async paged loading with velocity-aware cancellation
//! ([`collection`]), placeholder rows for not-yet-loaded items ([`placeholder`]), a shared event
//! bus and named-layout registry ([`event`], [`layout`]), a fixed-order capability pipeline for
//! composing independent feature enhancers ([`feature`], [`enhancers`]), plus the original
//! adapter-level helpers (scroll anchoring, tween-driven smooth scrolling).
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod adapter;
mod anchor;
mod collection;
mod controller;
mod error;
mod event;
mod feature;
mod key;
mod layout;
mod list;
mod paging;
mod tween;

pub mod enhancers;

#[cfg(feature = "serde_json")]
mod placeholder;


pub use adapter::{
    Adapter, AdapterRequest, AdapterResponse, FilterValue, ResponseMeta, SortDirection, SortKey,
};
pub use anchor::{ScrollAnchor, apply_anchor, capture_first_visible_anchor};
pub use collection::{CollectionCoordinator, CollectionOptions, IdExtractor, PagingStrategy};
pub use controller::Controller;
pub use error::ListError;
pub use event::{Event, EventBus};
pub use feature::{Capability, CoreCapability, Pipeline, STAGE_ORDER};
pub use key::ViewportKey;
pub use layout::{LayoutNode, LayoutRegistry, LayoutSlot};
pub use list::{List, ListOptions};
pub use paging::{LoadedRangeSet, PagingKey};
pub use tween::{Easing, Tween};

#[cfg(feature = "serde_json")]
pub use collection::json_id_extractor;
#[cfg(feature = "serde_json")]
pub use placeholder::{
    FieldProfile, FieldType, PlaceholderGenerator, PlaceholderMode, PlaceholderOptions,
    placeholder_id,
};
