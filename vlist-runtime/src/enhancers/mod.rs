//! Independent feature enhancers composed over the shared `EventBus`/`LayoutRegistry`, one
//! module per enhancer, matching the fixed stage order in [`crate::feature`].

pub mod filter;
pub mod scroll_restore;
pub mod search;
pub mod selection;
pub mod stats;
pub mod velocity_display;

pub use filter::Filters;
pub use scroll_restore::{PendingScroll, PendingScrollTarget, ScrollRestore};
pub use search::{Search, SearchOptions};
pub use selection::{Selection, SelectionMode, SelectionOptions};
pub use stats::{Stats, StatsTracker};
pub use velocity_display::{VelocityDisplay, VelocityDisplayOptions};
