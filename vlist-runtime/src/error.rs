use crate::paging::PagingKey;

/// Errors surfaced by the collection coordinator and feature framework.
///
/// `vlist`'s own math never fails (invalid input is clamped, not rejected), so only this crate
/// has an error type. Recoverable kinds travel as [`crate::event::Event`] payloads; the
/// misconfiguration kinds are logged once via `vwarn!` and otherwise swallowed rather than
/// panicking, since a degraded list is preferable to an aborted one.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ListError {
    #[error("adapter read failed for {key:?}: {message}")]
    AdapterFailed { key: PagingKey, message: String },

    #[error("range still missing after load completed: {start}..{end}")]
    RangeMissingAfterLoad { start: usize, end: usize },

    #[error("template/render callback failed for index {index}: {message}")]
    TemplateFailed { index: usize, message: String },

    #[error("layout is missing a container slot")]
    ContainerMissing,

    #[error("layout is missing a \"viewport\" slot")]
    ViewportMissingInLayout,

    #[error("selection is unavailable: {reason}")]
    SelectionUnavailable { reason: String },

    #[error("cursor jumped past the loaded range: requested {requested}, loaded up to {loaded}")]
    CursorJumpExceeded { requested: usize, loaded: usize },
}
