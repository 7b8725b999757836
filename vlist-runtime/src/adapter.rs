use std::collections::BTreeMap;

use crate::error::ListError;

/// A value a filter control can hold.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
}

impl FilterValue {
    /// Empty-value normalization used by `enhancers::filter`: `null`/`""`/`[]` are not real
    /// filter values and should be removed from the control map rather than sent as-is.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::List(items) => items.is_empty(),
            FilterValue::Number(_) | FilterValue::Bool(_) => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Parameters an [`Adapter`] receives for a single paged read.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdapterRequest {
    pub page: Option<u32>,
    pub offset: Option<u64>,
    pub limit: u32,
    pub cursor: Option<String>,
    pub search: Option<String>,
    pub filters: BTreeMap<String, FilterValue>,
    pub sort: Vec<SortKey>,
}

/// Pagination metadata an [`Adapter`] may report back alongside a page of items.
///
/// `total` is used to size the virtual list; when absent, the coordinator falls back to
/// `max(known_index + 1, items.len())`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseMeta {
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub has_next: Option<bool>,
    pub has_prev: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdapterResponse<T> {
    pub items: Vec<T>,
    pub meta: Option<ResponseMeta>,
    pub cursor: Option<String>,
}

/// The only point of contact between the coordinator and the host's actual I/O.
///
/// Object-safe via `async-trait` so a coordinator can hold `Arc<dyn Adapter<T>>` without
/// committing to a concrete future type.
#[async_trait::async_trait]
pub trait Adapter<T>: Send + Sync {
    async fn read(&self, request: AdapterRequest) -> Result<AdapterResponse<T>, ListError>;
}

#[async_trait::async_trait]
impl<T, F, Fut> Adapter<T> for F
where
    T: Send,
    F: Fn(AdapterRequest) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<AdapterResponse<T>, ListError>> + Send,
{
    async fn read(&self, request: AdapterRequest) -> Result<AdapterResponse<T>, ListError> {
        (self)(request).await
    }
}
