use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::adapter::FilterValue;
use crate::error::ListError;
use crate::event::EventBus;
use crate::feature::Capability;

/// A named control map, with empty-value normalization: setting a control to `null`/`""`/`[]`
/// removes the key entirely rather than sending an empty filter to the adapter.
#[derive(Clone, Debug, Default)]
pub struct Filters {
    controls: BTreeMap<String, FilterValue>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: FilterValue) {
        let name = name.into();
        if value.is_empty() {
            self.controls.remove(&name);
        } else {
            self.controls.insert(name, value);
        }
    }

    pub fn clear(&mut self, name: &str) {
        self.controls.remove(name);
    }

    pub fn clear_all(&mut self) {
        self.controls.clear();
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.controls.get(name)
    }

    pub fn as_map(&self) -> &BTreeMap<String, FilterValue> {
        &self.controls
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[async_trait::async_trait(?Send)]
impl Capability for RefCell<Filters> {
    fn stage(&self) -> &'static str {
        "filter"
    }
    fn provides(&self) -> &'static [&'static str] {
        &["filter"]
    }
    fn requires(&self) -> &'static [&'static str] {
        &["search"]
    }
    async fn init(&self, _bus: &EventBus) -> Result<(), ListError> {
        Ok(())
    }
}
