use std::collections::BTreeMap;

use crate::error::ListError;

/// A declarative layout tree an adapter hands the feature framework at construction time.
///
/// `name` marks a node as an addressable slot (`"viewport"`, `"scrollbar-track"`,
/// `"scrollbar-thumb"`, ...); unnamed nodes are pure structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutNode {
    pub name: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<LayoutNode>,
}

impl LayoutNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: LayoutNode) -> Self {
        self.children.push(child);
        self
    }
}

/// A resolved, addressable slot in a compiled layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutSlot {
    pub attrs: BTreeMap<String, String>,
}

/// Flattens a [`LayoutNode`] tree into a `name -> slot` map.
///
/// `get("viewport")` must resolve; callers that compile a tree missing a `"viewport"` node get
/// `ListError::ViewportMissingInLayout` back from [`LayoutRegistry::compile`] rather than a
/// panic, and the list runs in degraded mode (logged once via `vwarn!`).
#[derive(Clone, Debug, Default)]
pub struct LayoutRegistry {
    slots: BTreeMap<String, LayoutSlot>,
}

impl LayoutRegistry {
    pub fn compile(root: &LayoutNode) -> Result<Self, ListError> {
        let mut slots = BTreeMap::new();
        Self::collect(root, &mut slots);
        if !slots.contains_key("viewport") {
            return Err(ListError::ViewportMissingInLayout);
        }
        Ok(Self { slots })
    }

    fn collect(node: &LayoutNode, slots: &mut BTreeMap<String, LayoutSlot>) {
        if let Some(name) = &node.name {
            slots.insert(
                name.clone(),
                LayoutSlot {
                    attrs: node.attrs.clone(),
                },
            );
        }
        for child in &node.children {
            Self::collect(child, slots);
        }
    }

    pub fn get(&self, name: &str) -> Option<&LayoutSlot> {
        self.slots.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
