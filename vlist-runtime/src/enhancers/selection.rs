use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::error::ListError;
use crate::event::EventBus;
use crate::feature::Capability;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    None,
    Single,
    Multiple,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionOptions {
    pub mode: SelectionMode,
    /// When true, Ctrl/Cmd-toggle and Shift-range-extend require the modifier to be held;
    /// a plain click always replaces the selection with a single item.
    pub require_modifiers: bool,
}

/// Click/keyboard-driven selection over item keys.
///
/// Kept independent of any particular key type beyond `Ord` so it can live in a `BTreeSet`
/// without pulling in a hashing requirement the core `vlist` crate avoids in `no_std`.
#[derive(Clone, Debug, Default)]
pub struct Selection<K: Ord + Clone> {
    options: SelectionOptions,
    selected: BTreeSet<K>,
    last_selected_index: Option<usize>,
}

impl<K: Ord + Clone> Selection<K> {
    pub fn new(options: SelectionOptions) -> Self {
        Self {
            options,
            selected: BTreeSet::new(),
            last_selected_index: None,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.options.mode
    }

    pub fn is_selected(&self, key: &K) -> bool {
        self.selected.contains(key)
    }

    pub fn selected_keys(&self) -> impl Iterator<Item = &K> {
        self.selected.iter()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.last_selected_index = None;
    }

    /// A plain click: replaces selection in `Single` mode (clicking an already-selected item
    /// deselects it, matching `Self::toggle`), toggles-with-clear in `Multiple` unless
    /// `ctrl_or_cmd` is held (in which case it behaves like [`Self::toggle`]).
    ///
    /// `key_for_index` resolves the keys between the last anchor and `index` for a shift-click
    /// range extend; it is only called when `shift` is set in `Multiple` mode.
    pub fn click(
        &mut self,
        key: K,
        index: usize,
        ctrl_or_cmd: bool,
        shift: bool,
        key_for_index: impl Fn(usize) -> K,
    ) -> Result<(), ListError> {
        match self.options.mode {
            SelectionMode::None => Err(ListError::SelectionUnavailable {
                reason: "selection mode is None".to_string(),
            }),
            SelectionMode::Single => {
                if self.selected.contains(&key) {
                    self.selected.remove(&key);
                    self.last_selected_index = None;
                } else {
                    self.selected.clear();
                    self.selected.insert(key);
                    self.last_selected_index = Some(index);
                }
                Ok(())
            }
            SelectionMode::Multiple => {
                if shift {
                    self.extend_range(index, key_for_index);
                } else if ctrl_or_cmd || !self.options.require_modifiers {
                    self.toggle(key);
                } else {
                    self.selected.clear();
                    self.selected.insert(key);
                }
                self.last_selected_index = Some(index);
                Ok(())
            }
        }
    }

    pub fn toggle(&mut self, key: K) {
        if !self.selected.remove(&key) {
            self.selected.insert(key);
        }
    }

    /// Extends the selection from the last anchor (or `index` itself, if there is none) to
    /// `index` inclusive, resolving each covered index to a key via `key_for_index`.
    fn extend_range(&mut self, index: usize, key_for_index: impl Fn(usize) -> K) {
        let anchor = self.last_selected_index.unwrap_or(index);
        let (lo, hi) = if anchor <= index { (anchor, index) } else { (index, anchor) };
        for i in lo..=hi {
            self.selected.insert(key_for_index(i));
        }
    }

    pub fn select_many(&mut self, keys: impl IntoIterator<Item = K>) {
        self.selected.extend(keys);
    }

    pub fn last_selected_index(&self) -> Option<usize> {
        self.last_selected_index
    }
}

#[async_trait::async_trait(?Send)]
impl<K: Ord + Clone + core::fmt::Debug + 'static> Capability for RefCell<Selection<K>> {
    fn stage(&self) -> &'static str {
        "selection"
    }
    fn provides(&self) -> &'static [&'static str] {
        &["selection"]
    }
    fn requires(&self) -> &'static [&'static str] {
        &["api"]
    }
    async fn init(&self, _bus: &EventBus) -> Result<(), ListError> {
        vdebug!("selection enhancer initialized in mode {:?}", self.borrow().mode());
        Ok(())
    }
}
