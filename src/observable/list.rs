//! Ordered, index-addressable container.

use std::cell::Ref;
use std::fmt;

use super::ObservableValue;
use crate::undo::{ActionKey, ChangeStack, Inverse};

/// Ordered list of records whose mutations may be undone.
///
/// Every mutation snapshots the entire previous list, so undoing restores
/// order and contents exactly even when indices shifted in between.
/// Out-of-range indices are ignored: pointer events can race with removals.
pub struct ObservableList<T> {
    inner: ObservableValue<Vec<T>>,
}

impl<T: Clone + 'static> ObservableList<T> {
    /// Create a list whose mutations are recorded on `changes`.
    pub fn tracked(initial: Vec<T>, changes: &ChangeStack) -> Self {
        Self {
            inner: ObservableValue::tracked(initial, changes),
        }
    }

    /// Create a list that is not part of any undo history.
    pub fn untracked(initial: Vec<T>) -> Self {
        Self {
            inner: ObservableValue::untracked(initial),
        }
    }

    /// Borrow the current items.
    pub fn borrow(&self) -> Ref<'_, Vec<T>> {
        self.inner.borrow()
    }

    /// Clone of the current items.
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.get()
    }

    /// Clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.borrow().get(index).cloned()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Number of changes applied so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision()
    }

    /// Whether mutations are recorded for undo.
    pub fn is_tracked(&self) -> bool {
        self.inner.is_tracked()
    }

    /// Replace the whole list.
    pub fn set(&self, items: Vec<T>, action: Option<&ActionKey>) {
        self.inner.set(items, action);
    }

    /// Replace the whole list without recording an undo step.
    pub fn set_untracked(&self, items: Vec<T>) {
        self.inner.set_untracked(items);
    }

    /// Append `value` at the end.
    pub fn append(&self, value: T, action: Option<&ActionKey>) {
        let mut items = self.to_vec();
        items.push(value);
        self.set(items, action);
    }

    /// Remove the item at `index`, shifting later items down.
    /// Returns the removed item, or None if `index` is out of range.
    pub fn remove_at(&self, index: usize, action: Option<&ActionKey>) -> Option<T> {
        let mut items = self.to_vec();
        if index >= items.len() {
            return None;
        }
        let removed = items.remove(index);
        self.set(items, action);
        Some(removed)
    }

    /// Replace the item at `index`. Returns false if `index` is out of range.
    pub fn replace_at(&self, index: usize, value: T, action: Option<&ActionKey>) -> bool {
        self.update_at(index, |_| value, action)
    }

    /// Replace the item at `index` with `f` applied to it.
    /// Returns false if `index` is out of range.
    pub fn update_at(
        &self,
        index: usize,
        f: impl FnOnce(&T) -> T,
        action: Option<&ActionKey>,
    ) -> bool {
        let mut items = self.to_vec();
        let Some(current) = items.get(index) else {
            return false;
        };
        let updated = f(current);
        items[index] = updated;
        self.set(items, action);
        true
    }

    /// Closure restoring the current items when invoked.
    pub fn restorer(&self) -> Inverse {
        self.inner.restorer()
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableList").field(&self.inner).finish()
    }
}
