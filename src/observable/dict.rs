//! Keyed container.

use std::cell::Ref;
use std::collections::BTreeMap;
use std::fmt;

use super::ObservableValue;
use crate::undo::{ActionKey, ChangeStack, Inverse};

/// Keyed mapping whose mutations may be undone.
///
/// Same whole-snapshot policy as [`super::ObservableList`].
pub struct ObservableDict<K, V> {
    inner: ObservableValue<BTreeMap<K, V>>,
}

impl<K, V> ObservableDict<K, V>
where
    K: Ord + Clone + 'static,
    V: Clone + 'static,
{
    /// Create a mapping whose mutations are recorded on `changes`.
    pub fn tracked(initial: BTreeMap<K, V>, changes: &ChangeStack) -> Self {
        Self {
            inner: ObservableValue::tracked(initial, changes),
        }
    }

    /// Create a mapping that is not part of any undo history.
    pub fn untracked(initial: BTreeMap<K, V>) -> Self {
        Self {
            inner: ObservableValue::untracked(initial),
        }
    }

    /// Borrow the current mapping.
    pub fn borrow(&self) -> Ref<'_, BTreeMap<K, V>> {
        self.inner.borrow()
    }

    /// Clone of the current mapping.
    pub fn to_map(&self) -> BTreeMap<K, V> {
        self.inner.get()
    }

    /// Clone of the value under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.borrow().get(key).cloned()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Number of changes applied so far.
    pub fn revision(&self) -> u64 {
        self.inner.revision()
    }

    /// Replace the whole mapping.
    pub fn set(&self, map: BTreeMap<K, V>, action: Option<&ActionKey>) {
        self.inner.set(map, action);
    }

    /// Replace the whole mapping without touching the undo history.
    pub fn set_untracked(&self, map: BTreeMap<K, V>) {
        self.inner.set_untracked(map);
    }

    /// Insert or overwrite the value under `key`.
    pub fn insert(&self, key: K, value: V, action: Option<&ActionKey>) {
        let mut map = self.to_map();
        map.insert(key, value);
        self.set(map, action);
    }

    /// Remove `key`. Returns the removed value, or None if it was absent.
    pub fn remove(&self, key: &K, action: Option<&ActionKey>) -> Option<V> {
        let mut map = self.to_map();
        let removed = map.remove(key)?;
        self.set(map, action);
        Some(removed)
    }

    /// Replace the value under `key` with `f` applied to it.
    /// Returns false if `key` is absent.
    pub fn update(&self, key: &K, f: impl FnOnce(&V) -> V, action: Option<&ActionKey>) -> bool {
        let mut map = self.to_map();
        let Some(slot) = map.get_mut(key) else {
            return false;
        };
        let updated = f(slot);
        *slot = updated;
        self.set(map, action);
        true
    }

    /// Closure restoring the current mapping when invoked.
    pub fn restorer(&self) -> Inverse {
        self.inner.restorer()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableDict<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableDict").field(&self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::{UndoStack, undo_shared};

    fn meta(changes: &ChangeStack) -> ObservableDict<String, String> {
        let mut initial = BTreeMap::new();
        initial.insert("author".to_string(), "afgs".to_string());
        ObservableDict::tracked(initial, changes)
    }

    #[test]
    fn test_insert_and_undo() {
        let changes = UndoStack::new().into_shared();
        let dict = meta(&changes);
        dict.insert("set".to_string(), "train".to_string(), None);
        assert_eq!(dict.len(), 2);
        undo_shared(&changes);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(&"author".to_string()).as_deref(), Some("afgs"));
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let changes = UndoStack::new().into_shared();
        let dict = meta(&changes);
        assert_eq!(dict.remove(&"missing".to_string(), None), None);
        assert!(!dict.update(&"missing".to_string(), |v| v.clone(), None));
        assert!(!changes.borrow().has_entries());
    }

    #[test]
    fn test_keystrokes_coalesce() {
        let changes = UndoStack::new().into_shared();
        let dict = meta(&changes);
        let key = ActionKey::meta("author");
        for name in ["a", "an", "ant"] {
            dict.insert("author".to_string(), name.to_string(), Some(&key));
        }
        assert_eq!(changes.borrow().len(), 1);
        undo_shared(&changes);
        assert_eq!(dict.get(&"author".to_string()).as_deref(), Some("afgs"));
    }
}
