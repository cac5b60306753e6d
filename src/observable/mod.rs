//! Observable state containers.
//!
//! Containers are the single source of truth views read from. A container
//! may be attached to a [`ChangeStack`]; every mutation then records the whole
//! previous value as its undo snapshot. Containers without a stack are plain
//! reactive state (colour assignments, selection) that never shows up in the
//! undo history.
//!
//! Every change bumps a revision counter so views can tell when to redraw.

mod dict;
mod list;

pub use dict::ObservableDict;
pub use list::ObservableList;

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::undo::{ActionKey, ChangeStack, Inverse};

struct Slot<T> {
    value: T,
    revision: u64,
}

/// A single tracked value.
pub struct ObservableValue<T> {
    slot: Rc<RefCell<Slot<T>>>,
    changes: Option<ChangeStack>,
}

impl<T: Clone + 'static> ObservableValue<T> {
    /// Create a container whose mutations are recorded on `changes`.
    pub fn tracked(initial: T, changes: &ChangeStack) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                value: initial,
                revision: 0,
            })),
            changes: Some(Rc::clone(changes)),
        }
    }

    /// Create a container that is not part of any undo history.
    pub fn untracked(initial: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                value: initial,
                revision: 0,
            })),
            changes: None,
        }
    }

    /// Borrow the current value.
    ///
    /// The borrow must be dropped before the container is mutated.
    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.slot.borrow(), |slot| &slot.value)
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.slot.borrow().value.clone()
    }

    /// Number of changes applied so far, undos included.
    pub fn revision(&self) -> u64 {
        self.slot.borrow().revision
    }

    /// Whether mutations are recorded for undo.
    pub fn is_tracked(&self) -> bool {
        self.changes.is_some()
    }

    /// Replace the value, recording the previous one for undo.
    pub fn set(&self, value: T, action: Option<&ActionKey>) {
        if let Some(changes) = &self.changes {
            let inverse = self.restorer();
            changes.borrow_mut().push(inverse, action);
        }
        self.set_untracked(value);
    }

    /// Replace the value without touching the undo history.
    pub fn set_untracked(&self, value: T) {
        let mut slot = self.slot.borrow_mut();
        slot.value = value;
        slot.revision += 1;
    }

    /// Closure restoring the current value when invoked.
    ///
    /// Used to record a single undo step spanning several containers.
    pub fn restorer(&self) -> Inverse {
        let snapshot = self.get();
        let slot = Rc::clone(&self.slot);
        Box::new(move || {
            let mut slot = slot.borrow_mut();
            slot.value = snapshot;
            slot.revision += 1;
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("ObservableValue")
            .field("value", &slot.value)
            .field("revision", &slot.revision)
            .field("tracked", &self.changes.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo::{DirtyLevel, UndoStack, undo_shared};

    #[test]
    fn test_tracked_value_undo() {
        let changes = UndoStack::new().into_shared();
        let notes = ObservableValue::tracked(String::from("a"), &changes);
        let key = ActionKey::notes();

        notes.set("ab".to_string(), Some(&key));
        notes.set("abc".to_string(), Some(&key));
        assert_eq!(notes.get(), "abc");
        assert_eq!(changes.borrow().len(), 1);

        assert!(undo_shared(&changes));
        assert_eq!(notes.get(), "a");
        assert_eq!(changes.borrow().dirty_level(), DirtyLevel::Clean);
    }

    #[test]
    fn test_untracked_value() {
        let value = ObservableValue::untracked(1);
        value.set(2, None);
        assert!(!value.is_tracked());
        assert_eq!(value.get(), 2);
        assert_eq!(value.revision(), 1);
    }

    #[test]
    fn test_undo_bumps_revision() {
        let changes = UndoStack::new().into_shared();
        let value = ObservableValue::tracked(0u8, &changes);
        value.set(1, None);
        let before = value.revision();
        undo_shared(&changes);
        assert!(value.revision() > before);
    }
}
