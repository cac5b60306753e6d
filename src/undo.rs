//! Bounded undo stack with action coalescing and save tracking.
//!
//! Every tracked mutation records an inverse closure that puts the touched
//! container back to the value it had before the mutation. Consecutive pushes
//! carrying the same [`ActionKey`] collapse into one step, so a drag gesture or
//! a burst of keystrokes in one field undoes as a unit.
//!
//! The stack also owns the session's [`DirtyLevel`] and arms an
//! [`UnloadGuard`] while there are changes that have not reached the store.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::constants::MAX_UNDO_STEPS;

// ============================================================================
// Dirty level
// ============================================================================

/// Save status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum DirtyLevel {
    /// No changes, or every change has been saved
    #[default]
    Clean = 0,
    /// Changes done since the last save
    Modified = 1,
    /// Changes submitted to the store, awaiting the response
    Saving = 2,
}

impl DirtyLevel {
    /// Whether leaving the page now would lose work.
    pub fn is_dirty(self) -> bool {
        self != DirtyLevel::Clean
    }
}

// ============================================================================
// Action keys
// ============================================================================

/// Identifies the logical user action a low-level mutation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey(String);

impl ActionKey {
    /// Build a key from an arbitrary caller-chosen name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Drawing or redrawing the box of element `index`.
    pub fn box_edit(index: usize) -> Self {
        Self(format!("box:{index}"))
    }

    /// Editing tag `column` of element `index`.
    pub fn element_tag(index: usize, column: &str) -> Self {
        Self(format!("tag:{index}:{column}"))
    }

    /// Editing a record-level tag.
    pub fn record_tag(column: &str) -> Self {
        Self(format!("record_tag:{column}"))
    }

    /// Editing a metadata field.
    pub fn meta(field: &str) -> Self {
        Self(format!("meta:{field}"))
    }

    /// Typing in the free-text notes.
    pub fn notes() -> Self {
        Self("notes".to_string())
    }

    /// Editing the tag `column` of edge `index`.
    pub fn edge_tag(index: usize, column: &str) -> Self {
        Self(format!("edge_tag:{index}:{column}"))
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Navigation guard
// ============================================================================

/// Hook that warns before the page is left with unsaved changes.
///
/// Implementations register their native listener in `arm` and remove it in
/// `disarm`; both are only called on actual transitions.
pub trait UnloadGuard {
    /// Start warning on navigation.
    fn arm(&mut self);
    /// Stop warning on navigation.
    fn disarm(&mut self);
}

/// Guard that does nothing, for sessions without a page to protect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGuard;

impl UnloadGuard for NoGuard {
    fn arm(&mut self) {}
    fn disarm(&mut self) {}
}

// ============================================================================
// Undo stack
// ============================================================================

/// Closure restoring a container to its pre-mutation value.
pub type Inverse = Box<dyn FnOnce()>;

struct UndoEntry {
    inverse: Inverse,
    dirty_before: DirtyLevel,
}

/// The undo history of one session.
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    last_action: Option<ActionKey>,
    dirty: DirtyLevel,
    capacity: usize,
    guard: Box<dyn UnloadGuard>,
    guard_armed: bool,
}

/// Shared handle through which containers record their inverses.
pub type ChangeStack = Rc<RefCell<UndoStack>>;

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Create an empty stack holding [`MAX_UNDO_STEPS`] entries.
    pub fn new() -> Self {
        Self::with_capacity(MAX_UNDO_STEPS)
    }

    /// Create an empty stack holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.saturating_add(1)),
            last_action: None,
            dirty: DirtyLevel::Clean,
            capacity: capacity.max(1),
            guard: Box::new(NoGuard),
            guard_armed: false,
        }
    }

    /// Use `guard` to protect against navigating away with unsaved changes.
    pub fn with_guard(mut self, guard: impl UnloadGuard + 'static) -> Self {
        self.guard = Box::new(guard);
        self
    }

    /// Wrap into the shared handle used by observable containers.
    pub fn into_shared(self) -> ChangeStack {
        Rc::new(RefCell::new(self))
    }

    /// Record the inverse of a mutation that has just happened.
    ///
    /// A push whose `action` equals the previous push's key is dropped; the
    /// earlier inverse already restores the state from before the action.
    pub fn push(&mut self, inverse: Inverse, action: Option<&ActionKey>) {
        if action.is_some() && action == self.last_action.as_ref() {
            return;
        }

        self.entries.push_back(UndoEntry {
            inverse,
            dirty_before: self.dirty,
        });
        self.last_action = action.cloned();
        self.set_dirty(DirtyLevel::Modified);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        match action {
            Some(key) => log::debug!("📝 Undo: pushed '{}' ({} steps)", key, self.entries.len()),
            None => log::debug!("📝 Undo: pushed ({} steps)", self.entries.len()),
        }
    }

    /// Revert the most recent step. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.pop() else {
            return false;
        };
        (entry.inverse)();
        true
    }

    /// Pop the most recent step and restore its dirty level, without running
    /// its inverse. Callers holding the stack through a shared handle run the
    /// inverse after releasing their borrow.
    pub(crate) fn pop_inverse(&mut self) -> Option<Inverse> {
        self.pop().map(|entry| entry.inverse)
    }

    fn pop(&mut self) -> Option<UndoEntry> {
        let entry = self.entries.pop_back()?;
        self.set_dirty(entry.dirty_before);
        self.last_action = None;
        log::debug!("⏪ Undo: {} steps left", self.entries.len());
        Some(entry)
    }

    /// Whether there is anything to undo.
    pub fn has_entries(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Number of undoable steps.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of steps kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current save status.
    pub fn dirty_level(&self) -> DirtyLevel {
        self.dirty
    }

    /// Changes have been submitted to the store.
    pub fn mark_saving(&mut self) {
        self.set_dirty(DirtyLevel::Saving);
    }

    /// Changes have been stored.
    ///
    /// Undoing past this point must leave the session Modified, so every
    /// queued entry forgets that it was recorded on a clean session.
    pub fn mark_saved(&mut self) {
        self.forget_clean_state();
        self.set_dirty(DirtyLevel::Clean);
        self.last_action = None;
    }

    /// A save has been stored, but the session changed again while it was
    /// in flight. The current level stays Modified; undoing still has to
    /// report every earlier state as differing from the store.
    pub fn mark_saved_while_modified(&mut self) {
        self.forget_clean_state();
    }

    fn forget_clean_state(&mut self) {
        for entry in &mut self.entries {
            entry.dirty_before = DirtyLevel::Modified;
        }
    }

    /// The store rejected the changes; they are still pending.
    pub fn mark_save_failed(&mut self) {
        self.set_dirty(DirtyLevel::Modified);
    }

    /// Disarm the navigation guard for good. Called on session teardown.
    pub fn release_guard(&mut self) {
        if self.guard_armed {
            self.guard.disarm();
            self.guard_armed = false;
        }
    }

    fn set_dirty(&mut self, level: DirtyLevel) {
        self.dirty = level;
        match (level.is_dirty(), self.guard_armed) {
            (true, false) => {
                self.guard.arm();
                self.guard_armed = true;
            }
            (false, true) => {
                self.guard.disarm();
                self.guard_armed = false;
            }
            _ => {}
        }
    }
}

impl fmt::Debug for UndoStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStack")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("last_action", &self.last_action)
            .field("dirty", &self.dirty)
            .field("guard_armed", &self.guard_armed)
            .finish()
    }
}

/// Undo one step through a shared handle.
///
/// The stack borrow is released before the inverse runs, so inverses are free
/// to touch containers attached to the same stack.
pub fn undo_shared(stack: &ChangeStack) -> bool {
    let inverse = stack.borrow_mut().pop_inverse();
    match inverse {
        Some(inverse) => {
            inverse();
            true
        }
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Guard recording whether it is currently armed.
    #[derive(Clone, Default)]
    struct FlagGuard(Rc<Cell<bool>>);

    impl UnloadGuard for FlagGuard {
        fn arm(&mut self) {
            assert!(!self.0.get(), "guard armed twice");
            self.0.set(true);
        }
        fn disarm(&mut self) {
            assert!(self.0.get(), "guard disarmed while not armed");
            self.0.set(false);
        }
    }

    fn setter(cell: &Rc<Cell<i32>>, value: i32) -> Inverse {
        let cell = Rc::clone(cell);
        Box::new(move || cell.set(value))
    }

    #[test]
    fn test_empty_stack() {
        let mut stack = UndoStack::new();
        assert!(!stack.has_entries());
        assert_eq!(stack.dirty_level(), DirtyLevel::Clean);
        assert!(!stack.undo());
        assert_eq!(stack.dirty_level(), DirtyLevel::Clean);
    }

    #[test]
    fn test_push_and_undo() {
        let value = Rc::new(Cell::new(1));
        let mut stack = UndoStack::new();

        value.set(2);
        stack.push(setter(&value, 1), None);
        assert!(stack.has_entries());
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);

        assert!(stack.undo());
        assert_eq!(value.get(), 1);
        assert!(!stack.has_entries());
        assert_eq!(stack.dirty_level(), DirtyLevel::Clean);
    }

    #[test]
    fn test_same_key_coalesces() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();
        let key = ActionKey::notes();

        for i in 1..=5 {
            let before = value.get();
            value.set(i);
            stack.push(setter(&value, before), Some(&key));
        }
        assert_eq!(stack.len(), 1);

        stack.undo();
        assert_eq!(value.get(), 0);
        assert!(!stack.has_entries());
    }

    #[test]
    fn test_missing_key_never_coalesces() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();
        stack.push(setter(&value, 0), None);
        stack.push(setter(&value, 0), None);
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_undo_forgets_last_action() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();
        let key = ActionKey::box_edit(0);

        stack.push(setter(&value, 0), Some(&ActionKey::notes()));
        stack.push(setter(&value, 0), Some(&key));
        stack.undo();
        stack.push(setter(&value, 0), Some(&key));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::with_capacity(3);

        for i in 0..5 {
            stack.push(setter(&value, i), Some(&ActionKey::box_edit(i as usize)));
        }
        assert_eq!(stack.len(), 3);

        while stack.undo() {}
        // Entries for 0 and 1 were evicted, so 2 is the oldest restorable value.
        assert_eq!(value.get(), 2);
    }

    #[test]
    fn test_default_capacity() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();
        for i in 0..(MAX_UNDO_STEPS + 7) {
            stack.push(setter(&value, i as i32), Some(&ActionKey::box_edit(i)));
        }
        assert_eq!(stack.len(), MAX_UNDO_STEPS);
    }

    #[test]
    fn test_dirty_round_trip() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();

        stack.push(setter(&value, 0), None);
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);
        stack.mark_saving();
        assert_eq!(stack.dirty_level(), DirtyLevel::Saving);
        stack.mark_saved();
        assert_eq!(stack.dirty_level(), DirtyLevel::Clean);

        // Undoing a saved change leaves unsaved work behind.
        stack.undo();
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);
    }

    #[test]
    fn test_saved_while_modified_keeps_level() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();
        stack.push(setter(&value, 0), None);
        stack.mark_saving();
        stack.push(setter(&value, 1), None);
        stack.mark_saved_while_modified();
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);

        stack.undo();
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);
        stack.undo();
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);
    }

    #[test]
    fn test_save_failure_returns_to_modified() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();
        stack.push(setter(&value, 0), None);
        stack.mark_saving();
        stack.mark_save_failed();
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_save_resets_coalescing() {
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new();
        let key = ActionKey::notes();
        stack.push(setter(&value, 0), Some(&key));
        stack.mark_saving();
        stack.mark_saved();

        stack.push(setter(&value, 0), Some(&key));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.dirty_level(), DirtyLevel::Modified);
    }

    #[test]
    fn test_guard_follows_dirty_level() {
        let flag = FlagGuard::default();
        let armed = Rc::clone(&flag.0);
        let value = Rc::new(Cell::new(0));
        let mut stack = UndoStack::new().with_guard(flag);

        assert!(!armed.get());
        stack.push(setter(&value, 0), None);
        assert!(armed.get());
        stack.mark_saving();
        assert!(armed.get());
        stack.mark_saved();
        assert!(!armed.get());

        stack.push(setter(&value, 0), None);
        assert!(armed.get());
        stack.release_guard();
        assert!(!armed.get());
    }

    #[test]
    fn test_undo_shared_releases_borrow() {
        let stack = UndoStack::new().into_shared();
        let observed = Rc::clone(&stack);
        let seen = Rc::new(Cell::new(false));
        let seen_in = Rc::clone(&seen);
        stack.borrow_mut().push(
            Box::new(move || seen_in.set(observed.try_borrow_mut().is_ok())),
            None,
        );
        assert!(undo_shared(&stack));
        assert!(seen.get());
    }
}
