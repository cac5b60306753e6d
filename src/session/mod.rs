//! Editing session over one annotation record.
//!
//! An [`AnnotationSession`] owns the undo history and every editable part of
//! the record (notes, drawn elements, edges, record tags, metadata). All
//! mutations go through its methods, so multi-container actions such as
//! removing a grapheme together with its edges stay one undo step.
//!
//! The session is created from a loaded [`RecordPayload`], lives as long as
//! the edit view, and is dropped without saving on navigation; only
//! [`AnnotationSession::begin_save`] hands its contents to a store.

mod replace;
mod save;

#[cfg(test)]
mod tests;

pub use replace::Replacement;
pub use save::SaveStatus;

use std::collections::BTreeMap;

use web_time::Instant;

use crate::config::TaggerConfig;
use crate::geometry::{self, BoundingBox};
use crate::model::{AnnotationId, AnnotationKind, Edge, Grapheme, RecordPayload, Tags};
use crate::observable::{ObservableDict, ObservableList, ObservableValue};
use crate::palette::ColorAssignment;
use crate::undo::{self, ActionKey, ChangeStack, DirtyLevel, UndoStack, UnloadGuard};

/// Builder for [`AnnotationSession`].
pub struct SessionBuilder {
    kind: AnnotationKind,
    id: AnnotationId,
    columns: Vec<String>,
    config: TaggerConfig,
    guard: Option<Box<dyn UnloadGuard>>,
}

impl SessionBuilder {
    /// Tag schema: the names of the tag columns, in order.
    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Apply undo depth, palette and ordering tolerance from `config`.
    pub fn config(mut self, config: &TaggerConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Warn before leaving the page while changes are unsaved.
    pub fn guard(mut self, guard: impl UnloadGuard + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Create the session from the loaded record.
    pub fn build(self, payload: RecordPayload) -> AnnotationSession {
        let mut stack = UndoStack::with_capacity(self.config.max_undo_steps);
        if let Some(guard) = self.guard {
            stack = stack.with_guard(BoxedGuard(guard));
        }
        let changes = stack.into_shared();

        let RecordPayload {
            notes,
            symbols,
            graphemes,
            edges,
            tags,
            meta,
        } = payload;
        let elements = match self.kind {
            AnnotationKind::Transcription => symbols,
            AnnotationKind::Logogram => graphemes,
            AnnotationKind::Grapheme => Vec::new(),
        };
        let edges = if self.kind.has_edges() {
            edges
        } else {
            Vec::new()
        };
        let record_tags = tags.unwrap_or_else(|| self.kind.empty_tags());

        let colors = ColorAssignment::new(self.config.palette.clone());
        colors.sync(elements.len());

        log::debug!(
            "Opened {} {} ({} elements, {} edges)",
            self.kind.name(),
            self.id,
            elements.len(),
            edges.len()
        );

        AnnotationSession {
            kind: self.kind,
            id: self.id,
            columns: self.columns,
            reading_order_tolerance: self.config.reading_order_tolerance,
            notes: ObservableValue::tracked(notes, &changes),
            elements: ObservableList::tracked(elements, &changes),
            edges: ObservableList::tracked(edges, &changes),
            tags: ObservableValue::tracked(record_tags, &changes),
            meta: ObservableDict::tracked(meta, &changes),
            changes,
            colors,
            status: ObservableValue::untracked(SaveStatus::Idle),
            save_in_flight: false,
            last_saved: None,
        }
    }
}

struct BoxedGuard(Box<dyn UnloadGuard>);

impl UnloadGuard for BoxedGuard {
    fn arm(&mut self) {
        self.0.arm();
    }
    fn disarm(&mut self) {
        self.0.disarm();
    }
}

/// Editable state of one annotation record.
pub struct AnnotationSession {
    kind: AnnotationKind,
    id: AnnotationId,
    columns: Vec<String>,
    reading_order_tolerance: f64,
    changes: ChangeStack,
    notes: ObservableValue<String>,
    /// Symbols of a transcription or graphemes of a logogram
    elements: ObservableList<Grapheme>,
    edges: ObservableList<Edge>,
    /// Record-level tags, in the shape they were stored in
    tags: ObservableValue<Tags>,
    meta: ObservableDict<String, serde_json::Value>,
    colors: ColorAssignment,
    status: ObservableValue<SaveStatus>,
    save_in_flight: bool,
    last_saved: Option<Instant>,
}

impl AnnotationSession {
    /// Start building a session for record `id`.
    pub fn builder(kind: AnnotationKind, id: AnnotationId) -> SessionBuilder {
        SessionBuilder {
            kind,
            id,
            columns: Vec::new(),
            config: TaggerConfig::default(),
            guard: None,
        }
    }

    /// Session with default configuration and no tag schema.
    pub fn new(kind: AnnotationKind, id: AnnotationId, payload: RecordPayload) -> Self {
        Self::builder(kind, id).build(payload)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn id(&self) -> &AnnotationId {
        &self.id
    }

    /// Tag schema column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn notes(&self) -> &ObservableValue<String> {
        &self.notes
    }

    /// Drawn elements: symbols of a transcription, graphemes of a logogram.
    pub fn elements(&self) -> &ObservableList<Grapheme> {
        &self.elements
    }

    pub fn edges(&self) -> &ObservableList<Edge> {
        &self.edges
    }

    /// Record-level tags, positional or named as loaded.
    pub fn tags(&self) -> &ObservableValue<Tags> {
        &self.tags
    }

    /// Value of record tag `column`.
    pub fn record_tag(&self, column: usize) -> Option<String> {
        let name = self.column_name(column);
        self.tags.borrow().get(column, &name).map(str::to_string)
    }

    pub fn meta(&self) -> &ObservableDict<String, serde_json::Value> {
        &self.meta
    }

    /// Display colour of element `index`.
    pub fn color(&self, index: usize) -> String {
        self.colors.get(index)
    }

    pub fn colors(&self) -> &ColorAssignment {
        &self.colors
    }

    pub fn dirty_level(&self) -> DirtyLevel {
        self.changes.borrow().dirty_level()
    }

    /// Whether the undo control should be shown.
    pub fn can_undo(&self) -> bool {
        self.changes.borrow().has_entries()
    }

    /// Number of undoable steps.
    pub fn undo_len(&self) -> usize {
        self.changes.borrow().len()
    }

    /// Index of the topmost element whose box contains the normalized point.
    pub fn element_at(&self, x: f64, y: f64) -> Option<usize> {
        let elements = self.elements.borrow();
        let boxes: Vec<BoundingBox> = elements
            .iter()
            .map(|g| g.bbox.unwrap_or(BoundingBox::new(f64::NAN, f64::NAN, 0.0, 0.0)))
            .collect();
        geometry::hit_test(boxes.iter(), x, y)
    }

    fn column_name(&self, column: usize) -> String {
        self.columns
            .get(column)
            .cloned()
            .unwrap_or_else(|| column.to_string())
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Revert the last step. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !undo::undo_shared(&self.changes) {
            return false;
        }
        // An undo cannot leave the session waiting on a save that is not
        // actually in flight.
        let mut stack = self.changes.borrow_mut();
        if stack.dirty_level() == DirtyLevel::Saving && !self.save_in_flight {
            stack.mark_save_failed();
        }
        drop(stack);
        self.colors.sync(self.elements.len());
        true
    }

    /// Replace the free-text notes. Keystrokes coalesce into one step.
    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes.set(notes.into(), Some(&ActionKey::notes()));
    }

    /// Append an element and give it the next colour. Returns its index.
    pub fn add_element(&mut self, element: Grapheme, action: Option<&ActionKey>) -> usize {
        let index = self.elements.len();
        self.elements.append(element, action);
        self.colors.sync(index);
        self.colors.push_next();
        index
    }

    /// Set the box of element `index`. Returns false if out of range.
    pub fn set_element_box(&mut self, index: usize, bbox: BoundingBox) -> bool {
        self.elements
            .update_at(index, |g| g.with_box(bbox), Some(&ActionKey::box_edit(index)))
    }

    /// Set tag `column` of element `index`. Returns false if out of range.
    pub fn set_element_tag(&mut self, index: usize, column: usize, value: &str) -> bool {
        let name = self.column_name(column);
        let action = ActionKey::element_tag(index, &name);
        self.elements
            .update_at(index, |g| g.with_tag(column, &name, value), Some(&action))
    }

    /// Remove element `index` together with every edge referring to it, as
    /// one undo step. Edges past it are renumbered. Returns the removed
    /// element, or None if out of range.
    pub fn remove_list_item_with_dependents(&mut self, index: usize) -> Option<Grapheme> {
        let removed = self.elements.get(index)?;

        let restore_elements = self.elements.restorer();
        let restore_edges = self.edges.restorer();
        self.changes.borrow_mut().push(
            Box::new(move || {
                restore_elements();
                restore_edges();
            }),
            None,
        );

        let mut elements = self.elements.to_vec();
        elements.remove(index);
        self.elements.set_untracked(elements);
        let edges = crate::model::edges_without(&self.edges.borrow(), index);
        self.edges.set_untracked(edges);
        self.colors.remove(index);

        log::debug!("Removed element {} of {}", index, self.id);
        Some(removed)
    }

    /// Set a record-level tag.
    pub fn set_record_tag(&mut self, column: usize, value: &str) {
        let name = self.column_name(column);
        let action = ActionKey::record_tag(&name);
        let updated = self.tags.borrow().with(column, &name, value);
        self.tags.set(updated, Some(&action));
    }

    /// Set a metadata field.
    pub fn set_meta(&mut self, field: &str, value: serde_json::Value) {
        self.meta
            .insert(field.to_string(), value, Some(&ActionKey::meta(field)));
    }

    /// Connect element `start` to element `end`.
    ///
    /// Returns false when either index is out of range, the edge would be a
    /// loop, or it already exists.
    pub fn add_edge(&mut self, start: usize, end: usize) -> bool {
        let len = self.elements.len();
        if !self.kind.has_edges() || start >= len || end >= len || start == end {
            return false;
        }
        if self
            .edges
            .borrow()
            .iter()
            .any(|e| e.start == start && e.end == end)
        {
            return false;
        }
        self.edges.append(Edge::new(start, end), None);
        true
    }

    /// Remove edge `index`. Returns false if out of range.
    pub fn remove_edge(&mut self, index: usize) -> bool {
        self.edges.remove_at(index, None).is_some()
    }

    /// Set tag `name` of edge `index`. Returns false if out of range.
    pub fn set_edge_tag(&mut self, index: usize, name: &str, value: &str) -> bool {
        let action = ActionKey::edge_tag(index, name);
        self.edges.update_at(
            index,
            |e| {
                let mut tags: BTreeMap<String, String> = e.tags.clone();
                tags.insert(name.to_string(), value.to_string());
                Edge {
                    tags,
                    ..e.clone()
                }
            },
            Some(&action),
        )
    }

    /// Override the display colour of element `index`. Not undoable.
    pub fn set_color(&mut self, index: usize, color: &str) -> bool {
        self.colors.sync(self.elements.len());
        self.colors.set(index, color)
    }
}

impl Drop for AnnotationSession {
    fn drop(&mut self) {
        if let Ok(mut stack) = self.changes.try_borrow_mut() {
            stack.release_guard();
        }
    }
}

impl std::fmt::Debug for AnnotationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("elements", &self.elements.len())
            .field("edges", &self.edges.len())
            .field("dirty", &self.dirty_level())
            .field("status", &self.status.get())
            .finish()
    }
}
