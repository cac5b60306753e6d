//! Bulk replacement of session contents.
//!
//! Importing detections or the result of a user function rewrites several
//! containers at once. Each import is a single undo step and never coalesces
//! with the previous one.

use super::AnnotationSession;
use crate::geometry;
use crate::model::{AutoAnnotation, Edge, FunctionResult, Grapheme, Meta, Tags};
use crate::undo::{ActionKey, Inverse};

/// New contents for some containers of a session. `None` leaves a
/// container as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacement {
    pub notes: Option<String>,
    pub elements: Option<Vec<Grapheme>>,
    pub edges: Option<Vec<Edge>>,
    pub tags: Option<Tags>,
    pub meta: Option<Meta>,
}

impl Replacement {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none()
            && self.elements.is_none()
            && self.edges.is_none()
            && self.tags.is_none()
            && self.meta.is_none()
    }
}

impl AnnotationSession {
    /// Replace the given containers as one undo step.
    ///
    /// Replacing the elements reassigns every colour from the start of the
    /// palette.
    pub fn replace_all(&mut self, replacement: Replacement, action: Option<&ActionKey>) {
        if replacement.is_empty() {
            return;
        }

        let mut restorers: Vec<Inverse> = Vec::new();
        if replacement.notes.is_some() {
            restorers.push(self.notes.restorer());
        }
        if replacement.elements.is_some() {
            restorers.push(self.elements.restorer());
        }
        if replacement.edges.is_some() {
            restorers.push(self.edges.restorer());
        }
        if replacement.tags.is_some() {
            restorers.push(self.tags.restorer());
        }
        if replacement.meta.is_some() {
            restorers.push(self.meta.restorer());
        }
        self.changes.borrow_mut().push(
            Box::new(move || {
                for restore in restorers {
                    restore();
                }
            }),
            action,
        );

        let Replacement {
            notes,
            elements,
            edges,
            tags,
            meta,
        } = replacement;
        if let Some(notes) = notes {
            self.notes.set_untracked(notes);
        }
        if let Some(elements) = elements {
            self.elements.set_untracked(elements);
            self.colors.reset();
            self.colors.sync(self.elements.len());
        }
        if let Some(edges) = edges {
            self.edges.set_untracked(edges);
        }
        if let Some(tags) = tags {
            self.tags.set_untracked(tags);
        }
        if let Some(meta) = meta {
            self.meta.set_untracked(meta);
        }
    }

    /// Whether importing detections would discard drawn elements, so the
    /// user should confirm first.
    pub fn needs_overwrite_confirmation(&self) -> bool {
        !self.elements.is_empty()
    }

    /// Replace the drawn elements with detected boxes, in reading order.
    ///
    /// Each detection's label goes into tag column `tag_index`. Existing
    /// edges no longer refer to anything and are cleared.
    pub fn apply_auto_annotation(&mut self, result: AutoAnnotation) {
        let column = self.column_name(result.tag_index);
        let empty = self.kind.empty_tags();
        let mut elements: Vec<Grapheme> = result
            .symbols
            .into_iter()
            .map(|d| Grapheme::new(d.bbox, empty.with(result.tag_index, &column, d.name)))
            .collect();
        geometry::sort_reading_order_with(
            &mut elements,
            |g| g.bbox.unwrap_or_default(),
            self.reading_order_tolerance,
        );
        log::info!(
            "🤖 Imported {} detections into {}",
            elements.len(),
            self.id
        );

        let edges = self.kind.has_edges().then(Vec::new);
        self.replace_all(
            Replacement {
                elements: Some(elements),
                edges,
                ..Replacement::default()
            },
            None,
        );
    }

    /// Overwrite record tags and metadata with what a user function returned.
    pub fn apply_function_result(&mut self, result: FunctionResult) {
        let FunctionResult { tags, meta } = result;
        self.replace_all(
            Replacement {
                tags,
                meta,
                ..Replacement::default()
            },
            None,
        );
    }
}
