//! Pointer and keyboard interaction with the annotated image.
//!
//! [`DrawingState`] is a plain value: every event handler takes the current
//! state and returns the next one, applying edits to the session on the way.
//!
//! | State        | Event                          | Next state   |
//! |--------------|--------------------------------|--------------|
//! | `Idle`       | pointer down on image          | `DrawingBox` (new element) |
//! | `Selected`   | pointer down on image          | `DrawingBox` (redraw selected) |
//! | `DrawingBox` | pointer move                   | `DrawingBox` (box follows pointer) |
//! | `DrawingBox` | pointer up                     | `Selected`   |
//! | `Selected`   | begin edge                     | `DrawingEdge` |
//! | `DrawingEdge`| pointer move                   | `DrawingEdge` |
//! | `DrawingEdge`| pointer up                     | `Selected` (edge added if over an element) |
//! | any          | outside click / Enter          | `Idle`       |

use crate::geometry::{self, BoundingBox, ImageSize, PixelPoint};
use crate::model::Grapheme;
use crate::session::AnnotationSession;
use crate::undo::ActionKey;

/// Where the user is in drawing boxes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingState {
    /// Nothing selected.
    #[default]
    Idle,
    /// Dragging out the box of element `index` from `start`.
    DrawingBox { index: usize, start: PixelPoint },
    /// Dragging an edge out of element `start`.
    DrawingEdge { start: usize, cursor: PixelPoint },
    /// Element `index` is highlighted; its row has focus.
    Selected { index: usize },
}

/// Keys the drawing state reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

impl DrawingState {
    /// Check if a pointer drag is in progress.
    pub fn is_drawing(&self) -> bool {
        matches!(
            self,
            DrawingState::DrawingBox { .. } | DrawingState::DrawingEdge { .. }
        )
    }

    /// Element currently highlighted, if any.
    pub fn selected(&self) -> Option<usize> {
        match *self {
            DrawingState::Idle => None,
            DrawingState::DrawingBox { index, .. } | DrawingState::Selected { index } => {
                Some(index)
            }
            DrawingState::DrawingEdge { start, .. } => Some(start),
        }
    }

    /// Focus moved to the row of element `index`.
    pub fn select(self, session: &AnnotationSession, index: usize) -> Self {
        if index < session.elements().len() {
            DrawingState::Selected { index }
        } else {
            self
        }
    }

    /// Pointer pressed on the image at `pos`.
    ///
    /// With nothing selected this appends a new element; with an element
    /// selected it redraws that element's box. The append and every box
    /// update of the drag share one action key, so the whole drag undoes as
    /// one step.
    pub fn pointer_down(
        self,
        session: &mut AnnotationSession,
        pos: PixelPoint,
        size: ImageSize,
    ) -> Self {
        if !size.is_laid_out() || !session.kind().draws_boxes() {
            return self;
        }
        let index = match self {
            DrawingState::Selected { index } if index < session.elements().len() => index,
            DrawingState::Idle | DrawingState::Selected { .. } => {
                let index = session.elements().len();
                let placeholder = Grapheme::placeholder(session.kind().empty_tags());
                session.add_element(placeholder, Some(&ActionKey::box_edit(index)))
            }
            drawing => return drawing,
        };
        let (x, y) = size.normalize(pos);
        session.set_element_box(index, BoundingBox::new(x, y, 0.0, 0.0));
        DrawingState::DrawingBox { index, start: pos }
    }

    /// Pointer moved to `pos`.
    pub fn pointer_move(
        self,
        session: &mut AnnotationSession,
        pos: PixelPoint,
        size: ImageSize,
    ) -> Self {
        if !size.is_laid_out() {
            return self;
        }
        match self {
            DrawingState::DrawingBox { index, start } => {
                session.set_element_box(index, geometry::from_drag(start, pos, size));
                self
            }
            DrawingState::DrawingEdge { start, .. } => DrawingState::DrawingEdge { start, cursor: pos },
            other => other,
        }
    }

    /// Pointer released at `pos`. The drawn element stays selected.
    pub fn pointer_up(
        self,
        session: &mut AnnotationSession,
        pos: PixelPoint,
        size: ImageSize,
    ) -> Self {
        match self {
            DrawingState::DrawingBox { index, .. } => DrawingState::Selected { index },
            DrawingState::DrawingEdge { start, .. } => {
                if size.is_laid_out() {
                    let (x, y) = size.normalize(pos);
                    if let Some(end) = session.element_at(x, y) {
                        session.add_edge(start, end);
                    }
                }
                DrawingState::Selected { index: start }
            }
            other => other,
        }
    }

    /// Start dragging an edge out of the selected element.
    pub fn begin_edge(self, session: &AnnotationSession, cursor: PixelPoint) -> Self {
        match self {
            DrawingState::Selected { index }
                if session.kind().has_edges() && index < session.elements().len() =>
            {
                DrawingState::DrawingEdge {
                    start: index,
                    cursor,
                }
            }
            other => other,
        }
    }

    /// Pointer pressed anywhere outside the image and the element rows.
    pub fn outside_click(self) -> Self {
        DrawingState::Idle
    }

    /// Key pressed while an element row has focus.
    pub fn key(self, key: Key) -> Self {
        match key {
            Key::Enter => DrawingState::Idle,
            Key::Other => self,
        }
    }

    /// Adjust after element `removed` was deleted.
    pub fn element_removed(self, removed: usize) -> Self {
        match self.selected() {
            Some(index) if index == removed => DrawingState::Idle,
            Some(index) if index > removed => DrawingState::Selected { index: index - 1 },
            _ => self,
        }
    }
}
