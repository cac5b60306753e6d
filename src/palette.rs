//! Display colours of annotated elements.
//!
//! Colours are view state: they are never saved and never undone. Each
//! session owns its own assignment, derived from element positions.

use crate::constants::PALETTE;
use crate::observable::ObservableList;

/// Palette colour for the element at `index`, round-robin.
pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Colours shown for a session's elements, overridable per element.
#[derive(Debug)]
pub struct ColorAssignment {
    palette: Vec<String>,
    colors: ObservableList<String>,
}

impl Default for ColorAssignment {
    fn default() -> Self {
        Self::new(PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl ColorAssignment {
    /// Assign colours from `palette`. An empty palette falls back to the
    /// built-in one.
    pub fn new(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            palette,
            colors: ObservableList::untracked(Vec::new()),
        }
    }

    fn palette_color(&self, index: usize) -> String {
        self.palette[index % self.palette.len()].clone()
    }

    /// Make sure there is exactly one colour for each of `len` elements.
    ///
    /// When the element list outgrew the colours (an undo brought elements
    /// back) every colour is recomputed from its position. Colours of
    /// elements that no longer exist are dropped.
    pub fn sync(&self, len: usize) {
        let current = self.colors.len();
        if current < len {
            let colors = (0..len).map(|i| self.palette_color(i)).collect();
            self.colors.set_untracked(colors);
        } else if current > len {
            let mut colors = self.colors.to_vec();
            colors.truncate(len);
            self.colors.set_untracked(colors);
        }
    }

    /// Colour for a newly appended element.
    pub fn push_next(&self) {
        let next = self.palette_color(self.colors.len());
        self.colors.append(next, None);
    }

    /// Forget the colour of a removed element.
    pub fn remove(&self, index: usize) {
        self.colors.remove_at(index, None);
    }

    /// User override of one element's colour.
    pub fn set(&self, index: usize, color: impl Into<String>) -> bool {
        self.colors.replace_at(index, color.into(), None)
    }

    /// Colour of element `index`, falling back to its palette colour.
    pub fn get(&self, index: usize) -> String {
        self.colors
            .get(index)
            .unwrap_or_else(|| self.palette_color(index))
    }

    /// Drop every assignment, e.g. after the element list was replaced.
    pub fn reset(&self) {
        self.colors.set_untracked(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.colors.revision()
    }
}
