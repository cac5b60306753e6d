//! Graphemes (symbols) and the edges between them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Tags;
use crate::geometry::{self, BoundingBox, ImageSize, PixelRect};

/// An annotated sub-region of the image: a box plus its tags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grapheme {
    /// Box in normalized coordinates; absent until drawn.
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub tags: Tags,
}

/// Transcriptions call their graphemes symbols.
pub type Symbol = Grapheme;

impl Grapheme {
    pub fn new(bbox: BoundingBox, tags: Tags) -> Self {
        Self {
            bbox: Some(bbox),
            tags,
        }
    }

    /// Element created by pressing on the image, before it is dragged out.
    pub fn placeholder(tags: Tags) -> Self {
        Self::new(BoundingBox::EMPTY, tags)
    }

    /// Copy with the box replaced.
    pub fn with_box(&self, bbox: BoundingBox) -> Self {
        Self {
            bbox: Some(bbox),
            tags: self.tags.clone(),
        }
    }

    /// Copy with one tag column set.
    pub fn with_tag(&self, column: usize, name: &str, value: impl Into<String>) -> Self {
        Self {
            bbox: self.bbox,
            tags: self.tags.with(column, name, value),
        }
    }

    /// On-screen rectangle, or None if the box has not been drawn.
    pub fn pixel_rect(&self, size: ImageSize) -> Option<PixelRect> {
        geometry::to_pixels(self.bbox.as_ref()?, size)
    }
}

/// Directed relation between two graphemes of a logogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Index of the source grapheme
    pub start: usize,
    /// Index of the target grapheme
    pub end: usize,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Edge {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            tags: BTreeMap::new(),
        }
    }

    /// Whether either endpoint is grapheme `index`.
    pub fn touches(&self, index: usize) -> bool {
        self.start == index || self.end == index
    }
}

/// Edges left after removing grapheme `removed`: edges touching it are
/// dropped and endpoints past it shift down by one.
pub fn edges_without(edges: &[Edge], removed: usize) -> Vec<Edge> {
    let shift = |i: usize| if i > removed { i - 1 } else { i };
    edges
        .iter()
        .filter(|e| !e.touches(removed))
        .map(|e| Edge {
            start: shift(e.start),
            end: shift(e.end),
            tags: e.tags.clone(),
        })
        .collect()
}
