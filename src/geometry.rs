//! Conversion between normalized boxes and on-screen pixels.
//!
//! Boxes are stored as `[cx, cy, w, h]`, each a fraction of the image
//! dimensions, so annotations survive the image being displayed at any size.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::constants::READING_ORDER_TOLERANCE;

/// Box in normalized image coordinates, centre plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Horizontal centre
    pub cx: f64,
    /// Vertical centre
    pub cy: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl BoundingBox {
    /// Placeholder box of an element that has not been drawn yet.
    pub const EMPTY: BoundingBox = BoundingBox {
        cx: 0.0,
        cy: 0.0,
        w: 0.0,
        h: 0.0,
    };

    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }

    /// Normalized left edge.
    pub fn left(&self) -> f64 {
        self.cx - self.w / 2.0
    }

    /// Normalized top edge.
    pub fn top(&self) -> f64 {
        self.cy - self.h / 2.0
    }

    /// Whether the normalized point lies inside the box (edges included).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let left = self.left();
        let top = self.top();
        x >= left && x <= left + self.w && y >= top && y <= top + self.h
    }

    /// A box is placed once its centre is a real coordinate.
    pub fn is_placed(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite()
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([cx, cy, w, h]: [f64; 4]) -> Self {
        Self { cx, cy, w, h }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.cx, b.cy, b.w, b.h]
    }
}

/// Rendered size of the image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// An image that has not been laid out yet reports a zero size; pointer
    /// positions cannot be normalized against it.
    pub fn is_laid_out(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Normalize a pixel position relative to the image's top-left corner.
    pub fn normalize(&self, point: PixelPoint) -> (f64, f64) {
        (point.x / self.width, point.y / self.height)
    }
}

/// Pointer position in pixels, relative to the image's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen rectangle of a box, rounded to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

/// Round to the nearest integer, halves towards positive infinity.
fn round_px(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Pixel rectangle covered by `bbox` on an image of `size`.
///
/// Returns None for a box that has not been placed yet.
pub fn to_pixels(bbox: &BoundingBox, size: ImageSize) -> Option<PixelRect> {
    if !bbox.is_placed() {
        return None;
    }
    Some(PixelRect {
        left: round_px(bbox.left() * size.width),
        top: round_px(bbox.top() * size.height),
        width: round_px(bbox.w * size.width),
        height: round_px(bbox.h * size.height),
    })
}

/// Box spanned by a drag from `start` to `current`, in any direction.
pub fn from_drag(start: PixelPoint, current: PixelPoint, size: ImageSize) -> BoundingBox {
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    BoundingBox {
        cx: (start.x + dx / 2.0) / size.width,
        cy: (start.y + dy / 2.0) / size.height,
        w: dx.abs() / size.width,
        h: dy.abs() / size.height,
    }
}

/// Approximate reading order: left to right, and top to bottom for boxes
/// whose left edges are within `tolerance` of each other.
pub fn reading_order(a: &BoundingBox, b: &BoundingBox, tolerance: f64) -> Ordering {
    let (left_a, left_b) = (a.left(), b.left());
    if (left_b - left_a).abs() < tolerance {
        a.top().total_cmp(&b.top())
    } else {
        left_a.total_cmp(&left_b)
    }
}

/// Sort `items` in reading order using [`READING_ORDER_TOLERANCE`].
pub fn sort_reading_order<T>(items: &mut [T], bbox: impl Fn(&T) -> BoundingBox) {
    sort_reading_order_with(items, bbox, READING_ORDER_TOLERANCE);
}

/// Sort `items` in reading order with a custom column tolerance.
///
/// The tolerance makes the comparison non-transitive, which slice sorting
/// does not accept, so this is a stable insertion sort. Detection batches are
/// small.
pub fn sort_reading_order_with<T>(
    items: &mut [T],
    bbox: impl Fn(&T) -> BoundingBox,
    tolerance: f64,
) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0
            && reading_order(&bbox(&items[j]), &bbox(&items[j - 1]), tolerance) == Ordering::Less
        {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Index of the topmost box containing the normalized point.
///
/// Later boxes are drawn over earlier ones, so the search runs backwards.
pub fn hit_test<'a>(
    boxes: impl DoubleEndedIterator<Item = &'a BoundingBox> + ExactSizeIterator,
    x: f64,
    y: f64,
) -> Option<usize> {
    let len = boxes.len();
    boxes
        .rev()
        .position(|b| b.is_placed() && b.contains(x, y))
        .map(|from_end| len - 1 - from_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: ImageSize = ImageSize {
        width: 400.0,
        height: 300.0,
    };

    #[test]
    fn test_to_pixels() {
        let rect = to_pixels(&BoundingBox::new(0.5, 0.5, 0.5, 0.2), SIZE).unwrap();
        assert_eq!(
            rect,
            PixelRect {
                left: 100,
                top: 120,
                width: 200,
                height: 60
            }
        );
    }

    #[test]
    fn test_unplaced_box_has_no_pixels() {
        let bbox = BoundingBox::new(f64::NAN, 0.5, 0.1, 0.1);
        assert!(to_pixels(&bbox, SIZE).is_none());
    }

    #[test]
    fn test_from_drag_any_direction() {
        let a = PixelPoint::new(40.0, 30.0);
        let b = PixelPoint::new(120.0, 90.0);
        let forward = from_drag(a, b, SIZE);
        let backward = from_drag(b, a, SIZE);
        assert_eq!(forward, backward);
        assert!(forward.w >= 0.0 && forward.h >= 0.0);

        let diagonal = from_drag(PixelPoint::new(120.0, 30.0), PixelPoint::new(40.0, 90.0), SIZE);
        assert_eq!(diagonal, forward);
    }

    #[test]
    fn test_drag_round_trip() {
        let drags = [
            ((10.0, 20.0), (110.0, 70.0)),
            ((110.0, 70.0), (10.0, 20.0)),
            ((300.0, 5.0), (250.5, 280.25)),
            ((0.0, 299.0), (399.0, 0.0)),
        ];
        for ((x0, y0), (x1, y1)) in drags {
            let bbox = from_drag(PixelPoint::new(x0, y0), PixelPoint::new(x1, y1), SIZE);
            let rect = to_pixels(&bbox, SIZE).unwrap();
            let left = f64::min(x0, x1);
            let top = f64::min(y0, y1);
            assert!((rect.left as f64 - left).abs() <= 1.0, "{rect:?}");
            assert!((rect.top as f64 - top).abs() <= 1.0, "{rect:?}");
            assert!((rect.width as f64 - (x1 - x0).abs()).abs() <= 1.0, "{rect:?}");
            assert!((rect.height as f64 - (y1 - y0).abs()).abs() <= 1.0, "{rect:?}");
        }
    }

    #[test]
    fn test_reading_order_same_column_uses_top() {
        // Left edges 0.10 and 0.15: same column.
        let upper = BoundingBox::new(0.20, 0.20, 0.2, 0.1);
        let lower = BoundingBox::new(0.20, 0.80, 0.1, 0.1);
        assert_eq!(reading_order(&lower, &upper, 0.09), Ordering::Greater);
        assert_eq!(reading_order(&upper, &lower, 0.09), Ordering::Less);
    }

    #[test]
    fn test_reading_order_far_columns_use_left() {
        // Left edges 0.1 and 0.3, the right one higher up.
        let left = BoundingBox::new(0.15, 0.9, 0.1, 0.1);
        let right = BoundingBox::new(0.35, 0.1, 0.1, 0.1);
        assert_eq!(reading_order(&left, &right, 0.09), Ordering::Less);
        assert_eq!(reading_order(&right, &left, 0.09), Ordering::Greater);
    }

    #[test]
    fn test_sort_reading_order() {
        let mut boxes = vec![
            BoundingBox::new(0.55, 0.2, 0.1, 0.1),
            BoundingBox::new(0.15, 0.7, 0.1, 0.1),
            BoundingBox::new(0.17, 0.2, 0.1, 0.1),
        ];
        sort_reading_order(&mut boxes, |b| *b);
        assert_eq!(boxes[0].cy, 0.2);
        assert_eq!(boxes[0].cx, 0.17);
        assert_eq!(boxes[1].cy, 0.7);
        assert_eq!(boxes[2].cx, 0.55);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let boxes = [
            BoundingBox::new(0.5, 0.5, 0.6, 0.6),
            BoundingBox::new(0.5, 0.5, 0.2, 0.2),
            BoundingBox::new(0.9, 0.9, 0.1, 0.1),
        ];
        assert_eq!(hit_test(boxes.iter(), 0.5, 0.5), Some(1));
        assert_eq!(hit_test(boxes.iter(), 0.3, 0.3), Some(0));
        assert_eq!(hit_test(boxes.iter(), 0.05, 0.95), None);
    }

    #[test]
    fn test_box_serializes_as_array() {
        let bbox = BoundingBox::new(0.5, 0.25, 0.1, 0.2);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[0.5,0.25,0.1,0.2]");
        let parsed: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bbox);
    }
}
