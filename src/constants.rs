//! Global constants for the tagger editing core

/// Maximum number of undo steps kept per session
pub const MAX_UNDO_STEPS: usize = 30;

/// Left edges closer than this (in normalized units) are considered the same
/// column, and their boxes are ordered top to bottom instead.
pub const READING_ORDER_TOLERANCE: f64 = 0.09;

/// Display colours assigned round-robin to annotated elements.
pub const PALETTE: [&str; 10] = [
    "#FF0000", "#00FF00", "#0000FF", "#FF00FF", "#00FFFF", "#880000", "#008800", "#000088",
    "#888800", "#008888",
];

/// Prefix for every persisted preference key
pub const PREFERENCE_PREFIX: &str = "quevedo.";

/// Warning shown by the navigation guard while there are unsaved changes
pub const UNSAVED_CHANGES_WARNING: &str = "Warning: unsaved changes will be lost";
