//! Editing core of the quevedo annotation tagger.
//!
//! An [`AnnotationSession`] holds the editable parts of one record (notes,
//! drawn graphemes, edges, tags, metadata) in observable containers that
//! share an undo history. Edits coalesce by action key, the history tracks
//! whether there are unsaved changes, and saving hands a snapshot to an
//! [`AnnotationStore`](store::AnnotationStore).
//!
//! Boxes are kept in normalized image coordinates; [`geometry`] converts
//! them to and from on-screen pixels, and [`interaction::DrawingState`]
//! turns pointer events into edits.

pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod model;
pub mod observable;
pub mod palette;
pub mod preferences;
pub mod session;
pub mod store;
pub mod undo;

pub use config::TaggerConfig;
pub use error::{PreferenceError, SaveError, StoreError};
pub use session::{AnnotationSession, SaveStatus};
pub use undo::{ActionKey, DirtyLevel, UndoStack};

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
