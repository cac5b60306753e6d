//! Data model of annotation records.

mod grapheme;
mod record;
mod tag;

pub use grapheme::{Edge, Grapheme, Symbol, edges_without};
pub use record::{
    AnnotationId, AnnotationKind, AutoAnnotation, Detection, FunctionResult, Meta, ParseIdError,
    RecordPayload, RecordSnapshot,
};
pub use tag::Tags;
