//! Tests for editing sessions: undo behaviour across containers, the save
//! lifecycle and bulk imports.

mod editing_tests;

use crate::geometry::BoundingBox;
use crate::model::{AnnotationId, AnnotationKind, Edge, Grapheme, RecordPayload, Tags};

use super::AnnotationSession;

fn grapheme(cx: f64, name: &str) -> Grapheme {
    Grapheme::new(
        BoundingBox::new(cx, 0.5, 0.1, 0.1),
        Tags::named().with(0, "COARSE", name),
    )
}

/// Logogram with graphemes g0, g1, g2 and edges 0→1, 1→2.
fn logogram() -> AnnotationSession {
    let payload = RecordPayload {
        graphemes: vec![grapheme(0.1, "g0"), grapheme(0.4, "g1"), grapheme(0.7, "g2")],
        edges: vec![Edge::new(0, 1), Edge::new(1, 2)],
        ..RecordPayload::default()
    };
    AnnotationSession::builder(AnnotationKind::Logogram, AnnotationId::new("logos", 1))
        .columns(vec!["COARSE".to_string()])
        .build(payload)
}

fn transcription() -> AnnotationSession {
    let payload = RecordPayload {
        notes: "first line".to_string(),
        ..RecordPayload::default()
    };
    AnnotationSession::new(
        AnnotationKind::Transcription,
        AnnotationId::new("transcriptions", 3),
        payload,
    )
}

fn names(session: &AnnotationSession) -> Vec<String> {
    session
        .elements()
        .borrow()
        .iter()
        .map(|g| g.tags.get(0, "COARSE").unwrap_or_default().to_string())
        .collect()
}
