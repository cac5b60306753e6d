//! Tests for edits and their undo.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;

use super::{grapheme, logogram, names, transcription};
use crate::config::TaggerConfig;
use crate::geometry::BoundingBox;
use crate::model::{AnnotationId, AnnotationKind, Edge, Grapheme, RecordPayload, Tags};
use crate::session::AnnotationSession;
use crate::undo::{ActionKey, DirtyLevel, UnloadGuard};

#[test]
fn test_new_session_is_clean() {
    let session = logogram();
    assert_eq!(session.dirty_level(), DirtyLevel::Clean);
    assert!(!session.can_undo());
    assert_eq!(session.elements().len(), 3);
    assert_eq!(session.edges().len(), 2);
}

#[test]
fn test_notes_keystrokes_coalesce() {
    let mut session = transcription();
    session.set_notes("first line!");
    session.set_notes("first line!!");
    session.set_notes("first line!!!");
    assert_eq!(session.undo_len(), 1);

    assert!(session.undo());
    assert_eq!(session.notes().get(), "first line");
    assert!(!session.undo());
}

#[test]
fn test_undo_restores_dirty_level() {
    let mut session = transcription();
    session.set_notes("changed");
    assert_eq!(session.dirty_level(), DirtyLevel::Modified);
    session.undo();
    assert_eq!(session.dirty_level(), DirtyLevel::Clean);
}

#[test]
fn test_history_is_bounded() {
    let config = TaggerConfig {
        max_undo_steps: 3,
        ..TaggerConfig::default()
    };
    let mut session =
        AnnotationSession::builder(AnnotationKind::Logogram, AnnotationId::new("logos", 2))
            .config(&config)
            .build(RecordPayload::default());
    for i in 0..5 {
        session.add_element(grapheme(0.1 * i as f64, "x"), None);
    }
    assert_eq!(session.undo_len(), 3);
    while session.undo() {}
    // The two oldest appends can no longer be undone.
    assert_eq!(session.elements().len(), 2);
}

#[test]
fn test_box_edits_coalesce_per_element() {
    let mut session = logogram();
    let original = session.elements().get(0).unwrap();
    session.set_element_box(0, BoundingBox::new(0.2, 0.2, 0.1, 0.1));
    session.set_element_box(0, BoundingBox::new(0.3, 0.3, 0.2, 0.2));
    session.set_element_box(1, BoundingBox::new(0.6, 0.6, 0.1, 0.1));
    assert_eq!(session.undo_len(), 2);

    session.undo();
    session.undo();
    assert_eq!(session.elements().get(0).unwrap(), original);
}

#[test]
fn test_out_of_range_edits_are_noops() {
    let mut session = logogram();
    assert!(!session.set_element_box(7, BoundingBox::EMPTY));
    assert!(!session.set_element_tag(7, 0, "x"));
    assert!(session.remove_list_item_with_dependents(7).is_none());
    assert!(!session.remove_edge(5));
    assert_eq!(session.dirty_level(), DirtyLevel::Clean);
    assert!(!session.can_undo());
}

#[test]
fn test_element_tag_uses_schema_column() {
    let mut session = logogram();
    assert!(session.set_element_tag(2, 0, "h"));
    assert_eq!(names(&session), ["g0", "g1", "h"]);
    session.undo();
    assert_eq!(names(&session), ["g0", "g1", "g2"]);
}

#[test]
fn test_remove_grapheme_cascades_to_edges() {
    let mut session = logogram();
    let removed = session.remove_list_item_with_dependents(1).unwrap();
    assert_eq!(removed.tags.get(0, "COARSE"), Some("g1"));
    assert_eq!(names(&session), ["g0", "g2"]);
    assert!(session.edges().is_empty());
    assert_eq!(session.undo_len(), 1);

    assert!(session.undo());
    assert_eq!(names(&session), ["g0", "g1", "g2"]);
    assert_eq!(session.edges().to_vec(), [Edge::new(0, 1), Edge::new(1, 2)]);
    assert_eq!(session.dirty_level(), DirtyLevel::Clean);
}

#[test]
fn test_remove_renumbers_later_edges() {
    let mut session = logogram();
    session.add_element(grapheme(0.9, "g3"), None);
    assert!(session.add_edge(2, 3));
    session.remove_list_item_with_dependents(0);
    assert_eq!(session.edges().to_vec(), [Edge::new(0, 1), Edge::new(1, 2)]);
}

#[test]
fn test_remove_restores_sibling_order() {
    let mut session = transcription();
    for name in ["a", "b", "c"] {
        let tags = Tags::positional().with(0, "0", name);
        session.add_element(Grapheme::new(BoundingBox::new(0.5, 0.5, 0.1, 0.1), tags), None);
    }
    session.remove_list_item_with_dependents(1);
    session.set_notes("edited");
    session.undo();
    session.undo();
    let tags: Vec<Option<String>> = session
        .elements()
        .borrow()
        .iter()
        .map(|g| g.tags.get(0, "0").map(str::to_string))
        .collect();
    let expected: Vec<Option<String>> = ["a", "b", "c"].iter().map(|s| Some(s.to_string())).collect();
    assert_eq!(tags, expected);
}

#[test]
fn test_add_edge_rejects_invalid() {
    let mut session = logogram();
    assert!(!session.add_edge(0, 0));
    assert!(!session.add_edge(0, 1));
    assert!(!session.add_edge(0, 9));
    assert!(session.add_edge(2, 0));
    assert_eq!(session.edges().len(), 3);

    let mut transcription = transcription();
    transcription.add_element(grapheme(0.1, "a"), None);
    transcription.add_element(grapheme(0.2, "b"), None);
    assert!(!transcription.add_edge(0, 1));
}

#[test]
fn test_edge_tag_undo() {
    let mut session = logogram();
    assert!(session.set_edge_tag(0, "relation", "above"));
    assert_eq!(
        session.edges().get(0).unwrap().tags.get("relation").map(String::as_str),
        Some("above")
    );
    session.undo();
    assert!(session.edges().get(0).unwrap().tags.is_empty());
}

#[test]
fn test_record_tags_and_meta() {
    let columns = vec!["COARSE".to_string(), "FINE".to_string()];
    let payload = RecordPayload {
        tags: Some(Tags::Positional(vec![Some("A".into())])),
        ..RecordPayload::default()
    };
    let mut session =
        AnnotationSession::builder(AnnotationKind::Grapheme, AnnotationId::new("graphemes", 4))
            .columns(columns)
            .build(payload);
    assert_eq!(session.record_tag(0), Some("A".to_string()));

    session.set_record_tag(1, "a1");
    session.set_meta("source", json!("scan"));
    assert_eq!(session.record_tag(1), Some("a1".to_string()));
    assert_eq!(
        session.tags().get(),
        Tags::Positional(vec![Some("A".into()), Some("a1".into())])
    );
    assert_eq!(session.undo_len(), 2);

    session.undo();
    assert!(session.meta().is_empty());
    session.undo();
    assert_eq!(session.record_tag(1), None);
    assert_eq!(session.tags().get(), Tags::Positional(vec![Some("A".into())]));
}

#[test]
fn test_named_record_tags_stay_named() {
    let payload = RecordPayload {
        tags: Some(Tags::named().with(0, "COARSE", "A")),
        ..RecordPayload::default()
    };
    let mut session =
        AnnotationSession::builder(AnnotationKind::Grapheme, AnnotationId::new("graphemes", 5))
            .columns(vec!["COARSE".to_string(), "FINE".to_string()])
            .build(payload);
    session.set_record_tag(1, "b");
    assert_eq!(
        session.tags().get(),
        Tags::named().with(0, "COARSE", "A").with(1, "FINE", "b")
    );
}

#[test]
fn test_colors_follow_elements() {
    let mut session = logogram();
    assert_eq!(session.color(0), "#FF0000");
    assert_eq!(session.color(2), "#0000FF");

    let index = session.add_element(grapheme(0.9, "g3"), Some(&ActionKey::box_edit(3)));
    assert_eq!(session.color(index), "#FF00FF");

    session.remove_list_item_with_dependents(0);
    assert_eq!(session.color(0), "#00FF00");
    assert_eq!(session.colors().len(), 3);

    assert!(session.set_color(1, "#123456"));
    assert_eq!(session.color(1), "#123456");
    assert_eq!(session.undo_len(), 2);
}

#[test]
fn test_element_at_prefers_topmost() {
    let payload = RecordPayload {
        graphemes: vec![
            Grapheme::new(BoundingBox::new(0.5, 0.5, 0.8, 0.8), Tags::named()),
            Grapheme::new(BoundingBox::new(0.5, 0.5, 0.2, 0.2), Tags::named()),
        ],
        ..RecordPayload::default()
    };
    let session = AnnotationSession::new(
        AnnotationKind::Logogram,
        AnnotationId::new("logos", 5),
        payload,
    );
    assert_eq!(session.element_at(0.5, 0.5), Some(1));
    assert_eq!(session.element_at(0.2, 0.2), Some(0));
    assert_eq!(session.element_at(0.99, 0.01), None);
}

struct CountingGuard(Rc<Cell<i32>>);

impl UnloadGuard for CountingGuard {
    fn arm(&mut self) {
        self.0.set(self.0.get() + 1);
    }
    fn disarm(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

#[test]
fn test_guard_released_on_drop() {
    let armed = Rc::new(Cell::new(0));
    let mut session =
        AnnotationSession::builder(AnnotationKind::Transcription, AnnotationId::new("t", 1))
            .guard(CountingGuard(armed.clone()))
            .build(RecordPayload::default());
    session.set_notes("x");
    session.set_notes("xy");
    assert_eq!(armed.get(), 1);
    drop(session);
    assert_eq!(armed.get(), 0);
}
