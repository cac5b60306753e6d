//! Annotation records as exchanged with the store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Edge, Grapheme, Tags};
use crate::geometry::BoundingBox;

/// Free-form metadata of a record (author, date, source filename...).
pub type Meta = BTreeMap<String, serde_json::Value>;

/// The kinds of record the tagger edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Image transcription: free-text notes plus drawn symbols.
    Transcription,
    /// Isolated grapheme: metadata plus record-level tags.
    Grapheme,
    /// Logogram: metadata, drawn graphemes and the edges between them.
    Logogram,
}

impl AnnotationKind {
    /// Display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationKind::Transcription => "Transcription",
            AnnotationKind::Grapheme => "Grapheme",
            AnnotationKind::Logogram => "Logogram",
        }
    }

    /// Whether elements are drawn as boxes over the image.
    pub fn draws_boxes(&self) -> bool {
        !matches!(self, AnnotationKind::Grapheme)
    }

    /// Whether graphemes can be connected by edges.
    pub fn has_edges(&self) -> bool {
        matches!(self, AnnotationKind::Logogram)
    }

    /// Tags of a freshly drawn element, or of a grapheme record stored
    /// without any.
    pub fn empty_tags(&self) -> Tags {
        match self {
            AnnotationKind::Logogram => Tags::named(),
            _ => Tags::positional(),
        }
    }
}

/// Location of a record: its directory and number within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationId {
    pub dir: String,
    pub num: u32,
}

impl AnnotationId {
    pub fn new(dir: impl Into<String>, num: u32) -> Self {
        Self {
            dir: dir.into(),
            num,
        }
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dir, self.num)
    }
}

/// Error parsing an [`AnnotationId`] from `dir/num`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid annotation id '{0}', expected <dir>/<number>")]
pub struct ParseIdError(String);

impl FromStr for AnnotationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dir, num) = s.rsplit_once('/').ok_or_else(|| ParseIdError(s.to_string()))?;
        if dir.is_empty() {
            return Err(ParseIdError(s.to_string()));
        }
        let num = num.parse().map_err(|_| ParseIdError(s.to_string()))?;
        Ok(Self::new(dir, num))
    }
}

/// Initial values of every editable part of a record, as loaded.
///
/// Fields a kind does not use are simply left empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub symbols: Vec<Grapheme>,
    #[serde(default)]
    pub graphemes: Vec<Grapheme>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Record-level tags; None when the record has none stored.
    #[serde(default)]
    pub tags: Option<Tags>,
    #[serde(default)]
    pub meta: Meta,
}

/// The tracked fields of a record at the moment a save begins.
///
/// Serializes to exactly the fields its kind edits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordSnapshot {
    Transcription {
        notes: String,
        symbols: Vec<Grapheme>,
    },
    Grapheme {
        meta: Meta,
        tags: Tags,
    },
    Logogram {
        meta: Meta,
        graphemes: Vec<Grapheme>,
        edges: Vec<Edge>,
    },
}

impl RecordSnapshot {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            RecordSnapshot::Transcription { .. } => AnnotationKind::Transcription,
            RecordSnapshot::Grapheme { .. } => AnnotationKind::Grapheme,
            RecordSnapshot::Logogram { .. } => AnnotationKind::Logogram,
        }
    }

    /// JSON body to submit.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// One box found by the auto-annotation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Predicted label
    pub name: String,
}

/// Result set returned by the auto-annotation service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoAnnotation {
    pub symbols: Vec<Detection>,
    /// Tag schema column the predicted labels belong to
    #[serde(default)]
    pub tag_index: usize,
}

/// Full rewrite of tags and metadata returned by a user function.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionResult {
    #[serde(default)]
    pub tags: Option<Tags>,
    #[serde(default)]
    pub meta: Option<Meta>,
}
