//! Boundary with the record store.
//!
//! The session never performs I/O itself: it produces a snapshot, and an
//! [`AnnotationStore`] submits it and reports the response. [`JsonFileStore`]
//! is the filesystem-backed store used by the command line tool.

use std::path::{Path, PathBuf};

use crate::error::{SaveError, StoreError};
use crate::model::{AnnotationId, RecordPayload};

/// Outcome of submitting a record, shaped like an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl SubmitResponse {
    /// `200 OK`.
    pub fn ok() -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: "OK".to_string(),
        }
    }

    /// A response with an arbitrary status.
    pub fn with_status(status: u16, status_text: &str, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where records are loaded from and submitted to.
pub trait AnnotationStore {
    /// Initial values for every editable part of record `id`.
    fn load(&self, id: &AnnotationId) -> Result<RecordPayload, StoreError>;

    /// Submit the tracked fields of record `id`.
    ///
    /// `Err` means the submission did not get a response at all.
    fn submit(
        &mut self,
        id: &AnnotationId,
        body: &serde_json::Value,
    ) -> Result<SubmitResponse, SaveError>;
}

/// Records stored as `<root>/<dir>/<num>.json`, next to their images.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the JSON document of record `id`.
    pub fn record_path(&self, id: &AnnotationId) -> PathBuf {
        self.root.join(&id.dir).join(format!("{}.json", id.num))
    }

    /// The stored document, including fields the editor does not touch.
    pub fn load_document(
        &self,
        id: &AnnotationId,
    ) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        let json = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&json)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject { id: id.to_string() }),
        }
    }

    /// Overlay the top-level fields of `body` on the stored document.
    fn merge(&self, id: &AnnotationId, body: &serde_json::Value) -> Result<(), StoreError> {
        let serde_json::Value::Object(update) = body else {
            return Err(StoreError::NotAnObject { id: id.to_string() });
        };
        let mut document = self.load_document(id)?;
        for (key, value) in update {
            document.insert(key.clone(), value.clone());
        }
        let json = serde_json::to_string(&document)?;
        std::fs::write(self.record_path(id), json)?;
        Ok(())
    }
}

impl AnnotationStore for JsonFileStore {
    fn load(&self, id: &AnnotationId) -> Result<RecordPayload, StoreError> {
        let document = self.load_document(id)?;
        let payload = serde_json::from_value(serde_json::Value::Object(document))?;
        log::debug!("Loaded annotation {}", id);
        Ok(payload)
    }

    fn submit(
        &mut self,
        id: &AnnotationId,
        body: &serde_json::Value,
    ) -> Result<SubmitResponse, SaveError> {
        match self.merge(id, body) {
            Ok(()) => {
                log::info!("Stored annotation {}", id);
                Ok(SubmitResponse::ok())
            }
            Err(e @ StoreError::NotFound { .. }) => {
                Ok(SubmitResponse::with_status(404, "Not Found", e.to_string()))
            }
            Err(e @ StoreError::NotAnObject { .. }) => {
                Ok(SubmitResponse::with_status(400, "Bad Request", e.to_string()))
            }
            Err(StoreError::Io(e)) => Err(SaveError::Io(e)),
            Err(StoreError::Json(e)) => Err(SaveError::Json(e)),
        }
    }
}
