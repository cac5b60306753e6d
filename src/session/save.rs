//! Save lifecycle of a session.
//!
//! `begin_save` moves the session to Saving and hands out a snapshot; the
//! caller submits it and reports back through `on_save_success` or
//! `on_save_failure`. Only one save may be in flight. A failed save changes
//! no data, so the user can retry.

use std::fmt;

use web_time::Instant;

use super::AnnotationSession;
use crate::error::SaveError;
use crate::model::{AnnotationKind, RecordSnapshot};
use crate::store::{AnnotationStore, SubmitResponse};
use crate::undo::DirtyLevel;

/// Transient status line shown next to the save control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error(String),
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Idle => Ok(()),
            SaveStatus::Saving => f.write_str("Saving..."),
            SaveStatus::Saved => f.write_str("Saved"),
            SaveStatus::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

impl AnnotationSession {
    /// Current save status line.
    pub fn status(&self) -> SaveStatus {
        self.status.get()
    }

    /// When the last successful save completed.
    pub fn last_saved(&self) -> Option<Instant> {
        self.last_saved
    }

    /// Whether a save request is awaiting its response.
    pub fn is_saving(&self) -> bool {
        self.save_in_flight
    }

    /// Whether the save control should be shown.
    pub fn can_save(&self) -> bool {
        !self.save_in_flight && self.dirty_level() == DirtyLevel::Modified
    }

    /// Current values of the fields this kind of record edits.
    pub fn snapshot(&self) -> RecordSnapshot {
        match self.kind {
            AnnotationKind::Transcription => RecordSnapshot::Transcription {
                notes: self.notes.get(),
                symbols: self.elements.to_vec(),
            },
            AnnotationKind::Grapheme => RecordSnapshot::Grapheme {
                meta: self.meta.to_map(),
                tags: self.tags.get(),
            },
            AnnotationKind::Logogram => RecordSnapshot::Logogram {
                meta: self.meta.to_map(),
                graphemes: self.elements.to_vec(),
                edges: self.edges.to_vec(),
            },
        }
    }

    /// Enter the Saving state and return what has to be submitted.
    pub fn begin_save(&mut self) -> Result<RecordSnapshot, SaveError> {
        if self.save_in_flight {
            return Err(SaveError::AlreadySaving);
        }
        self.save_in_flight = true;
        self.changes.borrow_mut().mark_saving();
        self.status.set_untracked(SaveStatus::Saving);
        log::debug!("Saving {}", self.id);
        Ok(self.snapshot())
    }

    /// The store accepted the submitted snapshot.
    ///
    /// Edits made while the request was in flight keep the session Modified.
    pub fn on_save_success(&mut self) -> Result<(), SaveError> {
        if !self.save_in_flight {
            return Err(SaveError::NotSaving);
        }
        self.save_in_flight = false;
        let mut stack = self.changes.borrow_mut();
        if stack.dirty_level() == DirtyLevel::Saving {
            stack.mark_saved();
        } else {
            stack.mark_saved_while_modified();
        }
        drop(stack);
        self.last_saved = Some(Instant::now());
        self.status.set_untracked(SaveStatus::Saved);
        log::info!("💾 Saved {}", self.id);
        Ok(())
    }

    /// The store did not accept the snapshot. Nothing is rolled back.
    pub fn on_save_failure(&mut self, error: &SaveError) -> Result<(), SaveError> {
        if !self.save_in_flight {
            return Err(SaveError::NotSaving);
        }
        self.save_in_flight = false;
        let mut stack = self.changes.borrow_mut();
        if stack.dirty_level() == DirtyLevel::Saving {
            stack.mark_save_failed();
        }
        drop(stack);
        log::warn!("Failed to save {}: {}", self.id, error);
        self.status.set_untracked(SaveStatus::Error(error.to_string()));
        Ok(())
    }

    /// Complete the save in flight with the outcome of its submission.
    ///
    /// Non-2xx responses become [`SaveError::Rejected`] or
    /// [`SaveError::Server`] and are returned after the session has recorded
    /// them.
    pub fn finish_save(
        &mut self,
        outcome: Result<SubmitResponse, SaveError>,
    ) -> Result<(), SaveError> {
        let error = match outcome {
            Ok(response) => match SaveError::from_response(&response) {
                None => return self.on_save_success(),
                Some(error) => error,
            },
            Err(error) => error,
        };
        self.on_save_failure(&error)?;
        Err(error)
    }

    /// Save synchronously through `store`.
    pub fn save_to(&mut self, store: &mut impl AnnotationStore) -> Result<(), SaveError> {
        let snapshot = self.begin_save()?;
        let outcome = snapshot
            .to_json()
            .map_err(SaveError::from)
            .and_then(|body| store.submit(&self.id, &body));
        self.finish_save(outcome)
    }
}
