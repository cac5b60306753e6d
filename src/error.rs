//! Error types of the tagger core.
//!
//! Out-of-range indices, undo on an empty history and coalesced pushes are not
//! errors: they are expected races between UI events and are reported as
//! `false`/`None` by the operations themselves.

use thiserror::Error;

pub use crate::config::ConfigError;
use crate::store::SubmitResponse;

/// Errors that end a save attempt. Edits stay in memory so the save can be
/// retried.
#[derive(Error, Debug)]
pub enum SaveError {
    /// The store refused the data (4xx); the message comes from the response body
    #[error("{message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Validation message sent by the store
        message: String,
    },

    /// The store failed (5xx); only the status line is shown
    #[error("{status_text}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Reason phrase of the status line
        status_text: String,
    },

    /// The request never got a response
    #[error("{0}")]
    Transport(String),

    /// I/O error writing a record
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized or parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A previous save has not finished yet
    #[error("a save is already in progress")]
    AlreadySaving,

    /// There is no save in flight to complete
    #[error("no save in progress")]
    NotSaving,
}

impl SaveError {
    /// Error for a non-success response, or None if the response succeeded.
    pub fn from_response(response: &SubmitResponse) -> Option<Self> {
        if response.is_success() {
            return None;
        }
        if response.status < 500 {
            Some(SaveError::Rejected {
                status: response.status,
                message: response.body.trim().to_string(),
            })
        } else {
            Some(SaveError::Server {
                status: response.status,
                status_text: response.status_text.clone(),
            })
        }
    }

    /// Create a transport error with a message.
    pub fn transport(message: impl Into<String>) -> Self {
        SaveError::Transport(message.into())
    }
}

/// Errors loading or storing records.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No record with this id
    #[error("Annotation not found: {id}")]
    NotFound {
        /// The missing record id
        id: String,
    },

    /// The stored or submitted document is not a JSON object
    #[error("Annotation {id} is not a JSON object")]
    NotAnObject {
        /// The offending record id
        id: String,
    },
}

/// Errors writing preferences. Reads never fail: they fall back to defaults.
#[derive(Error, Debug)]
pub enum PreferenceError {
    /// I/O error when writing the preference file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be serialized
    #[error("Failed to serialize preference: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage error (localStorage in WASM)
    #[error("Storage error: {0}")]
    Storage(String),
}
