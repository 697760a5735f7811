//! Error types for the chatlink client
//!
//! Three kinds of failure reach a caller: transport failures talking to the
//! backend, relationship precondition violations, and authentication failures
//! carrying the provider's own text. `ChatlinkError` unifies them with the
//! store, validation and configuration errors used by the rest of the crate.

use crate::relationship::{RelationshipAction, RelationshipStatus};

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Failures reaching or writing to a backend service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("Batch commit rejected: {reason}")]
    CommitRejected { reason: String },
    #[error("Media upload failed: {reason}")]
    UploadFailed { reason: String },
}

/// Document store errors that are not transport failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Profile document not found: {id}")]
    DocumentNotFound { id: String },
    #[error("Profile document already exists: {id}")]
    DocumentExists { id: String },
    #[error("Membership query too large: {requested} ids (max: {max})")]
    QueryTooLarge { requested: usize, max: usize },
}

/// Relationship precondition violations, evaluated on the actor's last read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationshipError {
    #[error("Cannot {action} ({counterpart}): relationship is {status}")]
    InvalidTransition {
        counterpart: String,
        status: RelationshipStatus,
        action: RelationshipAction,
    },
    #[error("Cannot {action}: counterpart is the acting user")]
    SelfRelationship { action: RelationshipAction },
}

// ----------------------------------------------------------------------------
// Core Error Type
// ----------------------------------------------------------------------------

/// Core error type for the chatlink client
#[derive(Debug, thiserror::Error)]
pub enum ChatlinkError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Relationship error: {0}")]
    Relationship(#[from] RelationshipError),

    /// Authentication failure with provider-supplied text
    #[error("{message}")]
    Auth { message: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl ChatlinkError {
    /// Create an authentication error carrying provider text
    pub fn auth<T: Into<String>>(message: T) -> Self {
        ChatlinkError::Auth {
            message: message.into(),
        }
    }

    /// Create a validation error for a named field
    pub fn validation<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        ChatlinkError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        ChatlinkError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a backend-unavailable transport error
    pub fn unavailable<T: Into<String>>(reason: T) -> Self {
        ChatlinkError::Transport(TransportError::Unavailable {
            reason: reason.into(),
        })
    }

    /// Create a rejected-commit transport error
    pub fn commit_rejected<T: Into<String>>(reason: T) -> Self {
        ChatlinkError::Transport(TransportError::CommitRejected {
            reason: reason.into(),
        })
    }

    /// Create a document-not-found store error
    pub fn not_found<T: Into<String>>(id: T) -> Self {
        ChatlinkError::Store(StoreError::DocumentNotFound { id: id.into() })
    }

    /// Whether this failure came from the network/transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, ChatlinkError::Transport(_))
    }

    /// Whether this failure is a relationship precondition violation
    pub fn is_precondition(&self) -> bool {
        matches!(self, ChatlinkError::Relationship(_))
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, ChatlinkError>;
