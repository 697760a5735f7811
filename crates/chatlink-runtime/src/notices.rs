//! User-facing notices
//!
//! Every failure surfaces as a dismissable notice. Precondition violations are
//! flagged as warnings rather than dropped.

use core::fmt;
use serde::{Deserialize, Serialize};

use chatlink_core::ChatlinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A titled message shown to the user until dismissed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Map an error to the notice shown for it
    pub fn from_error(err: &ChatlinkError) -> Self {
        match err {
            ChatlinkError::Transport(inner) => Self::error("Network error", inner.to_string()),
            ChatlinkError::Auth { message } => Self::error("Error", message.clone()),
            ChatlinkError::Relationship(inner) => Self::warning("Not allowed", inner.to_string()),
            ChatlinkError::Validation { .. } => Self::warning("Check your input", err.to_string()),
            ChatlinkError::Store(inner) => Self::error("Error", inner.to_string()),
            ChatlinkError::Configuration { .. } | ChatlinkError::Serialization(_) => {
                Self::error("Something went wrong", err.to_string())
            }
        }
    }
}

impl From<&ChatlinkError> for Notice {
    fn from(err: &ChatlinkError) -> Self {
        Self::from_error(err)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlink_core::{RelationshipAction, RelationshipError, RelationshipStatus};

    #[test]
    fn test_notice_mapping() {
        let notice = Notice::from_error(&ChatlinkError::unavailable("offline"));
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Network error");

        let notice = Notice::from_error(&ChatlinkError::auth("Please verify your email first."));
        assert_eq!(notice.to_string(), "Error: Please verify your email first.");

        let err = ChatlinkError::from(RelationshipError::InvalidTransition {
            counterpart: "u2".into(),
            status: RelationshipStatus::PendingOutgoing,
            action: RelationshipAction::SendRequest,
        });
        let notice = Notice::from(&err);
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("pending outgoing"));
    }
}
